pub mod client_lookup;
pub mod decision_cache;
pub mod engine;
pub mod membership;
pub mod regex_binder;
pub mod special_domains;
pub mod statements;

pub use client_lookup::ClientGroupResolver;
pub use decision_cache::{CachedDecision, DecisionCache};
pub use engine::{BlockingEngine, CounterSnapshot};
pub use membership::{CountedTable, ListLookup};
pub use regex_binder::RegexBinder;
pub use statements::{ClientStatements, StatementCache};
