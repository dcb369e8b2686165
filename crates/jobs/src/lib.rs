//! Umbra DNS Background Jobs
pub mod adlist_health;
pub mod runner;

pub use adlist_health::AdlistHealthJob;
pub use runner::JobRunner;
