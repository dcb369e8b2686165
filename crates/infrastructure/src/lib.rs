//! Umbra DNS Infrastructure Layer
//!
//! SQLite-backed policy store access, the blocking decision engine and the
//! system adapters used for client identification.
pub mod database;
pub mod gravity;
pub mod repositories;
pub mod system;

pub use database::GravityDb;
pub use gravity::engine::BlockingEngine;
pub use gravity::regex_binder::RegexBinder;
