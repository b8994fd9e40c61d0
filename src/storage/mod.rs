//! Storage Layer
//!
//! Handles all data persistence: SQLite settings store, the local cache built
//! on it, and the JSON config.

pub mod config;
pub mod database;
pub mod local_cache;

pub use config::*;
pub use database::*;
pub use local_cache::*;
