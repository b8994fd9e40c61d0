//! Compscope - application layer
//!
//! Everything above the wire: the dependency-injected [`AppState`], local
//! storage (JSON config and the SQLite-backed cache), the comp workflow and
//! analysis services, command functions and the `compscope` CLI.
//!
//! - Wire types, progress reduction and repair math live in `compscope-core`
//! - HTTP, the event-stream transport and the completion resolver live in
//!   `compscope-client`

pub mod cli;
pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::response::*;
pub use models::settings::{AppConfig, SettingsUpdate};
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
