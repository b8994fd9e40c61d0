//! Commands
//!
//! Entry points behind every CLI subcommand. Each takes the shared
//! [`AppState`](crate::state::AppState) and returns a
//! [`CommandResponse`](crate::models::response::CommandResponse).

pub mod analysis;
pub mod auth;
pub mod comps;
pub mod health;
pub mod property;
pub mod settings;
pub mod users;

pub use analysis::*;
pub use auth::*;
pub use comps::*;
pub use health::*;
pub use property::*;
pub use settings::*;
pub use users::*;
