//! Data Models
//!
//! Contains the data structures shared by services, commands and the CLI.

pub mod analysis;
pub mod property;
pub mod response;
pub mod search;
pub mod settings;

pub use analysis::*;
pub use property::*;
pub use response::*;
pub use search::*;
pub use settings::*;
