//! Services
//!
//! Stateful application logic between the commands and the API client.

pub mod analysis;
pub mod comps;
pub mod notice;

pub use analysis::AnalysisService;
pub use comps::ComparablesStore;
pub use notice::{Notice, NoticeLevel, Notifier};
