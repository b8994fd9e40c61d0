//! Compscope Core
//!
//! Pure domain logic for the comp analysis client. Nothing in this crate
//! performs I/O: the HTTP transport and the application layer live in
//! `compscope-client` and the root crate respectively.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `streaming` - Analysis stream event types (`StepId`, `StepEvent`, `StreamEvent`, `AnalysisResult`)
//! - `frame` - Incremental `data:` frame decoder (`FrameDecoder`)
//! - `progress` - Progress snapshot and reducer (`AnalysisProgress`, `StepStatus`, `StepView`)
//! - `repair` - Repair-cost derivation and MAO inputs (`RepairInputs`, `MaoInputs`)
//! - `selection` - Comparable selection rules (`CompSelection`)
//! - `format` - Display formatting for currency, deal scores and recommendations
//! - `proxy` - Proxy configuration data types shared with the HTTP client factory

pub mod error;
pub mod format;
pub mod frame;
pub mod progress;
pub mod proxy;
pub mod repair;
pub mod selection;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Streaming Types ────────────────────────────────────────────────────
pub use frame::FrameDecoder;
pub use streaming::{
    AnalysisResult, ConditionScores, DealScore, MaoBreakdown, Recommendation, RepairBreakdown,
    StepEvent, StepId, StreamEvent,
};

// ── Progress ───────────────────────────────────────────────────────────
pub use progress::{AnalysisProgress, StepStatus, StepView};

// ── Inputs & Selection ─────────────────────────────────────────────────
pub use repair::{compute_total_repair, MaoInputs, MaoInputsUpdate, MaoRule, RepairInputs};
pub use selection::{
    CompSelection, SelectionCheck, SelectionError, MAX_SELECTED_COMPS, RECOMMENDED_MIN_COMPS,
};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};
