//! Integration tests for the compscope command layer.
//!
//! Network tests run against a local stand-in server from [`support`].

mod analysis_flow;
mod comps_flow;
mod support;
mod workflow_persistence;
