//! Compscope Client
//!
//! Network side of the comp analysis client:
//! - `http_client` - shared `reqwest::Client` factory (cookies, proxy, timeouts)
//! - `transport` - streaming request and pull-based chunk source
//! - `resolver` - drives a chunk source to the final analysis result
//! - `api` - JSON endpoints for properties, comparables, auth and users

pub mod api;
pub mod error;
pub mod http_client;
pub mod resolver;
pub mod transport;

// Re-export main types
pub use api::{
    extract_token, AnalyzeSelectedRequest, ApiClient, CreateUserRequest, FetchDetailsRequest,
    FindComparablesRequest, LoginRequest, LoginResponse, UpdateUserRequest,
};
pub use error::{ClientError, ClientResult, ErrorContext};
pub use http_client::{build_http_client, HttpSettings};
pub use resolver::{consume_event_stream, StreamOutcome};
pub use transport::{open_event_stream, ChunkSource, HttpChunkSource};
