//! HTTP API for the rendering frontend.
//!
//! - `server` - axum router and endpoint handlers
//! - `types` - request/response types
//! - `logs` - SSE log streaming

pub mod logs;
pub mod server;
pub mod types;
