//! API layer for proxy-core.
//!
//! This module exposes the command handler, session listing and
//! operational endpoints over HTTP.
//!
//! ## Endpoints
//!
//! ### Health & Info
//! - `GET /health` - Health check
//! - `GET /api/v1/` - API information and instance UUID
//!
//! ### Commands & Sessions
//! - `POST /api/v1/command` - Run a command document
//! - `GET /api/v1/sessions` - List active sessions
//!
//! ### Operations
//! - `GET /metrics` - Prometheus metrics
//! - `GET /debug/vars` - Process state dump
//!
//! ## Example
//!
//! ```no_run
//! use proxy_core::api::{serve_with_state, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> proxy_core::Result<()> {
//!     let config = ServerConfig::new("127.0.0.1", 8088);
//!     serve_with_state(config, AppState::in_memory()?).await
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;

// Re-export commonly used types
pub use handlers::AppState;
pub use router::{create_router, create_router_with_state, serve_with_state, ServerConfig};
pub use types::{ErrorResponse, ListSessionsResponse, SessionSummary};
