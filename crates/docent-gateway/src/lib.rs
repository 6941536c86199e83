//! HTTP surface for Docent: document upload, document chat, quiz mode and
//! conversational tutoring sessions, served with axum.

/// `{ "detail": ... }` error responses.
pub mod error;
/// CORS configuration.
pub mod middleware;
/// Routes and request and response bodies.
pub mod router;
/// Server assembly and startup.
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{AppState, GatewayServer, ServerConfig};
