//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, fallback)
//!     → request.rs (request ID, buffered RequestContext)
//!     → routing::Dispatcher (match + invoke api::Handler)
//!     → response.rs (JSON error envelope)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, RequestContext, X_REQUEST_ID};
pub use response::json_error;
pub use server::{AppState, HttpServer};
