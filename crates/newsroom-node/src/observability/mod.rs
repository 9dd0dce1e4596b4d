//! # Observability Module
//!
//! - **Structured Logging**: pretty or JSON logs through `tracing-subscriber`
//! - **Request Tracing**: a request id on every request, its span and its response
//!
//! ## Usage
//!
//! ```rust,ignore
//! use axum::Router;
//! use newsroom_node::observability::{init_logging, request_id_layer, LogFormat};
//!
//! init_logging("info", LogFormat::Pretty);
//!
//! let app: Router<()> = Router::new().layer(request_id_layer());
//! ```

mod logging;
pub mod middleware;

pub use logging::{default_directive, init_logging, LogFormat};
pub use middleware::{request_id_layer, MiddlewareLayer, REQUEST_ID_HEADER};
