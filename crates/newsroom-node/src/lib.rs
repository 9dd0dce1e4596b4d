//! # Newsroom Node
//!
//! HTTP server for the Newsroom content store.
//!
//! The node owns one [`newsroom_core::ContentStore`], serves it over HTTP
//! and writes a YAML snapshot of it after every successful mutation.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Liveness and version |
//! | POST | `/users` | Create or fetch a user |
//! | GET | `/users/{username}` | User with their articles and comments |
//! | GET, POST | `/articles` | List or create articles |
//! | GET, PUT, DELETE | `/articles/{id}` | Read, update or delete an article |
//! | PUT | `/articles/{id}/upvote`, `/articles/{id}/downvote` | Vote on an article |
//! | POST | `/comments` | Create a comment |
//! | PUT, DELETE | `/comments/{id}` | Update or delete a comment |
//! | PUT | `/comments/{id}/upvote`, `/comments/{id}/downvote` | Vote on a comment |
//!
//! Any `OPTIONS` request answers 200. Unknown routes answer 400.
//!
//! ## Quick Start
//!
//! ```bash
//! cargo run --bin newsroom-node -- --port 4000 --database database.yml
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Router, CORS and the dispatch handler
//! - [`config`] - Layered node configuration
//! - [`persistence`] - Snapshot gateways and startup loading
//! - [`observability`] - Logging and request ids

pub mod api;
pub mod config;
pub mod error;
pub mod observability;
pub mod persistence;

pub use error::{NodeError, Result};
