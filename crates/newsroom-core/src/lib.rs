//! Content store for Newsroom: users, articles, comments and votes.
//!
//! This crate holds the in-memory database with its cascade and
//! back-reference rules, the entity operations, and the dispatcher that maps
//! `(method, path, body)` requests onto those operations. It knows nothing
//! about sockets or files; see `newsroom-node` for the server.

mod article;
mod comment;
mod database;
mod dispatch;
mod error;
mod id;
pub mod integrity;
mod ops;
pub mod route;
mod store;
mod user;
mod vote;

pub use article::{Article, ArticleDetail, ArticlePatch};
pub use comment::Comment;
pub use database::Database;
pub use dispatch::{Dispatcher, Method, Operation, Reply, Status};
pub use error::StoreError;
pub use id::{ArticleId, CommentId};
pub use ops::{NewArticle, NewComment, Registration};
pub use route::{Route, Target};
pub use store::ContentStore;
pub use user::{User, UserProfile};
pub use vote::{Votable, Vote, Votes};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
