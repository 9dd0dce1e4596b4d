//! Error types for store operations.

use thiserror::Error;

use crate::{ArticleId, CommentId};

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A required field is missing, empty or malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// A request referenced a user that does not exist.
    #[error("unknown user: {username}")]
    UnknownUser { username: String },

    /// A request referenced an article that does not exist.
    #[error("unknown article: {id}")]
    UnknownArticle { id: ArticleId },

    /// A request referenced a comment that does not exist.
    #[error("unknown comment: {id}")]
    UnknownComment { id: CommentId },

    /// A comment update did not change the body.
    #[error("comment {id} already has this body")]
    UnchangedBody { id: CommentId },

    /// An id counter has no identifiers left to hand out.
    #[error("{counter} is exhausted")]
    IdsExhausted { counter: &'static str },

    /// User not found.
    #[error("user not found: {username}")]
    UserNotFound { username: String },

    /// Article not found.
    #[error("article not found: {id}")]
    ArticleNotFound { id: ArticleId },

    /// Comment not found.
    #[error("comment not found: {id}")]
    CommentNotFound { id: CommentId },
}

impl StoreError {
    /// Creates a validation error for a missing or empty field.
    pub fn missing(field: &str) -> Self {
        Self::Validation(format!("missing required field: {field}"))
    }

    /// Returns true if the error means the addressed entity does not exist.
    ///
    /// Unknown references carried inside a request body are *not* "not
    /// found": those are rejected as bad requests.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound { .. } | Self::ArticleNotFound { .. } | Self::CommentNotFound { .. }
        )
    }
}
