//! User records.

use serde::{Deserialize, Serialize};

use crate::{Article, ArticleId, Comment, CommentId};

/// A registered user.
///
/// Users are created once and never renamed or removed. The id lists are
/// back-references maintained by the store; they are never edited directly
/// by request handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique name, also the user's key in the store.
    pub username: String,
    /// Articles written by this user, in creation order.
    #[serde(default)]
    pub article_ids: Vec<ArticleId>,
    /// Comments written by this user, in creation order.
    #[serde(default)]
    pub comment_ids: Vec<CommentId>,
}

impl User {
    /// Creates a user with no articles or comments.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            article_ids: Vec::new(),
            comment_ids: Vec::new(),
        }
    }
}

/// A user together with the records their id lists point at.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user: User,
    pub user_articles: Vec<Article>,
    pub user_comments: Vec<Comment>,
}
