//! Comment records.

use serde::{Deserialize, Serialize};

use crate::vote::{Votable, Votes};
use crate::{ArticleId, CommentId};

/// A comment on an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique identifier.
    pub id: CommentId,
    /// Comment text.
    pub body: String,
    /// Author's username.
    pub username: String,
    /// Article this comment belongs to.
    pub article_id: ArticleId,
    /// Vote sets.
    #[serde(flatten)]
    pub votes: Votes,
}

impl Comment {
    /// Creates a comment with no votes.
    pub fn new(
        id: CommentId,
        body: impl Into<String>,
        username: impl Into<String>,
        article_id: ArticleId,
    ) -> Self {
        Self {
            id,
            body: body.into(),
            username: username.into(),
            article_id,
            votes: Votes::default(),
        }
    }
}

impl Votable for Comment {
    fn votes(&self) -> &Votes {
        &self.votes
    }

    fn votes_mut(&mut self) -> &mut Votes {
        &mut self.votes
    }
}
