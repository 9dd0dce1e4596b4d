//! Article records.

use serde::{Deserialize, Serialize};

use crate::vote::{Votable, Votes};
use crate::{ArticleId, Comment, CommentId};

/// A submitted link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Unique identifier.
    pub id: ArticleId,
    /// Headline.
    pub title: String,
    /// Link target.
    pub url: String,
    /// Author's username.
    pub username: String,
    /// Comments on this article, in creation order.
    #[serde(default)]
    pub comment_ids: Vec<CommentId>,
    /// Vote sets.
    #[serde(flatten)]
    pub votes: Votes,
}

impl Article {
    /// Creates an article with no comments or votes.
    pub fn new(
        id: ArticleId,
        title: impl Into<String>,
        url: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            url: url.into(),
            username: username.into(),
            comment_ids: Vec::new(),
            votes: Votes::default(),
        }
    }

    /// Applies a partial update. Absent fields leave the stored value alone.
    pub fn apply(&mut self, patch: ArticlePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(url) = patch.url {
            self.url = url;
        }
    }
}

impl Votable for Article {
    fn votes(&self) -> &Votes {
        &self.votes
    }

    fn votes_mut(&mut self) -> &mut Votes {
        &mut self.votes
    }
}

/// Fields accepted by an article update.
///
/// Only `title` and `url` can change; the id, owner and comment list are
/// fixed for the life of the article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub url: Option<String>,
}

impl ArticlePatch {
    /// Builds a patch, treating empty strings as absent.
    pub fn new(title: Option<String>, url: Option<String>) -> Self {
        Self {
            title: title.filter(|t| !t.is_empty()),
            url: url.filter(|u| !u.is_empty()),
        }
    }
}

/// An article with its comments resolved into full records.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetail {
    #[serde(flatten)]
    pub article: Article,
    pub comments: Vec<Comment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_skips_empty_fields() {
        let mut article = Article::new(ArticleId::FIRST, "Title", "http://a", "alice");
        article.apply(ArticlePatch::new(Some(String::new()), Some("http://b".into())));

        assert_eq!(article.title, "Title");
        assert_eq!(article.url, "http://b");
    }

    #[test]
    fn test_votes_are_flattened_on_the_wire() {
        let mut article = Article::new(ArticleId::new(5), "T", "u", "alice");
        article.cast_vote(crate::Vote::Up, "bob");

        let value = serde_json::to_value(&article).unwrap();
        assert_eq!(value["id"], 5);
        assert_eq!(value["upvotedBy"][0], "bob");
        assert!(value["commentIds"].as_array().unwrap().is_empty());
        assert!(value.get("votes").is_none());
    }

    #[test]
    fn test_detail_carries_comments() {
        let article = Article::new(ArticleId::FIRST, "T", "u", "alice");
        let detail = ArticleDetail {
            article,
            comments: Vec::new(),
        };

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["title"], "T");
        assert!(value["comments"].as_array().unwrap().is_empty());
    }
}
