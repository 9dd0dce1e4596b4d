//! The entity maps and id counters behind a [`ContentStore`](crate::ContentStore).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::{Article, ArticleId, Comment, CommentId, Result, User};

/// All users, articles and comments, plus the next free ids.
///
/// Fields are private: entity operations (see the `ops` module) and the
/// integrity layer are the only code that mutates them, which is what keeps
/// the cross references between the three maps consistent.
///
/// The serialized form is the snapshot written to disk. Map keys are written
/// as strings and records that were nulled out by older snapshot writers are
/// dropped on load, so files produced by earlier versions of the server still
/// load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RawDatabase", from = "RawDatabase")]
pub struct Database {
    pub(crate) users: BTreeMap<String, User>,
    pub(crate) articles: BTreeMap<ArticleId, Article>,
    pub(crate) comments: BTreeMap<CommentId, Comment>,
    pub(crate) next_article_id: ArticleId,
    pub(crate) next_comment_id: CommentId,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            articles: BTreeMap::new(),
            comments: BTreeMap::new(),
            next_article_id: ArticleId::FIRST,
            next_comment_id: CommentId::FIRST,
        }
    }
}

impl Database {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a user by name.
    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// Looks up an article by id.
    pub fn article(&self, id: ArticleId) -> Option<&Article> {
        self.articles.get(&id)
    }

    /// Looks up a comment by id.
    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.comments.get(&id)
    }

    /// Iterates over users in name order.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// Iterates over articles in ascending id order.
    pub fn articles(&self) -> impl DoubleEndedIterator<Item = &Article> {
        self.articles.values()
    }

    /// Iterates over comments in ascending id order.
    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.values()
    }

    /// The id the next created article will receive.
    pub fn next_article_id(&self) -> ArticleId {
        self.next_article_id
    }

    /// The id the next created comment will receive.
    pub fn next_comment_id(&self) -> CommentId {
        self.next_comment_id
    }

    /// Takes the next article id, advancing the counter.
    ///
    /// Fails without touching the counter once it has reached
    /// [`ArticleId::LAST`].
    pub(crate) fn allocate_article_id(&mut self) -> Result<ArticleId> {
        let id = self.next_article_id;
        self.next_article_id = id.next().ok_or(StoreError::IdsExhausted {
            counter: "nextArticleId",
        })?;
        Ok(id)
    }

    /// Takes the next comment id, advancing the counter.
    pub(crate) fn allocate_comment_id(&mut self) -> Result<CommentId> {
        let id = self.next_comment_id;
        self.next_comment_id = id.next().ok_or(StoreError::IdsExhausted {
            counter: "nextCommentId",
        })?;
        Ok(id)
    }
}

/// On-disk layout of a [`Database`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawDatabase {
    users: BTreeMap<String, Option<User>>,
    articles: BTreeMap<String, Option<Article>>,
    comments: BTreeMap<String, Option<Comment>>,
    next_article_id: Option<ArticleId>,
    next_comment_id: Option<CommentId>,
}

impl From<Database> for RawDatabase {
    fn from(db: Database) -> Self {
        Self {
            users: db
                .users
                .into_iter()
                .map(|(name, user)| (name, Some(user)))
                .collect(),
            articles: db
                .articles
                .into_iter()
                .map(|(id, article)| (id.to_string(), Some(article)))
                .collect(),
            comments: db
                .comments
                .into_iter()
                .map(|(id, comment)| (id.to_string(), Some(comment)))
                .collect(),
            next_article_id: Some(db.next_article_id),
            next_comment_id: Some(db.next_comment_id),
        }
    }
}

impl From<RawDatabase> for Database {
    fn from(raw: RawDatabase) -> Self {
        // Records carry their own key; the map key is only trusted for users
        // whose record omits the name.
        let users = raw
            .users
            .into_iter()
            .filter_map(|(key, user)| {
                let mut user = user?;
                if user.username.is_empty() {
                    user.username = key;
                }
                Some((user.username.clone(), user))
            })
            .collect();
        let articles = raw
            .articles
            .into_values()
            .flatten()
            .map(|article| (article.id, article))
            .collect();
        let comments = raw
            .comments
            .into_values()
            .flatten()
            .map(|comment| (comment.id, comment))
            .collect();

        Self {
            users,
            articles,
            comments,
            next_article_id: raw.next_article_id.unwrap_or(ArticleId::FIRST),
            next_comment_id: raw.next_comment_id.unwrap_or(CommentId::FIRST),
        }
    }
}
