//! Entity operations over a [`Database`].
//!
//! Each operation runs to completion against the database it is handed and
//! reports failure through [`StoreError`]; the dispatcher turns the outcome
//! into a status code. Creation and deletion go through the integrity layer
//! so back-references never dangle.

use crate::article::{ArticleDetail, ArticlePatch};
use crate::error::StoreError;
use crate::user::UserProfile;
use crate::vote::{Votable, Vote};
use crate::{Article, ArticleId, Comment, CommentId, Database, Result, User};

/// Outcome of [`Database::create_or_get_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// A new user was created.
    Created(User),
    /// The user already existed and was left untouched.
    Existing(User),
}

impl Registration {
    /// Returns true if the call created the user.
    pub fn is_created(&self) -> bool {
        matches!(self, Registration::Created(_))
    }

    /// Returns the user record.
    pub fn into_user(self) -> User {
        match self {
            Registration::Created(user) | Registration::Existing(user) => user,
        }
    }
}

/// Fields submitted to create an article. Empty strings count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewArticle {
    pub title: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
}

/// Fields submitted to create a comment. Empty strings count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewComment {
    pub body: Option<String>,
    pub username: Option<String>,
    pub article_id: Option<ArticleId>,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StoreError::missing(field))
}

impl Database {
    fn known_user(&self, username: Option<String>) -> Result<String> {
        let username = required(username, "username")?;
        if self.users.contains_key(&username) {
            Ok(username)
        } else {
            Err(StoreError::UnknownUser { username })
        }
    }

    // ==================== Users ====================

    /// Returns the named user, creating it first if needed.
    pub fn create_or_get_user(&mut self, username: Option<String>) -> Result<Registration> {
        let username = required(username, "username")?;

        if let Some(user) = self.users.get(&username) {
            return Ok(Registration::Existing(user.clone()));
        }

        let user = User::new(username.clone());
        self.users.insert(username.clone(), user.clone());
        tracing::debug!(username = %username, "User created");

        Ok(Registration::Created(user))
    }

    /// Returns a user with their articles and comments resolved.
    pub fn user_profile(&self, username: &str) -> Result<UserProfile> {
        if username.is_empty() {
            return Err(StoreError::missing("username"));
        }

        let user = self
            .users
            .get(username)
            .ok_or_else(|| StoreError::UserNotFound {
                username: username.to_string(),
            })?;

        Ok(UserProfile {
            user: user.clone(),
            user_articles: user
                .article_ids
                .iter()
                .filter_map(|id| self.articles.get(id).cloned())
                .collect(),
            user_comments: user
                .comment_ids
                .iter()
                .filter_map(|id| self.comments.get(id).cloned())
                .collect(),
        })
    }

    // ==================== Articles ====================

    /// Lists every article, newest first.
    pub fn list_articles(&self) -> Vec<Article> {
        self.articles.values().rev().cloned().collect()
    }

    /// Returns an article with its comments resolved.
    pub fn article_detail(&self, id: ArticleId) -> Result<ArticleDetail> {
        let article = self
            .articles
            .get(&id)
            .ok_or(StoreError::ArticleNotFound { id })?;

        Ok(ArticleDetail {
            article: article.clone(),
            comments: article
                .comment_ids
                .iter()
                .filter_map(|cid| self.comments.get(cid).cloned())
                .collect(),
        })
    }

    /// Creates an article owned by an existing user.
    ///
    /// The id counter is only advanced once every check has passed.
    pub fn create_article(&mut self, draft: NewArticle) -> Result<Article> {
        let title = required(draft.title, "title")?;
        let url = required(draft.url, "url")?;
        let username = self.known_user(draft.username)?;

        let id = self.allocate_article_id()?;
        let article = self
            .link_article(Article::new(id, title, url, username))
            .clone();
        tracing::debug!(article_id = %id, username = %article.username, "Article created");

        Ok(article)
    }

    /// Updates an article's title and/or url.
    ///
    /// A missing patch is rejected; empty fields inside a patch are skipped.
    pub fn update_article(
        &mut self,
        id: ArticleId,
        patch: Option<ArticlePatch>,
    ) -> Result<Article> {
        let patch = patch.ok_or_else(|| StoreError::missing("article"))?;
        let article = self
            .articles
            .get_mut(&id)
            .ok_or(StoreError::ArticleNotFound { id })?;

        article.apply(patch);
        tracing::debug!(article_id = %id, "Article updated");

        Ok(article.clone())
    }

    /// Deletes an article together with its comments.
    ///
    /// A missing article is reported as an unknown reference (a bad request),
    /// not as not-found, unlike [`Database::delete_comment`].
    pub fn delete_article(&mut self, id: ArticleId) -> Result<Article> {
        let article = self
            .unlink_article(id)
            .ok_or(StoreError::UnknownArticle { id })?;
        tracing::debug!(
            article_id = %id,
            comments = article.comment_ids.len(),
            "Article deleted"
        );

        Ok(article)
    }

    /// Records a vote on an article by an existing user.
    pub fn vote_article(
        &mut self,
        id: ArticleId,
        username: Option<String>,
        vote: Vote,
    ) -> Result<Article> {
        if !self.articles.contains_key(&id) {
            return Err(StoreError::UnknownArticle { id });
        }
        let username = self.known_user(username)?;
        let article = self
            .articles
            .get_mut(&id)
            .ok_or(StoreError::UnknownArticle { id })?;

        article.cast_vote(vote, &username);
        tracing::debug!(article_id = %id, username = %username, %vote, "Article vote recorded");

        Ok(article.clone())
    }

    // ==================== Comments ====================

    /// Creates a comment by an existing user on an existing article.
    pub fn create_comment(&mut self, draft: NewComment) -> Result<Comment> {
        let body = required(draft.body, "body")?;
        let username = self.known_user(draft.username)?;
        let article_id = draft
            .article_id
            .ok_or_else(|| StoreError::missing("articleId"))?;
        if !self.articles.contains_key(&article_id) {
            return Err(StoreError::UnknownArticle { id: article_id });
        }

        let id = self.allocate_comment_id()?;
        let comment = self
            .link_comment(Comment::new(id, body, username, article_id))
            .clone();
        tracing::debug!(comment_id = %id, article_id = %article_id, "Comment created");

        Ok(comment)
    }

    /// Replaces a comment's body.
    ///
    /// The new body must be non-empty and differ from the current one.
    pub fn update_comment(&mut self, id: CommentId, body: Option<String>) -> Result<Comment> {
        let comment = self
            .comments
            .get_mut(&id)
            .ok_or(StoreError::CommentNotFound { id })?;
        let body = required(body, "body")?;
        if body == comment.body {
            return Err(StoreError::UnchangedBody { id });
        }

        comment.body = body;
        tracing::debug!(comment_id = %id, "Comment updated");

        Ok(comment.clone())
    }

    /// Records a vote on a comment by an existing user.
    pub fn vote_comment(
        &mut self,
        id: CommentId,
        username: Option<String>,
        vote: Vote,
    ) -> Result<Comment> {
        if !self.comments.contains_key(&id) {
            return Err(StoreError::UnknownComment { id });
        }
        let username = self.known_user(username)?;
        let comment = self
            .comments
            .get_mut(&id)
            .ok_or(StoreError::UnknownComment { id })?;

        comment.cast_vote(vote, &username);
        tracing::debug!(comment_id = %id, username = %username, %vote, "Comment vote recorded");

        Ok(comment.clone())
    }

    /// Deletes a comment.
    pub fn delete_comment(&mut self, id: CommentId) -> Result<Comment> {
        let comment = self
            .unlink_comment(id)
            .ok_or(StoreError::CommentNotFound { id })?;
        tracing::debug!(comment_id = %id, "Comment deleted");

        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::audit;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn draft(title: &str, url: &str, username: &str) -> NewArticle {
        NewArticle {
            title: some(title),
            url: some(url),
            username: some(username),
        }
    }

    fn remark(body: &str, username: &str, article_id: ArticleId) -> NewComment {
        NewComment {
            body: some(body),
            username: some(username),
            article_id: Some(article_id),
        }
    }

    fn create_db_with_article() -> (Database, Article) {
        let mut db = Database::new();
        db.create_or_get_user(some("alice")).unwrap();
        db.create_or_get_user(some("bob")).unwrap();
        let article = db.create_article(draft("T", "http://t", "alice")).unwrap();
        (db, article)
    }

    #[test]
    fn test_create_or_get_user_is_idempotent() {
        let mut db = Database::new();

        let first = db.create_or_get_user(some("alice")).unwrap();
        assert!(first.is_created());

        let second = db.create_or_get_user(some("alice")).unwrap();
        assert!(!second.is_created());
        assert_eq!(second.into_user(), first.into_user());
        assert_eq!(db.users().count(), 1);
    }

    #[test]
    fn test_create_user_requires_name() {
        let mut db = Database::new();
        assert!(matches!(
            db.create_or_get_user(some("")),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            db.create_or_get_user(None),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_user_profile_resolves_records() {
        let (mut db, article) = create_db_with_article();
        db.create_comment(remark("first", "alice", article.id)).unwrap();

        let profile = db.user_profile("alice").unwrap();
        assert_eq!(profile.user_articles, vec![article]);
        assert_eq!(profile.user_comments.len(), 1);
        assert_eq!(profile.user_comments[0].body, "first");

        assert!(matches!(
            db.user_profile("nobody"),
            Err(StoreError::UserNotFound { .. })
        ));
        assert!(matches!(db.user_profile(""), Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_create_article_links_owner() {
        let (db, article) = create_db_with_article();

        assert_eq!(article.id, ArticleId::new(1));
        assert_eq!(db.user("alice").unwrap().article_ids, vec![article.id]);
        assert!(article.comment_ids.is_empty());
        assert!(article.votes.upvoted_by.is_empty());
    }

    #[test]
    fn test_failed_create_article_does_not_consume_id() {
        let (mut db, _) = create_db_with_article();

        let err = db.create_article(draft("T", "u", "mallory")).unwrap_err();
        assert_eq!(err, StoreError::UnknownUser { username: "mallory".into() });
        assert!(db.create_article(draft("", "u", "alice")).is_err());
        assert!(db.create_article(draft("T", "", "alice")).is_err());

        let next = db.create_article(draft("T2", "u2", "bob")).unwrap();
        assert_eq!(next.id, ArticleId::new(2));
    }

    #[test]
    fn test_list_articles_newest_first() {
        let (mut db, _) = create_db_with_article();
        db.create_article(draft("B", "b", "bob")).unwrap();
        db.create_article(draft("C", "c", "alice")).unwrap();
        db.delete_article(ArticleId::new(2)).unwrap();

        let ids: Vec<u64> = db.list_articles().iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_update_article_skips_empty_fields() {
        let (mut db, article) = create_db_with_article();

        let updated = db
            .update_article(article.id, Some(ArticlePatch::new(some("New"), some(""))))
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.url, "http://t");
        assert_eq!(updated.username, "alice");

        assert!(matches!(
            db.update_article(article.id, None),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            db.update_article(ArticleId::new(99), Some(ArticlePatch::default())),
            Err(StoreError::ArticleNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_article_cascades_to_comments() {
        let (mut db, article) = create_db_with_article();
        let c1 = db.create_comment(remark("one", "bob", article.id)).unwrap();
        let c2 = db.create_comment(remark("two", "alice", article.id)).unwrap();
        let other = db.create_article(draft("O", "o", "bob")).unwrap();
        let kept = db.create_comment(remark("kept", "bob", other.id)).unwrap();

        db.delete_article(article.id).unwrap();

        assert!(db.comment(c1.id).is_none());
        assert!(db.comment(c2.id).is_none());
        assert_eq!(db.user("bob").unwrap().comment_ids, vec![kept.id]);
        assert!(db.user("alice").unwrap().comment_ids.is_empty());
        assert!(db.user("alice").unwrap().article_ids.is_empty());
        assert!(audit(&db).is_empty());
    }

    #[test]
    fn test_delete_missing_article_is_unknown_reference() {
        let mut db = Database::new();
        let err = db.delete_article(ArticleId::new(1)).unwrap_err();
        assert_eq!(err, StoreError::UnknownArticle { id: ArticleId::new(1) });
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let (mut db, first) = create_db_with_article();
        db.delete_article(first.id).unwrap();

        let second = db.create_article(draft("T", "u", "alice")).unwrap();
        assert_eq!(second.id, ArticleId::new(2));
    }

    #[test]
    fn test_exhausted_counters_reject_creation() {
        let (mut db, article) = create_db_with_article();
        db.next_article_id = ArticleId::LAST;
        db.next_comment_id = CommentId::LAST;
        let before = db.clone();

        assert_eq!(
            db.create_article(draft("T", "u", "alice")),
            Err(StoreError::IdsExhausted { counter: "nextArticleId" })
        );
        assert_eq!(
            db.create_comment(remark("hi", "alice", article.id)),
            Err(StoreError::IdsExhausted { counter: "nextCommentId" })
        );
        assert_eq!(db, before);
    }

    #[test]
    fn test_vote_article_toggles() {
        let (mut db, article) = create_db_with_article();

        let up = db.vote_article(article.id, some("alice"), Vote::Up).unwrap();
        assert_eq!(up.votes.upvoted_by, vec!["alice"]);

        let down = db.vote_article(article.id, some("alice"), Vote::Down).unwrap();
        assert!(down.votes.upvoted_by.is_empty());
        assert_eq!(down.votes.downvoted_by, vec!["alice"]);
    }

    #[test]
    fn test_vote_article_requires_known_user_and_article() {
        let (mut db, article) = create_db_with_article();

        assert!(matches!(
            db.vote_article(article.id, some("mallory"), Vote::Up),
            Err(StoreError::UnknownUser { .. })
        ));
        assert!(matches!(
            db.vote_article(ArticleId::new(9), some("alice"), Vote::Up),
            Err(StoreError::UnknownArticle { .. })
        ));
        assert!(matches!(
            db.vote_article(article.id, None, Vote::Up),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_create_comment_links_article_and_author() {
        let (mut db, article) = create_db_with_article();
        let comment = db.create_comment(remark("hi", "bob", article.id)).unwrap();

        assert_eq!(comment.id, CommentId::new(1));
        assert_eq!(db.user("bob").unwrap().comment_ids, vec![comment.id]);
        assert_eq!(db.article(article.id).unwrap().comment_ids, vec![comment.id]);

        let detail = db.article_detail(article.id).unwrap();
        assert_eq!(detail.comments, vec![comment]);
    }

    #[test]
    fn test_create_comment_guards() {
        let (mut db, article) = create_db_with_article();

        assert!(db.create_comment(remark("", "bob", article.id)).is_err());
        assert!(matches!(
            db.create_comment(remark("hi", "mallory", article.id)),
            Err(StoreError::UnknownUser { .. })
        ));
        assert!(matches!(
            db.create_comment(remark("hi", "bob", ArticleId::new(5))),
            Err(StoreError::UnknownArticle { .. })
        ));
        assert_eq!(db.next_comment_id(), CommentId::FIRST);
    }

    #[test]
    fn test_update_comment_rules() {
        let (mut db, article) = create_db_with_article();
        let comment = db.create_comment(remark("hi", "bob", article.id)).unwrap();

        assert_eq!(
            db.update_comment(comment.id, some("hi")).unwrap_err(),
            StoreError::UnchangedBody { id: comment.id }
        );
        assert!(matches!(
            db.update_comment(comment.id, some("")),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            db.update_comment(CommentId::new(8), some("x")),
            Err(StoreError::CommentNotFound { .. })
        ));

        let updated = db.update_comment(comment.id, some("hello")).unwrap();
        assert_eq!(updated.body, "hello");
    }

    #[test]
    fn test_vote_comment() {
        let (mut db, article) = create_db_with_article();
        let comment = db.create_comment(remark("hi", "bob", article.id)).unwrap();

        db.vote_comment(comment.id, some("alice"), Vote::Down).unwrap();
        let voted = db.vote_comment(comment.id, some("alice"), Vote::Down).unwrap();
        assert_eq!(voted.votes.downvoted_by, vec!["alice"]);

        assert!(matches!(
            db.vote_comment(CommentId::new(3), some("alice"), Vote::Up),
            Err(StoreError::UnknownComment { .. })
        ));
    }

    #[test]
    fn test_delete_comment_unlinks() {
        let (mut db, article) = create_db_with_article();
        let comment = db.create_comment(remark("hi", "bob", article.id)).unwrap();

        db.delete_comment(comment.id).unwrap();

        assert!(db.user("bob").unwrap().comment_ids.is_empty());
        assert!(db.article(article.id).unwrap().comment_ids.is_empty());
        assert!(matches!(
            db.delete_comment(comment.id),
            Err(StoreError::CommentNotFound { .. })
        ));
    }
}
