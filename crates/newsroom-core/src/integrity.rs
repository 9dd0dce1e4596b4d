//! Back-reference maintenance between users, articles and comments.
//!
//! Every path that creates or deletes an article or comment goes through the
//! `link_*` / `unlink_*` methods here, so the id lists on users and articles
//! always mirror the records that exist:
//!
//! - each id in `User::article_ids` names a live article owned by that user,
//!   and each live article is listed by its owner;
//! - the same holds for comments against `User::comment_ids` and
//!   `Article::comment_ids`;
//! - nobody sits in both vote sets of one item;
//! - the id counters are ahead of every id in use.
//!
//! [`audit`] reports breaches of those rules and [`repair`] fixes them. Both
//! exist for snapshots read from disk; the store itself never produces a
//! breach.

use std::collections::BTreeSet;
use std::fmt;

use crate::vote::Votes;
use crate::{Article, ArticleId, Comment, CommentId, Database, User};

impl Database {
    /// Inserts a new article and lists it under its owner.
    pub(crate) fn link_article(&mut self, article: Article) -> &Article {
        let id = article.id;
        if let Some(owner) = self.users.get_mut(&article.username) {
            owner.article_ids.push(id);
        }
        self.articles.entry(id).or_insert(article)
    }

    /// Removes an article, its comments and every reference to them.
    pub(crate) fn unlink_article(&mut self, id: ArticleId) -> Option<Article> {
        let article = self.articles.remove(&id)?;

        for comment_id in &article.comment_ids {
            self.unlink_comment(*comment_id);
        }
        if let Some(owner) = self.users.get_mut(&article.username) {
            owner.article_ids.retain(|a| *a != id);
        }

        Some(article)
    }

    /// Inserts a new comment and lists it under its article and its author.
    pub(crate) fn link_comment(&mut self, comment: Comment) -> &Comment {
        let id = comment.id;
        if let Some(article) = self.articles.get_mut(&comment.article_id) {
            article.comment_ids.push(id);
        }
        if let Some(author) = self.users.get_mut(&comment.username) {
            author.comment_ids.push(id);
        }
        self.comments.entry(id).or_insert(comment)
    }

    /// Removes a comment and every reference to it.
    pub(crate) fn unlink_comment(&mut self, id: CommentId) -> Option<Comment> {
        let comment = self.comments.remove(&id)?;

        if let Some(author) = self.users.get_mut(&comment.username) {
            author.comment_ids.retain(|c| *c != id);
        }
        if let Some(article) = self.articles.get_mut(&comment.article_id) {
            article.comment_ids.retain(|c| *c != id);
        }

        Some(comment)
    }
}

/// A broken cross reference found by [`audit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A user lists an article that is missing or owned by someone else.
    DanglingUserArticle { username: String, article_id: ArticleId },
    /// A user lists a comment that is missing or written by someone else.
    DanglingUserComment { username: String, comment_id: CommentId },
    /// An article lists a comment that is missing or belongs elsewhere.
    DanglingArticleComment { article_id: ArticleId, comment_id: CommentId },
    /// An id appears more than once in one list.
    DuplicateReference { owner: String, id: u64 },
    /// An article's owner does not exist.
    OrphanArticle { article_id: ArticleId, username: String },
    /// A comment's author or article does not exist.
    OrphanComment { comment_id: CommentId },
    /// An article is not listed by its owner.
    UnlistedArticle { article_id: ArticleId },
    /// A comment is not listed by its author or its article.
    UnlistedComment { comment_id: CommentId },
    /// A user sits in both vote sets of an item.
    ConflictingVote { item: String, username: String },
    /// A counter would hand out an id that is already in use.
    CounterBehind { counter: &'static str, next: u64, highest: u64 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingUserArticle { username, article_id } => {
                write!(f, "user {username} lists article {article_id} it does not own")
            }
            Self::DanglingUserComment { username, comment_id } => {
                write!(f, "user {username} lists comment {comment_id} it did not write")
            }
            Self::DanglingArticleComment { article_id, comment_id } => {
                write!(f, "article {article_id} lists foreign comment {comment_id}")
            }
            Self::DuplicateReference { owner, id } => {
                write!(f, "{owner} lists id {id} more than once")
            }
            Self::OrphanArticle { article_id, username } => {
                write!(f, "article {article_id} belongs to missing user {username}")
            }
            Self::OrphanComment { comment_id } => {
                write!(f, "comment {comment_id} has a missing author or article")
            }
            Self::UnlistedArticle { article_id } => {
                write!(f, "article {article_id} is not listed by its owner")
            }
            Self::UnlistedComment { comment_id } => {
                write!(f, "comment {comment_id} is not listed by its author or article")
            }
            Self::ConflictingVote { item, username } => {
                write!(f, "{username} both upvotes and downvotes {item}")
            }
            Self::CounterBehind { counter, next, highest } => {
                write!(f, "{counter} is {next} but id {highest} is in use")
            }
        }
    }
}

/// Checks every cross-reference rule and returns the breaches found.
pub fn audit(db: &Database) -> Vec<Violation> {
    let mut violations = Vec::new();

    for user in db.users.values() {
        for id in &user.article_ids {
            if db.articles.get(id).is_none_or(|a| a.username != user.username) {
                violations.push(Violation::DanglingUserArticle {
                    username: user.username.clone(),
                    article_id: *id,
                });
            }
        }
        for id in &user.comment_ids {
            if db.comments.get(id).is_none_or(|c| c.username != user.username) {
                violations.push(Violation::DanglingUserComment {
                    username: user.username.clone(),
                    comment_id: *id,
                });
            }
        }
        check_duplicates(
            &user.article_ids,
            || format!("user {} articles", user.username),
            &mut violations,
        );
        check_duplicates(
            &user.comment_ids,
            || format!("user {} comments", user.username),
            &mut violations,
        );
    }

    for article in db.articles.values() {
        match db.users.get(&article.username) {
            None => violations.push(Violation::OrphanArticle {
                article_id: article.id,
                username: article.username.clone(),
            }),
            Some(owner) if !owner.article_ids.contains(&article.id) => {
                violations.push(Violation::UnlistedArticle { article_id: article.id });
            }
            Some(_) => {}
        }
        for id in &article.comment_ids {
            if db.comments.get(id).is_none_or(|c| c.article_id != article.id) {
                violations.push(Violation::DanglingArticleComment {
                    article_id: article.id,
                    comment_id: *id,
                });
            }
        }
        check_duplicates(
            &article.comment_ids,
            || format!("article {}", article.id),
            &mut violations,
        );
        check_votes(&article.votes, || format!("article {}", article.id), &mut violations);
    }

    for comment in db.comments.values() {
        let author = db.users.get(&comment.username);
        let article = db.articles.get(&comment.article_id);
        match (author, article) {
            (Some(author), Some(article)) => {
                if !author.comment_ids.contains(&comment.id)
                    || !article.comment_ids.contains(&comment.id)
                {
                    violations.push(Violation::UnlistedComment { comment_id: comment.id });
                }
            }
            _ => violations.push(Violation::OrphanComment { comment_id: comment.id }),
        }
        check_votes(&comment.votes, || format!("comment {}", comment.id), &mut violations);
    }

    // An exhausted counter hands out nothing, so it is never behind.
    if let Some(highest) = db.articles.keys().next_back() {
        if db.next_article_id <= *highest && db.next_article_id != ArticleId::LAST {
            violations.push(Violation::CounterBehind {
                counter: "nextArticleId",
                next: db.next_article_id.get(),
                highest: highest.get(),
            });
        }
    }
    if let Some(highest) = db.comments.keys().next_back() {
        if db.next_comment_id <= *highest && db.next_comment_id != CommentId::LAST {
            violations.push(Violation::CounterBehind {
                counter: "nextCommentId",
                next: db.next_comment_id.get(),
                highest: highest.get(),
            });
        }
    }

    violations
}

/// Brings a database back in line with the cross-reference rules.
///
/// Comments whose article is gone are deleted; records whose owner is gone
/// get the owner re-created. Stale and duplicate ids are dropped from every
/// list, unlisted records are appended to their owners' lists, a user found
/// in both vote sets keeps the upvote, and counters are moved past the
/// highest id in use or still referenced. Returns the number of breaches
/// that were found.
pub fn repair(db: &mut Database) -> usize {
    let found = audit(db).len();
    if found == 0 {
        return 0;
    }

    // Ids of dropped records may still be referenced; none of them is reused.
    let highest_article = db
        .articles
        .keys()
        .copied()
        .chain(db.users.values().flat_map(|u| u.article_ids.iter().copied()))
        .chain(db.comments.values().map(|c| c.article_id))
        .max();
    let highest_comment = db
        .comments
        .keys()
        .copied()
        .chain(db.users.values().flat_map(|u| u.comment_ids.iter().copied()))
        .chain(db.articles.values().flat_map(|a| a.comment_ids.iter().copied()))
        .max();

    let orphaned: Vec<CommentId> = db
        .comments
        .values()
        .filter(|c| !db.articles.contains_key(&c.article_id))
        .map(|c| c.id)
        .collect();
    for id in orphaned {
        db.comments.remove(&id);
    }

    let authors: BTreeSet<String> = db
        .articles
        .values()
        .map(|a| a.username.clone())
        .chain(db.comments.values().map(|c| c.username.clone()))
        .collect();
    for username in authors {
        db.users
            .entry(username.clone())
            .or_insert_with(|| User::new(username));
    }

    // Rebuild every id list from the records, keeping the existing order for
    // ids that are still valid.
    for user in db.users.values_mut() {
        let owned_articles: BTreeSet<ArticleId> = db
            .articles
            .values()
            .filter(|a| a.username == user.username)
            .map(|a| a.id)
            .collect();
        let owned_comments: BTreeSet<CommentId> = db
            .comments
            .values()
            .filter(|c| c.username == user.username)
            .map(|c| c.id)
            .collect();
        user.article_ids = rebuild(&user.article_ids, &owned_articles);
        user.comment_ids = rebuild(&user.comment_ids, &owned_comments);
    }

    let mut article_comments: Vec<(ArticleId, BTreeSet<CommentId>)> = Vec::new();
    for article in db.articles.values() {
        let owned = db
            .comments
            .values()
            .filter(|c| c.article_id == article.id)
            .map(|c| c.id)
            .collect();
        article_comments.push((article.id, owned));
    }
    for (id, owned) in article_comments {
        if let Some(article) = db.articles.get_mut(&id) {
            article.comment_ids = rebuild(&article.comment_ids, &owned);
            resolve_votes(&mut article.votes);
        }
    }
    for comment in db.comments.values_mut() {
        resolve_votes(&mut comment.votes);
    }

    // A counter that cannot move past the highest id stays exhausted at LAST.
    if let Some(highest) = highest_article {
        if db.next_article_id <= highest {
            db.next_article_id = highest.next().unwrap_or(ArticleId::LAST);
        }
    }
    if let Some(highest) = highest_comment {
        if db.next_comment_id <= highest {
            db.next_comment_id = highest.next().unwrap_or(CommentId::LAST);
        }
    }

    found
}

fn rebuild<T: Copy + Ord>(current: &[T], owned: &BTreeSet<T>) -> Vec<T> {
    let mut seen = BTreeSet::new();
    let mut ids: Vec<T> = current
        .iter()
        .copied()
        .filter(|id| owned.contains(id) && seen.insert(*id))
        .collect();
    ids.extend(owned.iter().copied().filter(|id| !seen.contains(id)));
    ids
}

fn resolve_votes(votes: &mut Votes) {
    let upvoters: BTreeSet<String> = votes.upvoted_by.iter().cloned().collect();
    votes.downvoted_by.retain(|name| !upvoters.contains(name));

    let mut seen = BTreeSet::new();
    votes.upvoted_by.retain(|name| seen.insert(name.clone()));
    let mut seen = BTreeSet::new();
    votes.downvoted_by.retain(|name| seen.insert(name.clone()));
}

fn check_duplicates<T, F>(ids: &[T], owner: F, violations: &mut Vec<Violation>)
where
    T: Copy + Ord + Into<u64>,
    F: Fn() -> String,
{
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(*id) {
            violations.push(Violation::DuplicateReference {
                owner: owner(),
                id: (*id).into(),
            });
        }
    }
}

fn check_votes<F>(votes: &Votes, item: F, violations: &mut Vec<Violation>)
where
    F: Fn() -> String,
{
    for username in &votes.upvoted_by {
        if votes.downvoted_by.contains(username) {
            violations.push(Violation::ConflictingVote {
                item: item(),
                username: username.clone(),
            });
        }
    }
}
