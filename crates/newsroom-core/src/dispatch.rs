//! Request dispatch: `(method, path, body)` in, `(status, body)` out.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | `/users` | create or fetch a user (`{username}`) |
//! | GET | `/users/{username}` | user with their articles and comments |
//! | GET | `/articles` | all articles, newest first |
//! | POST | `/articles` | create (`{article: {title, url, username}}`) |
//! | GET | `/articles/{id}` | article with its comments |
//! | PUT | `/articles/{id}` | update (`{article: {title?, url?}}`) |
//! | DELETE | `/articles/{id}` | delete, cascading to comments |
//! | PUT | `/articles/{id}/upvote` | vote (`{username}`) |
//! | PUT | `/articles/{id}/downvote` | vote (`{username}`) |
//! | POST | `/comments` | create (`{comment: {body, username, articleId}}`) |
//! | PUT | `/comments/{id}` | update (`{comment: {body}}`) |
//! | DELETE | `/comments/{id}` | delete |
//! | PUT | `/comments/{id}/upvote` | vote (`{username}`) |
//! | PUT | `/comments/{id}/downvote` | vote (`{username}`) |
//!
//! Any other method/path pair is a bad request. Failed requests carry no
//! body.

use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::article::ArticlePatch;
use crate::error::StoreError;
use crate::ops::{NewArticle, NewComment};
use crate::route::{self, Route, Target};
use crate::vote::Vote;
use crate::{ArticleId, CommentId, ContentStore};

/// Request methods the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Parses an upper-case HTTP method name.
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    /// Returns true for methods whose request body is decoded.
    pub fn has_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

/// Status of a dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Created,
    NoContent,
    BadRequest,
    NotFound,
}

impl Status {
    /// Numeric HTTP status code.
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::NoContent => 204,
            Status::BadRequest => 400,
            Status::NotFound => 404,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<&StoreError> for Status {
    fn from(err: &StoreError) -> Self {
        if err.is_not_found() {
            Status::NotFound
        } else {
            Status::BadRequest
        }
    }
}

/// The operation selected for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CreateOrGetUser,
    GetUser { username: String },
    ListArticles,
    GetArticle { id: Option<ArticleId> },
    CreateArticle,
    UpdateArticle { id: Option<ArticleId> },
    DeleteArticle { id: Option<ArticleId> },
    VoteArticle { id: Option<ArticleId>, vote: Vote },
    CreateComment,
    UpdateComment { id: Option<CommentId> },
    DeleteComment { id: Option<CommentId> },
    VoteComment { id: Option<CommentId>, vote: Vote },
}

impl Operation {
    /// Picks the operation for a method on a route, if there is one.
    ///
    /// Id segments that are not positive integers are kept as `None`; each
    /// operation decides how to reject them.
    pub fn select(method: Method, route: &Route) -> Option<Self> {
        let op = match (route.collection.as_str(), &route.target, method) {
            ("users", Target::Collection, Method::Post) => Operation::CreateOrGetUser,
            ("users", Target::User(username), Method::Get) => Operation::GetUser {
                username: username.clone(),
            },

            ("articles", Target::Collection, Method::Get) => Operation::ListArticles,
            ("articles", Target::Collection, Method::Post) => Operation::CreateArticle,
            ("articles", Target::Entity(id), Method::Get) => Operation::GetArticle {
                id: ArticleId::parse(id),
            },
            ("articles", Target::Entity(id), Method::Put) => Operation::UpdateArticle {
                id: ArticleId::parse(id),
            },
            ("articles", Target::Entity(id), Method::Delete) => Operation::DeleteArticle {
                id: ArticleId::parse(id),
            },
            ("articles", Target::Vote { id, vote }, Method::Put) => Operation::VoteArticle {
                id: ArticleId::parse(id),
                vote: *vote,
            },

            ("comments", Target::Collection, Method::Post) => Operation::CreateComment,
            ("comments", Target::Entity(id), Method::Put) => Operation::UpdateComment {
                id: CommentId::parse(id),
            },
            ("comments", Target::Entity(id), Method::Delete) => Operation::DeleteComment {
                id: CommentId::parse(id),
            },
            ("comments", Target::Vote { id, vote }, Method::Put) => Operation::VoteComment {
                id: CommentId::parse(id),
                vote: *vote,
            },

            _ => return None,
        };
        Some(op)
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateOrGetUser => "create_or_get_user",
            Operation::GetUser { .. } => "get_user",
            Operation::ListArticles => "list_articles",
            Operation::GetArticle { .. } => "get_article",
            Operation::CreateArticle => "create_article",
            Operation::UpdateArticle { .. } => "update_article",
            Operation::DeleteArticle { .. } => "delete_article",
            Operation::VoteArticle { vote: Vote::Up, .. } => "upvote_article",
            Operation::VoteArticle { vote: Vote::Down, .. } => "downvote_article",
            Operation::CreateComment => "create_comment",
            Operation::UpdateComment { .. } => "update_comment",
            Operation::DeleteComment { .. } => "delete_comment",
            Operation::VoteComment { vote: Vote::Up, .. } => "upvote_comment",
            Operation::VoteComment { vote: Vote::Down, .. } => "downvote_comment",
        }
    }

    /// Returns true if the operation can change the store.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Operation::GetUser { .. } | Operation::ListArticles | Operation::GetArticle { .. }
        )
    }

    /// Returns true when a successful reply with `status` left the store changed.
    ///
    /// Fetching an existing user through `POST /users` answers 200 and writes
    /// nothing.
    pub fn changed_store(&self, status: Status) -> bool {
        match self {
            Operation::CreateOrGetUser => status == Status::Created,
            _ => self.is_mutating(),
        }
    }
}

/// Result of dispatching one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: Status,
    pub body: Option<Value>,
    /// True when a mutating operation succeeded and the store should be saved.
    pub mutated: bool,
}

impl Reply {
    fn failure(status: Status) -> Self {
        Self {
            status,
            body: None,
            mutated: false,
        }
    }
}

/// Decoded request body. Only JSON objects carry fields.
#[derive(Debug, Default)]
struct Payload(Map<String, Value>);

impl Payload {
    fn new(body: Option<Value>) -> Self {
        match body {
            Some(Value::Object(fields)) => Self(fields),
            _ => Self::default(),
        }
    }

    /// A string field; other JSON types count as absent.
    fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(Value::as_str).map(str::to_string)
    }

    /// A nested object such as `article` or `comment`.
    fn section(&self, key: &str) -> Option<Payload> {
        match self.0.get(key) {
            Some(Value::Object(fields)) => Some(Self(fields.clone())),
            _ => None,
        }
    }

    fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Why a request was refused.
#[derive(Debug)]
struct Rejection {
    status: Status,
    reason: String,
}

impl Rejection {
    fn bad_request(reason: impl Into<String>) -> Self {
        Self {
            status: Status::BadRequest,
            reason: reason.into(),
        }
    }

    fn not_found(reason: impl Into<String>) -> Self {
        Self {
            status: Status::NotFound,
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for Rejection {
    fn from(err: StoreError) -> Self {
        Self {
            status: Status::from(&err),
            reason: err.to_string(),
        }
    }
}

type Outcome = std::result::Result<(Status, Option<Value>), Rejection>;

/// Maps requests onto entity operations against a shared store.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Arc<ContentStore>,
}

impl Dispatcher {
    /// Creates a dispatcher over `store`.
    pub fn new(store: Arc<ContentStore>) -> Self {
        Self { store }
    }

    /// The store requests are applied to.
    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    /// Handles one request.
    ///
    /// `body` is the decoded JSON payload, if the request carried one.
    pub fn handle(&self, method: &str, path: &str, body: Option<Value>) -> Reply {
        let route = route::resolve(path);
        let operation = Method::parse(method)
            .zip(route.as_ref())
            .and_then(|(method, route)| Operation::select(method, route));

        let (Some(route), Some(operation)) = (route, operation) else {
            tracing::debug!(method, path, "No operation for request");
            return Reply::failure(Status::BadRequest);
        };

        match self.execute(&operation, Payload::new(body)) {
            Ok((status, body)) => {
                tracing::debug!(
                    operation = operation.name(),
                    route = %route,
                    %status,
                    "Request handled"
                );
                Reply {
                    status,
                    body,
                    mutated: operation.changed_store(status),
                }
            }
            Err(rejection) => {
                tracing::debug!(
                    operation = operation.name(),
                    route = %route,
                    status = %rejection.status,
                    reason = %rejection.reason,
                    "Request rejected"
                );
                Reply::failure(rejection.status)
            }
        }
    }

    fn execute(&self, operation: &Operation, payload: Payload) -> Outcome {
        match operation {
            Operation::CreateOrGetUser => {
                let registration = self
                    .store
                    .write(|db| db.create_or_get_user(payload.text("username")))?;
                let status = if registration.is_created() {
                    Status::Created
                } else {
                    Status::Ok
                };
                Ok((status, Some(json!({ "user": registration.into_user() }))))
            }
            Operation::GetUser { username } => {
                let profile = self.store.read(|db| db.user_profile(username))?;
                Ok((Status::Ok, Some(json!(profile))))
            }
            Operation::ListArticles => {
                let articles = self.store.read(|db| db.list_articles());
                Ok((Status::Ok, Some(json!({ "articles": articles }))))
            }
            Operation::GetArticle { id } => {
                let id = id.ok_or_else(|| Rejection::bad_request("invalid article id"))?;
                let detail = self.store.read(|db| db.article_detail(id))?;
                Ok((Status::Ok, Some(json!({ "article": detail }))))
            }
            Operation::CreateArticle => {
                let fields = payload
                    .section("article")
                    .ok_or_else(|| Rejection::bad_request("missing article"))?;
                let draft = NewArticle {
                    title: fields.text("title"),
                    url: fields.text("url"),
                    username: fields.text("username"),
                };
                let article = self.store.write(|db| db.create_article(draft))?;
                Ok((Status::Created, Some(json!({ "article": article }))))
            }
            Operation::UpdateArticle { id } => {
                let id = id.ok_or_else(|| Rejection::bad_request("invalid article id"))?;
                let patch = payload
                    .section("article")
                    .map(|fields| ArticlePatch::new(fields.text("title"), fields.text("url")));
                let article = self.store.write(|db| db.update_article(id, patch))?;
                Ok((Status::Ok, Some(json!({ "article": article }))))
            }
            Operation::DeleteArticle { id } => {
                let id = id.ok_or_else(|| Rejection::bad_request("invalid article id"))?;
                self.store.write(|db| db.delete_article(id))?;
                Ok((Status::NoContent, None))
            }
            Operation::VoteArticle { id, vote } => {
                let id = id.ok_or_else(|| Rejection::bad_request("invalid article id"))?;
                let username = payload.text("username");
                let article = self
                    .store
                    .write(|db| db.vote_article(id, username, *vote))?;
                Ok((Status::Ok, Some(json!({ "article": article }))))
            }
            Operation::CreateComment => {
                let fields = payload
                    .section("comment")
                    .ok_or_else(|| Rejection::bad_request("missing comment"))?;
                let draft = NewComment {
                    body: fields.text("body"),
                    username: fields.text("username"),
                    article_id: fields.value("articleId").and_then(ArticleId::from_value),
                };
                let comment = self.store.write(|db| db.create_comment(draft))?;
                Ok((Status::Created, Some(json!({ "comment": comment }))))
            }
            Operation::UpdateComment { id } => {
                let id = id.ok_or_else(|| Rejection::not_found("invalid comment id"))?;
                let body = payload
                    .section("comment")
                    .and_then(|fields| fields.text("body"));
                let comment = self.store.write(|db| db.update_comment(id, body))?;
                Ok((Status::Ok, Some(json!({ "comment": comment }))))
            }
            Operation::DeleteComment { id } => {
                let id = id.ok_or_else(|| Rejection::not_found("invalid comment id"))?;
                self.store.write(|db| db.delete_comment(id))?;
                Ok((Status::NoContent, None))
            }
            Operation::VoteComment { id, vote } => {
                let id = id.ok_or_else(|| Rejection::bad_request("invalid comment id"))?;
                let username = payload.text("username");
                let comment = self
                    .store
                    .write(|db| db.vote_comment(id, username, *vote))?;
                Ok((Status::Ok, Some(json!({ "comment": comment }))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(ContentStore::new()))
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(Method::parse("PUT"), Some(Method::Put));
        assert_eq!(Method::parse("PATCH"), None);
        assert!(Method::Post.has_body());
        assert!(!Method::Delete.has_body());
    }

    #[test]
    fn test_operation_selection() {
        let select = |method, path| Operation::select(method, &route::resolve(path).unwrap());

        assert_eq!(select(Method::Post, "/users"), Some(Operation::CreateOrGetUser));
        assert_eq!(select(Method::Get, "/users"), None);
        assert_eq!(
            select(Method::Get, "/articles/x"),
            Some(Operation::GetArticle { id: None })
        );
        assert_eq!(
            select(Method::Put, "/comments/3/upvote"),
            Some(Operation::VoteComment {
                id: Some(CommentId::new(3)),
                vote: Vote::Up
            })
        );
        assert_eq!(select(Method::Get, "/comments/3"), None);
        assert_eq!(select(Method::Put, "/users/alice/upvote"), None);
        assert_eq!(select(Method::Get, "/widgets"), None);
    }

    #[test]
    fn test_mutating_classification() {
        assert!(Operation::CreateOrGetUser.is_mutating());
        assert!(Operation::DeleteComment { id: None }.is_mutating());
        assert!(!Operation::ListArticles.is_mutating());
        assert!(!Operation::GetUser { username: "a".into() }.is_mutating());
    }

    #[test]
    fn test_changed_store_follows_status() {
        assert!(Operation::CreateOrGetUser.changed_store(Status::Created));
        assert!(!Operation::CreateOrGetUser.changed_store(Status::Ok));
        assert!(Operation::UpdateComment { id: None }.changed_store(Status::Ok));
        assert!(!Operation::ListArticles.changed_store(Status::Ok));
    }

    #[test]
    fn test_unmatched_requests_are_bad() {
        let d = dispatcher();
        assert_eq!(d.handle("GET", "/", None).status, Status::BadRequest);
        assert_eq!(d.handle("PATCH", "/articles/1", None).status, Status::BadRequest);
        assert_eq!(d.handle("DELETE", "/users/alice", None).status, Status::BadRequest);
    }

    #[test]
    fn test_user_registration_statuses() {
        let d = dispatcher();
        let body = json!({ "username": "alice" });

        let created = d.handle("POST", "/users", Some(body.clone()));
        assert_eq!(created.status, Status::Created);
        assert!(created.mutated);
        assert_eq!(created.body.unwrap()["user"]["username"], "alice");

        let existing = d.handle("POST", "/users", Some(body));
        assert_eq!(existing.status, Status::Ok);
        assert!(!existing.mutated);

        let missing = d.handle("POST", "/users", Some(json!({ "username": "" })));
        assert_eq!(missing.status, Status::BadRequest);
        assert!(missing.body.is_none());
        assert!(!missing.mutated);
    }

    #[test]
    fn test_invalid_id_statuses() {
        let d = dispatcher();
        assert_eq!(d.handle("GET", "/articles/0", None).status, Status::BadRequest);
        assert_eq!(d.handle("GET", "/articles/7", None).status, Status::NotFound);
        assert_eq!(d.handle("DELETE", "/articles/7", None).status, Status::BadRequest);
        assert_eq!(d.handle("DELETE", "/comments/abc", None).status, Status::NotFound);
        assert_eq!(
            d.handle("PUT", "/comments/abc", Some(json!({ "comment": { "body": "x" } })))
                .status,
            Status::NotFound
        );
        assert_eq!(
            d.handle("PUT", "/comments/abc/upvote", Some(json!({ "username": "a" })))
                .status,
            Status::BadRequest
        );
    }

    #[test]
    fn test_reads_are_not_mutations() {
        let d = dispatcher();
        let reply = d.handle("GET", "/articles", None);

        assert_eq!(reply.status, Status::Ok);
        assert!(!reply.mutated);
        assert_eq!(reply.body.unwrap(), json!({ "articles": [] }));
    }

    #[test]
    fn test_comment_article_id_accepts_strings() {
        let d = dispatcher();
        d.handle("POST", "/users", Some(json!({ "username": "alice" })));
        d.handle(
            "POST",
            "/articles",
            Some(json!({ "article": { "title": "T", "url": "u", "username": "alice" } })),
        );

        let reply = d.handle(
            "POST",
            "/comments",
            Some(json!({ "comment": { "body": "hi", "username": "alice", "articleId": "1" } })),
        );
        assert_eq!(reply.status, Status::Created);
        assert_eq!(reply.body.unwrap()["comment"]["articleId"], 1);
    }
}
