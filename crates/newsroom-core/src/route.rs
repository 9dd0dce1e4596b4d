//! Path classification.
//!
//! Resolution looks at the slash-separated, non-empty segments of a path and
//! nothing else; it never touches the store.
//!
//! | Segments | Route |
//! |----------|-------|
//! | `/{collection}` | [`Target::Collection`] |
//! | `/{collection}/{id}/upvote`, `/{collection}/{id}/downvote` | [`Target::Vote`] |
//! | `/users/{username}` | [`Target::User`] |
//! | `/{collection}/{id}` (anything else) | [`Target::Entity`] |

use std::fmt;

use crate::vote::Vote;

/// A classified request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// First path segment, e.g. `articles`.
    pub collection: String,
    /// What the rest of the path addresses.
    pub target: Target,
}

/// The part of a [`Route`] after the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The collection itself.
    Collection,
    /// A user addressed by name.
    User(String),
    /// An article or comment addressed by its raw id segment.
    Entity(String),
    /// A vote on an article or comment.
    Vote { id: String, vote: Vote },
}

impl Route {
    /// Returns the route pattern, e.g. `/articles/:id/upvote`.
    pub fn pattern(&self) -> String {
        match &self.target {
            Target::Collection => format!("/{}", self.collection),
            Target::User(_) => format!("/{}/:username", self.collection),
            Target::Entity(_) => format!("/{}/:id", self.collection),
            Target::Vote { vote, .. } => format!("/{}/:id/{}", self.collection, vote.action()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern())
    }
}

/// Classifies a path. Returns `None` when the path has no segments.
///
/// Segments past the ones a route needs are ignored, so
/// `/articles/4/comments` addresses article 4.
pub fn resolve(path: &str) -> Option<Route> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let (collection, rest) = segments.split_first()?;
    let collection = (*collection).to_string();

    let Some(key) = rest.first() else {
        return Some(Route {
            collection,
            target: Target::Collection,
        });
    };
    let key = (*key).to_string();

    let target = match rest.get(1).and_then(|action| Vote::from_action(action)) {
        Some(vote) => Target::Vote { id: key, vote },
        None if collection == "users" => Target::User(key),
        None => Target::Entity(key),
    };

    Some(Route { collection, target })
}
