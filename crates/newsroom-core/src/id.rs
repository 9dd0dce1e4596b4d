//! Identifier types for articles and comments.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// The first identifier handed out by a fresh store.
            pub const FIRST: Self = Self(1);

            /// The largest identifier. A counter sitting here is exhausted.
            pub const LAST: Self = Self(u64::MAX);

            /// Creates an identifier from its raw value.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw integer value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Returns the identifier that follows this one, or `None` after
            /// [`Self::LAST`].
            #[must_use]
            pub const fn next(self) -> Option<Self> {
                match self.0.checked_add(1) {
                    Some(raw) => Some(Self(raw)),
                    None => None,
                }
            }

            /// Parses a path segment. Only positive integers are identifiers.
            pub fn parse(segment: &str) -> Option<Self> {
                match segment.trim().parse::<u64>() {
                    Ok(0) | Err(_) => None,
                    Ok(raw) => Some(Self(raw)),
                }
            }

            /// Reads an identifier out of a decoded payload field.
            ///
            /// Accepts a positive integer or a string holding one.
            pub fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Number(n) => n.as_u64().filter(|raw| *raw > 0).map(Self),
                    Value::String(s) => Self::parse(s),
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::FIRST
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id! {
    /// Identifier of an article. Allocated from 1 upward and never reused.
    ArticleId
}

entity_id! {
    /// Identifier of a comment. Allocated from 1 upward and never reused.
    CommentId
}
