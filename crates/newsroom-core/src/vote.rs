//! Upvote/downvote bookkeeping shared by articles and comments.
//!
//! A user starts out neutral and, once they vote, sits on exactly one side.
//! Voting again on the same side changes nothing; voting on the other side
//! moves them across. There is no way back to neutral.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    /// Parses the path action (`upvote` / `downvote`).
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "upvote" => Some(Vote::Up),
            "downvote" => Some(Vote::Down),
            _ => None,
        }
    }

    /// Returns the path action for this direction.
    pub fn action(self) -> &'static str {
        match self {
            Vote::Up => "upvote",
            Vote::Down => "downvote",
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// The two vote sets of an item, kept disjoint.
///
/// Stored as ordered lists so the wire format keeps the order in which
/// votes arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Votes {
    /// Usernames currently upvoting the item.
    #[serde(default)]
    pub upvoted_by: Vec<String>,
    /// Usernames currently downvoting the item.
    #[serde(default)]
    pub downvoted_by: Vec<String>,
}

impl Votes {
    /// Records `username` on the `vote` side, leaving the other side if needed.
    pub fn cast(&mut self, vote: Vote, username: &str) {
        let (side, opposite) = match vote {
            Vote::Up => (&mut self.upvoted_by, &mut self.downvoted_by),
            Vote::Down => (&mut self.downvoted_by, &mut self.upvoted_by),
        };

        opposite.retain(|name| name != username);
        if !side.iter().any(|name| name == username) {
            side.push(username.to_string());
        }
    }
}

/// An entity that carries vote sets.
pub trait Votable {
    fn votes(&self) -> &Votes;

    fn votes_mut(&mut self) -> &mut Votes;

    /// Applies the vote toggle to this item.
    fn cast_vote(&mut self, vote: Vote, username: &str) {
        self.votes_mut().cast(vote, username);
    }
}
