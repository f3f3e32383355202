//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Forum.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    /// Unique, stored lower-cased
    pub email: String,
    pub username: String,
    /// PHC-formatted hash produced by the `AuthProvider`
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A top-level discussion post with its comments and vote counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Owner used for delete authorization
    pub author_id: Uuid,
    /// Display name of the creator at the time of posting
    pub username: String,
    /// Append order
    pub comments: Vec<Comment>,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: DateTime<Utc>,
}

impl Thread {
    /// A fresh thread with no comments and zeroed counters.
    pub fn new(author: &User, title: String, content: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            title,
            content,
            author_id: author.id,
            username: author.username.clone(),
            comments: Vec::new(),
            likes: 0,
            dislikes: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user: &User) -> bool {
        self.author_id == user.id
    }
}

/// A reply embedded in a thread. Has no identity of its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Which counter a vote record contributes to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Like,
    Dislike,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Like => "like",
            VoteKind::Dislike => "dislike",
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(VoteKind::Like),
            "dislike" => Ok(VoteKind::Dislike),
            other => Err(format!("unknown vote kind '{other}'")),
        }
    }
}

/// Ledger entry: at most one per (user, thread, kind).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub user_id: Uuid,
    pub thread_id: Uuid,
    pub kind: VoteKind,
}

/// Outcome of a search request.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResults {
    /// The query was absent or blank
    NoQuery,
    Matches { query: String, threads: Vec<Thread> },
}
