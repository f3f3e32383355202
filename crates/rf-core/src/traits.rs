//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Comment, Thread, User, Vote};

/// Credential store: persisted user records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Stores the user unless the email is already registered.
    /// Returns `false` when the email was taken.
    async fn insert_user(&self, user: &User) -> anyhow::Result<bool>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}

/// Thread store: threads with their embedded comments and counters.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadRepo: Send + Sync {
    async fn insert_thread(&self, thread: &Thread) -> anyhow::Result<()>;
    async fn get_thread(&self, id: Uuid) -> anyhow::Result<Option<Thread>>;
    /// All threads, oldest first, comments included.
    async fn list_threads(&self) -> anyhow::Result<Vec<Thread>>;

    /// Appends to the thread's comment sequence. `false` if the thread does not exist.
    async fn append_comment(&self, thread_id: Uuid, comment: &Comment) -> anyhow::Result<bool>;

    /// Deletes the thread only if `author_id` created it. `false` if nothing was deleted.
    async fn delete_thread(&self, id: Uuid, author_id: Uuid) -> anyhow::Result<bool>;

    /// Case-insensitive substring match over thread content.
    async fn search_threads(&self, needle: &str) -> anyhow::Result<Vec<Thread>>;
}

/// Vote ledger: one like and one dislike per (user, thread).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait VoteLedger: Send + Sync {
    /// Records the vote and bumps the matching thread counter in one atomic step.
    /// Returns `false` for a repeat vote or a missing thread; nothing changes then.
    async fn record_vote(&self, vote: &Vote) -> anyhow::Result<bool>;
}

/// Server-side session state, keyed by the digest of the cookie token.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, token_digest: &str, user_id: Uuid) -> anyhow::Result<()>;
    async fn session_user(&self, token_digest: &str) -> anyhow::Result<Option<Uuid>>;
    /// Removing an unknown session is not an error.
    async fn delete_session(&self, token_digest: &str) -> anyhow::Result<()>;
}

/// Password hashing and session token contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Salted one-way hash, returned in a self-describing string format.
    fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a password against a stored hash. Malformed hashes never verify.
    fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Fresh opaque token for the session cookie.
    fn generate_session_token(&self) -> anyhow::Result<String>;

    /// The value stored server-side for a cookie token.
    fn digest_session_token(&self, token: &str) -> String;
}
