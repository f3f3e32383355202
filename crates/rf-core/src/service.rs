//! # ForumService
//!
//! Composes the ports into the forum's use cases. Handlers in `rf-api` talk to this
//! type only; nothing here knows about HTTP.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::limits::*;
use crate::models::{Comment, SearchResults, Thread, User, Vote, VoteKind};
use crate::traits::{AuthProvider, SessionStore, ThreadRepo, UserRepo, VoteLedger};

pub const DUPLICATE_EMAIL: &str = "Email already exists. Please choose another one.";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const MISSING_FIELDS: &str = "All fields are required.";

/// A session established by a successful login.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user: User,
    /// Raw token for the cookie. Only its digest is stored.
    pub token: String,
}

#[derive(Clone)]
pub struct ForumService {
    users: Arc<dyn UserRepo>,
    threads: Arc<dyn ThreadRepo>,
    votes: Arc<dyn VoteLedger>,
    sessions: Arc<dyn SessionStore>,
    auth: Arc<dyn AuthProvider>,
}

impl ForumService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        threads: Arc<dyn ThreadRepo>,
        votes: Arc<dyn VoteLedger>,
        sessions: Arc<dyn SessionStore>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self { users, threads, votes, sessions, auth }
    }

    // ── Accounts ────────────────────────────────────────────────────────────

    /// Registers a new account. Fails with `Conflict` if the email is taken.
    pub async fn signup(&self, email: &str, username: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        let username = username.trim();
        if email.is_empty() || username.is_empty() || password.is_empty() {
            return Err(AppError::ValidationError(MISSING_FIELDS.to_string()));
        }
        check_size("email", &email, MAX_EMAIL_SIZE)?;
        check_size("username", username, MAX_USERNAME_SIZE)?;
        check_size("password", password, MAX_PASSWORD_SIZE)?;

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let password = password.to_string();
        let password_hash = self.with_auth(move |auth| auth.hash_password(&password)).await??;
        let user = User {
            id: Uuid::now_v7(),
            email,
            username: username.to_string(),
            password_hash,
            created_at: Utc::now(),
        };

        // The store enforces uniqueness too; a concurrent signup can still win here.
        if !self.users.insert_user(&user).await? {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        log::info!("registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Checks credentials and opens a server-side session.
    pub async fn login(&self, email: &str, password: &str) -> Result<NewSession> {
        let email = normalize_email(email);
        let found = self.users.find_user_by_email(&email).await?;
        let password = password.to_string();
        let verified = self
            .with_auth(move |auth| match found {
                Some(user) if auth.verify_password(&password, &user.password_hash) => Some(user),
                Some(_) => None,
                None => {
                    // Unknown emails pay the same hashing cost as a wrong password.
                    let _ = auth.hash_password(&password);
                    None
                }
            })
            .await?;

        let Some(user) = verified else {
            log::info!("failed login attempt for {email}");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        let token = self.auth.generate_session_token()?;
        let digest = self.auth.digest_session_token(&token);
        self.sessions.insert_session(&digest, user.id).await?;

        log::info!("user {} logged in", user.id);
        Ok(NewSession { user, token })
    }

    /// Invalidates the session behind `token`. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<()> {
        let digest = self.auth.digest_session_token(token);
        self.sessions.delete_session(&digest).await?;
        log::debug!("session closed");
        Ok(())
    }

    /// Resolves a cookie token to its user, if the session is still valid.
    pub async fn current_user(&self, token: &str) -> Result<Option<User>> {
        let digest = self.auth.digest_session_token(token);
        match self.sessions.session_user(&digest).await? {
            Some(user_id) => Ok(self.users.get_user(user_id).await?),
            None => Ok(None),
        }
    }

    // ── Threads ─────────────────────────────────────────────────────────────

    pub async fn list_threads(&self) -> Result<Vec<Thread>> {
        Ok(self.threads.list_threads().await?)
    }

    pub async fn get_thread(&self, id: Uuid) -> Result<Thread> {
        self.threads
            .get_thread(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Thread".to_string(), id.to_string()))
    }

    pub async fn create_thread(&self, author: &User, title: &str, content: &str) -> Result<Thread> {
        let title = required("title", title, MAX_THREAD_TITLE_SIZE)?;
        let content = required("content", content, MAX_THREAD_CONTENT_SIZE)?;

        let thread = Thread::new(author, title, content);
        self.threads.insert_thread(&thread).await?;

        log::info!("user {} created thread {}", author.id, thread.id);
        Ok(thread)
    }

    /// Appends a comment. Returns `false` when the thread does not exist.
    pub async fn add_comment(&self, author: &User, thread_id: Uuid, text: &str) -> Result<bool> {
        let comment = Comment {
            username: author.username.clone(),
            text: required("comment", text, MAX_COMMENT_SIZE)?,
            created_at: Utc::now(),
        };

        let added = self.threads.append_comment(thread_id, &comment).await?;
        if !added {
            log::debug!("comment on missing thread {thread_id} ignored");
        }
        Ok(added)
    }

    /// Deletes a thread owned by `requester`. Anyone else gets a silent `false`.
    pub async fn delete_thread(&self, requester: &User, thread_id: Uuid) -> Result<bool> {
        let deleted = self.threads.delete_thread(thread_id, requester.id).await?;
        if deleted {
            log::info!("user {} deleted thread {thread_id}", requester.id);
        } else {
            log::debug!("user {} may not delete thread {thread_id}", requester.id);
        }
        Ok(deleted)
    }

    pub async fn search(&self, query: Option<&str>) -> Result<SearchResults> {
        let query = match query.map(str::trim) {
            Some(q) if !q.is_empty() => q,
            _ => return Ok(SearchResults::NoQuery),
        };

        let threads = self.threads.search_threads(query).await?;
        Ok(SearchResults::Matches { query: query.to_string(), threads })
    }

    // ── Votes ───────────────────────────────────────────────────────────────

    /// Records a like or dislike. `false` for a repeat vote or a missing thread.
    pub async fn vote(&self, user: &User, thread_id: Uuid, kind: VoteKind) -> Result<bool> {
        let vote = Vote { user_id: user.id, thread_id, kind };
        let counted = self.votes.record_vote(&vote).await?;
        log::debug!("{kind} by {} on {thread_id}: counted={counted}", user.id);
        Ok(counted)
    }

    /// Runs password hashing on the blocking pool.
    async fn with_auth<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn AuthProvider) -> T + Send + 'static,
        T: Send + 'static,
    {
        let auth = Arc::clone(&self.auth);
        tokio::task::spawn_blocking(move || f(auth.as_ref()))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_size(field: &str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(AppError::ValidationError(format!("{field} exceeds {max} bytes")));
    }
    Ok(())
}

/// Trims and checks a user-supplied text field.
fn required(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{field} must not be empty")));
    }
    check_size(field, value, max)?;
    Ok(value.to_string())
}
