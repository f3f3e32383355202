//! # rf-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `rf-core` domain models. One repo type backs every store port.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rf_core::models::{Comment, Thread, User, Vote, VoteKind};
use rf_core::traits::{SessionStore, ThreadRepo, UserRepo, VoteLedger};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

static MIGRATOR: Migrator = sqlx::migrate!();

const THREAD_COLUMNS: &str =
    "id, title, content, author_id, username, likes, dislikes, created_at";

pub struct SqliteForumRepo {
    pool: SqlitePool,
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Ok(Uuid::from_slice(blob)?)
}

/// `%`, `_` and the escape char itself match literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn user_from_row(row: &SqliteRow) -> anyhow::Result<User> {
    Ok(User {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

/// Comments are attached afterwards by `attach_comments`.
fn thread_from_row(row: &SqliteRow) -> anyhow::Result<Thread> {
    Ok(Thread {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author_id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("author_id")?)?,
        username: row.try_get("username")?,
        comments: Vec::new(),
        likes: row.try_get("likes")?,
        dislikes: row.try_get("dislikes")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

impl SqliteForumRepo {
    /// Opens (creating if needed) the database and applies pending migrations.
    ///
    /// # Developer Note
    /// Every connection to `sqlite::memory:` gets its own private database, so the
    /// in-memory pool is pinned to a single long-lived connection.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .connect_with(options.journal_mode(SqliteJournalMode::Wal))
                .await?
        };

        MIGRATOR.run(&pool).await?;
        log::info!("SQLite store ready at {database_url}");
        Ok(Self { pool })
    }

    /// Fills `comments` for each thread with a single query, in append order.
    async fn attach_comments(&self, threads: &mut [Thread]) -> anyhow::Result<()> {
        if threads.is_empty() {
            return Ok(());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT thread_id, username, text, created_at FROM comments WHERE thread_id IN (",
        );
        let mut ids = query.separated(", ");
        for thread in threads.iter() {
            ids.push_bind(uuid_to_blob(thread.id));
        }
        ids.push_unseparated(") ORDER BY seq ASC");

        let mut by_thread: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in query.build().fetch_all(&self.pool).await? {
            let thread_id = blob_to_uuid(&row.try_get::<Vec<u8>, _>("thread_id")?)?;
            by_thread.entry(thread_id).or_default().push(Comment {
                username: row.try_get("username")?,
                text: row.try_get("text")?,
                created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            });
        }

        for thread in threads.iter_mut() {
            if let Some(comments) = by_thread.remove(&thread.id) {
                thread.comments = comments;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepo for SqliteForumRepo {
    /// The UNIQUE email column decides races between concurrent signups.
    async fn insert_user(&self, user: &User) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO users (id, email, username, password_hash, created_at) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(email) DO NOTHING",
        )
        .bind(uuid_to_blob(user.id))
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, username, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(uuid_to_blob(id))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl ThreadRepo for SqliteForumRepo {
    async fn insert_thread(&self, thread: &Thread) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO threads (id, title, content, author_id, username, likes, dislikes, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(thread.id))
        .bind(&thread.title)
        .bind(&thread.content)
        .bind(uuid_to_blob(thread.author_id))
        .bind(&thread.username)
        .bind(thread.likes)
        .bind(thread.dislikes)
        .bind(thread.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_thread(&self, id: Uuid) -> anyhow::Result<Option<Thread>> {
        let row = sqlx::query(&format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut threads = [thread_from_row(&row)?];
        self.attach_comments(&mut threads).await?;
        let [thread] = threads;
        Ok(Some(thread))
    }

    async fn list_threads(&self) -> anyhow::Result<Vec<Thread>> {
        let rows = sqlx::query(&format!("SELECT {THREAD_COLUMNS} FROM threads ORDER BY rowid ASC"))
            .fetch_all(&self.pool)
            .await?;

        let mut threads = rows.iter().map(thread_from_row).collect::<anyhow::Result<Vec<_>>>()?;
        self.attach_comments(&mut threads).await?;
        Ok(threads)
    }

    /// Inserts only if the thread exists, in one statement.
    async fn append_comment(&self, thread_id: Uuid, comment: &Comment) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO comments (thread_id, username, text, created_at) \
             SELECT ?, ?, ?, ? WHERE EXISTS (SELECT 1 FROM threads WHERE id = ?)",
        )
        .bind(uuid_to_blob(thread_id))
        .bind(&comment.username)
        .bind(&comment.text)
        .bind(comment.created_at)
        .bind(uuid_to_blob(thread_id))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Comments and votes go with the thread via ON DELETE CASCADE.
    async fn delete_thread(&self, id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM threads WHERE id = ? AND author_id = ?")
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(author_id))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn search_threads(&self, needle: &str) -> anyhow::Result<Vec<Thread>> {
        let rows = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE content LIKE ? ESCAPE '\\' ORDER BY rowid ASC"
        ))
        .bind(like_pattern(needle))
        .fetch_all(&self.pool)
        .await?;

        let mut threads = rows.iter().map(thread_from_row).collect::<anyhow::Result<Vec<_>>>()?;
        self.attach_comments(&mut threads).await?;
        Ok(threads)
    }
}

#[async_trait]
impl VoteLedger for SqliteForumRepo {
    /// Atomic operation to record a vote and bump its counter.
    ///
    /// # Developer Note
    /// The ledger insert goes first so the transaction takes the write lock up front;
    /// the primary key on (user_id, thread_id, kind) turns a repeat vote into a no-op.
    async fn record_vote(&self, vote: &Vote) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let recorded = sqlx::query(
            "INSERT INTO votes (user_id, thread_id, kind, created_at) \
             SELECT ?, ?, ?, ? WHERE EXISTS (SELECT 1 FROM threads WHERE id = ?) \
             ON CONFLICT DO NOTHING",
        )
        .bind(uuid_to_blob(vote.user_id))
        .bind(uuid_to_blob(vote.thread_id))
        .bind(vote.kind.as_str())
        .bind(Utc::now())
        .bind(uuid_to_blob(vote.thread_id))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if recorded == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let bump = match vote.kind {
            VoteKind::Like => "UPDATE threads SET likes = likes + 1 WHERE id = ?",
            VoteKind::Dislike => "UPDATE threads SET dislikes = dislikes + 1 WHERE id = ?",
        };
        sqlx::query(bump)
            .bind(uuid_to_blob(vote.thread_id))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl SessionStore for SqliteForumRepo {
    async fn insert_session(&self, token_digest: &str, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO sessions (token_digest, user_id, created_at) VALUES (?, ?, ?)")
            .bind(token_digest)
            .bind(uuid_to_blob(user_id))
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn session_user(&self, token_digest: &str) -> anyhow::Result<Option<Uuid>> {
        let row = sqlx::query("SELECT user_id FROM sessions WHERE token_digest = ?")
            .bind(token_digest)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> anyhow::Result<Uuid> {
            blob_to_uuid(&row.try_get::<Vec<u8>, _>("user_id")?)
        })
        .transpose()
    }

    async fn delete_session(&self, token_digest: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_digest = ?")
            .bind(token_digest)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn repo() -> SqliteForumRepo {
        SqliteForumRepo::new("sqlite::memory:").await.unwrap()
    }

    async fn user(repo: &SqliteForumRepo, name: &str) -> User {
        let user = User {
            id: Uuid::now_v7(),
            email: format!("{name}@x.com"),
            username: name.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_at: Utc::now(),
        };
        assert!(repo.insert_user(&user).await.unwrap());
        user
    }

    async fn thread(repo: &SqliteForumRepo, author: &User, content: &str) -> Thread {
        let thread = Thread::new(author, format!("About {content}"), content.to_string());
        repo.insert_thread(&thread).await.unwrap();
        thread
    }

    fn comment(username: &str, text: &str) -> Comment {
        Comment { username: username.into(), text: text.into(), created_at: Utc::now() }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_not_inserted() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;

        let twin = User { id: Uuid::now_v7(), username: "other".into(), ..alice.clone() };
        assert!(!repo.insert_user(&twin).await.unwrap());

        let found = repo.find_user_by_email("alice@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, alice.id);
        assert!(repo.get_user(twin.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_and_get_thread_with_comments() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let created = thread(&repo, &alice, "rust").await;

        assert!(repo.append_comment(created.id, &comment("bob", "first")).await.unwrap());
        assert!(repo.append_comment(created.id, &comment("carol", "second")).await.unwrap());

        let fetched = repo.get_thread(created.id).await.unwrap().expect("thread exists");
        assert_eq!(fetched.title, created.title);
        assert_eq!(fetched.author_id, alice.id);
        let texts: Vec<_> = fetched.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
    }

    #[tokio::test]
    async fn test_comment_on_missing_thread_is_noop() {
        let repo = repo().await;
        assert!(!repo.append_comment(Uuid::now_v7(), &comment("bob", "hi")).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_threads_in_insertion_order() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let first = thread(&repo, &alice, "one").await;
        let second = thread(&repo, &alice, "two").await;
        repo.append_comment(second.id, &comment("bob", "hey")).await.unwrap();

        let threads = repo.list_threads().await.unwrap();
        assert_eq!(threads.iter().map(|t| t.id).collect::<Vec<_>>(), [first.id, second.id]);
        assert!(threads[0].comments.is_empty());
        assert_eq!(threads[1].comments.len(), 1);
    }

    #[tokio::test]
    async fn test_only_author_can_delete() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let mallory = user(&repo, "mallory").await;
        let target = thread(&repo, &alice, "mine").await;
        repo.append_comment(target.id, &comment("bob", "reply")).await.unwrap();
        let like = Vote { user_id: mallory.id, thread_id: target.id, kind: VoteKind::Like };
        assert!(repo.record_vote(&like).await.unwrap());

        assert!(!repo.delete_thread(target.id, mallory.id).await.unwrap());
        assert!(repo.get_thread(target.id).await.unwrap().is_some());

        assert!(repo.delete_thread(target.id, alice.id).await.unwrap());
        assert!(repo.get_thread(target.id).await.unwrap().is_none());

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);

        let votes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(votes, 0);
    }

    #[tokio::test]
    async fn test_like_twice_counts_once() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;
        let target = thread(&repo, &alice, "votes").await;

        let like = Vote { user_id: bob.id, thread_id: target.id, kind: VoteKind::Like };
        assert!(repo.record_vote(&like).await.unwrap());
        assert!(!repo.record_vote(&like).await.unwrap());

        let dislike = Vote { kind: VoteKind::Dislike, ..like.clone() };
        assert!(repo.record_vote(&dislike).await.unwrap());

        let by_alice = Vote { user_id: alice.id, ..like };
        assert!(repo.record_vote(&by_alice).await.unwrap());

        let fetched = repo.get_thread(target.id).await.unwrap().unwrap();
        assert_eq!(fetched.likes, 2);
        assert_eq!(fetched.dislikes, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_votes_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("forum.db").display());
        let repo = Arc::new(SqliteForumRepo::new(&url).await.unwrap());
        let alice = user(&repo, "alice").await;
        let target = thread(&repo, &alice, "race").await;

        // The same like fired in parallel is counted once.
        let like = Vote { user_id: alice.id, thread_id: target.id, kind: VoteKind::Like };
        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let (repo, like) = (Arc::clone(&repo), like.clone());
                tokio::spawn(async move { repo.record_vote(&like).await })
            })
            .collect();
        let mut counted = 0;
        for task in tasks {
            if task.await.unwrap().unwrap() {
                counted += 1;
            }
        }
        assert_eq!(counted, 1);

        // Distinct voters are all counted.
        let mut voters = Vec::new();
        for i in 0..16 {
            voters.push(user(&repo, &format!("voter{i}")).await);
        }
        let tasks: Vec<_> = voters
            .iter()
            .map(|voter| {
                let repo = Arc::clone(&repo);
                let vote = Vote { user_id: voter.id, thread_id: target.id, kind: VoteKind::Dislike };
                tokio::spawn(async move { repo.record_vote(&vote).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }

        let fetched = repo.get_thread(target.id).await.unwrap().unwrap();
        assert_eq!((fetched.likes, fetched.dislikes), (1, 16));
    }

    #[tokio::test]
    async fn test_vote_on_missing_thread_records_nothing() {
        let repo = repo().await;
        let bob = user(&repo, "bob").await;
        let vote = Vote { user_id: bob.id, thread_id: Uuid::now_v7(), kind: VoteKind::Like };

        assert!(!repo.record_vote(&vote).await.unwrap());
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_search_matches_content_substring() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let hit = thread(&repo, &alice, "Ownership and Borrowing in Rust").await;
        thread(&repo, &alice, "garbage collection").await;
        let percent = thread(&repo, &alice, "100% safe").await;

        let found = repo.search_threads("borrow").await.unwrap();
        assert_eq!(found.iter().map(|t| t.id).collect::<Vec<_>>(), [hit.id]);

        let found = repo.search_threads("0%").await.unwrap();
        assert_eq!(found.iter().map(|t| t.id).collect::<Vec<_>>(), [percent.id]);

        assert!(repo.search_threads("_").await.unwrap().is_empty());
        assert!(repo.search_threads("haskell").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;

        repo.insert_session("digest-1", alice.id).await.unwrap();
        assert_eq!(repo.session_user("digest-1").await.unwrap(), Some(alice.id));
        assert_eq!(repo.session_user("digest-2").await.unwrap(), None);

        repo.delete_session("digest-1").await.unwrap();
        assert_eq!(repo.session_user("digest-1").await.unwrap(), None);
        repo.delete_session("digest-1").await.unwrap();
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("a%b_c\\"), "%a\\%b\\_c\\\\%");
        assert_eq!(like_pattern("rust"), "%rust%");
    }
}
