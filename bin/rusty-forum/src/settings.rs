//! Runtime configuration: built-in defaults overlaid with `FORUM_*` environment
//! variables (a `.env` file is loaded first when present).

use config::{Config, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub port: u16,
    /// sqlx connection string, e.g. `sqlite:rusty_forum.db` or `sqlite::memory:`
    pub database_url: String,
    /// Mark the session cookie `Secure`. Enable behind HTTPS.
    pub secure_cookies: bool,
    /// Worker threads; actix picks one per core when unset.
    pub workers: Option<usize>,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_env(Environment::with_prefix("FORUM").try_parsing(true))
    }

    fn from_env(env: Environment) -> anyhow::Result<Self> {
        let settings = Config::builder()
            .set_default("bind_addr", "127.0.0.1")?
            .set_default("port", 5001_i64)?
            .set_default("database_url", "sqlite:rusty_forum.db")?
            .set_default("secure_cookies", false)?
            .add_source(env)
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
