//! # Rusty-Forum Binary
//!
//! The entry point that assembles the application based on compile-time features.

mod settings;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use rf_api::{configure_routes, middleware, AppState};
use rf_core::ForumService;
use settings::Settings;

// Feature-gated imports: This is the "Compiled-to-Order" magic
#[cfg(feature = "db-sqlite")]
use rf_db_sqlite::SqliteForumRepo;

#[cfg(feature = "auth-simple")]
use rf_auth_simple::SimpleAuthProvider;

#[cfg(not(all(feature = "db-sqlite", feature = "auth-simple")))]
compile_error!("rusty-forum needs a store (`db-sqlite`) and an auth provider (`auth-simple`)");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load()?;

    // 1. Initialize Database Implementation
    let repo = Arc::new(SqliteForumRepo::new(&settings.database_url).await?);

    // 2. Initialize Auth Implementation
    let auth = Arc::new(SimpleAuthProvider::new());

    // 3. Wrap in AppState (Using dynamic dispatch for maximum flexibility)
    let forum = ForumService::new(repo.clone(), repo.clone(), repo.clone(), repo, auth);
    let state = web::Data::new(AppState {
        forum,
        secure_cookies: settings.secure_cookies,
    });

    log::info!(
        "🚀 Rusty-Forum starting on http://{}:{}",
        settings.bind_addr,
        settings.port
    );

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::security_headers())
            .wrap(middleware::normalize_path())
            .wrap(middleware::standard_middleware())
            .configure(configure_routes)
    })
    .bind((settings.bind_addr.as_str(), settings.port))?;

    if let Some(workers) = settings.workers {
        server = server.workers(workers);
    }

    server.run().await?;
    log::info!("Rusty-Forum stopped");
    Ok(())
}
