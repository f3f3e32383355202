//! # rf-api
//!
//! The web routing and orchestration layer for Rusty-Forum.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use actix_web::web;
use rf_core::ForumService;

/// Largest accepted urlencoded form body. Sized for a full thread body.
pub const MAX_FORM_SIZE: usize = 256 * 1024;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub forum: ForumService,
    /// Marks the session cookie `Secure` (serve over HTTPS when set).
    pub secure_cookies: bool,
}

/// Configures the routes for the forum.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the forum under a different prefix if needed.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .app_data(web::FormConfig::default().limit(MAX_FORM_SIZE))
            // Thread listing (requires a session)
            .route("/", web::get().to(handlers::index))
            .route("/health", web::get().to(handlers::health))
            // Accounts
            .service(
                web::resource("/signup")
                    .route(web::get().to(handlers::signup_page))
                    .route(web::post().to(handlers::signup)),
            )
            .service(
                web::resource("/login")
                    .route(web::get().to(handlers::login_page))
                    .route(web::post().to(handlers::login)),
            )
            .route("/logout", web::post().to(handlers::logout))
            // Threads
            .route("/create_thread", web::post().to(handlers::create_thread))
            .route("/add_comment/{thread_id}", web::post().to(handlers::add_comment))
            .route("/delete_thread/{thread_id}", web::post().to(handlers::delete_thread))
            .route("/search", web::get().to(handlers::search))
            // Votes answer with JSON
            .route("/like_thread/{thread_id}", web::post().to(handlers::like_thread))
            .route("/dislike_thread/{thread_id}", web::post().to(handlers::dislike_thread)),
    );
}
