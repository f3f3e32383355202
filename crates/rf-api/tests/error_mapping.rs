//! Store failures reach the client as a generic 500; details stay in the log.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{web, App};
use chrono::Utc;
use rf_api::session::SESSION_COOKIE;
use rf_api::{configure_routes, AppState};
use rf_core::models::User;
use rf_core::traits::{
    MockAuthProvider, MockSessionStore, MockThreadRepo, MockUserRepo, MockVoteLedger,
};
use rf_core::ForumService;
use uuid::Uuid;

fn logged_in_state(threads: MockThreadRepo) -> web::Data<AppState> {
    let user = User {
        id: Uuid::now_v7(),
        email: "a@x.com".into(),
        username: "alice".into(),
        password_hash: "h".into(),
        created_at: Utc::now(),
    };
    let user_id = user.id;

    let mut auth = MockAuthProvider::new();
    auth.expect_digest_session_token().returning(|t| t.to_string());
    let mut sessions = MockSessionStore::new();
    sessions
        .expect_session_user()
        .returning(move |_| Ok(Some(user_id)));
    let mut users = MockUserRepo::new();
    users
        .expect_get_user()
        .returning(move |_| Ok(Some(user.clone())));

    let forum = ForumService::new(
        Arc::new(users),
        Arc::new(threads),
        Arc::new(MockVoteLedger::new()),
        Arc::new(sessions),
        Arc::new(auth),
    );
    web::Data::new(AppState { forum, secure_cookies: false })
}

#[actix_web::test]
async fn store_failure_is_a_generic_500() {
    let mut threads = MockThreadRepo::new();
    threads
        .expect_list_threads()
        .returning(|| Err(anyhow::anyhow!("database is locked")));

    let app = test::init_service(
        App::new()
            .app_data(logged_in_state(threads))
            .configure(configure_routes),
    )
    .await;

    let req = TestRequest::get()
        .uri("/")
        .cookie(Cookie::new(SESSION_COOKIE, "tok"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(!body.contains("database is locked"));
}

#[actix_web::test]
async fn search_store_failure_is_a_generic_500() {
    let mut threads = MockThreadRepo::new();
    threads
        .expect_search_threads()
        .returning(|_| Err(anyhow::anyhow!("disk I/O error")));

    let app = test::init_service(
        App::new()
            .app_data(logged_in_state(threads))
            .configure(configure_routes),
    )
    .await;

    let resp = test::call_service(&app, TestRequest::get().uri("/search?q=rust").to_request()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
