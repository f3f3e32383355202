//! # rf-api Handlers
//!
//! This module coordinates the flow between HTTP requests and `ForumService`.

use actix_web::http::{header, header::ContentType, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use rf_core::error::AppError;
use rf_core::models::{SearchResults, VoteKind};
use rf_ui::{IndexTemplate, LoginTemplate, SearchResultsTemplate, SignupTemplate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::session::{self, current_user};
use crate::AppState;

pub const NO_QUERY: &str = "No search query provided";

type HandlerResult = Result<HttpResponse, ApiError>;

/// An extractor whose rejection is reported only after the session check.
type Deferred<T> = Result<T, actix_web::Error>;

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ThreadForm {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct VoteResponse {
    pub success: bool,
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn render(status: StatusCode, template: impl Template) -> HandlerResult {
    Ok(HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(template.render()?))
}

/// Lists every thread for the logged-in user.
pub async fn index(data: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    let Some(user) = current_user(&data, &req).await? else {
        return Ok(see_other("/login"));
    };

    let threads = data.forum.list_threads().await?;
    render(
        StatusCode::OK,
        IndexTemplate {
            user_id: user.id,
            username: &user.username,
            email: &user.email,
            threads: &threads,
        },
    )
}

pub async fn signup_page() -> HandlerResult {
    render(StatusCode::OK, SignupTemplate { error: None })
}

/// Registers an account, then sends the user to the login form.
pub async fn signup(data: web::Data<AppState>, form: web::Form<SignupForm>) -> HandlerResult {
    match data.forum.signup(&form.email, &form.username, &form.password).await {
        Ok(_) => Ok(see_other("/login")),
        Err(AppError::Conflict(msg)) => {
            render(StatusCode::CONFLICT, SignupTemplate { error: Some(msg.as_str()) })
        }
        Err(AppError::ValidationError(msg)) => {
            render(StatusCode::BAD_REQUEST, SignupTemplate { error: Some(msg.as_str()) })
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login_page() -> HandlerResult {
    render(StatusCode::OK, LoginTemplate { error: None })
}

/// Checks credentials and sets the session cookie.
pub async fn login(data: web::Data<AppState>, form: web::Form<LoginForm>) -> HandlerResult {
    match data.forum.login(&form.email, &form.password).await {
        Ok(new_session) => Ok(HttpResponse::SeeOther()
            .insert_header((header::LOCATION, "/"))
            .cookie(session::session_cookie(&new_session.token, data.secure_cookies))
            .finish()),
        Err(AppError::Unauthorized(msg)) => {
            render(StatusCode::UNAUTHORIZED, LoginTemplate { error: Some(msg.as_str()) })
        }
        Err(e) => Err(e.into()),
    }
}

/// Drops the server-side session and clears the cookie.
pub async fn logout(data: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    if let Some(token) = session::session_token(&req) {
        data.forum.logout(&token).await?;
    }

    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/login"))
        .cookie(session::removal_cookie())
        .finish())
}

pub async fn create_thread(
    data: web::Data<AppState>,
    req: HttpRequest,
    form: Deferred<web::Form<ThreadForm>>,
) -> HandlerResult {
    let Some(user) = current_user(&data, &req).await? else {
        return Ok(see_other("/login"));
    };

    let form = form?;
    data.forum.create_thread(&user, &form.title, &form.content).await?;
    Ok(see_other("/"))
}

/// Comments on a missing thread are dropped silently.
pub async fn add_comment(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: Deferred<web::Path<Uuid>>,
    form: Deferred<web::Form<CommentForm>>,
) -> HandlerResult {
    let Some(user) = current_user(&data, &req).await? else {
        return Ok(see_other("/login"));
    };

    let (thread_id, form) = (path?.into_inner(), form?);
    data.forum.add_comment(&user, thread_id, &form.text).await?;
    Ok(see_other("/"))
}

/// Non-owners and missing threads are a silent no-op.
pub async fn delete_thread(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: Deferred<web::Path<Uuid>>,
) -> HandlerResult {
    let Some(user) = current_user(&data, &req).await? else {
        return Ok(see_other("/login"));
    };

    data.forum.delete_thread(&user, path?.into_inner()).await?;
    Ok(see_other("/"))
}

pub async fn search(data: web::Data<AppState>, params: web::Query<SearchParams>) -> HandlerResult {
    match data.forum.search(params.q.as_deref()).await? {
        SearchResults::NoQuery => Ok(HttpResponse::Ok()
            .content_type(ContentType::plaintext())
            .body(NO_QUERY)),
        SearchResults::Matches { query, threads } => render(
            StatusCode::OK,
            SearchResultsTemplate { query: &query, threads: &threads },
        ),
    }
}

pub async fn like_thread(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: Deferred<web::Path<Uuid>>,
) -> Result<web::Json<VoteResponse>, ApiError> {
    vote(&data, &req, path, VoteKind::Like).await
}

pub async fn dislike_thread(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: Deferred<web::Path<Uuid>>,
) -> Result<web::Json<VoteResponse>, ApiError> {
    vote(&data, &req, path, VoteKind::Dislike).await
}

/// Voting answers with a JSON flag instead of redirecting.
async fn vote(
    data: &AppState,
    req: &HttpRequest,
    path: Deferred<web::Path<Uuid>>,
    kind: VoteKind,
) -> Result<web::Json<VoteResponse>, ApiError> {
    let success = match current_user(data, req).await? {
        Some(user) => data.forum.vote(&user, path?.into_inner(), kind).await?,
        None => false,
    };
    Ok(web::Json(VoteResponse { success }))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::plaintext()).body("ok")
}
