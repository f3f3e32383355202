//! Session cookie plumbing. The cookie carries an opaque token; the mapping to a
//! user lives server-side behind `ForumService`.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use rf_core::models::User;

use crate::error::ApiError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "forum_session";

/// Browser-session cookie (no Max-Age) holding the login token.
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_owned())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish()
}

/// Expired, empty cookie that makes the browser drop the session.
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

pub fn session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|token| !token.is_empty())
}

/// The logged-in user for this request, if any.
pub async fn current_user(state: &AppState, req: &HttpRequest) -> Result<Option<User>, ApiError> {
    match session_token(req) {
        Some(token) => Ok(state.forum.current_user(&token).await?),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("tok", true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn removal_cookie_is_empty() {
        let cookie = removal_cookie();
        assert_eq!(cookie.value(), "");
        assert!(cookie.max_age().is_some());
    }

    #[test]
    fn token_extraction_ignores_empty_cookie() {
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, ""))
            .to_http_request();
        assert_eq!(session_token(&req), None);

        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "abc"))
            .to_http_request();
        assert_eq!(session_token(&req).as_deref(), Some("abc"));
    }
}
