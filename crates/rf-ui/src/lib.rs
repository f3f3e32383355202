use askama::Template;
use rf_core::models::Thread;
use uuid::Uuid;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub user_id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub threads: &'a [Thread],
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub error: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate<'a> {
    pub error: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "search_results.html")]
pub struct SearchResultsTemplate<'a> {
    pub query: &'a str,
    pub threads: &'a [Thread],
}
