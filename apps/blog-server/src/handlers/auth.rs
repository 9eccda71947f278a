//! Registration and login.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use blog_core::forms::RegistrationForm;
use blog_core::service::{FormPage, IssuedToken};
use blog_core::{Outcome, Route};
use blog_shared::dto::{LoginQuery, LoginRequest};

use super::respond;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// A token plus where the client asked to go after logging in.
#[derive(Serialize)]
struct LoginResponse {
    #[serde(flatten)]
    token: IssuedToken,
    next: String,
}

/// GET /auth/registration/
pub async fn registration_page() -> HttpResponse {
    respond(Outcome::Render(FormPage::blank(RegistrationForm::default())))
}

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegistrationForm>,
) -> AppResult<HttpResponse> {
    Ok(respond(state.accounts.register(form.into_inner()).await?))
}

/// GET /auth/login/
pub async fn login_page(query: web::Query<LoginQuery>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "username": "",
        "next": query.safe_next(),
    }))
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    query: web::Query<LoginQuery>,
    form: web::Form<LoginRequest>,
) -> AppResult<HttpResponse> {
    let token = state.accounts.login(&form.username, &form.password).await?;
    tracing::info!(username = %token.username, "User logged in");

    let next = query
        .safe_next()
        .map(str::to_string)
        .unwrap_or_else(|| Route::Profile(token.username.clone()).to_string());
    Ok(HttpResponse::Ok().json(LoginResponse { token, next }))
}
