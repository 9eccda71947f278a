//! Profile pages.

use actix_web::{HttpResponse, web};

use blog_core::forms::ProfileForm;
use blog_shared::dto::PageQuery;

use super::respond;
use crate::middleware::auth::CurrentViewer;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .blog
        .profile(&path, query.page.as_deref(), viewer.get())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /profile/edit/
pub async fn edit_profile_page(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
) -> AppResult<HttpResponse> {
    Ok(respond(state.blog.edit_profile_page(viewer.get()).await?))
}

/// POST /profile/edit/
pub async fn edit_profile(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    form: web::Form<ProfileForm>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .edit_profile(viewer.get(), form.into_inner())
        .await?;
    Ok(respond(outcome))
}
