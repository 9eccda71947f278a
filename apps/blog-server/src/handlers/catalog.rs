//! Staff-only category and location management.

use actix_web::{HttpResponse, web};

use blog_core::forms::{CategoryForm, LocationForm};

use super::respond;
use crate::middleware::auth::CurrentViewer;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /manage/categories/
pub async fn categories_page(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
) -> AppResult<HttpResponse> {
    Ok(respond(state.blog.categories_page(viewer.get()).await?))
}

/// POST /manage/categories/
pub async fn create_category(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    form: web::Form<CategoryForm>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .create_category(viewer.get(), form.into_inner())
        .await?;
    Ok(respond(outcome))
}

/// POST /manage/categories/{slug}/delete/
pub async fn delete_category(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    Ok(respond(state.blog.delete_category(viewer.get(), &path).await?))
}

/// GET /manage/locations/
pub async fn locations_page(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
) -> AppResult<HttpResponse> {
    Ok(respond(state.blog.locations_page(viewer.get()).await?))
}

/// POST /manage/locations/
pub async fn create_location(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    form: web::Form<LocationForm>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .create_location(viewer.get(), form.into_inner())
        .await?;
    Ok(respond(outcome))
}

/// POST /manage/locations/{id}/delete/
pub async fn delete_location(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .delete_location(viewer.get(), path.into_inner())
        .await?;
    Ok(respond(outcome))
}
