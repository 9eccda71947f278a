//! Post listings, detail and post create/edit/delete.

use actix_web::{HttpResponse, web};

use blog_core::forms::PostForm;
use blog_shared::dto::PageQuery;

use super::respond;
use crate::middleware::auth::CurrentViewer;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /
pub async fn index(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let page = state.blog.index().await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /posts/{id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let page = state.blog.post_detail(path.into_inner(), viewer.get()).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .blog
        .category_posts(&path, query.page.as_deref(), viewer.get())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /posts/create/
pub async fn create_post_page(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
) -> AppResult<HttpResponse> {
    Ok(respond(state.blog.create_post_page(viewer.get()).await?))
}

/// POST /posts/create/
pub async fn create_post(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .create_post(viewer.get(), form.into_inner())
        .await?;
    Ok(respond(outcome))
}

/// GET /posts/{id}/edit/
pub async fn edit_post_page(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .edit_post_page(viewer.get(), path.into_inner())
        .await?;
    Ok(respond(outcome))
}

/// POST /posts/{id}/edit/
pub async fn edit_post(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i64>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .edit_post(viewer.get(), path.into_inner(), form.into_inner())
        .await?;
    Ok(respond(outcome))
}

/// GET /posts/{id}/delete/
pub async fn delete_post_page(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .delete_post_page(viewer.get(), path.into_inner())
        .await?;
    Ok(respond(outcome))
}

/// POST /posts/{id}/delete/
pub async fn delete_post(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .delete_post(viewer.get(), path.into_inner())
        .await?;
    Ok(respond(outcome))
}
