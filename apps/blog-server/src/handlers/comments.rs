//! Comment create/edit/delete under a post.

use actix_web::{HttpResponse, web};

use blog_core::forms::CommentForm;

use super::respond;
use crate::middleware::auth::CurrentViewer;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /posts/{post_id}/comment/
pub async fn add_comment_page(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .add_comment_page(viewer.get(), path.into_inner())
        .await?;
    Ok(respond(outcome))
}

/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .add_comment(viewer.get(), path.into_inner(), form.into_inner())
        .await?;
    Ok(respond(outcome))
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment_page(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let outcome = state
        .blog
        .edit_comment_page(viewer.get(), post_id, comment_id)
        .await?;
    Ok(respond(outcome))
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<(i64, i64)>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let outcome = state
        .blog
        .edit_comment(viewer.get(), post_id, comment_id, form.into_inner())
        .await?;
    Ok(respond(outcome))
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_comment_page(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let outcome = state
        .blog
        .delete_comment_page(viewer.get(), post_id, comment_id)
        .await?;
    Ok(respond(outcome))
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_comment(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<(i64, i64)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let outcome = state
        .blog
        .delete_comment(viewer.get(), post_id, comment_id)
        .await?;
    Ok(respond(outcome))
}
