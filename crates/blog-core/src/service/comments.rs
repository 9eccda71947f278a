//! Comment create/edit/delete flows. Comments are always addressed through their
//! parent post.

use super::{BlogService, CommentDeletePage, CommentEditor, Outcome};
use crate::domain::{Comment, NewComment, Viewer};
use crate::error::DomainError;
use crate::forms::{CommentForm, ValidationErrors};
use crate::policy::{can_modify, is_comment_visible};
use crate::routes::Route;

impl BlogService {
    /// GET /posts/{post_id}/comment/
    pub async fn add_comment_page(
        &self,
        viewer: Option<&Viewer>,
        post_id: i64,
    ) -> Result<Outcome<CommentEditor>, DomainError> {
        let viewer = require_viewer!(viewer, Route::AddComment(post_id));
        self.visible_post(post_id, Some(viewer)).await?;
        Ok(Outcome::Render(CommentEditor {
            post_id,
            comment_id: None,
            form: CommentForm::default(),
            errors: ValidationErrors::new(),
        }))
    }

    /// POST /posts/{post_id}/comment/
    pub async fn add_comment(
        &self,
        viewer: Option<&Viewer>,
        post_id: i64,
        form: CommentForm,
    ) -> Result<Outcome<CommentEditor>, DomainError> {
        let viewer = require_viewer!(viewer, Route::AddComment(post_id));
        self.visible_post(post_id, Some(viewer)).await?;

        let text = match form.clean() {
            Ok(text) => text,
            Err(errors) => {
                return Ok(Outcome::Invalid(CommentEditor {
                    post_id,
                    comment_id: None,
                    form,
                    errors,
                }));
            }
        };

        let comment = self
            .repos
            .comments
            .create(NewComment {
                post_id,
                author_id: viewer.id,
                text,
            })
            .await?;
        tracing::info!(comment_id = comment.id, post_id, "Comment added");
        Ok(Outcome::Redirect(Route::PostDetail(post_id)))
    }

    /// GET /posts/{post_id}/edit_comment/{comment_id}/
    pub async fn edit_comment_page(
        &self,
        viewer: Option<&Viewer>,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Outcome<CommentEditor>, DomainError> {
        require_viewer!(viewer, Route::EditComment { post_id, comment_id });
        let comment = match self.modifiable_comment(viewer, post_id, comment_id).await? {
            Ok(comment) => comment,
            Err(redirect) => return Ok(redirect),
        };

        Ok(Outcome::Render(CommentEditor {
            post_id,
            comment_id: Some(comment_id),
            form: CommentForm { text: comment.text },
            errors: ValidationErrors::new(),
        }))
    }

    /// POST /posts/{post_id}/edit_comment/{comment_id}/
    pub async fn edit_comment(
        &self,
        viewer: Option<&Viewer>,
        post_id: i64,
        comment_id: i64,
        form: CommentForm,
    ) -> Result<Outcome<CommentEditor>, DomainError> {
        require_viewer!(viewer, Route::EditComment { post_id, comment_id });
        let mut comment = match self.modifiable_comment(viewer, post_id, comment_id).await? {
            Ok(comment) => comment,
            Err(redirect) => return Ok(redirect),
        };

        comment.text = match form.clean() {
            Ok(text) => text,
            Err(errors) => {
                return Ok(Outcome::Invalid(CommentEditor {
                    post_id,
                    comment_id: Some(comment_id),
                    form,
                    errors,
                }));
            }
        };

        self.repos.comments.update(comment).await?;
        tracing::info!(comment_id, post_id, "Comment updated");
        Ok(Outcome::Redirect(Route::PostDetail(post_id)))
    }

    /// GET /posts/{post_id}/delete_comment/{comment_id}/
    pub async fn delete_comment_page(
        &self,
        viewer: Option<&Viewer>,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Outcome<CommentDeletePage>, DomainError> {
        require_viewer!(viewer, Route::DeleteComment { post_id, comment_id });
        Ok(match self.modifiable_comment(viewer, post_id, comment_id).await? {
            Ok(comment) => Outcome::Render(CommentDeletePage { post_id, comment }),
            Err(redirect) => redirect,
        })
    }

    /// POST /posts/{post_id}/delete_comment/{comment_id}/
    pub async fn delete_comment(
        &self,
        viewer: Option<&Viewer>,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Outcome<CommentDeletePage>, DomainError> {
        require_viewer!(viewer, Route::DeleteComment { post_id, comment_id });
        if let Err(redirect) = self.modifiable_comment(viewer, post_id, comment_id).await? {
            return Ok(redirect);
        }

        self.repos.comments.delete(comment_id).await?;
        tracing::info!(comment_id, post_id, "Comment deleted");
        Ok(Outcome::Redirect(Route::PostDetail(post_id)))
    }

    /// Resolve a comment by both ids. A comment under a different post does not exist
    /// as far as this route is concerned.
    async fn modifiable_comment<T>(
        &self,
        viewer: Option<&Viewer>,
        post_id: i64,
        comment_id: i64,
    ) -> Result<Result<Comment, Outcome<T>>, DomainError> {
        let comment = self
            .repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("Comment", comment_id))?;
        self.visible_post(post_id, viewer).await?;

        if can_modify(&comment, viewer) {
            return Ok(Ok(comment));
        }
        if !is_comment_visible(&comment, viewer) {
            return Err(DomainError::not_found("Comment", comment_id));
        }
        tracing::debug!(comment_id, post_id, "Viewer may not modify comment");
        Ok(Err(Outcome::Redirect(Route::PostDetail(post_id))))
    }
}
