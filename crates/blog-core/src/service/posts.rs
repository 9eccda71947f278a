//! Post listings, detail and the post create/edit/delete flows.

use chrono::Utc;

use super::{
    BlogService, CategoryPage, IndexPage, Outcome, PostDeletePage, PostDetailPage, PostEditor,
};
use crate::domain::{NewPost, PostEntry, Viewer};
use crate::error::DomainError;
use crate::forms::{CleanPost, CommentForm, PostForm, ValidationErrors};
use crate::pagination::{INDEX_FEED_SIZE, POSTS_PER_PAGE, Page, Paginator};
use crate::policy::{can_modify, is_category_listable, is_comment_visible, is_post_visible};
use crate::ports::{PostFilter, Visibility};
use crate::routes::Route;

impl BlogService {
    /// GET / - the most recent public posts, whoever is asking.
    pub async fn index(&self) -> Result<IndexPage, DomainError> {
        let filter = PostFilter::new(Visibility::PublicAt(Utc::now()));
        let posts = self.repos.posts.list(&filter, 0, INDEX_FEED_SIZE).await?;
        Ok(IndexPage { posts })
    }

    /// GET /posts/{id}/
    pub async fn post_detail(
        &self,
        id: i64,
        viewer: Option<&Viewer>,
    ) -> Result<PostDetailPage, DomainError> {
        let now = Utc::now();
        let post = self.visible_post(id, viewer).await?;

        let comments = self
            .repos
            .comments
            .list_for_post(id)
            .await?
            .into_iter()
            .filter(|entry| is_comment_visible(&entry.comment, viewer))
            .collect();

        Ok(PostDetailPage {
            is_publicly_visible: is_post_visible(&post, None, now),
            can_edit: can_modify(&post, viewer),
            post,
            comments,
            comment_form: CommentForm::default(),
        })
    }

    /// GET /category/{slug}/
    pub async fn category_posts(
        &self,
        slug: &str,
        page: Option<&str>,
        viewer: Option<&Viewer>,
    ) -> Result<CategoryPage, DomainError> {
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(is_category_listable)
            .ok_or_else(|| DomainError::not_found("Category", slug))?;

        let now = Utc::now();
        let visibility = match viewer {
            Some(viewer) => Visibility::PublicOrOwnedBy {
                viewer_id: viewer.id,
                now,
            },
            None => Visibility::PublicAt(now),
        };
        let filter = PostFilter::new(visibility).in_category(category.id);

        Ok(CategoryPage {
            page: self.paginate(&filter, page).await?,
            category,
        })
    }

    /// GET /posts/create/
    pub async fn create_post_page(
        &self,
        viewer: Option<&Viewer>,
    ) -> Result<Outcome<PostEditor>, DomainError> {
        require_viewer!(viewer, Route::CreatePost);
        let editor = self
            .post_editor(None, PostForm::default(), ValidationErrors::new())
            .await?;
        Ok(Outcome::Render(editor))
    }

    /// POST /posts/create/
    pub async fn create_post(
        &self,
        viewer: Option<&Viewer>,
        form: PostForm,
    ) -> Result<Outcome<PostEditor>, DomainError> {
        let viewer = require_viewer!(viewer, Route::CreatePost);

        let clean = match self.clean_post_form(&form).await? {
            Ok(clean) => clean,
            Err(errors) => {
                return Ok(Outcome::Invalid(self.post_editor(None, form, errors).await?));
            }
        };

        let post = self
            .repos
            .posts
            .create(NewPost {
                title: clean.title,
                text: clean.text,
                pub_date: clean.pub_date,
                is_published: clean.is_published.unwrap_or(true),
                image: clean.image,
                author_id: viewer.id,
                location_id: clean.location_id,
                category_id: clean.category_id,
            })
            .await?;
        tracing::info!(post_id = post.id, author_id = viewer.id, "Post created");

        let username = match self.repos.posts.find_entry(post.id).await? {
            Some(entry) => entry.author_username,
            None => viewer.username.clone(),
        };
        Ok(Outcome::Redirect(Route::Profile(username)))
    }

    /// GET /posts/{id}/edit/
    pub async fn edit_post_page(
        &self,
        viewer: Option<&Viewer>,
        id: i64,
    ) -> Result<Outcome<PostEditor>, DomainError> {
        require_viewer!(viewer, Route::EditPost(id));
        let entry = match self.modifiable_post(viewer, id).await? {
            Ok(entry) => entry,
            Err(redirect) => return Ok(redirect),
        };

        let form = PostForm::from_post(&entry.post, self.utc_offset);
        let editor = self
            .post_editor(Some(id), form, ValidationErrors::new())
            .await?;
        Ok(Outcome::Render(editor))
    }

    /// POST /posts/{id}/edit/
    pub async fn edit_post(
        &self,
        viewer: Option<&Viewer>,
        id: i64,
        form: PostForm,
    ) -> Result<Outcome<PostEditor>, DomainError> {
        let viewer = require_viewer!(viewer, Route::EditPost(id));
        let entry = match self.modifiable_post(Some(viewer), id).await? {
            Ok(entry) => entry,
            Err(redirect) => return Ok(redirect),
        };

        let clean = match self.clean_post_form(&form).await? {
            Ok(clean) => clean,
            Err(errors) => {
                return Ok(Outcome::Invalid(
                    self.post_editor(Some(id), form, errors).await?,
                ));
            }
        };

        let mut post = entry.post;
        post.title = clean.title;
        post.text = clean.text;
        post.pub_date = clean.pub_date;
        post.image = clean.image;
        post.location_id = clean.location_id;
        post.category_id = clean.category_id;
        if let Some(is_published) = clean.is_published {
            post.is_published = is_published;
        }

        self.repos.posts.update(post).await?;
        tracing::info!(post_id = id, editor_id = viewer.id, "Post updated");
        Ok(Outcome::Redirect(Route::PostDetail(id)))
    }

    /// GET /posts/{id}/delete/
    pub async fn delete_post_page(
        &self,
        viewer: Option<&Viewer>,
        id: i64,
    ) -> Result<Outcome<PostDeletePage>, DomainError> {
        require_viewer!(viewer, Route::DeletePost(id));
        Ok(match self.modifiable_post(viewer, id).await? {
            Ok(post) => Outcome::Render(PostDeletePage { post }),
            Err(redirect) => redirect,
        })
    }

    /// POST /posts/{id}/delete/
    pub async fn delete_post(
        &self,
        viewer: Option<&Viewer>,
        id: i64,
    ) -> Result<Outcome<PostDeletePage>, DomainError> {
        let viewer = require_viewer!(viewer, Route::DeletePost(id));
        let entry = match self.modifiable_post(Some(viewer), id).await? {
            Ok(entry) => entry,
            Err(redirect) => return Ok(redirect),
        };

        self.repos.posts.delete(id).await?;
        tracing::info!(post_id = id, deleted_by = viewer.id, "Post deleted");
        Ok(Outcome::Redirect(Route::Profile(entry.author_username)))
    }

    /// Resolve a post the viewer may see, or report it as missing.
    pub(super) async fn visible_post(
        &self,
        id: i64,
        viewer: Option<&Viewer>,
    ) -> Result<PostEntry, DomainError> {
        self.repos
            .posts
            .find_entry(id)
            .await?
            .filter(|entry| is_post_visible(entry, viewer, Utc::now()))
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    /// Resolve a post for mutation. A viewer without rights is sent to the post itself,
    /// unless they cannot see it either, in which case it does not exist for them.
    async fn modifiable_post<T>(
        &self,
        viewer: Option<&Viewer>,
        id: i64,
    ) -> Result<Result<PostEntry, Outcome<T>>, DomainError> {
        let entry = self
            .repos
            .posts
            .find_entry(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;

        if can_modify(&entry, viewer) {
            return Ok(Ok(entry));
        }
        if !is_post_visible(&entry, viewer, Utc::now()) {
            return Err(DomainError::not_found("Post", id));
        }
        tracing::debug!(post_id = id, "Viewer may not modify post, redirecting to detail");
        Ok(Err(Outcome::Redirect(Route::PostDetail(id))))
    }

    pub(super) async fn paginate(
        &self,
        filter: &PostFilter,
        page: Option<&str>,
    ) -> Result<Page<PostEntry>, DomainError> {
        let total = self.repos.posts.count(filter).await?;
        let window = Paginator::new(total, POSTS_PER_PAGE).window(page);
        let items = self
            .repos
            .posts
            .list(filter, window.offset, window.limit)
            .await?;
        Ok(Page::new(items, window))
    }

    /// Field validation plus the checks that need storage: referenced category and
    /// location must exist.
    async fn clean_post_form(
        &self,
        form: &PostForm,
    ) -> Result<Result<CleanPost, ValidationErrors>, DomainError> {
        let (clean, mut errors) = match form.clean(self.utc_offset) {
            Ok(clean) => (Some(clean), ValidationErrors::new()),
            Err(errors) => (None, errors),
        };

        let category_id = form.category.as_deref().and_then(|v| v.trim().parse().ok());
        if let Some(id) = category_id {
            if self.repos.categories.find_by_id(id).await?.is_none() {
                errors.add("category", "Select a valid choice.");
            }
        }
        let location_id = form.location.as_deref().and_then(|v| v.trim().parse().ok());
        if let Some(id) = location_id {
            if self.repos.locations.find_by_id(id).await?.is_none() {
                errors.add("location", "Select a valid choice.");
            }
        }

        Ok(match clean {
            Some(clean) if errors.is_empty() => Ok(clean),
            _ => Err(errors),
        })
    }

    async fn post_editor(
        &self,
        post_id: Option<i64>,
        form: PostForm,
        errors: ValidationErrors,
    ) -> Result<PostEditor, DomainError> {
        Ok(PostEditor {
            post_id,
            form,
            errors,
            categories: self.repos.categories.list().await?,
            locations: self.repos.locations.list().await?,
        })
    }
}
