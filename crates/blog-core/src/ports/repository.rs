use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Category, Comment, CommentEntry, Location, NewCategory, NewComment, NewLocation, NewPost,
    NewUser, Post, PostEntry, User,
};
use crate::error::RepoError;
use crate::policy::is_post_visible;

/// Generic repository trait defining standard CRUD operations.
///
/// `N` is the insert shape of `T`: everything but the generated id and timestamps.
#[async_trait]
pub trait BaseRepository<T, N, ID>: Send + Sync {
    /// Insert a new entity and return it with its assigned id.
    async fn create(&self, new: N) -> Result<T, RepoError>;

    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Overwrite a stored entity. Fails with `NotFound` if it no longer exists.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, applying the relational delete rules.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Users. Deleting a user deletes their posts and comments.
#[async_trait]
pub trait UserRepository: BaseRepository<User, NewUser, i64> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Categories. Deleting a category detaches its posts instead of deleting them.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, NewCategory, i64> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    async fn list(&self) -> Result<Vec<Category>, RepoError>;
}

/// Locations. Deleting a location detaches its posts instead of deleting them.
#[async_trait]
pub trait LocationRepository: BaseRepository<Location, NewLocation, i64> {
    async fn list(&self) -> Result<Vec<Location>, RepoError>;
}

/// Posts. Deleting a post deletes its comments.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, NewPost, i64> {
    /// Load a post with its author, category, location and comment count.
    async fn find_entry(&self, id: i64) -> Result<Option<PostEntry>, RepoError>;

    /// Posts matching `filter`, newest `pub_date` first.
    async fn list(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostEntry>, RepoError>;

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, NewComment, i64> {
    /// Comments under a post, oldest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentEntry>, RepoError>;
}

/// The full persistence port handed to the services.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

/// Which posts a listing may show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// No visibility restriction (the owner's own profile).
    Everything,
    /// Only posts an anonymous reader may see at `now`.
    PublicAt(DateTime<Utc>),
    /// Public posts plus everything authored by the viewer.
    PublicOrOwnedBy { viewer_id: i64, now: DateTime<Utc> },
}

/// Listing criteria understood by every [`PostRepository`].
///
/// SQL implementations must translate this into the same predicate that
/// [`PostFilter::matches`] evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub author_id: Option<i64>,
    pub category_id: Option<i64>,
    pub visibility: Visibility,
}

impl PostFilter {
    pub fn new(visibility: Visibility) -> Self {
        Self {
            author_id: None,
            category_id: None,
            visibility,
        }
    }

    pub fn by_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn matches(&self, entry: &PostEntry) -> bool {
        if self.author_id.is_some_and(|id| entry.post.author_id != id) {
            return false;
        }
        if self.category_id.is_some() && entry.post.category_id != self.category_id {
            return false;
        }
        match self.visibility {
            Visibility::Everything => true,
            Visibility::PublicAt(now) => is_post_visible(entry, None, now),
            Visibility::PublicOrOwnedBy { viewer_id, now } => {
                entry.post.author_id == viewer_id || is_post_visible(entry, None, now)
            }
        }
    }
}
