//! In-memory repositories - used when no database is configured, and in tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use blog_core::domain::{
    Category, Comment, CommentEntry, Location, NewCategory, NewComment, NewLocation, NewPost,
    NewUser, Post, PostEntry, User,
};
use blog_core::error::RepoError;
use blog_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostFilter,
    PostRepository, Repositories, UserRepository,
};

/// Rows of one table plus its id sequence.
struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn replace(&mut self, id: i64, row: T) -> Result<(), RepoError> {
        match self.rows.get_mut(&id) {
            Some(slot) => {
                *slot = row;
                Ok(())
            }
            None => Err(RepoError::NotFound),
        }
    }
}

#[derive(Default)]
struct Tables {
    users: Table<User>,
    categories: Table<Category>,
    locations: Table<Location>,
    posts: Table<Post>,
    comments: Table<Comment>,
}

impl Tables {
    fn entry(&self, post: &Post) -> PostEntry {
        PostEntry {
            post: post.clone(),
            author_username: self
                .users
                .rows
                .get(&post.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            category: post
                .category_id
                .and_then(|id| self.categories.rows.get(&id).cloned()),
            location: post
                .location_id
                .and_then(|id| self.locations.rows.get(&id).cloned()),
            comment_count: self
                .comments
                .rows
                .values()
                .filter(|c| c.post_id == post.id)
                .count() as u64,
        }
    }

    fn remove_post(&mut self, id: i64) -> bool {
        let removed = self.posts.rows.remove(&id).is_some();
        if removed {
            self.comments.rows.retain(|_, c| c.post_id != id);
        }
        removed
    }

    fn check_foreign_keys(&self, post: &NewPostRefs) -> Result<(), RepoError> {
        if !self.users.rows.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("posts.author_id".to_string()));
        }
        if post
            .category_id
            .is_some_and(|id| !self.categories.rows.contains_key(&id))
        {
            return Err(RepoError::Constraint("posts.category_id".to_string()));
        }
        if post
            .location_id
            .is_some_and(|id| !self.locations.rows.contains_key(&id))
        {
            return Err(RepoError::Constraint("posts.location_id".to_string()));
        }
        Ok(())
    }
}

struct NewPostRefs {
    author_id: i64,
    category_id: Option<i64>,
    location_id: Option<i64>,
}

/// All five tables behind one async lock, so cascades are applied atomically.
///
/// Note: Data is lost on process restart.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every repository port, backed by this store.
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            users: self.clone(),
            categories: self.clone(),
            locations: self.clone(),
            posts: self.clone(),
            comments: self.clone(),
        }
    }
}

#[async_trait]
impl BaseRepository<User, NewUser, i64> for InMemoryStore {
    async fn create(&self, new: NewUser) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.rows.values().any(|u| u.username == new.username) {
            return Err(RepoError::Constraint("users.username".to_string()));
        }
        let id = tables.users.next_id();
        let user = User {
            id,
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password_hash: new.password_hash,
            is_staff: new.is_staff,
            created_at: Utc::now(),
        };
        tables.users.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.rows.get(&id).cloned())
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .rows
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(RepoError::Constraint("users.username".to_string()));
        }
        tables.users.replace(user.id, user.clone())?;
        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.rows.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        let owned: Vec<i64> = tables
            .posts
            .rows
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.remove_post(post_id);
        }
        tables.comments.rows.retain(|_, c| c.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Category, NewCategory, i64> for InMemoryStore {
    async fn create(&self, new: NewCategory) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.rows.values().any(|c| c.slug == new.slug) {
            return Err(RepoError::Constraint("categories.slug".to_string()));
        }
        let id = tables.categories.next_id();
        let category = Category {
            id,
            title: new.title,
            description: new.description,
            slug: new.slug,
            is_published: new.is_published,
            created_at: Utc::now(),
        };
        tables.categories.rows.insert(id, category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.rows.get(&id).cloned())
    }

    async fn update(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .categories
            .rows
            .values()
            .any(|c| c.slug == category.slug && c.id != category.id)
        {
            return Err(RepoError::Constraint("categories.slug".to_string()));
        }
        tables.categories.replace(category.id, category.clone())?;
        Ok(category)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.rows.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.rows.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .rows
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.rows.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

#[async_trait]
impl BaseRepository<Location, NewLocation, i64> for InMemoryStore {
    async fn create(&self, new: NewLocation) -> Result<Location, RepoError> {
        let mut tables = self.tables.write().await;
        let id = tables.locations.next_id();
        let location = Location {
            id,
            name: new.name,
            is_published: new.is_published,
            created_at: Utc::now(),
        };
        tables.locations.rows.insert(id, location.clone());
        Ok(location)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Location>, RepoError> {
        Ok(self.tables.read().await.locations.rows.get(&id).cloned())
    }

    async fn update(&self, location: Location) -> Result<Location, RepoError> {
        let mut tables = self.tables.write().await;
        tables.locations.replace(location.id, location.clone())?;
        Ok(location)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.locations.rows.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        for post in tables.posts.rows.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<Location>, RepoError> {
        let tables = self.tables.read().await;
        let mut locations: Vec<Location> = tables.locations.rows.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }
}

#[async_trait]
impl BaseRepository<Post, NewPost, i64> for InMemoryStore {
    async fn create(&self, new: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_foreign_keys(&NewPostRefs {
            author_id: new.author_id,
            category_id: new.category_id,
            location_id: new.location_id,
        })?;
        let id = tables.posts.next_id();
        let post = Post {
            id,
            title: new.title,
            text: new.text,
            pub_date: new.pub_date,
            is_published: new.is_published,
            image: new.image,
            author_id: new.author_id,
            location_id: new.location_id,
            category_id: new.category_id,
            created_at: Utc::now(),
        };
        tables.posts.rows.insert(id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.rows.get(&id).cloned())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_foreign_keys(&NewPostRefs {
            author_id: post.author_id,
            category_id: post.category_id,
            location_id: post.location_id,
        })?;
        tables.posts.replace(post.id, post.clone())?;
        Ok(post)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.remove_post(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_entry(&self, id: i64) -> Result<Option<PostEntry>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.rows.get(&id).map(|post| tables.entry(post)))
    }

    async fn list(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostEntry>, RepoError> {
        let tables = self.tables.read().await;
        let mut entries: Vec<PostEntry> = tables
            .posts
            .rows
            .values()
            .map(|post| tables.entry(post))
            .filter(|entry| filter.matches(entry))
            .collect();
        entries.sort_by(|a, b| {
            b.post
                .pub_date
                .cmp(&a.post.pub_date)
                .then_with(|| b.post.id.cmp(&a.post.id))
        });
        Ok(entries
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .rows
            .values()
            .filter(|post| filter.matches(&tables.entry(post)))
            .count() as u64)
    }
}

#[async_trait]
impl BaseRepository<Comment, NewComment, i64> for InMemoryStore {
    async fn create(&self, new: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.rows.contains_key(&new.post_id) {
            return Err(RepoError::Constraint("comments.post_id".to_string()));
        }
        if !tables.users.rows.contains_key(&new.author_id) {
            return Err(RepoError::Constraint("comments.author_id".to_string()));
        }
        let id = tables.comments.next_id();
        let comment = Comment {
            id,
            post_id: new.post_id,
            author_id: new.author_id,
            text: new.text,
            is_published: true,
            created_at: Utc::now(),
        };
        tables.comments.rows.insert(id, comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.rows.get(&id).cloned())
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .comments
            .rows
            .get_mut(&comment.id)
            .ok_or(RepoError::NotFound)?;
        // Parent post, author and creation time are fixed at insert.
        stored.text = comment.text;
        stored.is_published = comment.is_published;
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        match tables.comments.rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentEntry>, RepoError> {
        let tables = self.tables.read().await;
        let mut entries: Vec<CommentEntry> = tables
            .comments
            .rows
            .values()
            .filter(|c| c.post_id == post_id)
            .map(|c| CommentEntry {
                comment: c.clone(),
                author_username: tables
                    .users
                    .rows
                    .get(&c.author_id)
                    .map(|u| u.username.clone())
                    .unwrap_or_default(),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.comment
                .created_at
                .cmp(&b.comment.created_at)
                .then_with(|| a.comment.id.cmp(&b.comment.id))
        });
        Ok(entries)
    }
}
