use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Location};

/// Post entity - a dated publication by one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Posts dated in the future stay hidden from everyone but the author until then.
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub image: Option<String>,
    pub author_id: i64,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub image: Option<String>,
    pub author_id: i64,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
}

/// Read model of a post: the row plus the relations every listing shows.
#[derive(Debug, Clone, Serialize)]
pub struct PostEntry {
    #[serde(flatten)]
    pub post: Post,
    pub author_username: String,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}

impl PostEntry {
    pub fn id(&self) -> i64 {
        self.post.id
    }
}
