use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity. `post_id` and `author_id` never change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

/// A comment together with its author's username, as shown under a post.
#[derive(Debug, Clone, Serialize)]
pub struct CommentEntry {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_username: String,
}
