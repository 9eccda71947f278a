use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity - an account that owns posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to register a user. The id and `created_at` are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash: password_hash.into(),
            is_staff: false,
        }
    }

    pub fn staff(mut self) -> Self {
        self.is_staff = true;
        self
    }
}

/// The authenticated identity behind a request.
///
/// Anonymous requests carry no viewer at all (`Option<&Viewer>` is `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

impl Viewer {
    pub fn is(&self, user_id: i64) -> bool {
        self.id == user_id
    }
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
        }
    }
}
