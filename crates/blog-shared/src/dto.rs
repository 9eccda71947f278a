//! Data Transfer Objects - request types for the API.

use serde::{Deserialize, Serialize};

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `?page=` on paginated listings. Kept as text: anything unparsable means page 1.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// `?next=` on the login route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

impl LoginQuery {
    /// Where to go after a successful login. Only local paths are honoured.
    pub fn safe_next(&self) -> Option<&str> {
        self.next
            .as_deref()
            .filter(|next| next.starts_with('/') && !next.starts_with("//"))
    }
}
