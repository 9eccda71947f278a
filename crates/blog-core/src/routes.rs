//! The site's routing table, used to build redirect targets.

use std::fmt;

/// A page of the site. `Display` yields its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    CreatePost,
    PostDetail(i64),
    EditPost(i64),
    DeletePost(i64),
    Category(String),
    EditProfile,
    Profile(String),
    AddComment(i64),
    EditComment { post_id: i64, comment_id: i64 },
    DeleteComment { post_id: i64, comment_id: i64 },
    Login { next: Option<Box<Route>> },
    Registration,
    ManageCategories,
    ManageLocations,
}

impl Route {
    /// Login page that sends the user back to `self` afterwards.
    pub fn login_then(self) -> Route {
        Route::Login {
            next: Some(Box::new(self)),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Index => write!(f, "/"),
            Route::CreatePost => write!(f, "/posts/create/"),
            Route::PostDetail(id) => write!(f, "/posts/{id}/"),
            Route::EditPost(id) => write!(f, "/posts/{id}/edit/"),
            Route::DeletePost(id) => write!(f, "/posts/{id}/delete/"),
            Route::Category(slug) => write!(f, "/category/{slug}/"),
            Route::EditProfile => write!(f, "/profile/edit/"),
            Route::Profile(username) => write!(f, "/profile/{username}/"),
            Route::AddComment(post_id) => write!(f, "/posts/{post_id}/comment/"),
            Route::EditComment {
                post_id,
                comment_id,
            } => write!(f, "/posts/{post_id}/edit_comment/{comment_id}/"),
            Route::DeleteComment {
                post_id,
                comment_id,
            } => write!(f, "/posts/{post_id}/delete_comment/{comment_id}/"),
            Route::Login { next: None } => write!(f, "/auth/login/"),
            // Paths only contain URL-safe characters apart from '/', which is legal in a query.
            Route::Login { next: Some(next) } => write!(f, "/auth/login/?next={next}"),
            Route::Registration => write!(f, "/auth/registration/"),
            Route::ManageCategories => write!(f, "/manage/categories/"),
            Route::ManageLocations => write!(f, "/manage/locations/"),
        }
    }
}
