//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod user;

pub use category::{Category, NewCategory};
pub use comment::{Comment, CommentEntry, NewComment};
pub use location::{Location, NewLocation};
pub use post::{NewPost, Post, PostEntry};
pub use user::{NewUser, User, Viewer};
