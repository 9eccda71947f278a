//! Visibility and authorization predicates.
//!
//! Both take already-resolved entities; nothing here touches storage.

mod authorization;
mod visibility;

pub use authorization::{Guarded, can_modify};
pub use visibility::{is_category_listable, is_comment_visible, is_post_visible};
