use chrono::{DateTime, Utc};

use crate::domain::{Category, Comment, PostEntry, Viewer};

/// Whether `viewer` may see `entry` at `now`.
///
/// Authors always see their own posts. Everyone else sees a post only once it is
/// published, its `pub_date` has passed and its category (if any) is published.
pub fn is_post_visible(entry: &PostEntry, viewer: Option<&Viewer>, now: DateTime<Utc>) -> bool {
    if viewer.is_some_and(|v| v.is(entry.post.author_id)) {
        return true;
    }
    entry.post.is_published
        && entry.post.pub_date <= now
        && entry.category.as_ref().is_none_or(|c| c.is_published)
}

/// Whether a category's listing page exists at all.
pub fn is_category_listable(category: &Category) -> bool {
    category.is_published
}

/// Unpublished comments are only shown to their author.
pub fn is_comment_visible(comment: &Comment, viewer: Option<&Viewer>) -> bool {
    comment.is_published || viewer.is_some_and(|v| v.is(comment.author_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Post;
    use chrono::Duration;

    fn category(is_published: bool) -> Category {
        Category {
            id: 7,
            title: "Travel".to_string(),
            description: "Trips".to_string(),
            slug: "travel".to_string(),
            is_published,
            created_at: Utc::now(),
        }
    }

    fn entry(is_published: bool, offset: Duration, category: Option<Category>) -> PostEntry {
        let now = Utc::now();
        PostEntry {
            post: Post {
                id: 1,
                title: "Title".to_string(),
                text: "Text".to_string(),
                pub_date: now + offset,
                is_published,
                image: None,
                author_id: 10,
                location_id: None,
                category_id: category.as_ref().map(|c| c.id),
                created_at: now,
            },
            author_username: "author".to_string(),
            category,
            location: None,
            comment_count: 0,
        }
    }

    fn viewer(id: i64, is_staff: bool) -> Viewer {
        Viewer {
            id,
            username: format!("user{id}"),
            is_staff,
        }
    }

    #[test]
    fn test_published_past_post_is_public() {
        let post = entry(true, -Duration::hours(1), Some(category(true)));
        assert!(is_post_visible(&post, None, Utc::now()));
        assert!(is_post_visible(&post, Some(&viewer(11, false)), Utc::now()));
    }

    #[test]
    fn test_post_without_category_is_public() {
        let post = entry(true, -Duration::hours(1), None);
        assert!(is_post_visible(&post, None, Utc::now()));
    }

    #[test]
    fn test_hidden_posts_for_strangers() {
        let now = Utc::now();
        let stranger = viewer(11, false);
        let cases = [
            entry(false, -Duration::hours(1), None),
            entry(true, Duration::hours(1), None),
            entry(true, -Duration::hours(1), Some(category(false))),
        ];
        for post in &cases {
            assert!(!is_post_visible(post, None, now));
            assert!(!is_post_visible(post, Some(&stranger), now));
        }
    }

    #[test]
    fn test_staff_gets_no_visibility_override() {
        let post = entry(false, -Duration::hours(1), None);
        assert!(!is_post_visible(&post, Some(&viewer(11, true)), Utc::now()));
    }

    #[test]
    fn test_author_always_sees_own_post() {
        let author = viewer(10, false);
        let post = entry(false, Duration::days(3), Some(category(false)));
        assert!(is_post_visible(&post, Some(&author), Utc::now()));
    }

    #[test]
    fn test_comment_visibility() {
        let mut comment = Comment {
            id: 1,
            post_id: 1,
            author_id: 10,
            text: "hi".to_string(),
            is_published: true,
            created_at: Utc::now(),
        };
        assert!(is_comment_visible(&comment, None));

        comment.is_published = false;
        assert!(!is_comment_visible(&comment, None));
        assert!(!is_comment_visible(&comment, Some(&viewer(11, true))));
        assert!(is_comment_visible(&comment, Some(&viewer(10, false))));
    }

    #[test]
    fn test_category_listable() {
        assert!(is_category_listable(&category(true)));
        assert!(!is_category_listable(&category(false)));
    }
}
