//! End-to-end flows through `BlogService` over the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};

use blog_core::domain::{NewCategory, NewComment, NewPost, NewUser, Post, Viewer};
use blog_core::forms::{CategoryForm, CommentForm, PostForm, ProfileForm};
use blog_core::ports::Repositories;
use blog_core::{BlogService, DomainError, Outcome, Route};
use blog_infra::InMemoryStore;

struct World {
    blog: BlogService,
    repos: Repositories,
    author: Viewer,
    reader: Viewer,
    staff: Viewer,
}

async fn world() -> World {
    let store = Arc::new(InMemoryStore::new());
    let repos = store.repositories();
    let blog = BlogService::new(repos.clone());

    let author = repos.users.create(NewUser::new("author", "x")).await.unwrap();
    let reader = repos.users.create(NewUser::new("reader", "x")).await.unwrap();
    let staff = repos
        .users
        .create(NewUser::new("editor", "x").staff())
        .await
        .unwrap();

    World {
        blog,
        repos,
        author: Viewer::from(&author),
        reader: Viewer::from(&reader),
        staff: Viewer::from(&staff),
    }
}

impl World {
    async fn post(&self, author: &Viewer, build: impl FnOnce(&mut NewPost)) -> Post {
        let mut new = NewPost {
            title: "A day at the lake".to_string(),
            text: "Water was cold.".to_string(),
            pub_date: Utc::now() - Duration::hours(1),
            is_published: true,
            image: None,
            author_id: author.id,
            location_id: None,
            category_id: None,
        };
        build(&mut new);
        self.repos.posts.create(new).await.unwrap()
    }

    async fn category(&self, slug: &str, is_published: bool) -> i64 {
        self.repos
            .categories
            .create(NewCategory {
                title: slug.to_uppercase(),
                description: "About things".to_string(),
                slug: slug.to_string(),
                is_published,
            })
            .await
            .unwrap()
            .id
    }
}

fn post_form(title: &str) -> PostForm {
    PostForm {
        title: title.to_string(),
        text: "Body".to_string(),
        pub_date: "2024-01-05T10:30".to_string(),
        ..PostForm::default()
    }
}

fn is_not_found<T>(result: &Result<T, DomainError>) -> bool {
    matches!(result, Err(DomainError::NotFound { .. }))
}

#[tokio::test]
async fn test_index_shows_at_most_five_public_posts_newest_first() {
    let w = world().await;
    let hidden = w.category("hidden", false).await;
    for hours in 1..=7 {
        w.post(&w.author, |p| p.pub_date = Utc::now() - Duration::hours(hours))
            .await;
    }
    w.post(&w.author, |p| p.is_published = false).await;
    w.post(&w.author, |p| p.pub_date = Utc::now() + Duration::days(1))
        .await;
    w.post(&w.author, |p| p.category_id = Some(hidden)).await;

    let page = w.blog.index().await.unwrap();

    assert_eq!(page.posts.len(), 5);
    assert!(
        page.posts
            .windows(2)
            .all(|pair| pair[0].post.pub_date >= pair[1].post.pub_date)
    );
    assert!(page.posts.iter().all(|entry| {
        entry.post.is_published
            && entry.post.pub_date <= Utc::now()
            && entry.post.category_id != Some(hidden)
    }));
}

#[tokio::test]
async fn test_unpublished_post_is_missing_for_anonymous_viewers() {
    let w = world().await;
    let post = w.post(&w.author, |p| p.is_published = false).await;

    let result = w.blog.post_detail(post.id, None).await;

    assert!(is_not_found(&result));
}

#[tokio::test]
async fn test_author_sees_own_future_draft() {
    let w = world().await;
    let post = w
        .post(&w.author, |p| {
            p.is_published = false;
            p.pub_date = Utc::now() + Duration::days(3);
        })
        .await;

    let page = w.blog.post_detail(post.id, Some(&w.author)).await.unwrap();
    assert!(!page.is_publicly_visible);
    assert!(page.can_edit);
    assert!(page.comment_form.text.is_empty());

    let result = w.blog.post_detail(post.id, Some(&w.reader)).await;
    assert!(is_not_found(&result));
}

#[tokio::test]
async fn test_detail_hides_others_unpublished_comments() {
    let w = world().await;
    let post = w.post(&w.author, |_| {}).await;
    let mut hidden = w
        .repos
        .comments
        .create(NewComment {
            post_id: post.id,
            author_id: w.reader.id,
            text: "Pending".to_string(),
        })
        .await
        .unwrap();
    hidden.is_published = false;
    w.repos.comments.update(hidden).await.unwrap();

    let anonymous = w.blog.post_detail(post.id, None).await.unwrap();
    let own = w.blog.post_detail(post.id, Some(&w.reader)).await.unwrap();

    assert!(anonymous.comments.is_empty());
    assert_eq!(own.comments.len(), 1);
}

#[tokio::test]
async fn test_non_author_delete_redirects_to_detail_and_keeps_post() {
    let w = world().await;
    let post = w.post(&w.author, |_| {}).await;

    let outcome = w.blog.delete_post(Some(&w.reader), post.id).await.unwrap();

    assert!(matches!(outcome, Outcome::Redirect(Route::PostDetail(id)) if id == post.id));
    assert!(w.repos.posts.find_by_id(post.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_author_delete_redirects_to_profile_and_cascades_comments() {
    let w = world().await;
    let post = w.post(&w.author, |_| {}).await;
    let comment = w
        .repos
        .comments
        .create(NewComment {
            post_id: post.id,
            author_id: w.reader.id,
            text: "Nice".to_string(),
        })
        .await
        .unwrap();

    let outcome = w.blog.delete_post(Some(&w.author), post.id).await.unwrap();

    assert!(matches!(outcome, Outcome::Redirect(Route::Profile(ref name)) if name == "author"));
    assert!(w.repos.posts.find_by_id(post.id).await.unwrap().is_none());
    assert!(w.repos.comments.find_by_id(comment.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_page_has_no_comment_form() {
    let w = world().await;
    let post = w.post(&w.author, |_| {}).await;

    let outcome = w
        .blog
        .delete_post_page(Some(&w.author), post.id)
        .await
        .unwrap();

    let Outcome::Render(page) = outcome else {
        panic!("expected the confirmation page");
    };
    let json = serde_json::to_value(&page).unwrap();
    assert!(json.get("comment_form").is_none());
    assert_eq!(json["post"]["id"], post.id);
}

#[tokio::test]
async fn test_staff_may_edit_someone_elses_post() {
    let w = world().await;
    let post = w.post(&w.author, |_| {}).await;

    let outcome = w
        .blog
        .edit_post(Some(&w.staff), post.id, post_form("Moderated"))
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Redirect(Route::PostDetail(id)) if id == post.id));
    let stored = w.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Moderated");
    assert_eq!(stored.author_id, w.author.id);
    assert!(stored.is_published);
}

#[tokio::test]
async fn test_editing_a_missing_post_is_not_found() {
    let w = world().await;

    let result = w.blog.edit_post_page(Some(&w.author), 404).await;

    assert!(is_not_found(&result));
}

#[tokio::test]
async fn test_hidden_post_mutation_looks_like_a_missing_post() {
    let w = world().await;
    let hidden_category = w.category("hidden", false).await;
    let draft = w.post(&w.author, |p| p.is_published = false).await;
    let future = w
        .post(&w.author, |p| p.pub_date = Utc::now() + Duration::days(3))
        .await;
    let in_hidden_category = w
        .post(&w.author, |p| p.category_id = Some(hidden_category))
        .await;

    assert!(is_not_found(&w.blog.edit_post_page(Some(&w.reader), 999).await));
    for id in [draft.id, future.id, in_hidden_category.id] {
        assert!(is_not_found(&w.blog.edit_post_page(Some(&w.reader), id).await));
        assert!(is_not_found(
            &w.blog.edit_post(Some(&w.reader), id, post_form("Mine now")).await
        ));
        assert!(is_not_found(&w.blog.delete_post_page(Some(&w.reader), id).await));
        assert!(is_not_found(&w.blog.delete_post(Some(&w.reader), id).await));
        assert!(w.repos.posts.find_by_id(id).await.unwrap().is_some());
    }

    // Staff may still moderate what the public cannot see.
    let outcome = w
        .blog
        .edit_post_page(Some(&w.staff), draft.id)
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Render(_)));
}

#[tokio::test]
async fn test_comment_mutation_under_a_hidden_post_is_not_found() {
    let w = world().await;
    let post = w.post(&w.author, |_| {}).await;
    let comment = w
        .repos
        .comments
        .create(NewComment {
            post_id: post.id,
            author_id: w.reader.id,
            text: "Before it was hidden".to_string(),
        })
        .await
        .unwrap();

    let mut unpublished = w.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    unpublished.is_published = false;
    w.repos.posts.update(unpublished).await.unwrap();

    let result = w
        .blog
        .edit_comment_page(Some(&w.reader), post.id, comment.id)
        .await;
    assert!(is_not_found(&result));
    let result = w
        .blog
        .delete_comment(Some(&w.reader), post.id, comment.id)
        .await;
    assert!(is_not_found(&result));
    assert!(w.repos.comments.find_by_id(comment.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_strangers_cannot_reach_unpublished_comments() {
    let w = world().await;
    let post = w.post(&w.author, |_| {}).await;
    let mut pending = w
        .repos
        .comments
        .create(NewComment {
            post_id: post.id,
            author_id: w.reader.id,
            text: "Pending".to_string(),
        })
        .await
        .unwrap();
    pending.is_published = false;
    let pending = w.repos.comments.update(pending).await.unwrap();

    let result = w
        .blog
        .delete_comment_page(Some(&w.author), post.id, pending.id)
        .await;

    assert!(is_not_found(&result));
}

#[tokio::test]
async fn test_anonymous_writers_are_sent_to_login() {
    let w = world().await;
    let post = w.post(&w.author, |_| {}).await;

    let create = w.blog.create_post(None, post_form("Sneaky")).await.unwrap();
    let comment = w
        .blog
        .add_comment(None, post.id, CommentForm { text: "hi".into() })
        .await
        .unwrap();

    let Outcome::LoginRequired(route) = create else {
        panic!("expected a login redirect");
    };
    assert_eq!(route.to_string(), "/auth/login/?next=/posts/create/");
    assert!(matches!(comment, Outcome::LoginRequired(_)));
    assert!(
        w.repos
            .comments
            .list_for_post(post.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_create_post_redirects_to_author_profile() {
    let w = world().await;
    let category = w.category("travel", true).await;
    let form = PostForm {
        category: Some(category.to_string()),
        ..post_form("Harbour walk")
    };

    let outcome = w.blog.create_post(Some(&w.author), form).await.unwrap();

    assert!(matches!(outcome, Outcome::Redirect(Route::Profile(ref name)) if name == "author"));
    let page = w
        .blog
        .category_posts("travel", None, None)
        .await
        .unwrap();
    assert_eq!(page.page.total, 1);
    assert_eq!(page.page.items[0].post.title, "Harbour walk");
}

#[tokio::test]
async fn test_create_post_with_unknown_category_is_invalid() {
    let w = world().await;
    let form = PostForm {
        category: Some("999".to_string()),
        ..post_form("Nowhere")
    };

    let outcome = w.blog.create_post(Some(&w.author), form).await.unwrap();

    let Outcome::Invalid(editor) = outcome else {
        panic!("expected the form back");
    };
    assert!(editor.errors.has("category"));
    assert_eq!(editor.form.title, "Nowhere");
}

#[tokio::test]
async fn test_overlong_comment_is_rejected_and_not_stored() {
    let w = world().await;
    let post = w.post(&w.author, |_| {}).await;
    let form = CommentForm {
        text: "x".repeat(1001),
    };

    let outcome = w
        .blog
        .add_comment(Some(&w.reader), post.id, form)
        .await
        .unwrap();

    let Outcome::Invalid(editor) = outcome else {
        panic!("expected the form back");
    };
    assert!(editor.errors.has("text"));
    assert!(
        w.repos
            .comments
            .list_for_post(post.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_comment_on_invisible_post_is_not_found() {
    let w = world().await;
    let post = w.post(&w.author, |p| p.is_published = false).await;

    let result = w
        .blog
        .add_comment(Some(&w.reader), post.id, CommentForm { text: "hi".into() })
        .await;

    assert!(is_not_found(&result));
}

#[tokio::test]
async fn test_comment_edit_flows() {
    let w = world().await;
    let post = w.post(&w.author, |_| {}).await;
    let other = w.post(&w.author, |_| {}).await;
    let outcome = w
        .blog
        .add_comment(Some(&w.reader), post.id, CommentForm { text: "First".into() })
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Redirect(Route::PostDetail(id)) if id == post.id));
    let comment_id = w.repos.comments.list_for_post(post.id).await.unwrap()[0]
        .comment
        .id;

    // Addressed through the wrong post.
    let wrong_post = w
        .blog
        .edit_comment_page(Some(&w.reader), other.id, comment_id)
        .await;
    assert!(is_not_found(&wrong_post));

    // Even the post author cannot touch someone else's comment.
    let by_author = w
        .blog
        .delete_comment(Some(&w.author), post.id, comment_id)
        .await
        .unwrap();
    assert!(matches!(by_author, Outcome::Redirect(Route::PostDetail(_))));
    assert!(w.repos.comments.find_by_id(comment_id).await.unwrap().is_some());

    let edited = w
        .blog
        .edit_comment(
            Some(&w.reader),
            post.id,
            comment_id,
            CommentForm {
                text: "Second".into(),
            },
        )
        .await
        .unwrap();
    assert!(matches!(edited, Outcome::Redirect(_)));
    let stored = w.repos.comments.find_by_id(comment_id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Second");

    w.blog
        .delete_comment(Some(&w.reader), post.id, comment_id)
        .await
        .unwrap();
    assert!(w.repos.comments.find_by_id(comment_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unpublished_category_is_not_found() {
    let w = world().await;
    w.category("drafts", false).await;

    let result = w.blog.category_posts("drafts", None, Some(&w.author)).await;

    assert!(is_not_found(&result));
}

#[tokio::test]
async fn test_category_page_includes_viewers_own_drafts() {
    let w = world().await;
    let travel = w.category("travel", true).await;
    w.post(&w.author, |p| p.category_id = Some(travel)).await;
    w.post(&w.author, |p| {
        p.category_id = Some(travel);
        p.is_published = false;
    })
    .await;

    let anonymous = w.blog.category_posts("travel", None, None).await.unwrap();
    let owner = w
        .blog
        .category_posts("travel", None, Some(&w.author))
        .await
        .unwrap();

    assert_eq!(anonymous.page.total, 1);
    assert_eq!(owner.page.total, 2);
}

#[tokio::test]
async fn test_deleting_category_keeps_posts_without_category() {
    let w = world().await;
    let travel = w.category("travel", true).await;
    let post = w.post(&w.author, |p| p.category_id = Some(travel)).await;

    let outcome = w
        .blog
        .delete_category(Some(&w.staff), "travel")
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Redirect(Route::ManageCategories)));
    let stored = w.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.category_id, None);
}

#[tokio::test]
async fn test_category_management_is_staff_only() {
    let w = world().await;
    let form = CategoryForm {
        title: "Food".into(),
        description: "Eating".into(),
        slug: "food".into(),
        is_published: None,
    };

    let denied = w
        .blog
        .create_category(Some(&w.reader), form.clone())
        .await
        .unwrap();
    assert!(matches!(denied, Outcome::Redirect(Route::Index)));

    let created = w
        .blog
        .create_category(Some(&w.staff), form.clone())
        .await
        .unwrap();
    assert!(matches!(created, Outcome::Redirect(Route::ManageCategories)));

    let duplicate = w.blog.create_category(Some(&w.staff), form).await.unwrap();
    let Outcome::Invalid(page) = duplicate else {
        panic!("expected the form back");
    };
    assert!(page.errors.has("slug"));
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn test_profile_paginates_and_owner_sees_everything() {
    let w = world().await;
    for hours in 1..=12 {
        w.post(&w.author, |p| p.pub_date = Utc::now() - Duration::hours(hours))
            .await;
    }
    w.post(&w.author, |p| p.is_published = false).await;

    let public = w.blog.profile("author", None, None).await.unwrap();
    assert!(!public.is_owner);
    assert_eq!(public.page.total, 12);
    assert_eq!(public.page.items.len(), 10);
    assert!(public.page.has_next);

    let last = w.blog.profile("author", Some("99"), None).await.unwrap();
    assert_eq!(last.page.number, 2);
    assert_eq!(last.page.items.len(), 2);

    let garbage = w.blog.profile("author", Some("abc"), None).await.unwrap();
    assert_eq!(garbage.page.number, 1);

    let own = w
        .blog
        .profile("author", Some("2"), Some(&w.author))
        .await
        .unwrap();
    assert!(own.is_owner);
    assert_eq!(own.page.total, 13);
    assert_eq!(own.page.items.len(), 3);
}

#[tokio::test]
async fn test_unknown_profile_is_not_found() {
    let w = world().await;

    assert!(is_not_found(&w.blog.profile("ghost", None, None).await));
}

#[tokio::test]
async fn test_edit_profile_rejects_taken_username() {
    let w = world().await;
    let form = ProfileForm {
        username: "reader".into(),
        ..ProfileForm::default()
    };

    let outcome = w.blog.edit_profile(Some(&w.author), form).await.unwrap();

    let Outcome::Invalid(page) = outcome else {
        panic!("expected the form back");
    };
    assert!(page.errors.has("username"));
}

#[tokio::test]
async fn test_edit_profile_renames_and_redirects() {
    let w = world().await;
    let form = ProfileForm {
        username: "writer".into(),
        first_name: "Ada".into(),
        ..ProfileForm::default()
    };

    let outcome = w.blog.edit_profile(Some(&w.author), form).await.unwrap();

    assert!(matches!(outcome, Outcome::Redirect(Route::Profile(ref name)) if name == "writer"));
    let user = w.repos.users.find_by_id(w.author.id).await.unwrap().unwrap();
    assert_eq!(user.first_name, "Ada");
}

#[cfg(feature = "auth")]
mod accounts {
    use super::*;
    use blog_core::AccountService;
    use blog_core::forms::RegistrationForm;
    use blog_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};

    fn accounts(repos: &Repositories) -> AccountService {
        AccountService::new(
            repos.users.clone(),
            Arc::new(Argon2PasswordService::new()),
            Arc::new(JwtTokenService::new(JwtConfig::default())),
        )
    }

    #[tokio::test]
    async fn test_register_then_login_yields_a_usable_token() {
        let w = world().await;
        let accounts = accounts(&w.repos);
        let form = RegistrationForm {
            username: "newcomer".into(),
            password1: "long enough".into(),
            password2: "long enough".into(),
        };

        let outcome = accounts.register(form).await.unwrap();
        assert!(matches!(outcome, Outcome::Redirect(Route::Login { next: None })));

        let issued = accounts.login("newcomer", "long enough").await.unwrap();
        let viewer = accounts
            .viewer_from_token(&issued.access_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(viewer.username, "newcomer");
        assert!(!viewer.is_staff);
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let w = world().await;
        let accounts = accounts(&w.repos);
        accounts
            .register(RegistrationForm {
                username: "newcomer".into(),
                password1: "long enough".into(),
                password2: "long enough".into(),
            })
            .await
            .unwrap();

        let result = accounts.login("newcomer", "not it").await;

        assert!(matches!(result, Err(DomainError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_invalid() {
        let w = world().await;
        let accounts = accounts(&w.repos);

        let outcome = accounts
            .register(RegistrationForm {
                username: "author".into(),
                password1: "long enough".into(),
                password2: "long enough".into(),
            })
            .await
            .unwrap();

        let Outcome::Invalid(page) = outcome else {
            panic!("expected the form back");
        };
        assert!(page.errors.has("username"));
    }

    #[tokio::test]
    async fn test_garbage_token_means_anonymous() {
        let store = Arc::new(InMemoryStore::new());
        let accounts = accounts(&store.repositories());

        assert!(accounts.viewer_from_token("garbage").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ensure_staff_creates_an_account_that_manages_the_catalogue() {
        let w = world().await;
        let accounts = accounts(&w.repos);

        let admin = accounts.ensure_staff("admin", "admin password").await.unwrap();
        assert!(admin.is_staff);

        let issued = accounts.login("admin", "admin password").await.unwrap();
        let viewer = accounts
            .viewer_from_token(&issued.access_token)
            .await
            .unwrap()
            .unwrap();
        assert!(viewer.is_staff);

        let outcome = w
            .blog
            .create_category(
                Some(&viewer),
                CategoryForm {
                    title: "Travel".into(),
                    description: "Trips".into(),
                    slug: "travel".into(),
                    is_published: None,
                },
            )
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Redirect(Route::ManageCategories)));

        // Running it again at the next startup is a no-op.
        let again = accounts.ensure_staff("admin", "admin password").await.unwrap();
        assert_eq!(again.id, admin.id);
    }

    #[tokio::test]
    async fn test_ensure_staff_promotes_an_existing_user() {
        let w = world().await;
        let accounts = accounts(&w.repos);

        let promoted = accounts.ensure_staff("reader", "").await.unwrap();

        assert_eq!(promoted.id, w.reader.id);
        assert!(promoted.is_staff);
        let stored = w.repos.users.find_by_id(w.reader.id).await.unwrap().unwrap();
        assert!(stored.is_staff);
        assert_eq!(stored.password_hash, "x");
    }

    #[tokio::test]
    async fn test_ensure_staff_needs_a_password_for_a_new_account() {
        let w = world().await;
        let accounts = accounts(&w.repos);

        let result = accounts.ensure_staff("nobody", "").await;

        assert!(matches!(result, Err(DomainError::Internal(_))));
        assert!(w.repos.users.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_demoted_staff_loses_the_override_with_an_old_token() {
        let w = world().await;
        let accounts = accounts(&w.repos);
        let admin = accounts.ensure_staff("admin", "admin password").await.unwrap();
        let token = accounts
            .login("admin", "admin password")
            .await
            .unwrap()
            .access_token;
        let post = w.post(&w.author, |_| {}).await;

        let mut demoted = admin;
        demoted.is_staff = false;
        w.repos.users.update(demoted).await.unwrap();

        let viewer = accounts.viewer_from_token(&token).await.unwrap().unwrap();
        assert!(!viewer.is_staff);
        let outcome = w
            .blog
            .edit_post(Some(&viewer), post.id, post_form("Hijacked"))
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Redirect(Route::PostDetail(_))));
        let stored = w.repos.posts.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "A day at the lake");
    }

    #[tokio::test]
    async fn test_token_of_deleted_user_is_anonymous() {
        let w = world().await;
        let accounts = accounts(&w.repos);
        let user = accounts.ensure_staff("temp", "temp password").await.unwrap();
        let token = accounts
            .login("temp", "temp password")
            .await
            .unwrap()
            .access_token;

        w.repos.users.delete(user.id).await.unwrap();

        assert!(accounts.viewer_from_token(&token).await.unwrap().is_none());
    }
}
