//! Request orchestration.
//!
//! Each operation is one route of the site: resolve the entities it names, check
//! visibility or authorization against them, validate input, then persist and say
//! where to go next. Rendering and HTTP are left to the caller.

/// Unwraps the viewer or returns `LoginRequired` for `route`.
macro_rules! require_viewer {
    ($viewer:expr, $route:expr) => {
        match $viewer {
            Some(viewer) => viewer,
            None => {
                tracing::debug!(route = %$route, "Anonymous viewer sent to login");
                return Ok($crate::service::Outcome::LoginRequired($route.login_then()));
            }
        }
    };
}

mod accounts;
mod catalog;
mod comments;
mod posts;
mod profiles;

use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::domain::{Category, Comment, CommentEntry, Location, PostEntry, User};
use crate::forms::{CommentForm, PostForm, ValidationErrors};
use crate::pagination::Page;
use crate::ports::Repositories;
use crate::routes::Route;

pub use accounts::{AccountService, IssuedToken};

/// What the caller should do with a request that may show or accept a form.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Show the page.
    Render(T),
    /// Show the page again with the submitted values and their errors.
    Invalid(T),
    /// Go elsewhere: the next page after a write, or the resource itself when the
    /// viewer may not mutate it.
    Redirect(Route),
    /// Anonymous viewer on a route that needs an account; holds the login route.
    LoginRequired(Route),
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Render(page) => Outcome::Render(f(page)),
            Outcome::Invalid(page) => Outcome::Invalid(f(page)),
            Outcome::Redirect(route) => Outcome::Redirect(route),
            Outcome::LoginRequired(route) => Outcome::LoginRequired(route),
        }
    }
}

/// Front page feed.
#[derive(Debug, Clone, Serialize)]
pub struct IndexPage {
    pub posts: Vec<PostEntry>,
}

/// A post with its comments and a blank comment form.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetailPage {
    pub post: PostEntry,
    /// False when only the author can currently see the post.
    pub is_publicly_visible: bool,
    pub can_edit: bool,
    pub comments: Vec<CommentEntry>,
    pub comment_form: CommentForm,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPage {
    pub category: Category,
    pub page: Page<PostEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    pub profile: User,
    pub is_owner: bool,
    pub page: Page<PostEntry>,
}

/// Post create/edit form with the choices it offers.
#[derive(Debug, Clone, Serialize)]
pub struct PostEditor {
    pub post_id: Option<i64>,
    pub form: PostForm,
    pub errors: ValidationErrors,
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
}

/// Delete confirmation. Deliberately carries no comment form.
#[derive(Debug, Clone, Serialize)]
pub struct PostDeletePage {
    pub post: PostEntry,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentEditor {
    pub post_id: i64,
    pub comment_id: Option<i64>,
    pub form: CommentForm,
    pub errors: ValidationErrors,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentDeletePage {
    pub post_id: i64,
    pub comment: Comment,
}

/// A plain form and its errors.
#[derive(Debug, Clone, Serialize)]
pub struct FormPage<F> {
    pub form: F,
    pub errors: ValidationErrors,
}

impl<F> FormPage<F> {
    pub fn blank(form: F) -> Self {
        Self {
            form,
            errors: ValidationErrors::new(),
        }
    }

    pub fn rejected(form: F, errors: ValidationErrors) -> Self {
        Self { form, errors }
    }
}

/// Staff listing of catalogue entries with a creation form.
#[derive(Debug, Clone, Serialize)]
pub struct ManagePage<T, F> {
    pub items: Vec<T>,
    pub form: F,
    pub errors: ValidationErrors,
}

/// The blog's read and write flows over a set of repositories.
pub struct BlogService {
    repos: Repositories,
    utc_offset: FixedOffset,
}

impl BlogService {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            utc_offset: Utc.fix(),
        }
    }

    /// Offset used to read and pre-fill local `pub_date` inputs.
    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }
}
