//! Submitted form payloads and their field-level validation.
//!
//! Every form keeps the raw submitted strings so it can be redisplayed as-is, and
//! `clean` turns it into typed values or a full set of per-field errors.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{NewCategory, NewLocation, Post, User};

pub const TITLE_MAX_CHARS: usize = 256;
pub const COMMENT_MAX_CHARS: usize = 1000;
pub const USERNAME_MAX_CHARS: usize = 150;
pub const NAME_MAX_CHARS: usize = 150;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const IMAGE_MAX_CHARS: usize = 100;
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Format used to pre-fill the `pub_date` input.
pub const PUB_DATE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

const PUB_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

const REQUIRED: &str = "This field is required.";
const INVALID_CHOICE: &str = "Select a valid choice.";

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid regex"));
static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

/// Field name to messages. Empty means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("invalid form: {} field(s) rejected", .0.len())]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

fn required(errors: &mut ValidationErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
        return false;
    }
    true
}

fn max_chars(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn choice(errors: &mut ValidationErrors, field: &str, value: &Option<String>) -> Option<i64> {
    let raw = blank_to_none(value)?;
    match raw.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

fn flag(errors: &mut ValidationErrors, field: &str, value: &Option<String>) -> Option<bool> {
    match blank_to_none(value)?.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => {
            errors.add(field, "Enter a valid boolean.");
            None
        }
    }
}

/// Parse a local date-time input in the site's offset.
pub fn parse_pub_date(value: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let value = value.trim();
    PUB_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|local| local.with_timezone(&Utc))
}

/// Render a stored `pub_date` for the date-time input.
pub fn format_pub_date(pub_date: DateTime<Utc>, offset: FixedOffset) -> String {
    pub_date
        .with_timezone(&offset)
        .format(PUB_DATE_INPUT_FORMAT)
        .to_string()
}

/// Post create/edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub location: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    /// Absent leaves the current state alone (new posts are published).
    pub is_published: Option<String>,
}

/// Typed values of a valid [`PostForm`].
#[derive(Debug, Clone, PartialEq)]
pub struct CleanPost {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
    pub is_published: Option<bool>,
}

impl PostForm {
    /// Pre-fill from a stored post.
    pub fn from_post(post: &Post, offset: FixedOffset) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: format_pub_date(post.pub_date, offset),
            location: post.location_id.map(|id| id.to_string()),
            category: post.category_id.map(|id| id.to_string()),
            image: post.image.clone(),
            is_published: Some(post.is_published.to_string()),
        }
    }

    pub fn clean(&self, offset: FixedOffset) -> Result<CleanPost, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if required(&mut errors, "title", &self.title) {
            max_chars(&mut errors, "title", &self.title, TITLE_MAX_CHARS);
        }
        required(&mut errors, "text", &self.text);

        let pub_date = if required(&mut errors, "pub_date", &self.pub_date) {
            let parsed = parse_pub_date(&self.pub_date, offset);
            if parsed.is_none() {
                errors.add("pub_date", "Enter a valid date/time.");
            }
            parsed
        } else {
            None
        };

        let location_id = choice(&mut errors, "location", &self.location);
        let category_id = choice(&mut errors, "category", &self.category);
        let image = blank_to_none(&self.image).map(str::to_string);
        if let Some(image) = &image {
            max_chars(&mut errors, "image", image, IMAGE_MAX_CHARS);
        }
        let is_published = flag(&mut errors, "is_published", &self.is_published);

        match pub_date {
            Some(pub_date) => errors.finish(|| CleanPost {
                title: self.title.trim().to_string(),
                text: self.text.clone(),
                pub_date,
                location_id,
                category_id,
                image,
                is_published,
            }),
            None => Err(errors),
        }
    }
}

/// Comment create/edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if required(&mut errors, "text", &self.text) {
            max_chars(&mut errors, "text", &self.text, COMMENT_MAX_CHARS);
        }
        errors.finish(|| self.text.clone())
    }
}

/// Own-profile edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

fn check_username(errors: &mut ValidationErrors, username: &str) {
    if !required(errors, "username", username) {
        return;
    }
    max_chars(errors, "username", username, USERNAME_MAX_CHARS);
    if !USERNAME_RE.is_match(username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

impl ProfileForm {
    /// Apply the submitted values to `user`. Uniqueness of the username is checked
    /// against storage by the caller.
    pub fn clean(&self, user: &User) -> Result<User, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let username = self.username.trim();
        let email = self.email.trim();

        check_username(&mut errors, username);
        max_chars(&mut errors, "first_name", &self.first_name, NAME_MAX_CHARS);
        max_chars(&mut errors, "last_name", &self.last_name, NAME_MAX_CHARS);
        if !email.is_empty() {
            max_chars(&mut errors, "email", email, EMAIL_MAX_CHARS);
            if !EMAIL_RE.is_match(email) {
                errors.add("email", "Enter a valid email address.");
            }
        }

        errors.finish(|| User {
            username: username.to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: email.to_string(),
            ..user.clone()
        })
    }
}

/// Account registration form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

impl RegistrationForm {
    /// Returns the username and the plain password to hash.
    pub fn clean(&self) -> Result<(String, String), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let username = self.username.trim();
        check_username(&mut errors, username);

        if required(&mut errors, "password1", &self.password1)
            && self.password1.chars().count() < PASSWORD_MIN_CHARS
        {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {PASSWORD_MIN_CHARS} characters."),
            );
        }
        if required(&mut errors, "password2", &self.password2) && self.password1 != self.password2
        {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.finish(|| (username.to_string(), self.password1.clone()))
    }
}

/// Staff-only category form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: Option<String>,
}

impl CategoryForm {
    pub fn clean(&self) -> Result<NewCategory, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if required(&mut errors, "title", &self.title) {
            max_chars(&mut errors, "title", &self.title, TITLE_MAX_CHARS);
        }
        required(&mut errors, "description", &self.description);
        let slug = self.slug.trim();
        if required(&mut errors, "slug", slug) && !SLUG_RE.is_match(slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }
        let is_published = flag(&mut errors, "is_published", &self.is_published);

        errors.finish(|| NewCategory {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            slug: slug.to_string(),
            is_published: is_published.unwrap_or(true),
        })
    }
}

/// Staff-only location form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationForm {
    pub name: String,
    pub is_published: Option<String>,
}

impl LocationForm {
    pub fn clean(&self) -> Result<NewLocation, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if required(&mut errors, "name", &self.name) {
            max_chars(&mut errors, "name", &self.name, TITLE_MAX_CHARS);
        }
        let is_published = flag(&mut errors, "is_published", &self.is_published);

        errors.finish(|| NewLocation {
            name: self.name.trim().to_string(),
            is_published: is_published.unwrap_or(true),
        })
    }
}
