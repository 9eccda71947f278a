//! # Blog Core
//!
//! The domain layer of the blog.
//! Entities, visibility and authorization policy, form validation, pagination and the
//! request orchestration that composes them. No infrastructure dependencies: storage,
//! token signing and password hashing are reached through the traits in [`ports`].

pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod routes;
pub mod service;

pub use error::{DomainError, RepoError};
pub use routes::Route;
pub use service::{AccountService, BlogService, Outcome};
