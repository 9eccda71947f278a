//! # Blog Shared
//!
//! Wire types of the HTTP API that are not domain pages: query strings, the login
//! body and the error and redirect envelopes.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, RedirectResponse};
