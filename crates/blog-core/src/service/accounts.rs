//! Registration and login - the blog's side of the authentication collaborator.

use std::sync::Arc;

use serde::Serialize;

use super::{FormPage, Outcome, profiles::username_taken};
use crate::domain::{NewUser, User, Viewer};
use crate::error::{DomainError, RepoError};
use crate::forms::RegistrationForm;
use crate::ports::{PasswordService, TokenClaims, TokenService, UserRepository};
use crate::routes::Route;

/// An access token handed out at login.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub username: String,
}

/// Account creation and credential checks.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    /// POST /auth/registration/
    pub async fn register(
        &self,
        form: RegistrationForm,
    ) -> Result<Outcome<FormPage<RegistrationForm>>, DomainError> {
        let (username, password) = match form.clean() {
            Ok(clean) => clean,
            Err(errors) => return Ok(Outcome::Invalid(FormPage::rejected(form, errors))),
        };

        if self.users.find_by_username(&username).await?.is_some() {
            return Ok(Outcome::Invalid(username_taken(form)));
        }

        let password_hash = self
            .passwords
            .hash(&password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let user = match self.users.create(NewUser::new(username, password_hash)).await {
            Ok(user) => user,
            Err(RepoError::Constraint(_)) => return Ok(Outcome::Invalid(username_taken(form))),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(user_id = user.id, "User registered");
        Ok(Outcome::Redirect(Route::Login { next: None }))
    }

    /// POST /auth/login/
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        let valid = self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !valid {
            tracing::debug!(user_id = user.id, "Rejected login");
            return Err(DomainError::InvalidCredentials);
        }

        let mut roles = vec!["user".to_string()];
        if user.is_staff {
            roles.push(TokenClaims::STAFF_ROLE.to_string());
        }
        let access_token = self
            .tokens
            .generate_token(user.id, &user.username, roles)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_in: self.tokens.expiration_seconds().max(0) as u64,
            username: user.username,
        })
    }

    /// Create the staff account named by the deployment, or promote it if a user of
    /// that name already exists. The password of an existing user is left alone.
    pub async fn ensure_staff(&self, username: &str, password: &str) -> Result<User, DomainError> {
        if let Some(mut user) = self.users.find_by_username(username).await? {
            if user.is_staff {
                return Ok(user);
            }
            user.is_staff = true;
            let user = self.users.update(user).await?;
            tracing::info!(user_id = user.id, "Existing user promoted to staff");
            return Ok(user);
        }

        if password.is_empty() {
            return Err(DomainError::Internal(format!(
                "staff account {username} needs a password"
            )));
        }
        let password_hash = self
            .passwords
            .hash(password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let user = self
            .users
            .create(NewUser::new(username, password_hash).staff())
            .await?;
        tracing::info!(user_id = user.id, "Staff account created");
        Ok(user)
    }

    /// Resolve a bearer token into the viewer it names.
    ///
    /// The token only identifies the user: username and staff flag are read from the
    /// store, so a rename or a demotion applies to tokens already handed out. A token
    /// for a deleted user is treated like a bad one.
    pub async fn viewer_from_token(&self, token: &str) -> Result<Option<Viewer>, DomainError> {
        let claims = match self.tokens.validate_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
                return Ok(None);
            }
        };

        let user = self.users.find_by_id(claims.user_id).await?;
        if user.is_none() {
            tracing::debug!(user_id = claims.user_id, "Token names a user that no longer exists");
        }
        Ok(user.as_ref().map(Viewer::from))
    }
}
