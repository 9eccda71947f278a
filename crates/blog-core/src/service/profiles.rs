//! Profile pages and own-profile editing.

use chrono::Utc;

use super::{BlogService, FormPage, Outcome, ProfilePage};
use crate::domain::Viewer;
use crate::error::{DomainError, RepoError};
use crate::forms::{ProfileForm, ValidationErrors};
use crate::ports::{PostFilter, Visibility};
use crate::routes::Route;

const USERNAME_TAKEN: &str = "A user with that username already exists.";

impl BlogService {
    /// GET /profile/{username}/ - the owner sees every post, others only public ones.
    pub async fn profile(
        &self,
        username: &str,
        page: Option<&str>,
        viewer: Option<&Viewer>,
    ) -> Result<ProfilePage, DomainError> {
        let profile = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("User", username))?;

        let is_owner = viewer.is_some_and(|v| v.is(profile.id));
        let visibility = if is_owner {
            Visibility::Everything
        } else {
            Visibility::PublicAt(Utc::now())
        };
        let filter = PostFilter::new(visibility).by_author(profile.id);

        Ok(ProfilePage {
            page: self.paginate(&filter, page).await?,
            is_owner,
            profile,
        })
    }

    /// GET /profile/edit/
    pub async fn edit_profile_page(
        &self,
        viewer: Option<&Viewer>,
    ) -> Result<Outcome<FormPage<ProfileForm>>, DomainError> {
        let viewer = require_viewer!(viewer, Route::EditProfile);
        let user = self
            .repos
            .users
            .find_by_id(viewer.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", viewer.id))?;
        Ok(Outcome::Render(FormPage::blank(ProfileForm::from(&user))))
    }

    /// POST /profile/edit/
    pub async fn edit_profile(
        &self,
        viewer: Option<&Viewer>,
        form: ProfileForm,
    ) -> Result<Outcome<FormPage<ProfileForm>>, DomainError> {
        let viewer = require_viewer!(viewer, Route::EditProfile);
        let user = self
            .repos
            .users
            .find_by_id(viewer.id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", viewer.id))?;

        let updated = match form.clean(&user) {
            Ok(updated) => updated,
            Err(errors) => return Ok(Outcome::Invalid(FormPage::rejected(form, errors))),
        };

        if updated.username != user.username {
            let taken = self
                .repos
                .users
                .find_by_username(&updated.username)
                .await?
                .is_some_and(|other| other.id != user.id);
            if taken {
                return Ok(Outcome::Invalid(username_taken(form)));
            }
        }

        let saved = match self.repos.users.update(updated).await {
            Ok(saved) => saved,
            Err(RepoError::Constraint(_)) => return Ok(Outcome::Invalid(username_taken(form))),
            Err(e) => return Err(e.into()),
        };
        tracing::info!(user_id = saved.id, "Profile updated");
        Ok(Outcome::Redirect(Route::Profile(saved.username)))
    }
}

pub(super) fn username_taken<F>(form: F) -> FormPage<F> {
    let mut errors = ValidationErrors::new();
    errors.add("username", USERNAME_TAKEN);
    FormPage::rejected(form, errors)
}
