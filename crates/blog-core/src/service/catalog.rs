//! Staff-only management of categories and locations.

use super::{BlogService, ManagePage, Outcome};
use crate::domain::{Category, Location, Viewer};
use crate::error::{DomainError, RepoError};
use crate::forms::{CategoryForm, LocationForm, ValidationErrors};
use crate::routes::Route;

fn slug_taken() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add("slug", "Category with this slug already exists.");
    errors
}

/// Gate for the management routes: anonymous viewers log in, everyone else who is not
/// staff goes back to the front page.
macro_rules! require_staff {
    ($viewer:expr, $route:expr) => {{
        let viewer = require_viewer!($viewer, $route);
        if !viewer.is_staff {
            tracing::debug!(viewer_id = viewer.id, "Non-staff viewer on management route");
            return Ok(Outcome::Redirect(Route::Index));
        }
        viewer
    }};
}

impl BlogService {
    /// GET /manage/categories/
    pub async fn categories_page(
        &self,
        viewer: Option<&Viewer>,
    ) -> Result<Outcome<ManagePage<Category, CategoryForm>>, DomainError> {
        require_staff!(viewer, Route::ManageCategories);
        Ok(Outcome::Render(ManagePage {
            items: self.repos.categories.list().await?,
            form: CategoryForm::default(),
            errors: ValidationErrors::new(),
        }))
    }

    /// POST /manage/categories/
    pub async fn create_category(
        &self,
        viewer: Option<&Viewer>,
        form: CategoryForm,
    ) -> Result<Outcome<ManagePage<Category, CategoryForm>>, DomainError> {
        require_staff!(viewer, Route::ManageCategories);

        let new = match form.clean() {
            Ok(new) => new,
            Err(errors) => return self.rejected_category(form, errors).await,
        };
        if self.repos.categories.find_by_slug(&new.slug).await?.is_some() {
            return self.rejected_category(form, slug_taken()).await;
        }

        let category = match self.repos.categories.create(new).await {
            Ok(category) => category,
            Err(RepoError::Constraint(_)) => {
                return self.rejected_category(form, slug_taken()).await;
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(category_id = category.id, slug = %category.slug, "Category created");
        Ok(Outcome::Redirect(Route::ManageCategories))
    }

    async fn rejected_category(
        &self,
        form: CategoryForm,
        errors: ValidationErrors,
    ) -> Result<Outcome<ManagePage<Category, CategoryForm>>, DomainError> {
        Ok(Outcome::Invalid(ManagePage {
            items: self.repos.categories.list().await?,
            form,
            errors,
        }))
    }

    /// POST /manage/categories/{slug}/delete/ - posts in the category lose it.
    pub async fn delete_category(
        &self,
        viewer: Option<&Viewer>,
        slug: &str,
    ) -> Result<Outcome<()>, DomainError> {
        require_staff!(viewer, Route::ManageCategories);
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", slug))?;

        self.repos.categories.delete(category.id).await?;
        tracing::info!(category_id = category.id, "Category deleted");
        Ok(Outcome::Redirect(Route::ManageCategories))
    }

    /// GET /manage/locations/
    pub async fn locations_page(
        &self,
        viewer: Option<&Viewer>,
    ) -> Result<Outcome<ManagePage<Location, LocationForm>>, DomainError> {
        require_staff!(viewer, Route::ManageLocations);
        Ok(Outcome::Render(ManagePage {
            items: self.repos.locations.list().await?,
            form: LocationForm::default(),
            errors: ValidationErrors::new(),
        }))
    }

    /// POST /manage/locations/
    pub async fn create_location(
        &self,
        viewer: Option<&Viewer>,
        form: LocationForm,
    ) -> Result<Outcome<ManagePage<Location, LocationForm>>, DomainError> {
        require_staff!(viewer, Route::ManageLocations);
        match form.clean() {
            Ok(new) => {
                let location = self.repos.locations.create(new).await?;
                tracing::info!(location_id = location.id, "Location created");
                Ok(Outcome::Redirect(Route::ManageLocations))
            }
            Err(errors) => Ok(Outcome::Invalid(ManagePage {
                items: self.repos.locations.list().await?,
                form,
                errors,
            })),
        }
    }

    /// POST /manage/locations/{id}/delete/ - posts at the location lose it.
    pub async fn delete_location(
        &self,
        viewer: Option<&Viewer>,
        id: i64,
    ) -> Result<Outcome<()>, DomainError> {
        require_staff!(viewer, Route::ManageLocations);
        if self.repos.locations.find_by_id(id).await?.is_none() {
            return Err(DomainError::not_found("Location", id));
        }

        self.repos.locations.delete(id).await?;
        tracing::info!(location_id = id, "Location deleted");
        Ok(Outcome::Redirect(Route::ManageLocations))
    }
}
