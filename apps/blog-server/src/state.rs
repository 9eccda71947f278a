//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::BlogService;
use blog_core::ports::Repositories;
use blog_infra::InMemoryStore;
#[cfg(feature = "postgres")]
use blog_infra::{
    DatabaseConnections, PostgresCategoryRepository, PostgresCommentRepository,
    PostgresLocationRepository, PostgresPostRepository, PostgresUserRepository,
};
#[cfg(feature = "auth")]
use blog_infra::{Argon2PasswordService, JwtTokenService};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
    #[cfg(feature = "auth")]
    pub accounts: Arc<blog_core::AccountService>,
}

impl AppState {
    /// Build the application state, falling back to in-memory storage when no
    /// database is configured or reachable.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = Self::repositories(config).await;
        let state = Self::with_repositories(repos, config);
        #[cfg(feature = "auth")]
        state.provision_staff(config).await;
        tracing::info!("Application state initialized");
        state
    }

    /// Make sure the configured staff account exists. Failures are logged, the server
    /// still starts.
    #[cfg(feature = "auth")]
    pub async fn provision_staff(&self, config: &AppConfig) {
        let Some(account) = config.staff_account.as_ref() else {
            tracing::debug!("ADMIN_USERNAME not set, no staff account provisioned");
            return;
        };

        match self
            .accounts
            .ensure_staff(&account.username, &account.password)
            .await
        {
            Ok(user) => {
                tracing::info!(user_id = user.id, username = %user.username, "Staff account ready")
            }
            Err(e) => tracing::error!(
                error = %e,
                username = %account.username,
                "Failed to provision staff account"
            ),
        }
    }

    pub fn with_repositories(repos: Repositories, config: &AppConfig) -> Self {
        #[cfg(feature = "auth")]
        let accounts = Arc::new(blog_core::AccountService::new(
            repos.users.clone(),
            Arc::new(Argon2PasswordService::new()),
            Arc::new(JwtTokenService::new(config.jwt.clone())),
        ));

        Self {
            blog: Arc::new(BlogService::new(repos).with_utc_offset(config.utc_offset)),
            #[cfg(feature = "auth")]
            accounts,
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> Repositories {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Arc::new(InMemoryStore::new()).repositories();
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => postgres_repositories(&connections),
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
                Arc::new(InMemoryStore::new()).repositories()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(config: &AppConfig) -> Repositories {
        if config.database.is_some() {
            tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
        }
        tracing::info!("Using in-memory repositories");
        Arc::new(InMemoryStore::new()).repositories()
    }
}

/// All repositories over one connection pool.
#[cfg(feature = "postgres")]
fn postgres_repositories(connections: &DatabaseConnections) -> Repositories {
    Repositories {
        users: Arc::new(PostgresUserRepository::new(connections.main.clone())),
        categories: Arc::new(PostgresCategoryRepository::new(connections.main.clone())),
        locations: Arc::new(PostgresLocationRepository::new(connections.main.clone())),
        posts: Arc::new(PostgresPostRepository::new(connections.main.clone())),
        comments: Arc::new(PostgresCommentRepository::new(connections.main.clone())),
    }
}
