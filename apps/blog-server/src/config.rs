//! Application configuration loaded from environment variables.

use std::env;

use chrono::{FixedOffset, Offset, Utc};

use blog_infra::DatabaseConfig;
#[cfg(feature = "auth")]
use blog_infra::JwtConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    #[cfg(feature = "auth")]
    pub jwt: JwtConfig,
    /// Staff account provisioned at startup, from `ADMIN_USERNAME`/`ADMIN_PASSWORD`.
    #[cfg(feature = "auth")]
    pub staff_account: Option<StaffAccount>,
    /// Offset in which submitted `pub_date` values are read.
    pub utc_offset: FixedOffset,
}

/// Credentials of the staff account created or promoted at startup.
#[cfg(feature = "auth")]
#[derive(Clone)]
pub struct StaffAccount {
    pub username: String,
    pub password: String,
}

#[cfg(feature = "auth")]
impl std::fmt::Debug for StaffAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaffAccount")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut config = DatabaseConfig::new(url);
            if let Some(max) = parse_var("DB_MAX_CONNECTIONS") {
                config.max_connections = max;
            }
            if let Some(min) = parse_var("DB_MIN_CONNECTIONS") {
                config.min_connections = min;
            }
            config
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            database,
            #[cfg(feature = "auth")]
            jwt: JwtConfig::from_env(),
            #[cfg(feature = "auth")]
            staff_account: staff_account(
                env::var("ADMIN_USERNAME").ok(),
                env::var("ADMIN_PASSWORD").ok(),
            ),
            utc_offset: site_offset(parse_var("SITE_UTC_OFFSET_MINUTES")),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(feature = "auth")]
fn staff_account(username: Option<String>, password: Option<String>) -> Option<StaffAccount> {
    let username = username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())?;
    Some(StaffAccount {
        username,
        password: password.unwrap_or_default(),
    })
}

fn site_offset(minutes: Option<i32>) -> FixedOffset {
    let Some(minutes) = minutes else {
        return Utc.fix();
    };
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            tracing::warn!(minutes, "SITE_UTC_OFFSET_MINUTES out of range, using UTC");
            Utc.fix()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_offset() {
        assert_eq!(site_offset(None), Utc.fix());
        assert_eq!(site_offset(Some(180)).local_minus_utc(), 3 * 3600);
        assert_eq!(site_offset(Some(-90)).local_minus_utc(), -90 * 60);
        assert_eq!(site_offset(Some(100_000)), Utc.fix());
    }

    #[cfg(feature = "auth")]
    #[test]
    fn test_staff_account() {
        assert!(staff_account(None, Some("secret".into())).is_none());
        assert!(staff_account(Some("  ".into()), Some("secret".into())).is_none());

        let account = staff_account(Some(" admin ".into()), None).unwrap();
        assert_eq!(account.username, "admin");
        assert_eq!(account.password, "");
        assert!(!format!("{account:?}").contains("secret"));
    }
}
