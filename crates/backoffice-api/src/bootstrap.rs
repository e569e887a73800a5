//! # Start-up Bootstrap
//!
//! Builds the [`AppState`] from configuration and seeds the first
//! administrator.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Storage**: connect to PostgreSQL and run migrations when
//!    `DATABASE_URL` is set, otherwise use a seeded in-memory store.
//! 2. **Services**: wire the authorization gate and services over it.
//! 3. **First administrator**: when `BOOTSTRAP_ADMIN_NIK`,
//!    `BOOTSTRAP_ADMIN_USERNAME` and `BOOTSTRAP_ADMIN_PASSWORD` are set,
//!    register an `ADM` user unless one with that NIK already exists.
//!
//! Running the bootstrap twice is harmless.

use std::sync::Arc;

use backoffice_core::{RoleId, SecretHasher, User};
use zeroize::Zeroizing;

use crate::db::{self, PgStore};
use crate::services::{NewUser, ServiceError};
use crate::state::{AppConfig, AppState};

/// Errors during start-up.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Connecting to the database or migrating it failed.
    #[error("database initialization failed: {0}")]
    Database(#[from] sqlx::Error),

    /// The first administrator could not be registered.
    #[error("administrator seeding failed: {0}")]
    AdminSeed(#[from] ServiceError),
}

/// The first administrator's details.
#[derive(Clone)]
pub struct AdminSeed {
    /// National identity number.
    pub nik: String,
    /// Login name.
    pub username: String,
    /// Contact e-mail.
    pub email: String,
    /// Initial password.
    pub password: Zeroizing<String>,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("nik", &self.nik)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl AdminSeed {
    /// Read the seed from `BOOTSTRAP_ADMIN_*` variables. `None` unless NIK,
    /// username and password are all present.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Option<Self> {
        let nik = lookup("BOOTSTRAP_ADMIN_NIK")?;
        let username = lookup("BOOTSTRAP_ADMIN_USERNAME")?;
        let password = Zeroizing::new(lookup("BOOTSTRAP_ADMIN_PASSWORD")?);
        let email = lookup("BOOTSTRAP_ADMIN_EMAIL")
            .unwrap_or_else(|| format!("{}@localhost", username.trim()));
        Some(Self {
            nik,
            username,
            email,
            password,
        })
    }

    fn into_new_user(self) -> NewUser {
        NewUser {
            nik: self.nik,
            role_id: Some(RoleId::ADMIN.to_string()),
            full_name: "Administrator".to_string(),
            username: self.username,
            email: self.email,
            phone: "-".to_string(),
            password: self.password,
        }
    }
}

/// Build the application state from configuration.
pub async fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    let state = match config.database_url.clone() {
        Some(url) => {
            let pool = db::init_pool(&url, config.database_max_connections).await?;
            let store = Arc::new(PgStore::new(pool));
            AppState::with_stores(config, store.clone(), store, SecretHasher::default())
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set, running on the in-memory store. \
                 State will not survive restarts."
            );
            AppState::with_config(config)
        }
    };

    if let Some(seed) = state.config.bootstrap_admin.clone() {
        seed_admin(&state, seed).await?;
    }

    tracing::info!(
        base_currency = %state.config.base_currency,
        auth = state.config.auth_token.is_some(),
        "bootstrap complete"
    );
    Ok(state)
}

/// Register the first administrator. Returns `None` when a user with the
/// seed's NIK already exists.
pub async fn seed_admin(state: &AppState, seed: AdminSeed) -> Result<Option<User>, BootstrapError> {
    match state.reference.register(None, seed.into_new_user()).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "administrator created");
            Ok(Some(user))
        }
        Err(ServiceError::Conflict(_)) => {
            tracing::info!("administrator already present, skipping seed");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::verify_secret;

    fn seed() -> AdminSeed {
        AdminSeed {
            nik: "3174000000000999".into(),
            username: "root".into(),
            email: "root@bank.example".into(),
            password: Zeroizing::new("change-me-now".to_string()),
        }
    }

    #[test]
    fn seed_requires_all_three_variables() {
        let vars = |var: &str| match var {
            "BOOTSTRAP_ADMIN_NIK" => Some("3174000000000999".to_string()),
            "BOOTSTRAP_ADMIN_USERNAME" => Some("root".to_string()),
            _ => None,
        };
        assert!(AdminSeed::from_lookup(&vars).is_none());

        let vars = |var: &str| match var {
            "BOOTSTRAP_ADMIN_NIK" => Some("3174000000000999".to_string()),
            "BOOTSTRAP_ADMIN_USERNAME" => Some("root".to_string()),
            "BOOTSTRAP_ADMIN_PASSWORD" => Some("change-me-now".to_string()),
            _ => None,
        };
        let seed = AdminSeed::from_lookup(&vars).unwrap();
        assert_eq!(seed.email, "root@localhost");
        assert!(!format!("{seed:?}").contains("change-me-now"));
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let state = AppState::new();
        let admin = seed_admin(&state, seed()).await.unwrap().unwrap();
        assert_eq!(admin.role_id.as_str(), "ADM");
        assert!(admin.employee_id.is_none());
        assert!(verify_secret("change-me-now", &admin.password_hash));

        assert!(seed_admin(&state, seed()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_bootstrap_without_database() {
        let config = AppConfig {
            bootstrap_admin: Some(seed()),
            ..AppConfig::default()
        };
        let state = bootstrap(config).await.unwrap();
        assert!(seed_admin(&state, seed()).await.unwrap().is_none());
    }
}
