//! # Services
//!
//! Transport-independent use cases. Handlers translate HTTP into calls on
//! these services; tests drive them directly.
//!
//! - [`provisioning`]: account creation, reads and PIN updates.
//! - [`reference`]: users and reference data (branches, account types,
//!   currencies, transaction fees).
//!
//! Every operation takes the requester's [`UserId`](backoffice_core::UserId)
//! first and consults the [`AuthorizationGate`](crate::authz::AuthorizationGate)
//! before touching storage.

pub mod provisioning;
pub mod reference;

use backoffice_core::{HashError, RawPin, SecretHasher, ValidationError};
use thiserror::Error;

use crate::store::StoreError;

pub use provisioning::{AccountProvisioner, CreateAccount, UpdateAccount};
pub use reference::{NewUser, ReferenceData};

/// Failure of a service operation.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Requester, target user, branch, account type, currency or other
    /// referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Requester lacks the capability the operation requires.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// Input is malformed (PIN, identifiers, out-of-range numbering).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A uniqueness constraint fired.
    #[error("{0}")]
    Conflict(String),

    /// Storage, hashing or other infrastructure failure.
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(msg) => Self::Conflict(msg),
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Validation(v) => Self::Validation(v),
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl From<HashError> for ServiceError {
    fn from(err: HashError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Hash a PIN on the blocking pool.
pub(crate) async fn hash_pin(hasher: &SecretHasher, pin: RawPin) -> Result<String, ServiceError> {
    let hasher = hasher.clone();
    tokio::task::spawn_blocking(move || pin.hash_with(&hasher))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {e}")))?
        .map_err(ServiceError::from)
}

/// Hash a password on the blocking pool.
pub(crate) async fn hash_password(
    hasher: &SecretHasher,
    password: zeroize::Zeroizing<String>,
) -> Result<String, ServiceError> {
    let hasher = hasher.clone();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {e}")))?
        .map_err(ServiceError::from)
}
