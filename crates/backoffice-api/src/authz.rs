//! # Authorization Gate
//!
//! Resolves a requester to a role and capability set, and answers one
//! boolean question per operation category. Services receive the gate as an
//! injected `Arc<dyn AuthorizationGate>` and never read role storage.
//!
//! Failure modes of [`AuthorizationGate::resolve`]:
//!
//! | Condition                              | Error                      |
//! |----------------------------------------|----------------------------|
//! | requester id unknown                   | [`ServiceError::NotFound`] |
//! | requester's role row missing           | [`ServiceError::Internal`] |
//!
//! [`AuthorizationGate::require`] adds [`ServiceError::Unauthorized`] when
//! the capability is absent.

use std::sync::Arc;

use async_trait::async_trait;
use backoffice_core::{Capability, CapabilitySet, RoleId, UserId};

use crate::services::ServiceError;
use crate::store::Directory;

/// A resolved requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    /// The requester's user id.
    pub user_id: UserId,
    /// The requester's role.
    pub role_id: RoleId,
    /// Capabilities granted by the role.
    pub capabilities: CapabilitySet,
}

impl Requester {
    /// Membership test on the requester's capability set.
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.has(capability)
    }

    /// Fail with [`ServiceError::Unauthorized`] unless the capability is held.
    pub fn require(&self, capability: Capability) -> Result<(), ServiceError> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized(format!(
                "role '{}' lacks capability '{}'",
                self.role_id, capability
            )))
        }
    }
}

/// Requester resolution and capability checks.
#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    /// Resolve a user to their role and capabilities.
    async fn resolve(&self, user: UserId) -> Result<Requester, ServiceError>;

    /// Resolve, then require a capability.
    async fn require(
        &self,
        user: UserId,
        capability: Capability,
    ) -> Result<Requester, ServiceError> {
        let requester = self.resolve(user).await?;
        requester.require(capability)?;
        Ok(requester)
    }
}

/// Gate backed by the user and role tables of a [`Directory`].
#[derive(Clone)]
pub struct DirectoryGate {
    directory: Arc<dyn Directory>,
}

impl DirectoryGate {
    /// Build a gate over a directory.
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl AuthorizationGate for DirectoryGate {
    async fn resolve(&self, user: UserId) -> Result<Requester, ServiceError> {
        let record = self
            .directory
            .find_user(user)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("requester {user}")))?;
        let role = self
            .directory
            .find_role(&record.role_id)
            .await?
            .ok_or_else(|| {
                tracing::error!(user_id = %user, role_id = %record.role_id, "user references a missing role");
                ServiceError::Internal(format!("role {} of user {user} is missing", record.role_id))
            })?;
        Ok(Requester {
            user_id: record.id,
            role_id: role.id,
            capabilities: role.capabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use backoffice_core::{Nik, User};
    use chrono::Utc;

    async fn store_with_user(role: &str) -> (MemoryStore, UserId) {
        let store = MemoryStore::seeded();
        let user = User {
            id: UserId::new(),
            employee_id: None,
            nik: Nik::new("3174000000000001").unwrap(),
            role_id: RoleId::new(role).unwrap(),
            full_name: "Dewi Lestari".into(),
            username: "dewi".into(),
            email: "dewi@example.com".into(),
            phone: "0812222222".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        let id = user.id;
        store.insert_user(user).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn resolves_role_capabilities() {
        let (store, id) = store_with_user("EMP").await;
        let gate = DirectoryGate::new(Arc::new(store));
        let requester = gate.resolve(id).await.unwrap();
        assert_eq!(requester.role_id.as_str(), "EMP");
        assert!(requester.has(Capability::ProvisionAccounts));
        assert!(!requester.has(Capability::ManageFees));
    }

    #[tokio::test]
    async fn unknown_requester_is_not_found() {
        let gate = DirectoryGate::new(Arc::new(MemoryStore::seeded()));
        let err = gate.resolve(UserId::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_capability_is_unauthorized() {
        let (store, id) = store_with_user("USR").await;
        let gate = DirectoryGate::new(Arc::new(store));
        let err = gate
            .require(id, Capability::ProvisionAccounts)
            .await
            .unwrap_err();
        match err {
            ServiceError::Unauthorized(msg) => assert!(msg.contains("provision_accounts")),
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn admin_passes_every_check() {
        let (store, id) = store_with_user("ADM").await;
        let gate = DirectoryGate::new(Arc::new(store));
        for c in Capability::ALL {
            assert!(gate.require(id, c).await.is_ok(), "ADM denied {c}");
        }
    }
}
