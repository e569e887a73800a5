//! # Capabilities
//!
//! The closed vocabulary of permissions a role can carry. Authorization is a
//! single predicate, [`CapabilitySet::has`], asked once per operation
//! category; callers never inspect role storage directly.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named permission attached to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Open accounts for customers and manage their PINs.
    ProvisionAccounts,
    /// Register users and look them up.
    ManageUsers,
    /// Create and edit branch offices.
    ManageBranches,
    /// Create and edit account types.
    ManageAccountTypes,
    /// Create and edit currencies and their exchange rates.
    ManageCurrencies,
    /// Create, edit and remove transaction fees.
    ManageFees,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 6] = [
        Self::ProvisionAccounts,
        Self::ManageUsers,
        Self::ManageBranches,
        Self::ManageAccountTypes,
        Self::ManageCurrencies,
        Self::ManageFees,
    ];

    /// Return the string representation of this capability.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProvisionAccounts => "provision_accounts",
            Self::ManageUsers => "manage_users",
            Self::ManageBranches => "manage_branches",
            Self::ManageAccountTypes => "manage_account_types",
            Self::ManageCurrencies => "manage_currencies",
            Self::ManageFees => "manage_fees",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of capabilities, stored as a bitmask.
///
/// Serializes as a sorted list of capability names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(from = "Vec<Capability>", into = "Vec<Capability>")]
#[schema(value_type = Vec<Capability>)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The set holding every capability.
    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    /// Membership test.
    pub fn has(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    /// Add a capability in place.
    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    /// Builder-style insert.
    pub fn with(mut self, capability: Capability) -> Self {
        self.insert(capability);
        self
    }

    /// Whether no capability is held.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate held capabilities in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.has(*c))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl From<Vec<Capability>> for CapabilitySet {
    fn from(value: Vec<Capability>) -> Self {
        value.into_iter().collect()
    }
}

impl From<CapabilitySet> for Vec<Capability> {
    fn from(value: CapabilitySet) -> Self {
        value.iter().collect()
    }
}
