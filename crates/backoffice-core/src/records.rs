//! # Record Types
//!
//! Plain data records for the back-office entities. Secret material
//! (password and PIN hashes) is carried for storage but never serialized.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::account_number::AccountNumber;
use crate::capability::{Capability, CapabilitySet};
use crate::error::ValidationError;
use crate::identity::{
    AccountId, AccountTypeId, BranchId, CurrencyCode, FeeCode, Nik, RoleId, UserId,
};

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

fn require_min_chars(field: &'static str, value: &str, min: usize) -> Result<(), ValidationError> {
    require_text(field, value)?;
    if value.trim().chars().count() < min {
        return Err(ValidationError::TooShort { field, min });
    }
    Ok(())
}

fn require_positive(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::NonPositive(field));
    }
    Ok(())
}

/// Key of a sequence counter: one monotonic counter per (branch, account type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct SequenceKey {
    /// Issuing branch.
    pub branch: BranchId,
    /// Product the account is opened under.
    pub account_type: AccountTypeId,
}

impl SequenceKey {
    /// Build a key.
    pub fn new(branch: BranchId, account_type: AccountTypeId) -> Self {
        Self {
            branch,
            account_type,
        }
    }
}

impl std::fmt::Display for SequenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.branch, self.account_type)
    }
}

/// A registered user: customer or employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Employee who registered this user, if any.
    pub employee_id: Option<UserId>,
    /// National identity number, unique per user.
    pub nik: Nik,
    /// Role governing the user's capabilities.
    pub role_id: RoleId,
    /// Full legal name.
    pub full_name: String,
    /// Login name.
    pub username: String,
    /// Contact e-mail.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    pub password_hash: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Check the free-text fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("full_name", &self.full_name)?;
        require_min_chars("username", &self.username, 3)?;
        match self.email.trim().split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(ValidationError::InvalidEmail(self.email.clone())),
        }
        require_text("phone", &self.phone)
    }
}

/// A role and the capabilities it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    /// Three-letter role code.
    pub id: RoleId,
    /// Display name.
    pub name: String,
    /// Granted capabilities.
    pub capabilities: CapabilitySet,
}

impl Role {
    /// Whether this role grants the capability.
    pub fn grants(&self, capability: Capability) -> bool {
        self.capabilities.has(capability)
    }
}

/// A branch office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Branch {
    /// Storage-assigned key.
    pub id: BranchId,
    /// Branch name.
    pub name: String,
    /// Street address.
    pub address: String,
}

impl Branch {
    /// Check that name and address are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_branch(&self.name, &self.address)
    }
}

fn check_branch(name: &str, address: &str) -> Result<(), ValidationError> {
    require_text("name", name)?;
    require_text("address", address)
}

/// A branch office before storage assigns its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewBranch {
    /// Branch name.
    pub name: String,
    /// Street address.
    pub address: String,
}

impl NewBranch {
    /// Check that name and address are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_branch(&self.name, &self.address)
    }

    /// Attach the storage-assigned key.
    pub fn with_id(self, id: BranchId) -> Branch {
        Branch {
            id,
            name: self.name,
            address: self.address,
        }
    }
}

/// An account product with its channel feature flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountType {
    /// Storage-assigned key.
    pub id: AccountTypeId,
    /// Product name.
    pub name: String,
    /// Usable for e-toll top-ups.
    pub can_etoll: bool,
    /// Usable at Indomaret outlets.
    pub can_indomart: bool,
    /// Usable for Steam wallet purchases.
    pub can_steam: bool,
}

impl AccountType {
    /// Check that the product is named.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }
}

/// An account product before storage assigns its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewAccountType {
    /// Product name.
    pub name: String,
    /// Usable for e-toll top-ups.
    #[serde(default)]
    pub can_etoll: bool,
    /// Usable at Indomaret outlets.
    #[serde(default)]
    pub can_indomart: bool,
    /// Usable for Steam wallet purchases.
    #[serde(default)]
    pub can_steam: bool,
}

impl NewAccountType {
    /// Check that the product is named.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)
    }

    /// Attach the storage-assigned key.
    pub fn with_id(self, id: AccountTypeId) -> AccountType {
        AccountType {
            id,
            name: self.name,
            can_etoll: self.can_etoll,
            can_indomart: self.can_indomart,
            can_steam: self.can_steam,
        }
    }
}

/// A currency and its stored exchange rate to the base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Currency {
    /// Three-letter code.
    pub code: CurrencyCode,
    /// Display name, at least four characters.
    pub name: String,
    /// Units of base currency per unit of this currency.
    #[schema(value_type = String)]
    pub rate_to_base: Decimal,
}

impl Currency {
    /// Check name length and rate sign.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_min_chars("name", &self.name, 4)?;
        require_positive("rate_to_base", self.rate_to_base)
    }
}

/// A flat fee charged on a kind of transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransactionFee {
    /// Three-character code.
    pub code: FeeCode,
    /// Display name.
    pub name: String,
    /// Fee amount in the base currency.
    #[schema(value_type = String)]
    pub fee: Decimal,
}

impl TransactionFee {
    /// Check name length and amount sign.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_min_chars("name", &self.name, 3)?;
        require_positive("fee", self.fee)
    }
}

/// A customer account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    /// Internal identifier.
    pub id: AccountId,
    /// Owning customer.
    pub user_id: UserId,
    /// Employee of record for the last provisioning or update.
    pub employee_id: UserId,
    /// Issuing branch.
    pub branch_id: BranchId,
    /// Product.
    pub account_type_id: AccountTypeId,
    /// Sequence number issued for (branch, account type).
    pub sequence_number: u64,
    /// Derived 20-digit account number, unique system-wide.
    pub account_number: AccountNumber,
    /// Denomination.
    pub currency: CurrencyCode,
    /// Current balance; zero at creation.
    #[schema(value_type = String)]
    pub balance: Decimal,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip)]
    pub pin_hash: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Sequence key this account was numbered under.
    pub fn sequence_key(&self) -> SequenceKey {
        SequenceKey::new(self.branch_id, self.account_type_id)
    }

    /// Whether the given user owns this account.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == user
    }
}
