//! # Storage Seams
//!
//! The services never talk to a database directly. They depend on two
//! traits, injected as `Arc<dyn ...>`:
//!
//! - [`AccountLedger`]: the sequence counter store and the account table.
//!   Allocation is atomic per [`SequenceKey`] and never blocks other keys.
//! - [`Directory`]: users, roles and reference data (branches, account
//!   types, currencies, transaction fees).
//!
//! Two backends implement both traits: [`memory::MemoryStore`] for
//! development and tests, and [`crate::db::PgStore`] for PostgreSQL.

pub mod memory;

use async_trait::async_trait;
use backoffice_core::{
    Account, AccountId, AccountNumber, AccountType, AccountTypeId, Branch, BranchId, Currency,
    CurrencyCode, FeeCode, NewAccountType, NewBranch, Nik, Role, RoleId, SequenceKey,
    TransactionFee, User, UserId, ValidationError,
};
use thiserror::Error;

pub use memory::MemoryStore;

/// Errors raised by a storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness constraint fired (duplicate key, NIK, account number...).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced row does not exist (foreign key violation).
    #[error("referenced row not found: {0}")]
    NotFound(String),

    /// A stored value could not be turned into a domain value, or an
    /// allocated sequence does not fit the account number.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Any other backend failure: connection loss, lock timeout, ...
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// An account ready to be numbered and inserted.
///
/// The ledger fills in the sequence number, the account number, a zero
/// balance and the timestamps.
#[derive(Debug, Clone)]
pub struct AccountDraft {
    /// Pre-generated internal identifier.
    pub id: AccountId,
    /// Owning customer.
    pub user_id: UserId,
    /// Employee of record.
    pub employee_id: UserId,
    /// Counter the sequence is drawn from.
    pub key: SequenceKey,
    /// Denomination.
    pub currency: CurrencyCode,
    /// Argon2 PHC string of the PIN.
    pub pin_hash: String,
}

/// Mutable fields of an existing account.
#[derive(Debug, Clone)]
pub struct AccountChange {
    /// New employee of record.
    pub employee_id: UserId,
    /// Replacement PIN hash, if the PIN changes.
    pub pin_hash: Option<String>,
}

/// User lookup by any of the unique login attributes. Absent fields never match.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    /// National identity number.
    pub nik: Option<String>,
    /// Login name.
    pub username: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
}

impl UserQuery {
    /// Whether no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.nik.is_none() && self.username.is_none() && self.email.is_none()
    }

    /// Whether the user matches at least one criterion.
    pub fn matches(&self, user: &User) -> bool {
        self.nik.as_deref() == Some(user.nik.as_str())
            || self.username.as_deref() == Some(user.username.as_str())
            || self.email.as_deref() == Some(user.email.as_str())
    }
}

/// Sequence counters and the account table.
#[async_trait]
pub trait AccountLedger: Send + Sync {
    /// Atomically increment the counter for `key` and return the new value.
    ///
    /// The first allocation for a key returns 1. The increment commits on
    /// its own: a returned value is consumed even if the caller never uses it.
    async fn allocate_next(&self, key: SequenceKey) -> Result<u64, StoreError>;

    /// Last value issued for `key`, or 0 if nothing was ever issued.
    async fn current_sequence(&self, key: SequenceKey) -> Result<u64, StoreError>;

    /// Allocate the next sequence for the draft's key, derive the account
    /// number and insert the account, as one atomic unit.
    ///
    /// If numbering or the insert fails, the allocation is rolled back and
    /// the counter is left unchanged.
    async fn create_account(&self, draft: AccountDraft) -> Result<Account, StoreError>;

    /// Every account, ordered by account number.
    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Accounts owned by one user, ordered by account number.
    async fn accounts_for_user(&self, user: UserId) -> Result<Vec<Account>, StoreError>;

    /// Look up an account by number.
    async fn find_account(&self, number: &AccountNumber) -> Result<Option<Account>, StoreError>;

    /// Apply a change to an existing account. `None` if it does not exist.
    async fn update_account(
        &self,
        number: &AccountNumber,
        change: AccountChange,
    ) -> Result<Option<Account>, StoreError>;
}

/// Users, roles and reference data.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up a user by id.
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError>;
    /// Look up a user by national identity number.
    async fn find_user_by_nik(&self, nik: &Nik) -> Result<Option<User>, StoreError>;
    /// Users matching any criterion of the query.
    async fn search_users(&self, query: &UserQuery) -> Result<Vec<User>, StoreError>;
    /// Insert a user. NIK, username and e-mail are unique.
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;

    /// Look up a role.
    async fn find_role(&self, id: &RoleId) -> Result<Option<Role>, StoreError>;
    /// Every role.
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;

    /// Every branch, ordered by id.
    async fn list_branches(&self) -> Result<Vec<Branch>, StoreError>;
    /// Look up a branch.
    async fn find_branch(&self, id: BranchId) -> Result<Option<Branch>, StoreError>;
    /// Insert a branch under a storage-assigned id.
    async fn insert_branch(&self, branch: NewBranch) -> Result<Branch, StoreError>;
    /// Replace a branch. `None` if it does not exist.
    async fn update_branch(&self, branch: Branch) -> Result<Option<Branch>, StoreError>;

    /// Every account type, ordered by id.
    async fn list_account_types(&self) -> Result<Vec<AccountType>, StoreError>;
    /// Look up an account type.
    async fn find_account_type(&self, id: AccountTypeId)
        -> Result<Option<AccountType>, StoreError>;
    /// Insert an account type under a storage-assigned id.
    async fn insert_account_type(&self, account_type: NewAccountType)
        -> Result<AccountType, StoreError>;
    /// Replace an account type. `None` if it does not exist.
    async fn update_account_type(
        &self,
        account_type: AccountType,
    ) -> Result<Option<AccountType>, StoreError>;

    /// Every currency, ordered by code.
    async fn list_currencies(&self) -> Result<Vec<Currency>, StoreError>;
    /// Look up a currency.
    async fn find_currency(&self, code: &CurrencyCode) -> Result<Option<Currency>, StoreError>;
    /// Insert a currency. Codes are unique.
    async fn insert_currency(&self, currency: Currency) -> Result<Currency, StoreError>;
    /// Replace a currency. `None` if it does not exist.
    async fn update_currency(&self, currency: Currency) -> Result<Option<Currency>, StoreError>;

    /// Every transaction fee, ordered by code.
    async fn list_fees(&self) -> Result<Vec<TransactionFee>, StoreError>;
    /// Look up a transaction fee.
    async fn find_fee(&self, code: &FeeCode) -> Result<Option<TransactionFee>, StoreError>;
    /// Insert a transaction fee. Codes are unique.
    async fn insert_fee(&self, fee: TransactionFee) -> Result<TransactionFee, StoreError>;
    /// Replace a transaction fee. `None` if it does not exist.
    async fn update_fee(&self, fee: TransactionFee) -> Result<Option<TransactionFee>, StoreError>;
    /// Remove a transaction fee. `false` if it did not exist.
    async fn delete_fee(&self, code: &FeeCode) -> Result<bool, StoreError>;
}
