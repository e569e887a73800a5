//! # Database Persistence Layer
//!
//! PostgreSQL backend for the storage seams via SQLx.
//!
//! The database is **optional**. When `DATABASE_URL` is set the API keeps
//! everything in PostgreSQL; when absent it runs on
//! [`MemoryStore`](crate::store::MemoryStore), which is only suitable for
//! development and tests.
//!
//! ## Modules
//!
//! - [`sequences`]: the per-(branch, account type) counter table.
//! - [`accounts`]: account rows and the allocate-and-insert transaction.
//! - [`users`]: users and roles.
//! - [`reference`]: branches, account types, currencies, transaction fees.
//!
//! Functions take an executor (`&PgPool` or a transaction) and return
//! [`StoreError`]. SQLSTATE `23505` maps to [`StoreError::UniqueViolation`]
//! and `23503` to [`StoreError::NotFound`].

pub mod accounts;
pub mod reference;
pub mod sequences;
pub mod users;

use async_trait::async_trait;
use backoffice_core::{
    Account, AccountNumber, AccountType, AccountTypeId, Branch, BranchId, Currency, CurrencyCode,
    FeeCode, NewAccountType, NewBranch, Nik, Role, RoleId, SequenceKey, TransactionFee, User,
    UserId,
};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::store::{AccountChange, AccountDraft, AccountLedger, Directory, StoreError, UserQuery};

/// Connect to PostgreSQL and run the embedded migrations.
pub async fn init_pool(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2.min(max_connections))
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let detail = db
                .constraint()
                .map(str::to_string)
                .unwrap_or_else(|| db.message().to_string());
            match db.code().as_deref() {
                Some("23505") => return Self::UniqueViolation(detail),
                Some("23503") => return Self::NotFound(detail),
                _ => {}
            }
        }
        Self::Backend(err.to_string())
    }
}

/// Map a value read from the database that fails domain validation.
pub(crate) fn corrupt<E: std::fmt::Display>(what: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::Backend(format!("stored {what} is invalid: {e}"))
}

/// PostgreSQL implementation of [`AccountLedger`] and [`Directory`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connected pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccountLedger for PgStore {
    async fn allocate_next(&self, key: SequenceKey) -> Result<u64, StoreError> {
        sequences::allocate(&self.pool, key).await
    }

    async fn current_sequence(&self, key: SequenceKey) -> Result<u64, StoreError> {
        sequences::current(&self.pool, key).await
    }

    async fn create_account(&self, draft: AccountDraft) -> Result<Account, StoreError> {
        accounts::create(&self.pool, draft).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        accounts::list(&self.pool).await
    }

    async fn accounts_for_user(&self, user: UserId) -> Result<Vec<Account>, StoreError> {
        accounts::list_for_user(&self.pool, user).await
    }

    async fn find_account(&self, number: &AccountNumber) -> Result<Option<Account>, StoreError> {
        accounts::get_by_number(&self.pool, number).await
    }

    async fn update_account(
        &self,
        number: &AccountNumber,
        change: AccountChange,
    ) -> Result<Option<Account>, StoreError> {
        accounts::update(&self.pool, number, change).await
    }
}

#[async_trait]
impl Directory for PgStore {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        users::get_by_id(&self.pool, id).await
    }

    async fn find_user_by_nik(&self, nik: &Nik) -> Result<Option<User>, StoreError> {
        users::get_by_nik(&self.pool, nik).await
    }

    async fn search_users(&self, query: &UserQuery) -> Result<Vec<User>, StoreError> {
        users::search(&self.pool, query).await
    }

    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        users::insert(&self.pool, &user).await?;
        Ok(user)
    }

    async fn find_role(&self, id: &RoleId) -> Result<Option<Role>, StoreError> {
        users::get_role(&self.pool, id).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        users::list_roles(&self.pool).await
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, StoreError> {
        reference::list_branches(&self.pool).await
    }

    async fn find_branch(&self, id: BranchId) -> Result<Option<Branch>, StoreError> {
        reference::get_branch(&self.pool, id).await
    }

    async fn insert_branch(&self, branch: NewBranch) -> Result<Branch, StoreError> {
        reference::insert_branch(&self.pool, branch).await
    }

    async fn update_branch(&self, branch: Branch) -> Result<Option<Branch>, StoreError> {
        reference::update_branch(&self.pool, branch).await
    }

    async fn list_account_types(&self) -> Result<Vec<AccountType>, StoreError> {
        reference::list_account_types(&self.pool).await
    }

    async fn find_account_type(
        &self,
        id: AccountTypeId,
    ) -> Result<Option<AccountType>, StoreError> {
        reference::get_account_type(&self.pool, id).await
    }

    async fn insert_account_type(
        &self,
        account_type: NewAccountType,
    ) -> Result<AccountType, StoreError> {
        reference::insert_account_type(&self.pool, account_type).await
    }

    async fn update_account_type(
        &self,
        account_type: AccountType,
    ) -> Result<Option<AccountType>, StoreError> {
        reference::update_account_type(&self.pool, account_type).await
    }

    async fn list_currencies(&self) -> Result<Vec<Currency>, StoreError> {
        reference::list_currencies(&self.pool).await
    }

    async fn find_currency(&self, code: &CurrencyCode) -> Result<Option<Currency>, StoreError> {
        reference::get_currency(&self.pool, code).await
    }

    async fn insert_currency(&self, currency: Currency) -> Result<Currency, StoreError> {
        reference::insert_currency(&self.pool, &currency).await?;
        Ok(currency)
    }

    async fn update_currency(&self, currency: Currency) -> Result<Option<Currency>, StoreError> {
        let updated = reference::update_currency(&self.pool, &currency).await?;
        Ok(updated.then_some(currency))
    }

    async fn list_fees(&self) -> Result<Vec<TransactionFee>, StoreError> {
        reference::list_fees(&self.pool).await
    }

    async fn find_fee(&self, code: &FeeCode) -> Result<Option<TransactionFee>, StoreError> {
        reference::get_fee(&self.pool, code).await
    }

    async fn insert_fee(&self, fee: TransactionFee) -> Result<TransactionFee, StoreError> {
        reference::insert_fee(&self.pool, &fee).await?;
        Ok(fee)
    }

    async fn update_fee(&self, fee: TransactionFee) -> Result<Option<TransactionFee>, StoreError> {
        let updated = reference::update_fee(&self.pool, &fee).await?;
        Ok(updated.then_some(fee))
    }

    async fn delete_fee(&self, code: &FeeCode) -> Result<bool, StoreError> {
        reference::delete_fee(&self.pool, code).await
    }
}
