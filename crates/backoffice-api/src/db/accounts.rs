//! Account persistence operations.
//!
//! [`create`] allocates the sequence value and inserts the account inside
//! one transaction. If encoding the number or the insert fails, the
//! transaction is dropped and the counter increment is rolled back with it.

use backoffice_core::{
    account_number, Account, AccountId, AccountNumber, AccountTypeId, BranchId, CurrencyCode,
    UserId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::{corrupt, sequences};
use crate::store::{AccountChange, AccountDraft, StoreError};

const COLUMNS: &str = "id, user_id, employee_id, branch_id, account_type_id, sequence_number,
     account_number, currency, balance, pin_hash, created_at, updated_at";

/// Allocate a sequence number and insert the account in one transaction.
pub async fn create(pool: &PgPool, draft: AccountDraft) -> Result<Account, StoreError> {
    let mut tx = pool.begin().await?;

    let sequence = sequences::allocate(&mut *tx, draft.key).await?;
    let number = account_number::encode(draft.key.branch, draft.key.account_type, sequence)?;

    let now = Utc::now();
    let account = Account {
        id: draft.id,
        user_id: draft.user_id,
        employee_id: draft.employee_id,
        branch_id: draft.key.branch,
        account_type_id: draft.key.account_type,
        sequence_number: sequence,
        account_number: number,
        currency: draft.currency,
        balance: Decimal::ZERO,
        pin_hash: draft.pin_hash,
        created_at: now,
        updated_at: now,
    };
    insert(&mut *tx, &account).await?;

    tx.commit().await?;
    Ok(account)
}

/// Insert an account row.
pub async fn insert<'e>(executor: impl PgExecutor<'e>, account: &Account) -> Result<(), StoreError> {
    let sequence = i64::try_from(account.sequence_number).map_err(corrupt("sequence number"))?;
    sqlx::query(
        "INSERT INTO accounts (id, user_id, employee_id, branch_id, account_type_id,
         sequence_number, account_number, currency, balance, pin_hash, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(account.id.as_uuid())
    .bind(account.user_id.as_uuid())
    .bind(account.employee_id.as_uuid())
    .bind(account.branch_id.get())
    .bind(account.account_type_id.get())
    .bind(sequence)
    .bind(account.account_number.as_str())
    .bind(account.currency.as_str())
    .bind(account.balance)
    .bind(&account.pin_hash)
    .bind(account.created_at)
    .bind(account.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// All accounts, ordered by account number.
pub async fn list(pool: &PgPool) -> Result<Vec<Account>, StoreError> {
    let rows = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {COLUMNS} FROM accounts ORDER BY account_number"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(AccountRow::into_record).collect()
}

/// Accounts owned by one user.
pub async fn list_for_user(pool: &PgPool, user: UserId) -> Result<Vec<Account>, StoreError> {
    let rows = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {COLUMNS} FROM accounts WHERE user_id = $1 ORDER BY account_number"
    ))
    .bind(user.as_uuid())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(AccountRow::into_record).collect()
}

/// Fetch an account by number.
pub async fn get_by_number(
    pool: &PgPool,
    number: &AccountNumber,
) -> Result<Option<Account>, StoreError> {
    let row = sqlx::query_as::<_, AccountRow>(&format!(
        "SELECT {COLUMNS} FROM accounts WHERE account_number = $1"
    ))
    .bind(number.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(AccountRow::into_record).transpose()
}

/// Set the employee of record and, optionally, a new PIN hash.
pub async fn update(
    pool: &PgPool,
    number: &AccountNumber,
    change: AccountChange,
) -> Result<Option<Account>, StoreError> {
    let row = sqlx::query_as::<_, AccountRow>(&format!(
        "UPDATE accounts
         SET employee_id = $2, pin_hash = COALESCE($3, pin_hash), updated_at = now()
         WHERE account_number = $1
         RETURNING {COLUMNS}"
    ))
    .bind(number.as_str())
    .bind(change.employee_id.as_uuid())
    .bind(change.pin_hash)
    .fetch_optional(pool)
    .await?;

    row.map(AccountRow::into_record).transpose()
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    user_id: Uuid,
    employee_id: Uuid,
    branch_id: i32,
    account_type_id: i32,
    sequence_number: i64,
    account_number: String,
    currency: String,
    balance: Decimal,
    pin_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_record(self) -> Result<Account, StoreError> {
        Ok(Account {
            id: AccountId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            employee_id: UserId::from_uuid(self.employee_id),
            branch_id: BranchId::new(self.branch_id),
            account_type_id: AccountTypeId::new(self.account_type_id),
            sequence_number: u64::try_from(self.sequence_number)
                .map_err(corrupt("sequence number"))?,
            account_number: AccountNumber::parse(&self.account_number)
                .map_err(corrupt("account number"))?,
            currency: CurrencyCode::new(self.currency).map_err(corrupt("currency code"))?,
            balance: self.balance,
            pin_hash: self.pin_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
