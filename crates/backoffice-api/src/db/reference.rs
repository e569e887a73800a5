//! Reference data persistence: branches, account types, currencies and
//! transaction fees.

use backoffice_core::{
    AccountType, AccountTypeId, Branch, BranchId, Currency, CurrencyCode, FeeCode,
    NewAccountType, NewBranch, TransactionFee,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::corrupt;
use crate::store::StoreError;

// -- Branches ---------------------------------------------------------------

pub async fn list_branches(pool: &PgPool) -> Result<Vec<Branch>, StoreError> {
    let rows = sqlx::query_as::<_, BranchRow>("SELECT id, name, address FROM branches ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(BranchRow::into_record).collect())
}

pub async fn get_branch(pool: &PgPool, id: BranchId) -> Result<Option<Branch>, StoreError> {
    let row = sqlx::query_as::<_, BranchRow>("SELECT id, name, address FROM branches WHERE id = $1")
        .bind(id.get())
        .fetch_optional(pool)
        .await?;
    Ok(row.map(BranchRow::into_record))
}

pub async fn insert_branch(pool: &PgPool, branch: NewBranch) -> Result<Branch, StoreError> {
    let id: i32 = sqlx::query_scalar("INSERT INTO branches (name, address) VALUES ($1, $2) RETURNING id")
        .bind(&branch.name)
        .bind(&branch.address)
        .fetch_one(pool)
        .await?;
    Ok(branch.with_id(BranchId::new(id)))
}

pub async fn update_branch(pool: &PgPool, branch: Branch) -> Result<Option<Branch>, StoreError> {
    let result = sqlx::query("UPDATE branches SET name = $2, address = $3 WHERE id = $1")
        .bind(branch.id.get())
        .bind(&branch.name)
        .bind(&branch.address)
        .execute(pool)
        .await?;
    Ok((result.rows_affected() > 0).then_some(branch))
}

// -- Account types ----------------------------------------------------------

pub async fn list_account_types(pool: &PgPool) -> Result<Vec<AccountType>, StoreError> {
    let rows = sqlx::query_as::<_, AccountTypeRow>(
        "SELECT id, name, can_etoll, can_indomart, can_steam FROM account_types ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(AccountTypeRow::into_record).collect())
}

pub async fn get_account_type(
    pool: &PgPool,
    id: AccountTypeId,
) -> Result<Option<AccountType>, StoreError> {
    let row = sqlx::query_as::<_, AccountTypeRow>(
        "SELECT id, name, can_etoll, can_indomart, can_steam FROM account_types WHERE id = $1",
    )
    .bind(id.get())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(AccountTypeRow::into_record))
}

pub async fn insert_account_type(
    pool: &PgPool,
    account_type: NewAccountType,
) -> Result<AccountType, StoreError> {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO account_types (name, can_etoll, can_indomart, can_steam)
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&account_type.name)
    .bind(account_type.can_etoll)
    .bind(account_type.can_indomart)
    .bind(account_type.can_steam)
    .fetch_one(pool)
    .await?;
    Ok(account_type.with_id(AccountTypeId::new(id)))
}

pub async fn update_account_type(
    pool: &PgPool,
    account_type: AccountType,
) -> Result<Option<AccountType>, StoreError> {
    let result = sqlx::query(
        "UPDATE account_types SET name = $2, can_etoll = $3, can_indomart = $4, can_steam = $5
         WHERE id = $1",
    )
    .bind(account_type.id.get())
    .bind(&account_type.name)
    .bind(account_type.can_etoll)
    .bind(account_type.can_indomart)
    .bind(account_type.can_steam)
    .execute(pool)
    .await?;
    Ok((result.rows_affected() > 0).then_some(account_type))
}

// -- Currencies -------------------------------------------------------------

pub async fn list_currencies(pool: &PgPool) -> Result<Vec<Currency>, StoreError> {
    let rows = sqlx::query_as::<_, CurrencyRow>(
        "SELECT code, name, rate_to_base FROM currencies ORDER BY code",
    )
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(CurrencyRow::into_record).collect()
}

pub async fn get_currency(
    pool: &PgPool,
    code: &CurrencyCode,
) -> Result<Option<Currency>, StoreError> {
    let row = sqlx::query_as::<_, CurrencyRow>(
        "SELECT code, name, rate_to_base FROM currencies WHERE code = $1",
    )
    .bind(code.as_str())
    .fetch_optional(pool)
    .await?;
    row.map(CurrencyRow::into_record).transpose()
}

pub async fn insert_currency(pool: &PgPool, currency: &Currency) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO currencies (code, name, rate_to_base) VALUES ($1, $2, $3)")
        .bind(currency.code.as_str())
        .bind(&currency.name)
        .bind(currency.rate_to_base)
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns whether a row was updated.
pub async fn update_currency(pool: &PgPool, currency: &Currency) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE currencies SET name = $2, rate_to_base = $3 WHERE code = $1")
        .bind(currency.code.as_str())
        .bind(&currency.name)
        .bind(currency.rate_to_base)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// -- Transaction fees -------------------------------------------------------

pub async fn list_fees(pool: &PgPool) -> Result<Vec<TransactionFee>, StoreError> {
    let rows = sqlx::query_as::<_, FeeRow>("SELECT code, name, fee FROM transaction_fees ORDER BY code")
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(FeeRow::into_record).collect()
}

pub async fn get_fee(pool: &PgPool, code: &FeeCode) -> Result<Option<TransactionFee>, StoreError> {
    let row = sqlx::query_as::<_, FeeRow>("SELECT code, name, fee FROM transaction_fees WHERE code = $1")
        .bind(code.as_str())
        .fetch_optional(pool)
        .await?;
    row.map(FeeRow::into_record).transpose()
}

pub async fn insert_fee(pool: &PgPool, fee: &TransactionFee) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO transaction_fees (code, name, fee) VALUES ($1, $2, $3)")
        .bind(fee.code.as_str())
        .bind(&fee.name)
        .bind(fee.fee)
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns whether a row was updated.
pub async fn update_fee(pool: &PgPool, fee: &TransactionFee) -> Result<bool, StoreError> {
    let result = sqlx::query("UPDATE transaction_fees SET name = $2, fee = $3 WHERE code = $1")
        .bind(fee.code.as_str())
        .bind(&fee.name)
        .bind(fee.fee)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns whether a row was deleted.
pub async fn delete_fee(pool: &PgPool, code: &FeeCode) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM transaction_fees WHERE code = $1")
        .bind(code.as_str())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// -- Rows -------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct BranchRow {
    id: i32,
    name: String,
    address: String,
}

impl BranchRow {
    fn into_record(self) -> Branch {
        Branch {
            id: BranchId::new(self.id),
            name: self.name,
            address: self.address,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AccountTypeRow {
    id: i32,
    name: String,
    can_etoll: bool,
    can_indomart: bool,
    can_steam: bool,
}

impl AccountTypeRow {
    fn into_record(self) -> AccountType {
        AccountType {
            id: AccountTypeId::new(self.id),
            name: self.name,
            can_etoll: self.can_etoll,
            can_indomart: self.can_indomart,
            can_steam: self.can_steam,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CurrencyRow {
    code: String,
    name: String,
    rate_to_base: Decimal,
}

impl CurrencyRow {
    fn into_record(self) -> Result<Currency, StoreError> {
        Ok(Currency {
            code: CurrencyCode::new(self.code).map_err(corrupt("currency code"))?,
            name: self.name,
            rate_to_base: self.rate_to_base,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FeeRow {
    code: String,
    name: String,
    fee: Decimal,
}

impl FeeRow {
    fn into_record(self) -> Result<TransactionFee, StoreError> {
        Ok(TransactionFee {
            code: FeeCode::new(self.code).map_err(corrupt("fee code"))?,
            name: self.name,
            fee: self.fee,
        })
    }
}
