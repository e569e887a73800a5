//! Sequence counter persistence.
//!
//! One row per (branch, account type) in `account_sequences`. Allocation is
//! a single upsert that creates the row at 1 or increments it, returning the
//! new value. The upsert takes the row lock, so concurrent allocations for
//! the same key serialize while other keys proceed.
//!
//! Run on the pool, an allocation commits on its own and the value is
//! consumed even if the caller never uses it. Run inside a transaction, it
//! is rolled back with the transaction.

use backoffice_core::SequenceKey;
use sqlx::PgExecutor;

use crate::store::StoreError;

/// Allocate the next sequence value for `key`.
pub async fn allocate<'e>(executor: impl PgExecutor<'e>, key: SequenceKey) -> Result<u64, StoreError> {
    let next: i64 = sqlx::query_scalar(
        "INSERT INTO account_sequences (branch_id, account_type_id, last_sequence)
         VALUES ($1, $2, 1)
         ON CONFLICT (branch_id, account_type_id)
         DO UPDATE SET last_sequence = account_sequences.last_sequence + 1
         RETURNING last_sequence",
    )
    .bind(key.branch.get())
    .bind(key.account_type.get())
    .fetch_one(executor)
    .await?;

    u64::try_from(next).map_err(super::corrupt("sequence counter"))
}

/// The last value handed out for `key`, or 0 if none was.
pub async fn current<'e>(executor: impl PgExecutor<'e>, key: SequenceKey) -> Result<u64, StoreError> {
    let last: Option<i64> = sqlx::query_scalar(
        "SELECT last_sequence FROM account_sequences
         WHERE branch_id = $1 AND account_type_id = $2",
    )
    .bind(key.branch.get())
    .bind(key.account_type.get())
    .fetch_optional(executor)
    .await?;

    last.map_or(Ok(0), |v| {
        u64::try_from(v).map_err(super::corrupt("sequence counter"))
    })
}
