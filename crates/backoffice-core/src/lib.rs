#![deny(missing_docs)]

//! # backoffice-core: Domain Types for the Bank Back-Office
//!
//! This crate defines the types that the API crate builds on. It performs no
//! I/O: storage, transport and authorization lookups live in `backoffice-api`.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** A [`BranchId`] cannot be passed
//!    where an [`AccountTypeId`] is expected, and string identifiers such as
//!    [`Nik`] or [`CurrencyCode`] validate their format at construction.
//!
//! 2. **[`AccountNumber`] is the only way to spell an account number.** It is
//!    produced by [`account_number::encode`] from a (branch, account type,
//!    sequence) triple, or parsed back with [`AccountNumber::parse`]. Out of
//!    range components are rejected, never truncated.
//!
//! 3. **Closed capability vocabulary.** Authorization is expressed as a
//!    [`CapabilitySet`] over the fixed [`Capability`] enum with a single
//!    [`CapabilitySet::has`] predicate.
//!
//! 4. **Secrets stay opaque.** [`RawPin`] zeroes its buffer on drop and
//!    redacts itself in `Debug`; only Argon2 PHC strings are ever stored.

pub mod account_number;
pub mod capability;
pub mod error;
pub mod identity;
pub mod pin;
pub mod records;

pub use account_number::{AccountNumber, ACCOUNT_NUMBER_LEN, MAX_ENTITY_ID, MAX_SEQUENCE};
pub use capability::{Capability, CapabilitySet};
pub use error::{HashError, ValidationError};
pub use identity::{
    AccountId, AccountTypeId, BranchId, CurrencyCode, FeeCode, Nik, RoleId, UserId,
};
pub use pin::{hash_secret, verify_secret, RawPin, SecretHasher, PIN_LEN};
pub use records::{
    Account, AccountType, Branch, Currency, NewAccountType, NewBranch, Role, SequenceKey,
    TransactionFee, User,
};
