//! # API Route Modules
//!
//! - `accounts`: account opening, listing and PIN changes.
//! - `users`: user registration and lookup.
//! - `branches`, `account_types`, `currencies`, `fees`: reference data.
//!   Reads are open to any authenticated caller; writes need the matching
//!   `manage_*` capability.

pub mod account_types;
pub mod accounts;
pub mod branches;
pub mod currencies;
pub mod fees;
pub mod users;
