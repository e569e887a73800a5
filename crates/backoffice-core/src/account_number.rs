//! # Account Number Codec
//!
//! An account number is the externally visible, fixed-width identifier of an
//! account. It is the concatenation of three zero-padded decimal fields:
//!
//! ```text
//! BBBB TTTT SSSSSSSSSSSS
//! │    │    └─ sequence number (12 digits)
//! │    └────── account type id (4 digits)
//! └─────────── branch id       (4 digits)
//! ```
//!
//! Encoding is injective over the accepted domain because every field has a
//! fixed width. Components that do not fit their width are rejected with
//! [`ValidationError::OutOfRange`]; nothing is truncated.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationError;
use crate::identity::{AccountTypeId, BranchId};

/// Total length of an account number in characters.
pub const ACCOUNT_NUMBER_LEN: usize = 20;

/// Largest branch or account type id that fits a 4-digit field.
pub const MAX_ENTITY_ID: u64 = 9_999;

/// Largest sequence number that fits the 12-digit field.
pub const MAX_SEQUENCE: u64 = 999_999_999_999;

const BRANCH_WIDTH: usize = 4;
const TYPE_WIDTH: usize = 4;

fn check_entity_id(field: &'static str, value: i32) -> Result<u16, ValidationError> {
    u16::try_from(value)
        .ok()
        .filter(|v| u64::from(*v) <= MAX_ENTITY_ID)
        .ok_or(ValidationError::OutOfRange {
            field,
            value: i128::from(value),
            max: MAX_ENTITY_ID,
        })
}

/// Encode a (branch, account type, sequence) triple into an account number.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] if the branch or account type id
/// is outside `0..=9999` or the sequence is above [`MAX_SEQUENCE`].
pub fn encode(
    branch: BranchId,
    account_type: AccountTypeId,
    sequence: u64,
) -> Result<AccountNumber, ValidationError> {
    let b = check_entity_id("branch id", branch.get())?;
    let t = check_entity_id("account type id", account_type.get())?;
    if sequence > MAX_SEQUENCE {
        return Err(ValidationError::OutOfRange {
            field: "sequence number",
            value: i128::from(sequence),
            max: MAX_SEQUENCE,
        });
    }
    Ok(AccountNumber(format!("{b:04}{t:04}{sequence:012}")))
}

/// Decode an account number string into its (branch, account type, sequence)
/// components.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidAccountNumber`] unless the input is
/// exactly 20 ASCII digits.
pub fn decode(value: &str) -> Result<(BranchId, AccountTypeId, u64), ValidationError> {
    AccountNumber::parse(value).map(|n| n.components())
}

/// A validated 20-digit account number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Parse and validate an account number string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAccountNumber`] unless the input is
    /// exactly 20 ASCII digits.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        if value.len() != ACCOUNT_NUMBER_LEN || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidAccountNumber(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    /// Access the account number digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into (branch, account type, sequence).
    pub fn components(&self) -> (BranchId, AccountTypeId, u64) {
        let (branch, rest) = self.0.split_at(BRANCH_WIDTH);
        let (account_type, sequence) = rest.split_at(TYPE_WIDTH);
        // All-digit fields of width 4 and 12 always parse.
        let field = |s: &str| s.bytes().fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0'));
        (
            BranchId::new(field(branch) as i32),
            AccountTypeId::new(field(account_type) as i32),
            field(sequence),
        )
    }

    /// Branch that issued this account.
    pub fn branch(&self) -> BranchId {
        self.components().0
    }

    /// Account type this account was issued under.
    pub fn account_type(&self) -> AccountTypeId {
        self.components().1
    }

    /// Sequence number within the (branch, account type) key.
    pub fn sequence(&self) -> u64 {
        self.components().2
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountNumber> for String {
    fn from(value: AccountNumber) -> Self {
        value.0
    }
}

impl std::str::FromStr for AccountNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
