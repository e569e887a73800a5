//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the back-office.
//! Each identifier is a distinct type: a [`BranchId`] cannot be passed where
//! an [`AccountTypeId`] is expected.
//!
//! ## Validation
//!
//! String identifiers ([`Nik`], [`RoleId`], [`CurrencyCode`], [`FeeCode`])
//! validate format at construction time and on deserialization. UUID
//! identifiers are always valid by construction. Integer identifiers mirror
//! the storage keys and are range-checked only where a fixed-width encoding
//! needs it (see [`crate::account_number`]).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// UUID-based identifiers
// ---------------------------------------------------------------------------

/// Identifier of a user (customer or employee).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Create a new random user identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a user identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque internal identifier of an account row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Create a new random account identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an account identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Integer identifiers (storage-assigned)
// ---------------------------------------------------------------------------

/// Identifier of a branch office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct BranchId(i32);

impl BranchId {
    /// Wrap a raw branch key.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// The raw branch key.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for BranchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an account type (product).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct AccountTypeId(i32);

impl AccountTypeId {
    /// Wrap a raw account type key.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// The raw account type key.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for AccountTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// String-based identifiers (validated at construction)
// ---------------------------------------------------------------------------

fn is_three(s: &str, pred: impl Fn(char) -> bool) -> bool {
    s.len() == 3 && s.chars().all(pred)
}

/// Indonesian national identity number (NIK).
///
/// # Validation
///
/// - Exactly 16 ASCII digits
/// - Leading zeros are significant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct Nik(String);

impl Nik {
    /// Length of a NIK in digits.
    pub const LEN: usize = 16;

    /// Create a NIK from a string value, validating the 16-digit format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidNik`] if the value is not exactly
    /// 16 digits.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let trimmed = s.trim();
        if trimmed.len() != Self::LEN || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidNik(s));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the NIK digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Nik {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Nik> for String {
    fn from(value: Nik) -> Self {
        value.0
    }
}

impl std::fmt::Display for Nik {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Three-letter role code (`ADM`, `EMP`, `USR`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId(String);

impl RoleId {
    /// Role assigned to newly registered users when none is given.
    pub const DEFAULT: &'static str = "USR";
    /// Built-in administrator role.
    pub const ADMIN: &'static str = "ADM";
    /// Built-in employee role.
    pub const EMPLOYEE: &'static str = "EMP";

    /// Create a role id, normalising to upper case.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRoleId`] unless the value is three
    /// ASCII letters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if !is_three(s.trim(), |c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidRoleId(s));
        }
        Ok(Self(s.trim().to_ascii_uppercase()))
    }

    /// The default role for new users.
    pub fn default_user() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    /// The built-in administrator role.
    pub fn admin() -> Self {
        Self(Self::ADMIN.to_string())
    }

    /// The built-in employee role.
    pub fn employee() -> Self {
        Self(Self::EMPLOYEE.to_string())
    }

    /// Access the role code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoleId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleId> for String {
    fn from(value: RoleId) -> Self {
        value.0
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// ISO 4217-style three-letter currency code, stored upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// The deployment's base currency unless configured otherwise.
    pub const DEFAULT_BASE: &'static str = "IDR";

    /// The default base currency, Indonesian Rupiah.
    pub fn default_base() -> Self {
        Self(Self::DEFAULT_BASE.to_string())
    }

    /// Create a currency code, normalising to upper case.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCurrencyCode`] unless the value is
    /// three ASCII letters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if !is_three(s.trim(), |c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrencyCode(s));
        }
        Ok(Self(s.trim().to_ascii_uppercase()))
    }

    /// Access the currency code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Three-character transaction fee code (`INT`, `BIF`, ...), stored upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
pub struct FeeCode(String);

impl FeeCode {
    /// Create a fee code, normalising to upper case.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidFeeCode`] unless the value is three
    /// ASCII alphanumerics.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if !is_three(s.trim(), |c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidFeeCode(s));
        }
        Ok(Self(s.trim().to_ascii_uppercase()))
    }

    /// Access the fee code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FeeCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeeCode> for String {
    fn from(value: FeeCode) -> Self {
        value.0
    }
}

impl std::fmt::Display for FeeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn user_id_round_trips_through_uuid() {
        let raw = Uuid::new_v4();
        assert_eq!(*UserId::from_uuid(raw).as_uuid(), raw);
    }

    #[test]
    fn nik_accepts_sixteen_digits() {
        let nik = Nik::new("3174012345678901").unwrap();
        assert_eq!(nik.as_str(), "3174012345678901");
    }

    #[test]
    fn nik_trims_surrounding_whitespace() {
        assert_eq!(Nik::new(" 3174012345678901 ").unwrap().as_str(), "3174012345678901");
    }

    #[test]
    fn nik_rejects_wrong_length_and_letters() {
        assert!(Nik::new("317401234567890").is_err());
        assert!(Nik::new("31740123456789012").is_err());
        assert!(Nik::new("31740123456789AB").is_err());
        assert!(Nik::new("").is_err());
    }

    #[test]
    fn currency_code_normalises_case() {
        assert_eq!(CurrencyCode::new("usd").unwrap().as_str(), "USD");
    }

    #[test]
    fn currency_code_rejects_bad_input() {
        assert!(CurrencyCode::new("US").is_err());
        assert!(CurrencyCode::new("USDT").is_err());
        assert!(CurrencyCode::new("U5D").is_err());
    }

    #[test]
    fn fee_code_allows_digits() {
        assert_eq!(FeeCode::new("t01").unwrap().as_str(), "T01");
        assert!(FeeCode::new("T-1").is_err());
        assert!(FeeCode::new("TRAN").is_err());
    }

    #[test]
    fn role_id_default_is_usr() {
        assert_eq!(RoleId::default_user().as_str(), "USR");
        assert_eq!(RoleId::new("adm").unwrap().as_str(), "ADM");
        assert!(RoleId::new("AD1").is_err());
    }

    #[test]
    fn built_in_roles_are_valid_codes() {
        for built_in in [RoleId::admin(), RoleId::employee(), RoleId::default_user()] {
            assert_eq!(RoleId::new(built_in.as_str()).unwrap(), built_in);
        }
    }

    #[test]
    fn string_ids_validate_on_deserialize() {
        let ok: CurrencyCode = serde_json::from_str("\"idr\"").unwrap();
        assert_eq!(ok.as_str(), "IDR");
        assert!(serde_json::from_str::<CurrencyCode>("\"rupiah\"").is_err());
        assert!(serde_json::from_str::<Nik>("\"123\"").is_err());
    }

    #[test]
    fn integer_ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&BranchId::new(12)).unwrap(), "12");
        let t: AccountTypeId = serde_json::from_str("7").unwrap();
        assert_eq!(t.get(), 7);
    }
}
