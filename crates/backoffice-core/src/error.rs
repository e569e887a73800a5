//! # Error Types
//!
//! Structured validation errors for domain primitives, built with `thiserror`.
//! Messages quote the offending input and the expected format so that API
//! clients can act on them. PIN and password material is never echoed.

use thiserror::Error;

/// Domain primitive validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// PIN is not exactly six ASCII digits. The value is deliberately omitted.
    #[error("invalid PIN: expected exactly 6 decimal digits")]
    InvalidPin,

    /// A numeric component does not fit its fixed-width field.
    #[error("{field} {value} is out of range (expected 0..={max})")]
    OutOfRange {
        /// Name of the offending component.
        field: &'static str,
        /// The rejected value.
        value: i128,
        /// Inclusive upper bound of the field.
        max: u64,
    },

    /// Account number is not 20 decimal digits.
    #[error("invalid account number: \"{0}\" (expected 20 decimal digits)")]
    InvalidAccountNumber(String),

    /// Currency code is not three ASCII letters.
    #[error("invalid currency code: \"{0}\" (expected 3 letters, e.g. IDR)")]
    InvalidCurrencyCode(String),

    /// Fee code is not three ASCII alphanumerics.
    #[error("invalid fee code: \"{0}\" (expected 3 alphanumeric characters)")]
    InvalidFeeCode(String),

    /// Role identifier is not three ASCII letters.
    #[error("invalid role id: \"{0}\" (expected 3 letters, e.g. ADM)")]
    InvalidRoleId(String),

    /// National identity number is not sixteen digits.
    #[error("invalid NIK: \"{0}\" (expected 16 decimal digits)")]
    InvalidNik(String),

    /// E-mail address lacks a local part or a domain.
    #[error("invalid e-mail address: \"{0}\"")]
    InvalidEmail(String),

    /// A required text field is empty or whitespace.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A text field is shorter than its minimum length.
    #[error("{field} must be at least {min} characters")]
    TooShort {
        /// Name of the offending field.
        field: &'static str,
        /// Minimum accepted length in characters.
        min: usize,
    },

    /// A monetary amount or rate is zero or negative.
    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),
}

/// Failure to hash a secret. Carries no secret material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("secret hashing failed: {0}")]
pub struct HashError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_field_and_bound() {
        let err = ValidationError::OutOfRange {
            field: "branch id",
            value: 10_000,
            max: 9_999,
        };
        let msg = err.to_string();
        assert!(msg.contains("branch id"));
        assert!(msg.contains("10000"));
        assert!(msg.contains("9999"));
    }

    #[test]
    fn invalid_pin_message_does_not_echo_input() {
        let msg = ValidationError::InvalidPin.to_string();
        assert_eq!(msg, "invalid PIN: expected exactly 6 decimal digits");
    }
}
