//! # PINs and Secret Hashing
//!
//! [`RawPin`] is the only way a PIN enters the system. It accepts exactly six
//! ASCII digits, zeroes its buffer on drop and never prints its contents.
//!
//! [`SecretHasher`] turns a PIN or password into an Argon2id PHC string with
//! a fresh random salt. Only that string is ever persisted. Verification
//! reads the cost parameters from the stored string, so hashes made under
//! different costs keep verifying.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{HashError, ValidationError};

/// Number of digits in a PIN.
pub const PIN_LEN: usize = 6;

/// A validated, not yet hashed PIN.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RawPin(String);

impl RawPin {
    /// Validate a PIN.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPin`] unless the input is exactly
    /// [`PIN_LEN`] ASCII decimal digits. The rejected input is dropped
    /// and zeroed.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let mut s = value.into();
        if s.len() != PIN_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            s.zeroize();
            return Err(ValidationError::InvalidPin);
        }
        Ok(Self(s))
    }

    /// Hash this PIN for storage with the default cost.
    pub fn hash(&self) -> Result<String, HashError> {
        hash_secret(&self.0)
    }

    /// Hash this PIN for storage with the given hasher.
    pub fn hash_with(&self, hasher: &SecretHasher) -> Result<String, HashError> {
        hasher.hash(&self.0)
    }

    /// Check this PIN against a stored hash.
    pub fn matches(&self, stored_hash: &str) -> bool {
        verify_secret(&self.0, stored_hash)
    }
}

impl std::fmt::Debug for RawPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RawPin([REDACTED])")
    }
}

/// Argon2id hasher with fixed cost parameters.
#[derive(Clone, Default)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
}

impl SecretHasher {
    /// Hasher with explicit costs: memory in KiB, iterations, lanes.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if Argon2 rejects the parameters.
    pub fn with_cost(memory_kib: u32, iterations: u32, lanes: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, iterations, lanes, None)
            .map_err(|e| HashError(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a secret with a random salt, returning a PHC string.
    pub fn hash(&self, secret: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| HashError(e.to_string()))
    }
}

impl std::fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHasher").finish_non_exhaustive()
    }
}

/// Hash a secret with the default Argon2id cost and a random salt.
pub fn hash_secret(secret: &str) -> Result<String, HashError> {
    SecretHasher::default().hash(secret)
}

/// Verify a secret against a PHC string. Malformed hashes never verify.
pub fn verify_secret(secret: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_six_digits() {
        assert!(RawPin::new("123456").is_ok());
        assert!(RawPin::new("000000").is_ok());
    }

    #[test]
    fn rejects_letters() {
        assert_eq!(RawPin::new("12a45b").unwrap_err(), ValidationError::InvalidPin);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(RawPin::new("12345").is_err());
        assert!(RawPin::new("1234567").is_err());
        assert!(RawPin::new("").is_err());
    }

    #[test]
    fn rejects_non_ascii_digits() {
        // Arabic-Indic digits are numeric but not ASCII.
        assert!(RawPin::new("١٢٣٤٥٦").is_err());
        assert!(RawPin::new(" 12345").is_err());
    }

    #[test]
    fn debug_is_redacted() {
        let pin = RawPin::new("987654").unwrap();
        let dbg = format!("{pin:?}");
        assert!(!dbg.contains("987654"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn hash_is_salted_and_verifies() {
        let pin = RawPin::new("135790").unwrap();
        let h1 = pin.hash().unwrap();
        let h2 = pin.hash().unwrap();
        assert_ne!(h1, h2);
        assert!(h1.starts_with("$argon2id$"));
        assert!(!h1.contains("135790"));
        assert!(pin.matches(&h1));
        assert!(pin.matches(&h2));
        assert!(!RawPin::new("135791").unwrap().matches(&h1));
    }

    #[test]
    fn custom_cost_hashes_verify() {
        let hasher = SecretHasher::with_cost(1024, 1, 1).unwrap();
        let pin = RawPin::new("424242").unwrap();
        let h = pin.hash_with(&hasher).unwrap();
        assert!(h.contains("m=1024,t=1,p=1"));
        assert!(pin.matches(&h));
    }

    #[test]
    fn invalid_cost_is_rejected() {
        assert!(SecretHasher::with_cost(0, 0, 0).is_err());
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_secret("secret", "not-a-phc-string"));
        assert!(!verify_secret("secret", ""));
    }
}
