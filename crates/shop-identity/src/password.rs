//! Argon2id password hashing

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::IdentityError;

/// Shortest accepted password
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Argon2 work factors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashingCost {
    /// Memory in KiB
    pub memory_kib: u32,
    /// Passes over memory
    pub iterations: u32,
}

impl Default for HashingCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
        }
    }
}

/// Hashes and verifies user passwords (PHC string format)
#[derive(Clone)]
pub struct PasswordManager {
    argon2: Argon2<'static>,
}

impl PasswordManager {
    /// Manager with the given cost
    pub fn new(cost: HashingCost) -> Result<Self, IdentityError> {
        let params = Params::new(cost.memory_kib, cost.iterations, 1, None)
            .map_err(|e| IdentityError::Crypto(format!("argon2 params: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Reject passwords that are too short
    pub fn check_strength(password: &str) -> Result<(), IdentityError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(IdentityError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(())
    }

    /// Hash with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| IdentityError::Crypto(format!("hash failed: {e}")))?;
        Ok(hash.to_string())
    }

    /// `Ok(false)` on mismatch, `Err` when the stored hash is unreadable
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, IdentityError> {
        let parsed = PasswordHash::new(stored)
            .map_err(|e| IdentityError::Crypto(format!("stored hash unreadable: {e}")))?;
        Ok(self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
    }
}

impl Default for PasswordManager {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}
