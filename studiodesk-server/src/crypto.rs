//! Password hashing and token helpers

use crate::error::DeskError;

pub use studiodesk_core::generate_token;

/// Minimum password length in bytes
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length in bytes (bcrypt ignores anything past 72)
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Cost bounds accepted by bcrypt
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Well-formed bcrypt salt and digest that no password is expected to match
const DECOY_SALT_AND_DIGEST: &str = "N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";

/// Password checking as seen by login
pub trait VerifyPassword {
    fn verify(&self, password: &str, hash: &str) -> bool;

    /// A hash at the same cost as real ones, for checks against accounts
    /// that do not exist
    fn decoy_hash(&self) -> String;
}

/// bcrypt wrapper; the produced hash embeds its own salt
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with bcrypt
    pub fn hash(&self, password: &str) -> Result<String, DeskError> {
        bcrypt::hash(password, self.cost).map_err(DeskError::internal)
    }

    /// Verify a password against a bcrypt hash.
    ///
    /// A malformed stored hash counts as a mismatch.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be checked");
                false
            }
        }
    }
}

impl VerifyPassword for PasswordHasher {
    fn verify(&self, password: &str, hash: &str) -> bool {
        PasswordHasher::verify(self, password, hash)
    }

    fn decoy_hash(&self) -> String {
        format!("$2b${:02}${}", self.cost, DECOY_SALT_AND_DIGEST)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

/// Check password length limits
pub fn validate_password(password: &str) -> Result<(), DeskError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(DeskError::validation(format!(
            "Password too short (minimum {} characters)",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(DeskError::validation(format!(
            "Password too long (maximum {} characters)",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Trim and lowercase an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
