//! Random tokens
//!
//! Used for ticket capability tokens and for email verification and
//! password reset links.

use rand::RngCore;

/// Number of random bytes in a token
pub const TOKEN_BYTES: usize = 32;

/// Generate a fresh token: 32 random bytes, hex encoded (64 characters)
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
