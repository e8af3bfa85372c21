//! Password hashing with bcrypt.
//!
//! The salt is generated per hash and embedded in the output string, so no
//! separate salt storage is needed.

use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};

/// Hash a plaintext password with bcrypt at the default cost factor.
///
/// # Errors
///
/// Returns an error if the hashing primitive fails; this does not happen for
/// well-formed input.
pub fn hash_password(password: &str) -> Result<String> {
    hash(password, DEFAULT_COST).context("failed to hash password")
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// A malformed stored hash verifies as `false` rather than erroring, so a
/// caller cannot tell corrupt data apart from a wrong password.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    verify(password, stored_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();

        assert!(hash.starts_with("$2"), "expected a bcrypt hash, got {hash}");
        assert!(verify_password("correct horse battery staple", &hash));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let hash = hash_password("right-password").unwrap();

        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn malformed_stored_hash_verifies_false() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
        assert!(!verify_password("anything", ""));
    }
}
