//! Password hashing seam.
//!
//! The identity core never compares raw passwords; it goes through this
//! trait. The default implementation is Argon2id with the crate's
//! recommended parameters. The algorithm itself is an external collaborator
//! — nothing in this module designs hashing, it only binds it.

use crate::error::{IdentityError, Result};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};

/// Hashes and verifies passwords.
pub trait PasswordHasher: Send + Sync {
    /// Hash a password for storage.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::PasswordHash`] if hashing fails.
    fn hash(&self, password: &str) -> Result<String>;

    /// Verify a password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; errors are reserved for malformed
    /// hashes and other non-credential failures.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::PasswordHash`] if the stored hash cannot be
    /// parsed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id password hasher (`PHC` string format).
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| IdentityError::PasswordHash(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| IdentityError::PasswordHash(e.to_string()))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(IdentityError::PasswordHash(e.to_string())),
        }
    }
}
