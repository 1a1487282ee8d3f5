//! Argon2id password hashing and verification.
//!
//! Hashes written before the Argon2id migration use bcrypt (`$2a$`, `$2b$`,
//! `$2y$`). Those still verify, and [`PasswordHasher::needs_rehash`] tells
//! the caller to upgrade them after a successful login.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use remit_core::error::{AppError, ErrorKind};

const BCRYPT_PREFIX: &str = "$2";

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored hash.
    ///
    /// Returns `Ok(true)` if the password matches, `Ok(false)` if not.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        if hash.starts_with(BCRYPT_PREFIX) {
            return bcrypt::verify(password, hash).map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Legacy password verification failed", e)
            });
        }

        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        let argon2 = Argon2::default();
        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }

    /// Whether a stored hash predates Argon2id.
    pub fn needs_rehash(&self, hash: &str) -> bool {
        hash.starts_with(BCRYPT_PREFIX)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
