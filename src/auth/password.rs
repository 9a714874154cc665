//! Argon2id password hashing.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`) so the
//! salt and cost parameters travel with the hash. Verification always uses the
//! parameters embedded in the stored value, which lets the configured cost change
//! without invalidating existing accounts.

use argon2::{
    password_hash::{self, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
};
use rand::rngs::OsRng;
use std::fmt;

use super::error::AuthError;

/// OWASP baseline for Argon2id: 19 MiB, 2 passes, 1 lane.
pub const DEFAULT_MEMORY_KIB: u32 = 19 * 1024;
pub const DEFAULT_ITERATIONS: u32 = 2;
pub const DEFAULT_PARALLELISM: u32 = 1;

/// Argon2id cost parameters used for new hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_MEMORY_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

/// One-way password hash in PHC string format.
///
/// `Debug` is redacted so the value can sit inside logged structs.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wrap a hash loaded from storage. The value is not validated until used.
    #[must_use]
    pub fn from_stored(phc: String) -> Self {
        Self(phc)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(<redacted>)")
    }
}

#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .finish()
    }
}

impl PasswordHasher {
    /// Build a hasher for the given cost parameters.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` if argon2 rejects the parameters.
    pub fn new(params: PasswordParams) -> Result<Self, AuthError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            None,
        )
        .map_err(|err| AuthError::internal(format!("invalid argon2 parameters: {err}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` only if the hash computation itself fails
    /// (resource exhaustion); the password's contents never cause an error.
    pub fn hash(&self, password: &str) -> Result<HashedPassword, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| AuthError::internal(format!("failed to hash password: {err}")))?;

        Ok(HashedPassword(hash.to_string()))
    }

    /// Check a password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch. The digest comparison is constant time.
    ///
    /// # Errors
    /// Returns `AuthError::Internal` when the stored value is not a valid PHC hash.
    pub fn verify(&self, password: &str, stored: &HashedPassword) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored.as_str())
            .map_err(|err| AuthError::internal(format!("malformed stored hash: {err}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AuthError::internal(format!(
                "failed to verify password: {err}"
            ))),
        }
    }
}
