//! Registration and login orchestration.

use std::sync::Arc;
use tracing::{debug, error, instrument};

use super::{
    error::{AuthError, StoreError},
    identity::Identity,
    password::{HashedPassword, PasswordHasher},
    store::CredentialStore,
    token::TokenIssuer,
};

pub struct AuthenticationGate {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
}

impl std::fmt::Debug for AuthenticationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationGate")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl AuthenticationGate {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            store,
            hasher,
            issuer,
        }
    }

    /// Create an account.
    ///
    /// # Errors
    /// - `Validation` if username or password is empty.
    /// - `DuplicateUsername` if the store reports the name as taken.
    /// - `Internal` on hashing or store failures.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "username and password required".to_string(),
            ));
        }

        let password_hash = self.hash_blocking(password).await?;

        match self.store.insert(username, &password_hash).await {
            Ok(identity) => {
                debug!(user_id = %identity.user_id(), "user registered");
                Ok(identity)
            }
            Err(StoreError::Conflict) => {
                debug!("username already taken");
                Err(AuthError::DuplicateUsername)
            }
            Err(err) => {
                error!("Error inserting user: {err}");
                Err(err.into())
            }
        }
    }

    /// Check credentials and issue a bearer token.
    ///
    /// An unknown username and a wrong password both yield
    /// `InvalidCredentials`, and both cost one Argon2 evaluation.
    ///
    /// # Errors
    /// `InvalidCredentials` on any mismatch, `Internal` on infrastructure failures.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let record = match self.store.find_by_username(username).await {
            Ok(record) => record,
            Err(err) => {
                error!("Error looking up user: {err}");
                return Err(err.into());
            }
        };

        let Some(record) = record else {
            // burn the same work as a real verification
            let _ = self.hash_blocking(password).await;
            debug!("unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .verify_blocking(password, record.password_hash)
            .await?
        {
            debug!(user_id = %record.identity.user_id(), "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issuer.issue(&record.identity)?;
        debug!(user_id = %record.identity.user_id(), "login successful");

        Ok(token)
    }

    async fn hash_blocking(&self, password: &str) -> Result<HashedPassword, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| AuthError::internal(format!("hashing task failed: {err}")))?
    }

    async fn verify_blocking(
        &self,
        password: &str,
        stored: HashedPassword,
    ) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(|err| AuthError::internal(format!("verification task failed: {err}")))?
    }
}
