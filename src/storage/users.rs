use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};

use super::user_id_from_db;
use crate::auth::{CredentialRecord, CredentialStore, HashedPassword, Identity, StoreError};

/// [`CredentialStore`] backed by the `users` table.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert(
        &self,
        username: &str,
        password_hash: &HashedPassword,
    ) -> Result<Identity, StoreError> {
        // The UNIQUE constraint decides races; 23505 surfaces as `Conflict`.
        let query = r"
            INSERT INTO users
                (username, password_hash)
            VALUES ($1, $2)
            RETURNING id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .bind(password_hash.as_str())
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;

        let id = user_id_from_db(row.try_get("id")?)?;

        Ok(Identity::new(id, username))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let query = "SELECT id, username, password_hash FROM users WHERE username = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id = user_id_from_db(row.try_get("id")?)?;
        let username: String = row.try_get("username")?;
        let password_hash: String = row.try_get("password_hash")?;

        Ok(Some(CredentialRecord {
            identity: Identity::new(id, username),
            password_hash: HashedPassword::from_stored(password_hash),
        }))
    }
}
