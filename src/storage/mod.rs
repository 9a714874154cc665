//! Postgres adapters for the credential and book stores.

mod books;
mod users;

pub use books::PgBookStore;
pub use users::PgCredentialStore;

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::{debug, info_span, Instrument};

use crate::auth::{StoreError, UserId};

const SCHEMA: &str = include_str!("../../sql/schema.sql");

/// Open the connection pool.
/// # Errors
/// Returns an error if the database is unreachable.
pub async fn connect(dsn: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn)
        .await
        .context("Failed to connect to database")
}

/// Create tables and indexes if they do not exist yet.
/// # Errors
/// Returns an error if any statement fails.
pub async fn apply_schema(pool: &PgPool) -> Result<()> {
    for statement in schema_statements(SCHEMA) {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DDL",
            db.statement = statement
        );
        sqlx::query(statement)
            .execute(pool)
            .instrument(span)
            .await
            .with_context(|| format!("failed to apply schema statement: {statement}"))?;
    }

    debug!("schema applied");

    Ok(())
}

fn schema_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|statement| {
            statement
                .lines()
                .any(|line| !line.trim().is_empty() && !line.trim_start().starts_with("--"))
        })
        .collect()
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            Self::Conflict
        } else {
            Self::backend(err)
        }
    }
}

// BIGSERIAL ids are always positive, so the conversions only fail on corrupt rows.
fn user_id_from_db(id: i64) -> Result<UserId, StoreError> {
    u64::try_from(id)
        .map(UserId::new)
        .map_err(|_| StoreError::backend(std::io::Error::other(format!("invalid user id {id}"))))
}

fn user_id_to_db(id: UserId) -> Result<i64, StoreError> {
    i64::try_from(id.get())
        .map_err(|_| StoreError::backend(std::io::Error::other(format!("user id {id} out of range"))))
}
