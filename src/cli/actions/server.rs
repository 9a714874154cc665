use crate::{
    api::{self, AppState},
    auth::{AuthenticationGate, PasswordHasher, PasswordParams, TokenIssuer, TokenVerifier},
    cli::telemetry,
    storage::{self, PgBookStore, PgCredentialStore},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub jwt_secret: SecretString,
    pub password_params: PasswordParams,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable, the auth core cannot be
/// built from the configuration, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let hasher =
        PasswordHasher::new(args.password_params).context("Invalid password hashing parameters")?;
    let issuer = TokenIssuer::new(&args.jwt_secret).context("Invalid token signing secret")?;
    let verifier = TokenVerifier::new(&args.jwt_secret).context("Invalid token signing secret")?;

    let pool = storage::connect(&args.dsn).await?;
    storage::apply_schema(&pool).await?;

    let credentials = Arc::new(PgCredentialStore::new(pool.clone()));
    let books = Arc::new(PgBookStore::new(pool.clone()));

    let state = Arc::new(AppState {
        gate: AuthenticationGate::new(credentials, hasher, issuer),
        verifier,
        books,
        pool: Some(pool),
    });

    let result = api::new(args.port, state).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("jwt_secret", "set".to_string()),
        ("hash_memory_kib", args.password_params.memory_kib.to_string()),
        ("hash_iterations", args.password_params.iterations.to_string()),
        ("hash_parallelism", args.password_params.parallelism.to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}
