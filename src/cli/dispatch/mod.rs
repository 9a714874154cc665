use crate::{
    auth::PasswordParams,
    cli::{
        actions::{server::Args, Action},
        commands::auth::{
            ARG_HASH_ITERATIONS, ARG_HASH_MEMORY_KIB, ARG_HASH_PARALLELISM, ARG_JWT_SECRET,
        },
    },
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or empty.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8000);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let jwt_secret = matches
        .get_one::<String>(ARG_JWT_SECRET)
        .cloned()
        .context("missing required argument: --jwt-secret")?;
    if jwt_secret.trim().is_empty() {
        return Err(anyhow!("--jwt-secret must not be empty"));
    }

    let defaults = PasswordParams::default();
    let password_params = PasswordParams {
        memory_kib: matches
            .get_one::<u32>(ARG_HASH_MEMORY_KIB)
            .copied()
            .unwrap_or(defaults.memory_kib),
        iterations: matches
            .get_one::<u32>(ARG_HASH_ITERATIONS)
            .copied()
            .unwrap_or(defaults.iterations),
        parallelism: matches
            .get_one::<u32>(ARG_HASH_PARALLELISM)
            .copied()
            .unwrap_or(defaults.parallelism),
    };

    Ok(Action::Server(Args {
        port,
        dsn,
        jwt_secret: SecretString::from(jwt_secret),
        password_params,
    }))
}
