use clap::{Arg, Command};

pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_HASH_MEMORY_KIB: &str = "hash-memory-kib";
pub const ARG_HASH_ITERATIONS: &str = "hash-iterations";
pub const ARG_HASH_PARALLELISM: &str = "hash-parallelism";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HMAC-SHA256 secret used to sign and verify bearer tokens")
                .env("BOOKVAULT_JWT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_HASH_MEMORY_KIB)
                .long(ARG_HASH_MEMORY_KIB)
                .help("Argon2id memory cost in KiB")
                .env("BOOKVAULT_HASH_MEMORY_KIB")
                .default_value("19456")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_HASH_ITERATIONS)
                .long(ARG_HASH_ITERATIONS)
                .help("Argon2id time cost (iterations)")
                .env("BOOKVAULT_HASH_ITERATIONS")
                .default_value("2")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_HASH_PARALLELISM)
                .long(ARG_HASH_PARALLELISM)
                .help("Argon2id parallelism (lanes)")
                .env("BOOKVAULT_HASH_PARALLELISM")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
}
