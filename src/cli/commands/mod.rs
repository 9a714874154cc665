pub mod auth;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Names accepted by `BOOKVAULT_LOG_LEVEL`, indexed by verbosity count.
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts a level name (any case) or its verbosity count.
fn parse_log_level(level: &str) -> Result<u8, String> {
    let level = level.trim().to_ascii_lowercase();
    if let Ok(count) = level.parse::<u8>() {
        return Ok(count.min(4));
    }

    LOG_LEVELS
        .iter()
        .position(|name| *name == level)
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("invalid log level '{level}', expected one of {LOG_LEVELS:?}"))
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("bookvault")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8000")
                .env("BOOKVAULT_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("BOOKVAULT_DSN")
                .required(true),
        );

    auth::with_args(command).arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("BOOKVAULT_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(parse_log_level),
    )
}
