//! Command-line interface for proxy-core.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::config::parse_telemetry;

/// Command-line arguments.
///
/// Options left as `None` do not override the config file or environment.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Directory for the process state file.
    pub state_dir: Option<PathBuf>,
    /// Do not persist process state.
    pub no_state: bool,
    /// Session idle timeout in seconds.
    pub session_timeout: Option<u64>,
    /// Explicit telemetry decision.
    pub telemetry: Option<bool>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('s') | Long("state-dir") => {
                result.state_dir = Some(parser.value()?.parse()?);
            }
            Long("no-state") => {
                result.no_state = true;
            }
            Short('t') | Long("session-timeout") => {
                let value: String = parser.value()?.parse()?;
                match value.parse::<u64>() {
                    Ok(secs) if secs > 0 => result.session_timeout = Some(secs),
                    _ => return Err(ArgsError::InvalidValue("session-timeout", value)),
                }
            }
            Long("telemetry") => {
                let value: String = parser.value()?.parse()?;
                result.telemetry = Some(
                    parse_telemetry(&value)
                        .ok_or(ArgsError::InvalidValue("telemetry", value))?,
                );
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"proxy-core {version}
Session registry and process-state core for a MongoDB wire-protocol proxy

USAGE:
    proxy-core [OPTIONS]

OPTIONS:
    -H, --host <ADDR>             Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>             Port to listen on [default: 8088]
    -c, --config <FILE>           Path to configuration file (JSON)
    -s, --state-dir <DIR>         Directory for state.json [default: .]
        --no-state                Keep process state in memory only
    -t, --session-timeout <SECS>  Session idle timeout [default: 1800]
        --telemetry <enable|disable>
                                  Fix the telemetry decision
    -l, --log-level <LVL>         Log level (error, warn, info, debug, trace)
    -h, --help                    Print help
    -V, --version                 Print version

ENVIRONMENT VARIABLES:
    PROXY_CORE_HOST               Host address (overrides config)
    PROXY_CORE_PORT               Port number (overrides config)
    PROXY_CORE_STATE_DIR          State directory (overrides config)
    PROXY_CORE_SESSION_TIMEOUT    Session idle timeout in seconds
    PROXY_CORE_TELEMETRY          enable or disable
    PROXY_CORE_LOG_LEVEL          Log level (overrides config)
    RUST_LOG                      Alternative log level setting

EXAMPLES:
    # Start with defaults (localhost:8088, state in ./state.json)
    proxy-core

    # Persist state under /var/lib and expire sessions after 10 minutes
    proxy-core -s /var/lib/proxy-core -t 600

    # Ephemeral instance with telemetry disabled
    proxy-core --no-state --telemetry disable
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("proxy-core {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
