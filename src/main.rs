//! proxy-core binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use proxy_core::api::{serve_with_state, AppState};
use proxy_core::cli::{self, Args};
use proxy_core::config::Config;
use proxy_core::session::spawn_expiry_sweep;
use proxy_core::state::spawn_state_watcher;
use proxy_core::{logging, CommandHandler, SessionRegistry, StateProvider};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Try 'proxy-core --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // logging may not be initialized yet
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(&args)?;

    logging::init_with_filter(config.log_filter())?;

    info!("proxy-core v{}", env!("CARGO_PKG_VERSION"));

    // Persistence failures never stop the process; the in-memory state is
    // authoritative.
    let state = Arc::new(StateProvider::new(config.state_file()));
    match state.path() {
        Some(path) => {
            if let Err(e) = state.persist() {
                warn!("{e}");
            }
            info!(path = %path.display(), "Process state loaded");
        }
        None => info!("Process state persistence disabled"),
    }

    if let Some(enabled) = config.telemetry.enabled {
        if let Err(e) = state.update(|s| {
            s.telemetry = Some(enabled);
            s.telemetry_locked = true;
        }) {
            warn!("{e}");
        }
    }

    let _watcher = spawn_state_watcher(&state);

    let sessions = Arc::new(SessionRegistry::with_idle_timeout(config.idle_timeout()));
    let _sweeper = spawn_expiry_sweep(&sessions, config.sweep_interval());
    info!(
        idle_timeout_secs = config.idle_timeout().as_secs(),
        "Session registry initialized"
    );

    let handler = CommandHandler::new(state, sessions);
    let app = AppState::new(handler, config.metrics.include_uuid)?;

    serve_with_state(config.to_server_config()?, app).await?;

    info!("proxy-core stopped");
    Ok(())
}
