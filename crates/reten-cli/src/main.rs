#![forbid(unsafe_code)]

mod cmd;
mod config;
mod identity;
mod output;

use clap::{Parser, Subcommand};
use cmd::AppContext;
use output::{CliError, OutputMode, render_error};
use reten_core::{Lifecycle, LifecycleError, SqliteReportStore};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "reten: citizen checkpoint alerts, 2-hour memory",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Path of the shared SQLite store (overrides config).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self, config: &config::UserConfig) -> OutputMode {
        if config::resolve_json(self.json, config) {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Write",
        about = "Publish a checkpoint report",
        long_about = "Publish a new checkpoint report at the given coordinates. \
                      It stays visible to everyone for 2 hours, then disappears.",
        after_help = "EXAMPLES:\n    # Report a sobriety checkpoint\n    reten report --lat 4.711 --lng -74.0721 --category sobriety-check\n\n    # Add a short description\n    reten report --lat 4.711 --lng -74.0721 --description \"both directions\"\n\n    # Emit machine-readable output\n    reten report --lat 4.711 --lng -74.0721 --json"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        next_help_heading = "Write",
        about = "Confirm a report",
        long_about = "Add this device's confirmation to a report. Confirming the \
                      same report twice is a no-op; the count never double-counts \
                      a device.",
        after_help = "EXAMPLES:\n    # Confirm a report you drove past\n    reten confirm rt-0123456789ab\n\n    # Emit machine-readable output\n    reten confirm rt-0123456789ab --json"
    )]
    Confirm(cmd::confirm::ConfirmArgs),

    #[command(
        next_help_heading = "Write",
        about = "Comment on a report",
        long_about = "Append a comment (max 120 characters) to a report's thread. \
                      Comments are append-only and keep their order.",
        after_help = "EXAMPLES:\n    # Add context for other drivers\n    reten comment rt-0123456789ab \"moved to the north exit\"\n\n    # Emit machine-readable output\n    reten comment rt-0123456789ab \"gone now\" --json"
    )]
    Comment(cmd::comment::CommentArgs),

    #[command(
        next_help_heading = "Read",
        about = "List active reports",
        long_about = "List every report still inside its 2-hour visibility window.",
        after_help = "EXAMPLES:\n    # All active reports\n    reten list\n\n    # Only sobriety checkpoints\n    reten list --category sobriety-check\n\n    # Emit machine-readable output\n    reten list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Watch the active reports live",
        long_about = "Keep a live view over the store's change feed and reprint \
                      whenever the visible set changes, including expiry.",
        after_help = "EXAMPLES:\n    # Watch until interrupted\n    reten watch\n\n    # One snapshot, then exit\n    reten watch --once\n\n    # Re-query every 30 seconds even without changes\n    reten watch --interval 30"
    )]
    Watch(cmd::watch::WatchArgs),

    #[command(
        next_help_heading = "Device",
        about = "Show or rotate the device token",
        long_about = "Show the anonymous token this device votes with, or rotate \
                      it. Rotating forgets which reports this device confirmed; \
                      past confirmations stay counted.",
        after_help = "EXAMPLES:\n    # Show the current token\n    reten token\n\n    # Generate a fresh one\n    reten token --rotate"
    )]
    Token(cmd::token::TokenArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("RETEN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "reten=debug,info"
        } else {
            "reten=info,warn"
        })
    });

    let format = env::var("RETEN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let user_config = config::load(&config::default_config_path()?)?;
    let mode = cli.output_mode(&user_config);

    // Token management never touches the store.
    if let Commands::Token(ref args) = cli.command {
        return cmd::token::run(args, &identity::default_token_path()?, mode);
    }

    let store_path = config::resolve_store_path(cli.store.clone(), &user_config)?;
    if let Some(parent) = store_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!(store = %store_path.display(), "opening report store");

    let store = Arc::new(SqliteReportStore::open(&store_path)?);
    let ctx = AppContext {
        lifecycle: Lifecycle::new(store),
        device_token: identity::load_or_create(&identity::default_token_path()?)?,
        mode,
    };

    let result = match cli.command {
        Commands::Report(ref args) => cmd::report::run(args, &ctx),
        Commands::Confirm(ref args) => cmd::confirm::run(args, &ctx),
        Commands::Comment(ref args) => cmd::comment::run(args, &ctx),
        Commands::List(ref args) => cmd::list::run(args, &ctx),
        Commands::Watch(ref args) => cmd::watch::run(args, &ctx, user_config.refilter_seconds()),
        Commands::Token(_) => unreachable!("handled before the store opens"),
    };

    match result {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<LifecycleError>() {
            Some(lifecycle_err) => {
                render_error(mode, &CliError::from_lifecycle(lifecycle_err))?;
                std::process::exit(1);
            }
            None => Err(err),
        },
    }
}
