use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use shopregd::{
    cli,
    config::{AppConfig, ConfigWatcher},
    geocode::GeocodeClient,
    registry::Registry,
    rest, AppContext,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "shopregd",
    about = "Shop registry daemon — geocoded business registry with tax-compliance tracking",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// REST API server port
    #[arg(long, env = "SHOPREGD_PORT")]
    port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "SHOPREGD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SHOPREGD_LOG")]
    log: Option<String>,

    /// Bind address for the REST server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "SHOPREGD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "SHOPREGD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST server (default when no subcommand given).
    ///
    /// Examples:
    ///   shopregd serve
    ///   shopregd
    Serve,
    /// One-shot address search against the geocoding endpoint.
    ///
    /// Prints the ranked candidate list as JSON.
    ///
    /// Examples:
    ///   shopregd search "Tariq Road Karachi"
    ///   shopregd search "Saddar" --limit 3
    Search {
        /// Free-text address query.
        query: String,

        /// Maximum number of candidates (default: configured result limit).
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Interactive terminal address picker.
    ///
    /// Type to search as you go; Enter commits the highlighted candidate and
    /// prints it as JSON. Esc cancels.
    ///
    /// Examples:
    ///   shopregd pick
    Pick,
    /// Manage registered users.
    ///
    /// Examples:
    ///   shopregd users add owner@example.com
    ///   shopregd users add reviewer@example.com --admin
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Inspect the shop registry.
    ///
    /// Examples:
    ///   shopregd shops list
    Shops {
        #[command(subcommand)]
        action: ShopsAction,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// Create a user and print their API token.
    Add {
        /// Email address of the user.
        email: String,

        /// Grant the admin role (tax review, deletion).
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Subcommand)]
enum ShopsAction {
    /// List every registered shop with compliance totals.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::new(args.port, args.data_dir, args.log, args.bind_address);
    let _log_guard = init_tracing(&config, args.log_file.as_deref());

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Search { query, limit } => cli::run_search(&config, &query, limit).await,
        Command::Pick => {
            match cli::picker::run_picker(&config).await? {
                Some(location) => println!("{}", serde_json::to_string_pretty(&location)?),
                None => eprintln!("cancelled"),
            }
            Ok(())
        }
        Command::Users {
            action: UsersAction::Add { email, admin },
        } => cli::run_users_add(&config, &email, admin).await,
        Command::Shops {
            action: ShopsAction::List,
        } => cli::run_shops_list(&config).await,
    }
}

/// Initialize the tracing subscriber.
///
/// Logs go to stderr (the picker owns stdout), compact or JSON per config.
/// With `--log-file`, output goes to a daily-rotated file instead and the
/// returned guard must be held for the lifetime of the process.
fn init_tracing(
    config: &AppConfig,
    log_file: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.clone()));

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "shopregd.log".to_string());
        let appender = tracing_appender::rolling::daily(dir, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        if config.log_format == "json" {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(writer)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .compact()
                .init();
        }
        Some(guard)
    } else {
        if config.log_format == "json" {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
        None
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "starting shopregd"
    );

    let registry = Registry::new_with_slow_query(
        &config.data_dir,
        config.observability.slow_query_threshold_ms,
    )
    .await
    .context("failed to open the registry database")?;

    let geocoder =
        GeocodeClient::new(&config.geocoder).context("failed to build the geocode client")?;

    // Hold the watcher for the lifetime of the server; dropping it stops
    // hot-reload.
    let watcher = ConfigWatcher::start(&config.data_dir);
    let hot = watcher.as_ref().map(|w| w.hot.clone());

    let ctx = Arc::new(AppContext {
        config: Arc::new(config),
        registry: Arc::new(registry),
        geocoder: Arc::new(geocoder),
        started_at: std::time::Instant::now(),
        hot,
    });

    rest::start_rest_server(ctx).await
}
