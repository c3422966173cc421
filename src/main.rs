use anyhow::Result;
use clap::Parser;
use hoa_lookup::cli::{self, Backend, Cli, Commands};
use hoa_lookup::config::{Config, LogRotation};
use hoa_lookup::logging::{LogBuffer, TuiLogLayer};
use hoa_lookup::tui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Install the global subscriber
///
/// In TUI mode logs go to the in-app buffer (stderr would garble the
/// display), otherwise to stderr so stdout stays clean for payloads.
/// File logging adds a JSON layer on a rolling appender; the returned guard
/// must live until exit so buffered lines are flushed.
///
/// Precedence: RUST_LOG env var > config file > default "info"
fn init_logging(
    config: &Config,
    tui_mode: bool,
    log_buffer: &LogBuffer,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = format!("hoa_lookup={}", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let console: BoxedLayer = if tui_mode {
        Box::new(TuiLogLayer::new(log_buffer.clone()))
    } else {
        Box::new(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    };

    let mut layers = vec![console];
    let mut guard = None;

    if config.logging.file_enabled {
        match std::fs::create_dir_all(&config.logging.file_dir) {
            Err(e) => eprintln!(
                "Warning: Could not create log directory {:?}: {}",
                config.logging.file_dir, e
            ),
            Ok(()) => {
                let dir = &config.logging.file_dir;
                let prefix = &config.logging.file_prefix;
                let file_appender = match config.logging.file_rotation {
                    LogRotation::Hourly => tracing_appender::rolling::hourly(dir, prefix),
                    LogRotation::Daily => tracing_appender::rolling::daily(dir, prefix),
                    LogRotation::Never => tracing_appender::rolling::never(dir, prefix),
                };
                let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
                layers.push(Box::new(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                ));
                guard = Some(file_guard);
            }
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config management never touches the registry or the logger
    if let Some(Commands::Config { show, reset, path }) = &cli.command {
        return cli::handle_config(*show, *reset, *path);
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env()?;
    if cli.demo {
        config.demo_mode = true;
    }

    // Reject bad lookups before any logging or network setup
    let lookup = match &cli.command {
        Some(command) => cli::lookup_request(command)?,
        None => None,
    };

    let tui_mode = cli.command.is_none();
    let log_buffer = LogBuffer::new();
    let _file_guard = init_logging(&config, tui_mode, &log_buffer);

    let backend = Backend::connect(&config).await?;
    tracing::debug!("Registry endpoint: {}", backend.endpoint());

    if let Some((request, plain)) = lookup {
        return cli::run_lookup(&backend, request, plain).await;
    }

    match cli.command {
        None => tui::run_tui(backend.transport(), log_buffer, &config, backend.endpoint()).await,
        Some(Commands::Scrape {
            limit,
            out,
            workers,
        }) => cli::run_scrape(&backend, &config, limit, out, workers).await,
        Some(_) => Ok(()),
    }
}
