// CLI module - command-line argument parsing and handlers
//
// With no subcommand the interactive lookup page runs. The subcommands
// make single registry requests, run the bulk export, or manage the
// config file:
// - search <text> / list / show <id>: print the registry payload
// - scrape: export every HOA to CSV
// - config --show | --path | --reset

use crate::config::{Config, VERSION};
use crate::demo::{self, DemoRegistry};
use crate::markup;
use crate::registry::{LookupRequest, RegistryClient, RegistryTransport, SharedTransport};
use crate::scrape::{export_to_dir, Scraper};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Demo responses are slowed down so loading states are visible
const DEMO_LATENCY: Duration = Duration::from_millis(400);

/// Utah HOA registry lookup
#[derive(Parser)]
#[command(name = "hoa-lookup")]
#[command(version = VERSION)]
#[command(about = "Search the Utah HOA registry from the terminal", long_about = None)]
pub struct Cli {
    /// Use the built-in demo registry instead of the real endpoint
    #[arg(long, global = true)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search by name or registration number
    Search {
        query: String,

        /// Print plain text instead of markup
        #[arg(long = "text")]
        plain: bool,
    },

    /// List every registered HOA
    List {
        #[arg(long = "text")]
        plain: bool,
    },

    /// Show one HOA by identifier
    Show {
        id: String,

        #[arg(long = "text")]
        plain: bool,
    },

    /// Export the whole registry to CSV
    Scrape {
        /// Maximum HOAs to export (0 = all); remembered for next time
        #[arg(long)]
        limit: Option<usize>,

        /// Directory for the CSV file; remembered for next time
        #[arg(long)]
        out: Option<PathBuf>,

        /// Concurrent detail fetches
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry connection
// ─────────────────────────────────────────────────────────────────────────────

/// The transport every command talks to. Holds the demo server, if any,
/// so it lives as long as the connection.
pub struct Backend {
    transport: SharedTransport,
    endpoint: String,
    _demo: Option<DemoRegistry>,
}

impl Backend {
    pub async fn connect(config: &Config) -> Result<Self> {
        let mut settings = config.client_settings();
        let demo = if config.demo_mode {
            let server = demo::spawn_registry_with_latency(DEMO_LATENCY).await?;
            settings.endpoint = server.endpoint();
            tracing::info!("Running in DEMO MODE against {}", settings.endpoint);
            Some(server)
        } else {
            None
        };

        let client = RegistryClient::new(&settings)?;
        Ok(Self {
            endpoint: client.endpoint().to_string(),
            transport: Arc::new(client),
            _demo: demo,
        })
    }

    pub fn transport(&self) -> SharedTransport {
        self.transport.clone()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lookup commands
// ─────────────────────────────────────────────────────────────────────────────

/// Build the request for a lookup subcommand, validating ids up front
pub fn lookup_request(command: &Commands) -> Result<Option<(LookupRequest, bool)>> {
    let request = match command {
        Commands::Search { query, plain } => {
            let query = query.trim();
            if query.is_empty() {
                bail!("Please enter a name or registration number to search for.");
            }
            (LookupRequest::Search(query.to_string()), *plain)
        }
        Commands::List { plain } => (LookupRequest::ListAll, *plain),
        Commands::Show { id, plain } => {
            let id = crate::page::parse_identifier(Some(id.as_str()))?;
            (LookupRequest::Detail(id), *plain)
        }
        _ => return Ok(None),
    };
    Ok(Some(request))
}

fn render_payload(payload: &str, plain: bool) -> String {
    if plain {
        markup::to_display_text(payload)
    } else {
        payload.to_string()
    }
}

/// One registry request, payload to stdout
///
/// Server markup that comes back with an error status is still printed
/// before the error is reported.
pub async fn run_lookup(backend: &Backend, request: LookupRequest, plain: bool) -> Result<()> {
    match backend.transport.post(request.clone()).await {
        Ok(payload) => {
            println!("{}", render_payload(&payload, plain));
            Ok(())
        }
        Err(e) => {
            if let Some(payload) = e.payload() {
                println!("{}", render_payload(payload, plain));
            }
            Err(anyhow::Error::new(e)).with_context(|| format!("{} failed", request))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scrape
// ─────────────────────────────────────────────────────────────────────────────

pub async fn run_scrape(
    backend: &Backend,
    config: &Config,
    limit: Option<usize>,
    out: Option<PathBuf>,
    workers: Option<usize>,
) -> Result<()> {
    let mut options = config.scrape_options();
    if let Some(limit) = limit {
        options.limit = limit;
    }
    if let Some(workers) = workers {
        options.workers = workers;
    }
    let save_dir = out.unwrap_or_else(|| config.scrape.save_dir.clone());

    if let Err(e) = Config::save_scrape_settings(options.limit, save_dir.clone()) {
        tracing::warn!("Could not remember scrape settings: {:#}", e);
    }

    println!("Fetching full HOA list from {}...", backend.endpoint());
    println!("Starting parallel downloads ({} workers)...", options.workers.max(1));

    let scraper = Scraper::new(backend.transport(), options);
    let report = scraper
        .run(|p| println!("   Processed: {}/{}", p.completed, p.total))
        .await?;

    println!("Found {} HOAs, fetched {}.", report.found, report.attempted);
    if report.failed() > 0 {
        println!("{} detail pages could not be fetched (see log).", report.failed());
    }

    let path = export_to_dir(&report.records, &save_dir)?;
    println!("Scraping complete! {} HOAs processed.", report.records.len());
    println!("   Data saved to: {}", path.display());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

pub fn handle_config(show: bool, reset: bool, path: bool) -> Result<()> {
    if path {
        handle_config_path()
    } else if show {
        handle_config_show()
    } else if reset {
        handle_config_reset()
    } else {
        println!("Usage: hoa-lookup config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
        Ok(())
    }
}

fn handle_config_path() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;
    println!("{}", path.display());
    Ok(())
}

fn handle_config_show() -> Result<()> {
    let config = Config::from_env()?;

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());
    if config.demo_mode {
        println!();
        println!("# Demo mode is on (HOA_LOOKUP_DEMO)");
    }

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
    Ok(())
}

fn handle_config_reset() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let path = Config::default().save()?;
    println!("Config reset to defaults: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryError;

    #[test]
    fn parses_lookup_subcommands() {
        let cli = Cli::try_parse_from(["hoa-lookup", "search", "Smith", "--text"]).unwrap();
        let request = lookup_request(cli.command.as_ref().unwrap()).unwrap();
        assert_eq!(request, Some((LookupRequest::Search("Smith".into()), true)));

        let cli = Cli::try_parse_from(["hoa-lookup", "--demo", "show", "42"]).unwrap();
        assert!(cli.demo);
        let request = lookup_request(cli.command.as_ref().unwrap()).unwrap();
        assert_eq!(request, Some((LookupRequest::Detail(42), false)));
    }

    #[test]
    fn rejects_bad_lookups_before_sending() {
        let cli = Cli::try_parse_from(["hoa-lookup", "show", "abc"]).unwrap();
        assert!(lookup_request(cli.command.as_ref().unwrap()).is_err());

        let cli = Cli::try_parse_from(["hoa-lookup", "search", "  "]).unwrap();
        assert!(lookup_request(cli.command.as_ref().unwrap()).is_err());
    }

    #[test]
    fn scrape_flags_are_optional() {
        let cli = Cli::try_parse_from(["hoa-lookup", "scrape", "--limit", "5"]).unwrap();
        match cli.command {
            Some(Commands::Scrape {
                limit,
                out,
                workers,
            }) => {
                assert_eq!(limit, Some(5));
                assert!(out.is_none());
                assert!(workers.is_none());
            }
            _ => panic!("expected scrape"),
        }
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["hoa-lookup"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.demo);
    }

    #[tokio::test]
    async fn lookup_against_demo_backend() {
        let config = Config {
            demo_mode: true,
            ..Config::default()
        };
        let backend = Backend::connect(&config).await.unwrap();
        run_lookup(&backend, LookupRequest::Detail(1001), true)
            .await
            .unwrap();

        let err = run_lookup(&backend, LookupRequest::Detail(5), false)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<RegistryError>().is_some());
    }
}
