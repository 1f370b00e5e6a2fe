//! delay-scan CLI
//!
//! Local execution entry point: reads a run payload from a JSON file and
//! writes detected incidents to a file or stdout.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use delay_scan::{
    error::Result,
    host::{LocalHost, ScanHost},
    models::{Config, EngineSettings, parse_sources},
    pipeline,
    utils::get_domain,
};

/// delay-scan - Carrier Delay Incident Scanner
#[derive(Parser, Debug)]
#[command(
    name = "delay-scan",
    version,
    about = "Detect carrier delay incidents from tracking pages and APIs"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "scan.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan every source of an input payload
    Run {
        /// JSON file with `sources` and optional global overrides
        #[arg(short, long)]
        input: PathBuf,

        /// Write incidents here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate configuration and, optionally, an input payload
    Validate {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .target(env_logger::Target::Stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Run { input, output } => {
            config.validate()?;
            let host = LocalHost::new(input, output);
            let outcome = pipeline::run_with_host(&host, &config).await?;
            if outcome.failures > 0 {
                log::warn!("{} source(s) could not be evaluated", outcome.failures);
            }
        }

        Command::Validate { input } => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            if let Some(input) = input {
                let payload = LocalHost::new(&input, None).get_input().await?;
                let settings = EngineSettings::resolve(&config.engine, &payload);
                let sources = parse_sources(&payload, &settings);
                if sources.is_empty() {
                    log::warn!("No usable sources in {}", input.display());
                }
                for source in &sources {
                    if get_domain(&source.url).is_none() {
                        log::warn!("{}: URL does not parse: {}", source.order_id, source.url);
                    }
                }
                log::info!(
                    "✓ Input OK: {} source(s), {} delay / {} ignore pattern(s), concurrency {}",
                    sources.len(),
                    settings.delay_patterns.len(),
                    settings.ignore_patterns.len(),
                    settings.concurrency
                );
            }

            log::info!("All validations passed!");
        }
    }

    Ok(())
}
