//! PetNearby CLI - Command-line interface
//!
//! Finds pharmacies and veterinary clinics around a location, either as a
//! one-shot search or as a simulated discovery session.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use console::style;

use commands::common::PlacesOverrides;
use commands::discover::DiscoverArgs;
use commands::search::SearchArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "petnearby")]
#[command(version, about = "Find pharmacies and veterinary clinics nearby", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/petnearby/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search once around a coordinate and print the merged results
    Search {
        #[command(flatten)]
        location: LocationArgs,

        #[command(flatten)]
        places: PlacesArgs,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a discovery session with a simulated permission prompt and location stream
    Discover {
        #[command(flatten)]
        location: LocationArgs,

        #[command(flatten)]
        places: PlacesArgs,

        /// Answer the permission prompt with "deny"
        #[arg(long)]
        deny: bool,

        /// Number of simulated location updates
        #[arg(long, default_value_t = 3)]
        updates: usize,

        /// Delay between simulated updates in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Give up if no fix arrives within this many seconds (0 waits forever)
        #[arg(long = "first-fix-timeout-secs")]
        first_fix_timeout: Option<u64>,
    },
}

#[derive(Args)]
struct LocationArgs {
    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
}

#[derive(Args)]
struct PlacesArgs {
    /// Places API key (overrides config and environment)
    #[arg(long)]
    api_key: Option<String>,

    /// Search radius in meters
    #[arg(long)]
    radius: Option<u32>,

    /// Category to search; repeat for several (merge order follows)
    #[arg(long = "category")]
    categories: Vec<String>,
}

impl From<PlacesArgs> for PlacesOverrides {
    fn from(args: PlacesArgs) -> Self {
        PlacesOverrides {
            api_key: args.api_key,
            radius: args.radius,
            categories: args.categories,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let _log_guard = petnearby::logging::init(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Search {
            location,
            places,
            json,
        } => {
            commands::search::run(SearchArgs {
                config: cli.config,
                lat: location.lat,
                lon: location.lon,
                overrides: places.into(),
                json,
            })
            .await
        }
        Commands::Discover {
            location,
            places,
            deny,
            updates,
            interval_ms,
            first_fix_timeout,
        } => {
            commands::discover::run(DiscoverArgs {
                config: cli.config,
                lat: location.lat,
                lon: location.lon,
                deny,
                updates,
                interval: Duration::from_millis(interval_ms),
                first_fix_timeout,
                overrides: places.into(),
            })
            .await
        }
    }
}
