//! Search command - one-shot nearby search around a fixed coordinate.

use std::path::PathBuf;

use console::style;
use tracing::info;

use petnearby::coord::Coordinate;
use petnearby::places::{Place, PlaceAggregator};

use super::common::{
    format_distance, load_config, parse_coordinate, places_client, print_places, resolve_places,
    PlacesOverrides,
};
use crate::error::CliError;

/// Arguments for the search command.
pub struct SearchArgs {
    pub config: Option<PathBuf>,
    pub lat: f64,
    pub lon: f64,
    pub overrides: PlacesOverrides,
    pub json: bool,
}

/// Run the search command.
pub async fn run(args: SearchArgs) -> Result<(), CliError> {
    let origin = parse_coordinate(args.lat, args.lon)?;
    let config = resolve_places(load_config(args.config.as_deref())?, args.overrides);

    let aggregator = PlaceAggregator::new(places_client(&config)?, config.places.api_key.as_deref())?;
    info!(
        %origin,
        radius = config.places.radius_meters,
        categories = ?config.places.categories,
        "Searching nearby places"
    );

    let aggregation = aggregator
        .fetch_nearby(origin, &config.places.categories, config.places.radius_meters)
        .await?;

    if args.json {
        let json = serde_json::to_string_pretty(&aggregation.places)
            .map_err(|e| CliError::Places(format!("Failed to encode results: {}", e)))?;
        println!("{}", json);
    } else {
        print_summary(&aggregation.places, origin, config.places.radius_meters);
    }
    if let Some(warning) = aggregation.warning() {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }

    Ok(())
}

fn print_summary(places: &[Place], origin: Coordinate, radius_meters: u32) {
    println!(
        "{} places within {} of {}",
        style(places.len()).bold(),
        format_distance(f64::from(radius_meters)),
        origin
    );
    print_places(origin, places);
}
