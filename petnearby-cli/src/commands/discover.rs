//! Discover command - run a full discovery session in the terminal.
//!
//! The permission answer and the location stream are simulated: the
//! stream starts at `--lat/--lon` and drifts slightly with each update so
//! the later-update behavior is visible.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use petnearby::coord::{Coordinate, Region};
use petnearby::discovery::{DiscoveryPhase, DiscoveryServices, MapSurface, MountedScreen};
use petnearby::location::{ChannelLocationProvider, LocationFeed};
use petnearby::permission::{DenialReason, StaticPermissionGate};
use petnearby::places::Place;

use super::common::{
    load_config, parse_coordinate, places_client, print_places, resolve_first_fix_timeout,
    resolve_places, PlacesOverrides,
};
use crate::error::CliError;

/// Degrees added to each simulated update.
const DRIFT_DEGREES: f64 = 0.0002;

/// Arguments for the discover command.
pub struct DiscoverArgs {
    pub config: Option<PathBuf>,
    pub lat: f64,
    pub lon: f64,
    pub deny: bool,
    pub updates: usize,
    pub interval: Duration,
    pub first_fix_timeout: Option<u64>,
    pub overrides: PlacesOverrides,
}

/// Map surface that reports camera and marker commands on the terminal.
struct TerminalMap {
    progress: Option<ProgressBar>,
}

impl TerminalMap {
    fn line(&self, text: String) {
        match &self.progress {
            Some(pb) => pb.println(text),
            None => eprintln!("{}", text),
        }
    }
}

impl MapSurface for TerminalMap {
    fn animate_to(&self, region: Region, duration: Duration) {
        self.line(format!(
            "{} camera → {} (span {:.4}° × {:.4}°, {} ms)",
            style("map").cyan(),
            region.center,
            region.latitude_delta,
            region.longitude_delta,
            duration.as_millis()
        ));
    }

    fn show_places(&self, places: &[Place]) {
        self.line(format!("{} {} markers", style("map").cyan(), places.len()));
    }

    fn update_user_location(&self, coordinate: Coordinate) {
        self.line(format!("{} you are at {}", style("map").cyan(), coordinate));
    }
}

fn spinner() -> Option<ProgressBar> {
    if !Term::stderr().is_term() || std::env::var("NO_COLOR").is_ok() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"])
        .template("{spinner} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}

/// Push `count` drifting updates once the session subscribes.
async fn feed_updates(
    feed: LocationFeed,
    start: Coordinate,
    count: usize,
    interval: Duration,
    stop: CancellationToken,
) {
    while !feed.has_subscriber() {
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = tokio::time::sleep(Duration::from_millis(20)) => {}
        }
    }

    for i in 0..count {
        let offset = DRIFT_DEGREES * i as f64;
        let Ok(coordinate) = Coordinate::new(start.latitude + offset, start.longitude + offset) else {
            return;
        };
        if !feed.push(coordinate) {
            debug!("Location feed has no subscriber, stopping");
            return;
        }
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Waits for the feeder task. Returns false if it panicked or was aborted.
async fn join_feeder(feeder: JoinHandle<()>) -> bool {
    match feeder.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Location feeder task ended abnormally");
            false
        }
    }
}

/// Run the discover command.
pub async fn run(args: DiscoverArgs) -> Result<(), CliError> {
    let start = parse_coordinate(args.lat, args.lon)?;
    let config = resolve_places(load_config(args.config.as_deref())?, args.overrides);
    let first_fix_timeout = resolve_first_fix_timeout(args.first_fix_timeout, &config);
    let config = config.with_first_fix_timeout(first_fix_timeout);

    let permission = if args.deny {
        StaticPermissionGate::denied(DenialReason::UserDenied)
    } else {
        StaticPermissionGate::granted()
    };
    let (provider, feed) = ChannelLocationProvider::new();
    let progress = spinner();
    let map = Arc::new(TerminalMap {
        progress: progress.clone(),
    });

    let mut screen = MountedScreen::mount(
        DiscoveryServices {
            permission,
            location: provider,
            places: places_client(&config)?,
            map: map.clone(),
        },
        config,
    );

    let stop = CancellationToken::new();
    let feeder = tokio::spawn(feed_updates(
        feed,
        start,
        args.updates.max(1),
        args.interval,
        stop.clone(),
    ));

    let mut watcher = screen.watch();
    let mut last_phase = None;
    loop {
        let state = watcher.borrow_and_update().clone();
        if last_phase != Some(state.phase) {
            map.line(format!(
                "{} {}",
                style("state").magenta(),
                state.phase.display_status()
            ));
            last_phase = Some(state.phase);
        }
        if let (Some(pb), Some(message)) = (&progress, state.overlay_message()) {
            pb.set_message(message);
        }
        if state.phase.is_terminal() || watcher.changed().await.is_err() {
            break;
        }
    }
    let state = screen.settled().await;

    if state.phase == DiscoveryPhase::Ready {
        // Let the remaining simulated updates reach the map.
        join_feeder(feeder).await;
    } else {
        stop.cancel();
    }
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    screen.unmount().await;

    match state.phase {
        DiscoveryPhase::Ready => {
            println!(
                "{} {} places near {}",
                style("✓").green().bold(),
                state.places.len(),
                start
            );
            print_places(start, &state.places);
            if let Some(warning) = state.warning {
                eprintln!("{} {}", style("warning:").yellow().bold(), warning);
            }
            Ok(())
        }
        _ => Err(CliError::Discovery(
            state
                .error
                .unwrap_or_else(|| "Discovery stopped before completing".to_string()),
        )),
    }
}
