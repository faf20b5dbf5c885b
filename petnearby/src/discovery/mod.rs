//! Nearby-places discovery screen.
//!
//! One mount of the screen asks for location permission, waits for the
//! first location fix, centers the map there and fetches nearby places
//! exactly once. Later fixes only move the "my location" indicator.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use petnearby::config::DiscoveryConfig;
//! use petnearby::discovery::{DiscoveryServices, MountedScreen, RecordingMapSurface};
//! use petnearby::location::ChannelLocationProvider;
//! use petnearby::permission::StaticPermissionGate;
//! use petnearby::places::{AsyncReqwestClient, GooglePlacesClient};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DiscoveryConfig::load(None)?;
//! let (provider, feed) = ChannelLocationProvider::new();
//! let mut screen = MountedScreen::mount(
//!     DiscoveryServices {
//!         permission: StaticPermissionGate::granted(),
//!         location: provider,
//!         places: GooglePlacesClient::new(AsyncReqwestClient::new()?),
//!         map: Arc::new(RecordingMapSurface::new()),
//!     },
//!     config,
//! );
//!
//! feed.push(petnearby::coord::Coordinate::new(51.5074, -0.1278)?);
//! let state = screen.settled().await;
//! println!("{} places", state.places.len());
//! screen.unmount().await;
//! # Ok(())
//! # }
//! ```

mod controller;
mod map;
mod screen;
mod state;

pub use controller::{DiscoveryController, DiscoveryServices};
pub use map::{MapCommand, MapSurface, RecordingMapSurface};
pub use screen::MountedScreen;
pub use state::{
    DiscoveryPhase, DiscoveryState, PermissionState, FINDING_LOCATION_MESSAGE,
    LOADING_PLACES_MESSAGE, REQUESTING_PERMISSION_MESSAGE,
};
