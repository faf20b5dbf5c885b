//! Map rendering surface.
//!
//! The discovery core never draws anything. It issues camera and marker
//! commands to a [`MapSurface`] owned by the rendering layer.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::coord::{Coordinate, Region};
use crate::places::Place;

/// Commands accepted by the map view.
pub trait MapSurface: Send + Sync {
    /// Animate the camera to `region` over `duration`.
    fn animate_to(&self, region: Region, duration: Duration);

    /// Replace the rendered markers.
    fn show_places(&self, places: &[Place]);

    /// Move the live "my location" indicator.
    fn update_user_location(&self, coordinate: Coordinate);
}

/// A command issued to a [`RecordingMapSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    AnimateTo { region: Region, duration: Duration },
    ShowPlaces(Vec<Place>),
    UserLocation(Coordinate),
}

/// Map surface that records every command.
///
/// Useful for headless hosts and for asserting what a session asked the
/// map to do.
#[derive(Debug, Default)]
pub struct RecordingMapSurface {
    commands: Mutex<Vec<MapCommand>>,
}

impl RecordingMapSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands received so far, in order.
    pub fn commands(&self) -> Vec<MapCommand> {
        self.lock().clone()
    }

    /// Camera animations received so far.
    pub fn camera_moves(&self) -> Vec<(Region, Duration)> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                MapCommand::AnimateTo { region, duration } => Some((*region, *duration)),
                _ => None,
            })
            .collect()
    }

    /// Location indicator updates received so far.
    pub fn user_locations(&self) -> Vec<Coordinate> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                MapCommand::UserLocation(coord) => Some(*coord),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MapCommand>> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MapSurface for RecordingMapSurface {
    fn animate_to(&self, region: Region, duration: Duration) {
        self.lock().push(MapCommand::AnimateTo { region, duration });
    }

    fn show_places(&self, places: &[Place]) {
        self.lock().push(MapCommand::ShowPlaces(places.to_vec()));
    }

    fn update_user_location(&self, coordinate: Coordinate) {
        self.lock().push(MapCommand::UserLocation(coordinate));
    }
}
