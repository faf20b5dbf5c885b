//! Discovery state model.
//!
//! [`DiscoveryState`] is the snapshot the rendering layer draws from. All
//! transitions go through its guarded methods; each returns whether it
//! applied, and none of them can move the state out of a terminal phase.

use crate::coord::{Coordinate, Region};
use crate::error::DiscoveryError;
use crate::permission::{DenialReason, PermissionStatus};
use crate::places::{Aggregation, Place};

/// Overlay text while waiting for the permission answer.
pub const REQUESTING_PERMISSION_MESSAGE: &str = "Requesting location permission…";
/// Overlay text while waiting for the first location fix.
pub const FINDING_LOCATION_MESSAGE: &str = "Finding your location…";
/// Overlay text while places are being fetched.
pub const LOADING_PLACES_MESSAGE: &str = "Searching for nearby pharmacies and vets…";

/// Position in the discovery state machine.
///
/// ```text
/// AwaitingPermission ──granted──► AwaitingFirstFix ──fix──► AggregatingPlaces ──► Ready
///        │                                                          │
///        └──denied──► Failed ◄──────────── total failure ───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    AwaitingPermission,
    AwaitingFirstFix,
    AggregatingPlaces,
    Ready,
    Failed,
}

impl DiscoveryPhase {
    /// True for `Ready` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DiscoveryPhase::Ready | DiscoveryPhase::Failed)
    }

    /// Short label for status lines.
    pub fn display_status(&self) -> &'static str {
        match self {
            DiscoveryPhase::AwaitingPermission => "Waiting for permission",
            DiscoveryPhase::AwaitingFirstFix => "Locating",
            DiscoveryPhase::AggregatingPlaces => "Searching",
            DiscoveryPhase::Ready => "Ready",
            DiscoveryPhase::Failed => "Failed",
        }
    }
}

/// Location permission as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionState {
    Unrequested,
    Granted,
    Denied(DenialReason),
}

/// Snapshot consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryState {
    pub phase: DiscoveryPhase,
    pub permission: PermissionState,
    /// Set once, when the first fix is accepted.
    pub location_fixed: bool,
    /// Camera target derived from the first fix.
    pub region: Option<Region>,
    /// Category order, then provider order. Filled at most once.
    pub places: Vec<Place>,
    pub loading: bool,
    /// User-facing failure text (set only in `Failed`).
    pub error: Option<String>,
    /// Informational partial-failure text (set only in `Ready`).
    pub warning: Option<String>,
}

impl Default for DiscoveryState {
    fn default() -> Self {
        Self::mounted()
    }
}

impl DiscoveryState {
    /// Fresh state for a newly mounted screen.
    pub fn mounted() -> Self {
        Self {
            phase: DiscoveryPhase::AwaitingPermission,
            permission: PermissionState::Unrequested,
            location_fixed: false,
            region: None,
            places: Vec::new(),
            loading: true,
            error: None,
            warning: None,
        }
    }

    /// Loading overlay text for the current phase, if any.
    pub fn overlay_message(&self) -> Option<&'static str> {
        match self.phase {
            DiscoveryPhase::AwaitingPermission => Some(REQUESTING_PERMISSION_MESSAGE),
            DiscoveryPhase::AwaitingFirstFix => Some(FINDING_LOCATION_MESSAGE),
            DiscoveryPhase::AggregatingPlaces => Some(LOADING_PLACES_MESSAGE),
            DiscoveryPhase::Ready | DiscoveryPhase::Failed => None,
        }
    }

    /// Applies the permission answer.
    ///
    /// Only valid in `AwaitingPermission`. A denial moves straight to
    /// `Failed`.
    pub fn apply_permission(&mut self, status: PermissionStatus) -> bool {
        if self.phase != DiscoveryPhase::AwaitingPermission {
            return false;
        }
        match status {
            PermissionStatus::Granted => {
                self.permission = PermissionState::Granted;
                self.phase = DiscoveryPhase::AwaitingFirstFix;
            }
            PermissionStatus::Denied(reason) => {
                self.permission = PermissionState::Denied(reason.clone());
                self.enter_failed(DiscoveryError::Permission(reason));
            }
        }
        true
    }

    /// Accepts `coordinate` as the first fix.
    ///
    /// Only the first call in `AwaitingFirstFix` succeeds; it returns the
    /// camera region and moves to `AggregatingPlaces`. Every other call
    /// returns `None` and changes nothing.
    pub fn accept_first_fix(&mut self, coordinate: Coordinate) -> Option<Region> {
        if self.phase != DiscoveryPhase::AwaitingFirstFix {
            return None;
        }
        let region = Region::around(coordinate);
        self.location_fixed = true;
        self.region = Some(region);
        self.phase = DiscoveryPhase::AggregatingPlaces;
        Some(region)
    }

    /// Stores aggregation results and moves to `Ready`.
    pub fn apply_places(&mut self, aggregation: Aggregation) -> bool {
        if self.phase != DiscoveryPhase::AggregatingPlaces {
            return false;
        }
        self.warning = aggregation.warning();
        self.places = aggregation.places;
        self.loading = false;
        self.phase = DiscoveryPhase::Ready;
        true
    }

    /// Moves to `Failed` from any non-terminal phase.
    pub fn fail(&mut self, error: DiscoveryError) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.enter_failed(error);
        true
    }

    fn enter_failed(&mut self, error: DiscoveryError) {
        self.error = Some(error.to_string());
        self.places.clear();
        self.loading = false;
        self.phase = DiscoveryPhase::Failed;
    }
}
