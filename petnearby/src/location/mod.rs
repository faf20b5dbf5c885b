//! Live location updates.
//!
//! The host platform delivers an unbounded stream of [`Coordinate`] events
//! once permission is granted. A [`LocationSubscription`] is the screen's
//! exclusive handle on that stream: it is acquired once per mount and the
//! provider-side registration is released when the handle is dropped.
//!
//! # Architecture
//!
//! ```text
//! Host GPS ──► LocationFeed::push ──► mpsc ──► LocationSubscription::next
//!                    │                                  │
//!                    └──── release token ◄──── Drop ────┘
//! ```
//!
//! Updates pushed after release are discarded by the feed, so a late GPS
//! callback can never reach a torn-down screen.

mod channel;

pub use channel::{ChannelLocationProvider, LocationFeed};

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::coord::Coordinate;

/// Default maximum wait for a single provider reading.
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default maximum age of a cached reading the provider may return.
pub const DEFAULT_MAX_CACHED_AGE: Duration = Duration::from_secs(10);

/// Errors raised when subscribing to location updates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The stream already has a subscriber for this mount.
    #[error("Location updates already have an active subscriber")]
    AlreadySubscribed,

    /// The provider could not start delivering updates.
    #[error("Location provider unavailable: {0}")]
    Unavailable(String),
}

/// Knobs forwarded to the platform location provider.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationOptions {
    /// Request GPS-grade accuracy instead of network positioning.
    pub high_accuracy: bool,
    /// Maximum wait for a single reading.
    pub timeout: Duration,
    /// Maximum age of a cached reading.
    pub max_cached_age: Duration,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_LOCATION_TIMEOUT,
            max_cached_age: DEFAULT_MAX_CACHED_AGE,
        }
    }
}

/// Platform location provider.
pub trait LocationProvider: Send + Sync {
    /// Start delivering updates to a new subscription.
    fn subscribe(&self, options: &LocationOptions) -> Result<LocationSubscription, LocationError>;
}

impl<T: LocationProvider + ?Sized> LocationProvider for std::sync::Arc<T> {
    fn subscribe(&self, options: &LocationOptions) -> Result<LocationSubscription, LocationError> {
        (**self).subscribe(options)
    }
}

/// Owned handle on the location update stream.
///
/// Dropping the handle (or calling [`unsubscribe`](Self::unsubscribe))
/// cancels the release token shared with the provider, which stops further
/// deliveries.
#[derive(Debug)]
pub struct LocationSubscription {
    updates: mpsc::UnboundedReceiver<Coordinate>,
    release: CancellationToken,
}

impl LocationSubscription {
    /// Builds a subscription from a receiver and the provider's release token.
    pub fn new(updates: mpsc::UnboundedReceiver<Coordinate>, release: CancellationToken) -> Self {
        Self { updates, release }
    }

    /// Waits for the next update.
    ///
    /// Returns `None` once the subscription is released or the provider has
    /// stopped the stream.
    pub async fn next(&mut self) -> Option<Coordinate> {
        if self.release.is_cancelled() {
            return None;
        }
        self.updates.recv().await
    }

    /// Returns true until the subscription has been released.
    pub fn is_active(&self) -> bool {
        !self.release.is_cancelled()
    }

    /// Releases the subscription explicitly.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for LocationSubscription {
    fn drop(&mut self) {
        self.release.cancel();
        self.updates.close();
    }
}
