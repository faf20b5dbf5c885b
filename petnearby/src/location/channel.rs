//! In-process location provider fed by the host.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{LocationError, LocationOptions, LocationProvider, LocationSubscription};
use crate::coord::Coordinate;

/// Active registration between a feed and its subscriber.
#[derive(Debug)]
struct Registration {
    sender: mpsc::UnboundedSender<Coordinate>,
    release: CancellationToken,
}

#[derive(Debug, Default)]
struct Shared {
    registration: Option<Registration>,
    last_options: Option<LocationOptions>,
    subscriptions: usize,
}

/// Location provider whose updates are pushed by the host through a
/// [`LocationFeed`].
///
/// Only one subscription may be active at a time. Once a subscription is
/// released the registration is cleared and pushes become no-ops.
#[derive(Debug, Clone)]
pub struct ChannelLocationProvider {
    shared: Arc<Mutex<Shared>>,
}

/// Host-side handle used to deliver location updates.
#[derive(Debug, Clone)]
pub struct LocationFeed {
    shared: Arc<Mutex<Shared>>,
}

impl ChannelLocationProvider {
    /// Creates a provider together with the feed that drives it.
    pub fn new() -> (Self, LocationFeed) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            LocationFeed { shared },
        )
    }

    /// Options passed by the most recent subscriber.
    pub fn last_options(&self) -> Option<LocationOptions> {
        self.lock().last_options.clone()
    }

    /// Total number of subscriptions handed out.
    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocationProvider for ChannelLocationProvider {
    fn subscribe(&self, options: &LocationOptions) -> Result<LocationSubscription, LocationError> {
        let mut shared = self.lock();

        if let Some(existing) = &shared.registration {
            if !existing.release.is_cancelled() {
                return Err(LocationError::AlreadySubscribed);
            }
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let release = CancellationToken::new();
        shared.registration = Some(Registration {
            sender,
            release: release.clone(),
        });
        shared.last_options = Some(options.clone());
        shared.subscriptions += 1;

        debug!(
            high_accuracy = options.high_accuracy,
            timeout_ms = options.timeout.as_millis() as u64,
            max_cached_age_ms = options.max_cached_age.as_millis() as u64,
            "Location subscription started"
        );

        Ok(LocationSubscription::new(receiver, release))
    }
}

impl LocationFeed {
    /// Delivers an update to the current subscriber.
    ///
    /// Returns `false` if there is no active subscriber; the update is then
    /// dropped.
    pub fn push(&self, coordinate: Coordinate) -> bool {
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(registration) = &shared.registration else {
            trace!(%coordinate, "No location subscriber, update dropped");
            return false;
        };

        if registration.release.is_cancelled() || registration.sender.send(coordinate).is_err() {
            shared.registration = None;
            trace!(%coordinate, "Location subscriber released, update dropped");
            return false;
        }

        true
    }

    /// Returns true while a subscriber is registered and not released.
    pub fn has_subscriber(&self) -> bool {
        let shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared
            .registration
            .as_ref()
            .is_some_and(|r| !r.release.is_cancelled())
    }
}
