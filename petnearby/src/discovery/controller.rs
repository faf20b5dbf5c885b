//! Discovery controller.
//!
//! Drives one screen mount from the permission prompt to `Ready` or
//! `Failed`. The controller is a single task: every suspension point is
//! raced against the unmount token, and no state is published after the
//! token fires.
//!
//! # Flow
//!
//! ```text
//! request_access ──► subscribe ──► first update ──► animate camera
//!                                        │
//!                                        ▼
//!                                  fetch_nearby (once) ──► Ready | Failed
//!                                        │
//!                                        ▼
//!                          later updates ──► map "my location" only
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::map::MapSurface;
use super::state::{DiscoveryPhase, DiscoveryState};
use crate::config::DiscoveryConfig;
use crate::coord::Coordinate;
use crate::error::DiscoveryError;
use crate::location::{LocationProvider, LocationSubscription};
use crate::permission::{OncePermissionGate, PermissionGate};
use crate::places::{validate_categories, PlaceAggregator, PlacesClient};

/// Host collaborators for one screen mount.
pub struct DiscoveryServices<G, L, P> {
    /// Permission API
    pub permission: G,
    /// Location update stream
    pub location: L,
    /// Places query endpoint
    pub places: P,
    /// Map view
    pub map: Arc<dyn MapSurface>,
}

/// State machine for one screen mount.
pub struct DiscoveryController<G, L, P>
where
    G: PermissionGate,
    L: LocationProvider,
    P: PlacesClient,
{
    permission: OncePermissionGate<G>,
    location: L,
    /// Taken on first use, so places are fetched at most once per mount.
    aggregator: Option<PlaceAggregator<P>>,
    map: Arc<dyn MapSurface>,
    config: DiscoveryConfig,
    state: DiscoveryState,
    publisher: watch::Sender<DiscoveryState>,
}

impl<G, L, P> DiscoveryController<G, L, P>
where
    G: PermissionGate,
    L: LocationProvider,
    P: PlacesClient,
{
    /// Creates a controller for a fresh mount.
    ///
    /// The API key and the category list are validated here. If either is
    /// unusable the controller starts in `Failed` and [`run`](Self::run)
    /// returns without prompting.
    pub fn new(services: DiscoveryServices<G, L, P>, config: DiscoveryConfig) -> Self {
        let mut state = DiscoveryState::mounted();

        let aggregator = validate_categories(&config.places.categories)
            .and_then(|()| PlaceAggregator::new(services.places, config.places.api_key.as_deref()));
        let aggregator = match aggregator {
            Ok(aggregator) => Some(aggregator),
            Err(e) => {
                warn!(error = %e, "Places search unavailable");
                state.fail(e.into());
                None
            }
        };

        let (publisher, _) = watch::channel(state.clone());

        Self {
            permission: OncePermissionGate::new(services.permission),
            location: services.location,
            aggregator,
            map: services.map,
            config,
            state,
            publisher,
        }
    }

    /// Receiver for state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<DiscoveryState> {
        self.publisher.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> &DiscoveryState {
        &self.state
    }

    /// Runs the mount until `unmount` fires.
    ///
    /// After reaching `Ready` the controller keeps forwarding location
    /// updates to the map until unmount; the subscription is released when
    /// this future completes or is dropped.
    pub async fn run(mut self, unmount: CancellationToken) {
        if self.state.phase.is_terminal() {
            debug!(phase = ?self.state.phase, "Controller finished before start");
            return;
        }

        let status = tokio::select! {
            biased;
            _ = unmount.cancelled() => return,
            status = self.permission.request_access() => status,
        };
        if !self.transition(|s| s.apply_permission(status)) || self.state.phase.is_terminal() {
            return;
        }

        let options = self.config.location.options();
        let mut subscription = match self.location.subscribe(&options) {
            Ok(subscription) => subscription,
            Err(e) => {
                self.transition(|s| s.fail(e.into()));
                return;
            }
        };

        let Some(first_fix) = self.await_first_fix(&mut subscription, &unmount).await else {
            return;
        };

        if !self.aggregate(first_fix, &mut subscription, &unmount).await {
            return;
        }

        self.track_location(&mut subscription, &unmount).await;
        debug!("Discovery controller stopped");
    }

    /// Waits for the first update, honoring the optional timeout.
    ///
    /// Returns `None` if the mount ended first.
    async fn await_first_fix(
        &mut self,
        subscription: &mut LocationSubscription,
        unmount: &CancellationToken,
    ) -> Option<Coordinate> {
        let timeout = self.config.location.first_fix_timeout;
        let deadline = async move {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut stream_open = true;
        loop {
            tokio::select! {
                biased;
                _ = unmount.cancelled() => return None,
                _ = &mut deadline => {
                    let waited = timeout.unwrap_or_default();
                    warn!(timeout_secs = waited.as_secs(), "No location fix before timeout");
                    self.transition(|s| s.fail(DiscoveryError::LocationUnavailable(waited)));
                    return None;
                }
                update = subscription.next(), if stream_open => match update {
                    Some(coordinate) => {
                        if let Some(fix) = self.on_location_update(coordinate) {
                            return Some(fix);
                        }
                    }
                    None => {
                        // Non-restartable: stay in the locating phase until unmount or timeout.
                        warn!("Location stream ended before first fix");
                        stream_open = false;
                    }
                },
            }
        }
    }

    /// Fetches places once. Returns false if the mount ended first.
    async fn aggregate(
        &mut self,
        coordinate: Coordinate,
        subscription: &mut LocationSubscription,
        unmount: &CancellationToken,
    ) -> bool {
        // Only reached from AwaitingFirstFix, after `new` built the aggregator.
        let Some(aggregator) = self.aggregator.take() else {
            return false;
        };

        let categories = self.config.places.categories.clone();
        let radius = self.config.places.radius_meters;
        let fetch = aggregator.fetch_nearby(coordinate, &categories, radius);
        tokio::pin!(fetch);

        let mut stream_open = true;
        let outcome = loop {
            tokio::select! {
                biased;
                _ = unmount.cancelled() => {
                    debug!("Unmounted during aggregation, discarding results");
                    return false;
                }
                outcome = &mut fetch => break outcome,
                update = subscription.next(), if stream_open => match update {
                    Some(coordinate) => {
                        self.on_location_update(coordinate);
                    }
                    None => stream_open = false,
                },
            }
        };

        match outcome {
            Ok(aggregation) => {
                if let Some(warning) = aggregation.warning() {
                    warn!(%warning, "Showing partial results");
                }
                self.map.show_places(&aggregation.places);
                self.transition(|s| s.apply_places(aggregation));
                true
            }
            Err(e) => {
                self.transition(|s| s.fail(e.into()));
                false
            }
        }
    }

    /// Forwards updates to the map until unmount or the stream ends.
    async fn track_location(
        &mut self,
        subscription: &mut LocationSubscription,
        unmount: &CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = unmount.cancelled() => return,
                update = subscription.next() => match update {
                    Some(coordinate) => {
                        self.on_location_update(coordinate);
                    }
                    None => return,
                },
            }
        }
    }

    /// Handles one location update.
    ///
    /// The phase check and the transition happen without yielding, so only
    /// one update can ever become the first fix. Returns the coordinate if
    /// this update was it.
    fn on_location_update(&mut self, coordinate: Coordinate) -> Option<Coordinate> {
        self.map.update_user_location(coordinate);

        let region = self.state.accept_first_fix(coordinate)?;
        info!(%coordinate, "First location fix");
        self.map.animate_to(region, self.config.map.camera_animation);
        self.publish();
        Some(coordinate)
    }

    /// Applies a guarded transition and publishes it if it took effect.
    fn transition(&mut self, apply: impl FnOnce(&mut DiscoveryState) -> bool) -> bool {
        let from = self.state.phase;
        let applied = apply(&mut self.state);
        if applied {
            info!(from = ?from, to = ?self.state.phase, "Discovery state transition");
            if self.state.phase == DiscoveryPhase::Failed {
                if let Some(error) = &self.state.error {
                    warn!(%error, "Discovery failed");
                }
            }
            self.publish();
        }
        applied
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::discovery::map::{MapCommand, RecordingMapSurface};
    use crate::location::{ChannelLocationProvider, LocationFeed};
    use crate::permission::{DenialReason, StaticPermissionGate};
    use crate::places::tests::MockPlacesClient;
    use crate::places::{PlacesError, RawPlace, SearchResponse};

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn ok(ids: &[&str]) -> Result<SearchResponse, PlacesError> {
        Ok(SearchResponse::ok(
            ids.iter().map(|id| RawPlace::new(id, id, 10.0, 20.0)).collect(),
        ))
    }

    struct Harness {
        controller: DiscoveryController<Arc<StaticPermissionGate>, ChannelLocationProvider, MockPlacesClient>,
        gate: Arc<StaticPermissionGate>,
        provider: ChannelLocationProvider,
        feed: LocationFeed,
        places: MockPlacesClient,
        map: Arc<RecordingMapSurface>,
    }

    fn harness(gate: StaticPermissionGate, places: MockPlacesClient, config: DiscoveryConfig) -> Harness {
        let gate = Arc::new(gate);
        let (provider, feed) = ChannelLocationProvider::new();
        let map = Arc::new(RecordingMapSurface::new());
        let controller = DiscoveryController::new(
            DiscoveryServices {
                permission: Arc::clone(&gate),
                location: provider.clone(),
                places: places.clone(),
                map: map.clone(),
            },
            config,
        );
        Harness {
            controller,
            gate,
            provider,
            feed,
            places,
            map,
        }
    }

    fn config() -> DiscoveryConfig {
        DiscoveryConfig::default().with_api_key("test_key")
    }

    async fn wait_for_subscriber(feed: &LocationFeed) {
        while !feed.has_subscriber() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_prompt() {
        let h = harness(
            StaticPermissionGate::granted(),
            MockPlacesClient::new(),
            DiscoveryConfig::default(),
        );
        assert_eq!(h.controller.state().phase, DiscoveryPhase::Failed);

        let rx = h.controller.subscribe();
        h.controller.run(CancellationToken::new()).await;

        let state = rx.borrow().clone();
        assert_eq!(state.phase, DiscoveryPhase::Failed);
        assert!(state.error.unwrap().contains("Configuration error"));
        assert!(!state.loading);
        assert_eq!(h.gate.prompt_count(), 0);
        assert_eq!(h.provider.subscription_count(), 0);
        assert!(h.places.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_categories_fail_before_prompt() {
        let config = DiscoveryConfig::from_ini_str("[places]\napi_key = k\ncategories = \n").unwrap();
        let h = harness(StaticPermissionGate::granted(), MockPlacesClient::new(), config);
        assert_eq!(h.controller.state().phase, DiscoveryPhase::Failed);

        let rx = h.controller.subscribe();
        h.controller.run(CancellationToken::new()).await;

        let state = rx.borrow().clone();
        assert_eq!(state.phase, DiscoveryPhase::Failed);
        assert_eq!(
            state.error.as_deref(),
            Some("Configuration error: no place categories configured")
        );
        assert_eq!(h.gate.prompt_count(), 0);
        assert_eq!(h.provider.subscription_count(), 0);
        assert!(h.places.calls().is_empty());
        assert!(!h.feed.push(coord(1.0, 1.0)));
    }

    #[tokio::test]
    async fn test_denial_short_circuits() {
        let h = harness(
            StaticPermissionGate::denied(DenialReason::UserDenied),
            MockPlacesClient::new(),
            config(),
        );
        let rx = h.controller.subscribe();

        h.controller.run(CancellationToken::new()).await;

        let state = rx.borrow().clone();
        assert_eq!(state.phase, DiscoveryPhase::Failed);
        assert_eq!(state.error, Some(DenialReason::UserDenied.user_message()));
        assert_eq!(h.gate.prompt_count(), 1);
        assert_eq!(h.provider.subscription_count(), 0);
        assert!(h.places.calls().is_empty());
        assert!(h.map.commands().is_empty());
    }

    #[tokio::test]
    async fn test_first_fix_triggers_single_aggregation() {
        let places = MockPlacesClient::new()
            .respond("pharmacy", ok(&["A", "B"]))
            .respond("veterinary_care", ok(&["C"]));
        let h = harness(StaticPermissionGate::granted(), places, config());
        let mut rx = h.controller.subscribe();
        let unmount = CancellationToken::new();
        let task = tokio::spawn(h.controller.run(unmount.clone()));

        wait_for_subscriber(&h.feed).await;
        assert!(h.feed.push(coord(10.0, 20.0)));

        let state = rx
            .wait_for(|s| s.phase.is_terminal())
            .await
            .unwrap()
            .clone();
        assert_eq!(state.phase, DiscoveryPhase::Ready);
        let ids: Vec<_> = state.places.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(state.region.unwrap().center, coord(10.0, 20.0));

        // Later updates only move the location indicator
        assert!(h.feed.push(coord(10.1, 20.1)));
        assert!(h.feed.push(coord(10.2, 20.2)));
        while h.map.user_locations().len() < 3 {
            tokio::task::yield_now().await;
        }

        unmount.cancel();
        task.await.unwrap();

        let calls = h.places.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|q| q.location == coord(10.0, 20.0)));
        assert_eq!(h.map.camera_moves().len(), 1);
        assert_eq!(h.map.camera_moves()[0].1, Duration::from_millis(1000));
        assert_eq!(h.map.user_locations().len(), 3);
    }

    #[tokio::test]
    async fn test_total_failure_is_failed() {
        let places = MockPlacesClient::new()
            .respond("pharmacy", Err(PlacesError::HttpError("offline".to_string())))
            .respond("veterinary_care", Err(PlacesError::HttpError("offline".to_string())));
        let h = harness(StaticPermissionGate::granted(), places, config());
        let mut rx = h.controller.subscribe();
        let task = tokio::spawn(h.controller.run(CancellationToken::new()));

        wait_for_subscriber(&h.feed).await;
        h.feed.push(coord(1.0, 1.0));

        let state = rx.wait_for(|s| s.phase.is_terminal()).await.unwrap().clone();
        assert_eq!(state.phase, DiscoveryPhase::Failed);
        assert!(state.places.is_empty());
        assert!(!state.loading);
        assert!(state.error.unwrap().contains("offline"));

        // Failed is terminal: the task ends and releases the subscription.
        task.await.unwrap();
        assert!(!h.feed.has_subscriber());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fix_timeout() {
        let h = harness(
            StaticPermissionGate::granted(),
            MockPlacesClient::new(),
            config().with_first_fix_timeout(Some(Duration::from_secs(30))),
        );
        let rx = h.controller.subscribe();

        h.controller.run(CancellationToken::new()).await;

        let state = rx.borrow().clone();
        assert_eq!(state.phase, DiscoveryPhase::Failed);
        assert!(state.error.unwrap().contains("30 seconds"));
        assert!(h.places.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unmount_while_locating_leaves_state_untouched() {
        let h = harness(StaticPermissionGate::granted(), MockPlacesClient::new(), config());
        let rx = h.controller.subscribe();
        let unmount = CancellationToken::new();
        let task = tokio::spawn(h.controller.run(unmount.clone()));

        wait_for_subscriber(&h.feed).await;
        unmount.cancel();
        task.await.unwrap();

        assert!(!h.feed.push(coord(5.0, 5.0)));
        let state = rx.borrow().clone();
        assert_eq!(state.phase, DiscoveryPhase::AwaitingFirstFix);
        assert!(!state.location_fixed);
        assert!(h.places.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_during_aggregation_discards_results() {
        let places = MockPlacesClient::new()
            .respond("pharmacy", ok(&["A"]))
            .respond("veterinary_care", ok(&["C"]))
            .delay("pharmacy", Duration::from_secs(10));
        let h = harness(StaticPermissionGate::granted(), places, config());
        let mut rx = h.controller.subscribe();
        let unmount = CancellationToken::new();
        let task = tokio::spawn(h.controller.run(unmount.clone()));

        wait_for_subscriber(&h.feed).await;
        h.feed.push(coord(1.0, 1.0));
        rx.wait_for(|s| s.phase == DiscoveryPhase::AggregatingPlaces)
            .await
            .unwrap();

        unmount.cancel();
        task.await.unwrap();
        tokio::time::advance(Duration::from_secs(20)).await;

        let state = rx.borrow().clone();
        assert_eq!(state.phase, DiscoveryPhase::AggregatingPlaces);
        assert!(state.places.is_empty());
        let showed_places = h
            .map
            .commands()
            .iter()
            .any(|c| matches!(c, MapCommand::ShowPlaces(_)));
        assert!(!showed_places);
    }

    #[tokio::test]
    async fn test_location_options_forwarded() {
        let mut config = config();
        config.location.high_accuracy = false;
        let h = harness(StaticPermissionGate::granted(), MockPlacesClient::new(), config);
        let unmount = CancellationToken::new();
        let task = tokio::spawn(h.controller.run(unmount.clone()));

        wait_for_subscriber(&h.feed).await;
        unmount.cancel();
        task.await.unwrap();

        assert!(!h.provider.last_options().unwrap().high_accuracy);
    }
}
