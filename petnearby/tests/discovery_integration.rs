//! Integration tests for the discovery screen.
//!
//! These tests drive a mounted screen end to end through the public API:
//! - permission answer → location stream → first fix → places fan-out
//! - merge order, partial and total failure
//! - configuration precheck and unmount safety
//!
//! Run with: `cargo test --test discovery_integration`

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;

use petnearby::config::DiscoveryConfig;
use petnearby::coord::Coordinate;
use petnearby::discovery::{
    DiscoveryPhase, DiscoveryServices, MapCommand, MountedScreen, PermissionState,
    RecordingMapSurface,
};
use petnearby::location::{ChannelLocationProvider, LocationFeed};
use petnearby::permission::{DenialReason, StaticPermissionGate};
use petnearby::places::{PlaceQuery, PlacesClient, PlacesError, RawPlace, SearchResponse};
use petnearby::BoxFuture;

// ============================================================================
// Helper Functions
// ============================================================================

/// Places endpoint scripted per category, recording every query.
#[derive(Clone, Default)]
struct ScriptedPlaces {
    responses: HashMap<String, Result<SearchResponse, PlacesError>>,
    delays: HashMap<String, Duration>,
    queries: Arc<Mutex<Vec<PlaceQuery>>>,
}

impl ScriptedPlaces {
    fn with(mut self, category: &str, response: Result<SearchResponse, PlacesError>) -> Self {
        self.responses.insert(category.to_string(), response);
        self
    }

    fn slow(mut self, category: &str, delay: Duration) -> Self {
        self.delays.insert(category.to_string(), delay);
        self
    }

    fn queries(&self) -> Vec<PlaceQuery> {
        self.queries.lock().unwrap().clone()
    }
}

impl PlacesClient for ScriptedPlaces {
    fn search<'a>(&'a self, query: &'a PlaceQuery) -> BoxFuture<'a, Result<SearchResponse, PlacesError>> {
        self.queries.lock().unwrap().push(query.clone());
        let delay = self.delays.get(&query.category).copied();
        let response = self
            .responses
            .get(&query.category)
            .cloned()
            .unwrap_or_else(|| Ok(SearchResponse::ok(Vec::new())));
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            response
        })
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

/// One mounted screen plus handles on every collaborator.
struct Session {
    screen: MountedScreen,
    gate: Arc<StaticPermissionGate>,
    provider: ChannelLocationProvider,
    feed: LocationFeed,
    places: ScriptedPlaces,
    map: Arc<RecordingMapSurface>,
}

fn mount(gate: StaticPermissionGate, places: ScriptedPlaces, config: DiscoveryConfig) -> Session {
    let gate = Arc::new(gate);
    let (provider, feed) = ChannelLocationProvider::new();
    let map = Arc::new(RecordingMapSurface::new());
    let screen = MountedScreen::mount(
        DiscoveryServices {
            permission: Arc::clone(&gate),
            location: provider.clone(),
            places: places.clone(),
            map: map.clone(),
        },
        config,
    );
    Session {
        screen,
        gate,
        provider,
        feed,
        places,
        map,
    }
}

fn configured() -> DiscoveryConfig {
    DiscoveryConfig::default().with_api_key("integration_key")
}

fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).unwrap()
}

fn found(ids: &[&str]) -> Result<SearchResponse, PlacesError> {
    Ok(SearchResponse::ok(
        ids.iter()
            .enumerate()
            .map(|(i, id)| RawPlace::new(id, &format!("Place {}", id), 51.5 + i as f64 * 0.001, -0.12))
            .collect(),
    ))
}

async fn wait_for_subscriber(feed: &LocationFeed) {
    while !feed.has_subscriber() {
        tokio::task::yield_now().await;
    }
}

const LONDON: (f64, f64) = (51.5074, -0.1278);

// ============================================================================
// Integration Tests
// ============================================================================

/// Grant → first fix → both categories queried once → Ready.
#[tokio::test]
async fn test_full_flow_reaches_ready() {
    let places = ScriptedPlaces::default()
        .with("pharmacy", found(&["A", "B"]))
        .with("veterinary_care", found(&["C"]));
    let mut s = mount(StaticPermissionGate::granted(), places, configured());

    wait_for_subscriber(&s.feed).await;
    assert!(s.feed.push(coord(LONDON.0, LONDON.1)));

    let state = s.screen.settled().await;
    assert_eq!(state.phase, DiscoveryPhase::Ready);
    assert_eq!(state.permission, PermissionState::Granted);
    assert!(state.location_fixed);
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert!(state.warning.is_none());

    let categories: Vec<_> = s.places.queries().into_iter().map(|q| q.category).collect();
    assert_eq!(categories, vec!["pharmacy", "veterinary_care"]);
    assert!(s.map.commands().iter().any(|c| matches!(c, MapCommand::ShowPlaces(p) if p.len() == 3)));
    assert_eq!(s.gate.prompt_count(), 1);
    assert_eq!(s.provider.subscription_count(), 1);

    s.screen.unmount().await;
    assert!(!s.feed.has_subscriber());
}

/// The slower category still comes first in the merged list.
#[tokio::test(start_paused = true)]
async fn test_merge_order_ignores_completion_order() {
    let places = ScriptedPlaces::default()
        .with("pharmacy", found(&["A", "B"]))
        .with("veterinary_care", found(&["C"]))
        .slow("pharmacy", Duration::from_secs(3));
    let mut s = mount(StaticPermissionGate::granted(), places, configured());

    wait_for_subscriber(&s.feed).await;
    s.feed.push(coord(LONDON.0, LONDON.1));

    let state = s.screen.settled().await;
    let ids: Vec<_> = state.places.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);
    s.screen.unmount().await;
}

/// A failing category degrades to a warning.
#[tokio::test]
async fn test_partial_failure_is_ready() {
    let places = ScriptedPlaces::default()
        .with("pharmacy", Err(PlacesError::HttpError("HTTP 503".to_string())))
        .with("veterinary_care", found(&["C"]));
    let mut s = mount(StaticPermissionGate::granted(), places, configured());

    wait_for_subscriber(&s.feed).await;
    s.feed.push(coord(LONDON.0, LONDON.1));

    let state = s.screen.settled().await;
    assert_eq!(state.phase, DiscoveryPhase::Ready);
    let ids: Vec<_> = state.places.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["C"]);
    assert!(state.error.is_none());
    assert!(state.warning.unwrap().contains("pharmacy"));
    s.screen.unmount().await;
}

/// Every category failing, by transport or by status, fails the session.
#[tokio::test]
async fn test_total_failure_is_failed() {
    let places = ScriptedPlaces::default()
        .with("pharmacy", Err(PlacesError::HttpError("offline".to_string())))
        .with(
            "veterinary_care",
            Ok(SearchResponse::failed("REQUEST_DENIED", Some("The provided API key is invalid.".to_string()))),
        );
    let mut s = mount(StaticPermissionGate::granted(), places, configured());

    wait_for_subscriber(&s.feed).await;
    s.feed.push(coord(LONDON.0, LONDON.1));

    let state = s.screen.settled().await;
    assert_eq!(state.phase, DiscoveryPhase::Failed);
    assert!(state.places.is_empty());
    assert!(!state.loading);
    let error = state.error.unwrap();
    assert!(!error.is_empty());
    assert!(error.contains("REQUEST_DENIED"));
    s.screen.unmount().await;
}

/// Denial never touches the location stream or the places endpoint.
#[tokio::test]
async fn test_denial_short_circuits() {
    let mut s = mount(
        StaticPermissionGate::denied(DenialReason::UserDenied),
        ScriptedPlaces::default(),
        configured(),
    );

    let state = s.screen.settled().await;
    assert_eq!(state.phase, DiscoveryPhase::Failed);
    assert_eq!(state.permission, PermissionState::Denied(DenialReason::UserDenied));
    assert_eq!(state.error.as_deref(), Some("Permission to access location was denied"));
    assert_eq!(s.provider.subscription_count(), 0);
    assert!(s.places.queries().is_empty());
    assert!(!s.feed.push(coord(LONDON.0, LONDON.1)));
    s.screen.unmount().await;
}

/// A missing key fails before the prompt, with no network traffic.
#[tokio::test]
async fn test_missing_api_key_precheck() {
    let mut s = mount(
        StaticPermissionGate::granted(),
        ScriptedPlaces::default(),
        DiscoveryConfig::default(),
    );

    let state = s.screen.settled().await;
    assert_eq!(state.phase, DiscoveryPhase::Failed);
    assert!(state.error.unwrap().starts_with("Configuration error"));
    assert_eq!(s.gate.prompt_count(), 0);
    assert_eq!(s.provider.subscription_count(), 0);
    assert!(s.places.queries().is_empty());
    s.screen.unmount().await;
}

/// An empty category list in the config file is caught before the prompt.
#[tokio::test]
async fn test_empty_categories_precheck() {
    let config = DiscoveryConfig::from_ini_str("[places]\napi_key = k\ncategories = \n").unwrap();
    assert!(config.places.categories.is_empty());
    let mut s = mount(StaticPermissionGate::granted(), ScriptedPlaces::default(), config);

    let state = s.screen.settled().await;
    assert_eq!(state.phase, DiscoveryPhase::Failed);
    assert!(!state.loading);
    assert!(state.error.unwrap().starts_with("Configuration error"));
    assert_eq!(s.gate.prompt_count(), 0);
    assert_eq!(s.provider.subscription_count(), 0);
    assert!(s.places.queries().is_empty());
    assert!(!s.feed.push(coord(LONDON.0, LONDON.1)));
    s.screen.unmount().await;
}

/// Events delivered after unmount are dropped without touching the state.
#[tokio::test]
async fn test_late_event_after_unmount_is_noop() {
    let s = mount(StaticPermissionGate::granted(), ScriptedPlaces::default(), configured());
    wait_for_subscriber(&s.feed).await;

    let before = s.screen.state();
    let watcher = s.screen.watch();
    s.screen.unmount().await;

    assert!(!s.feed.push(coord(LONDON.0, LONDON.1)));
    assert!(!s.feed.has_subscriber());
    let after = watcher.borrow().clone();
    assert_eq!(after, before);
    assert_eq!(after.phase, DiscoveryPhase::AwaitingFirstFix);
    assert!(s.places.queries().is_empty());
    assert!(s.map.commands().is_empty());
}

/// With a first-fix timeout configured, a silent stream ends in Failed.
#[tokio::test(start_paused = true)]
async fn test_first_fix_timeout_fails() {
    let mut s = mount(
        StaticPermissionGate::granted(),
        ScriptedPlaces::default(),
        configured().with_first_fix_timeout(Some(Duration::from_secs(20))),
    );

    let state = s.screen.settled().await;
    assert_eq!(state.phase, DiscoveryPhase::Failed);
    assert!(state.error.unwrap().contains("20 seconds"));
    s.screen.unmount().await;
    assert!(!s.feed.has_subscriber());
}

// ============================================================================
// Property Tests
// ============================================================================

fn coordinate_strategy() -> impl Strategy<Value = Coordinate> {
    (-89.0f64..89.0, -179.0f64..179.0).prop_map(|(lat, lon)| coord(lat, lon))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// However many updates arrive, only the first one drives the camera
    /// and the places query.
    #[test]
    fn prop_first_fix_is_idempotent(updates in prop::collection::vec(coordinate_strategy(), 1..16)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let places = ScriptedPlaces::default()
                .with("pharmacy", found(&["A"]))
                .with("veterinary_care", found(&["B"]));
            let mut s = mount(StaticPermissionGate::granted(), places, configured());
            wait_for_subscriber(&s.feed).await;

            for update in &updates {
                s.feed.push(*update);
            }
            let state = s.screen.settled().await;
            while s.map.user_locations().len() < updates.len() {
                tokio::task::yield_now().await;
            }
            s.screen.unmount().await;

            let first = updates[0];
            let queries = s.places.queries();
            prop_assert_eq!(queries.len(), 2);
            prop_assert!(queries.iter().all(|q| q.location == first));
            prop_assert_eq!(s.map.camera_moves().len(), 1);
            prop_assert_eq!(s.map.camera_moves()[0].0.center, first);
            prop_assert_eq!(state.region.map(|r| r.center), Some(first));
            prop_assert_eq!(s.map.user_locations(), updates.clone());
            Ok(())
        })?;
    }
}
