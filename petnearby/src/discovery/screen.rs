//! Screen mount lifecycle.
//!
//! [`MountedScreen::mount`] spawns a [`DiscoveryController`] for one visit
//! of the screen. Unmounting (explicitly or by dropping the handle) cancels
//! the controller, which releases the location subscription and discards
//! any outstanding places queries.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

use super::controller::{DiscoveryController, DiscoveryServices};
use super::state::DiscoveryState;
use crate::config::DiscoveryConfig;
use crate::location::LocationProvider;
use crate::permission::PermissionGate;
use crate::places::PlacesClient;

/// Handle on a mounted discovery screen.
///
/// Must be created inside a Tokio runtime.
pub struct MountedScreen {
    state: watch::Receiver<DiscoveryState>,
    unmount: CancellationToken,
    task: JoinHandle<()>,
    _guard: DropGuard,
}

impl MountedScreen {
    /// Mounts a screen: builds the controller and starts it.
    pub fn mount<G, L, P>(services: DiscoveryServices<G, L, P>, config: DiscoveryConfig) -> Self
    where
        G: PermissionGate + 'static,
        L: LocationProvider + 'static,
        P: PlacesClient + 'static,
    {
        Self::start(DiscoveryController::new(services, config))
    }

    /// Starts an already constructed controller.
    pub fn start<G, L, P>(controller: DiscoveryController<G, L, P>) -> Self
    where
        G: PermissionGate + 'static,
        L: LocationProvider + 'static,
        P: PlacesClient + 'static,
    {
        let state = controller.subscribe();
        let unmount = CancellationToken::new();
        let task = tokio::spawn(controller.run(unmount.clone()));
        debug!("Discovery screen mounted");

        Self {
            state,
            _guard: unmount.clone().drop_guard(),
            unmount,
            task,
        }
    }

    /// Latest published state.
    pub fn state(&self) -> DiscoveryState {
        self.state.borrow().clone()
    }

    /// A new receiver for state changes (for the rendering layer).
    pub fn watch(&self) -> watch::Receiver<DiscoveryState> {
        self.state.clone()
    }

    /// Waits until the session reaches `Ready` or `Failed`.
    ///
    /// Returns the last published state if the controller stops first
    /// (e.g. it was unmounted while still loading).
    pub async fn settled(&mut self) -> DiscoveryState {
        let settled = self
            .state
            .wait_for(|s| s.phase.is_terminal())
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state.borrow().clone())
    }

    /// Unmounts the screen and waits for the controller to stop.
    pub async fn unmount(self) {
        self.unmount.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Discovery controller task ended abnormally");
        }
        debug!("Discovery screen unmounted");
    }
}
