//! Location permission gate.
//!
//! The host platform owns the consent dialog. This module models the single
//! asynchronous question "may we read the device location?" and the
//! user-facing reasons a denial can carry.
//!
//! # Example
//!
//! ```
//! use petnearby::permission::{OncePermissionGate, PermissionGate, PermissionStatus, StaticPermissionGate};
//!
//! # let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # runtime.block_on(async {
//! let gate = OncePermissionGate::new(StaticPermissionGate::granted());
//! assert_eq!(gate.request_access().await, PermissionStatus::Granted);
//! assert_eq!(gate.request_access().await, PermissionStatus::Granted);
//! assert_eq!(gate.inner().prompt_count(), 1);
//! # });
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::BoxFuture;

/// Why location access was not granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// The user declined the consent prompt.
    UserDenied,
    /// Access is blocked by device policy (parental controls, MDM, etc.).
    PlatformDenied,
    /// The host permission API failed before producing an answer.
    RequestFailed(String),
}

impl DenialReason {
    /// Message shown verbatim to the user.
    pub fn user_message(&self) -> String {
        match self {
            DenialReason::UserDenied => {
                "Permission to access location was denied".to_string()
            }
            DenialReason::PlatformDenied => {
                "Location access is blocked on this device".to_string()
            }
            DenialReason::RequestFailed(detail) => {
                format!("Could not request location permission: {}", detail)
            }
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

/// Answer to a permission request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Foreground location access granted.
    Granted,
    /// Access refused.
    Denied(DenialReason),
}

impl PermissionStatus {
    /// Returns true if access was granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// Host-provided location permission API.
///
/// Implementations suspend until the host answers. Failures of the host API
/// itself are reported as [`DenialReason::RequestFailed`], never as panics.
pub trait PermissionGate: Send + Sync {
    /// Ask the host for foreground location access.
    fn request_access(&self) -> BoxFuture<'_, PermissionStatus>;
}

impl<T: PermissionGate + ?Sized> PermissionGate for std::sync::Arc<T> {
    fn request_access(&self) -> BoxFuture<'_, PermissionStatus> {
        (**self).request_access()
    }
}

/// Gate that always answers with a fixed decision.
///
/// Used by hosts without a consent dialog (the CLI) and by tests. Counts
/// how many times it has been asked.
#[derive(Debug)]
pub struct StaticPermissionGate {
    status: PermissionStatus,
    prompts: AtomicUsize,
}

impl StaticPermissionGate {
    /// Creates a gate with the given answer.
    pub fn new(status: PermissionStatus) -> Self {
        Self {
            status,
            prompts: AtomicUsize::new(0),
        }
    }

    /// Gate that grants access.
    pub fn granted() -> Self {
        Self::new(PermissionStatus::Granted)
    }

    /// Gate that denies access for the given reason.
    pub fn denied(reason: DenialReason) -> Self {
        Self::new(PermissionStatus::Denied(reason))
    }

    /// Number of prompts shown so far.
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl PermissionGate for StaticPermissionGate {
    fn request_access(&self) -> BoxFuture<'_, PermissionStatus> {
        Box::pin(async move {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            self.status.clone()
        })
    }
}

/// Wraps a host gate so it prompts at most once per screen mount.
///
/// The first answer, granted or denied, is remembered; later calls return
/// it without touching the host. A fresh wrapper is created on every mount.
pub struct OncePermissionGate<G> {
    inner: G,
    answer: OnceCell<PermissionStatus>,
}

impl<G: PermissionGate> OncePermissionGate<G> {
    /// Wraps a host permission gate.
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            answer: OnceCell::new(),
        }
    }

    /// The remembered answer, if the host has already been asked.
    pub fn answer(&self) -> Option<&PermissionStatus> {
        self.answer.get()
    }

    /// Access the wrapped gate.
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: PermissionGate> PermissionGate for OncePermissionGate<G> {
    fn request_access(&self) -> BoxFuture<'_, PermissionStatus> {
        Box::pin(async move {
            if let Some(status) = self.answer.get() {
                debug!(?status, "Permission already answered for this mount");
                return status.clone();
            }
            let status = self
                .answer
                .get_or_init(|| async {
                    let status = self.inner.request_access().await;
                    info!(granted = status.is_granted(), "Location permission answered");
                    status
                })
                .await;
            status.clone()
        })
    }
}
