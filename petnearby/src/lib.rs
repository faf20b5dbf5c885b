//! PetNearby - nearby pharmacies and veterinary clinics on a map
//!
//! This library drives one visit of the discovery screen: it asks for
//! location permission, takes the first location fix, centers the map
//! there and aggregates nearby places from several categories into a
//! single de-duplicated list.
//!
//! The host supplies the permission prompt, the location stream and the
//! map view through the traits in [`permission`], [`location`] and
//! [`discovery`]; [`places`] ships a Google Places client.

use std::future::Future;
use std::pin::Pin;

pub mod config;
pub mod coord;
pub mod discovery;
pub mod error;
pub mod location;
pub mod logging;
pub mod permission;
pub mod places;

pub use error::DiscoveryError;

/// Boxed future returned by the object-safe async traits in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
