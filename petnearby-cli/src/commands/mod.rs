//! CLI command implementations.

pub mod common;
pub mod discover;
pub mod search;
