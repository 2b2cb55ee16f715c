//! Configuration types for Vigil.
//!
//! This crate provides the configuration used by the scan pipeline, read
//! from `.vigil/config.yaml` files.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;
