//! Hardware Abstraction Layer implementations.
//!
//! This module contains concrete implementations of the traits
//! defined in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: Simulated decoder fabric and pin configurator for desktop development
//! - `mmio`: Volatile memory-mapped register access (requires `mmio` feature)

pub mod mock;

#[cfg(feature = "mmio")]
pub mod mmio;

pub use mock::*;

#[cfg(feature = "mmio")]
pub use mmio::*;
