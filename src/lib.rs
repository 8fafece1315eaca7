//! # fabric-quadrature
//!
//! Driver for quadrature decoder channels implemented in FPGA fabric and
//! exposed to the microcontroller through a handful of memory-mapped
//! registers.
//!
//! ## Features
//!
//! - **Up to six channels**: handed out in creation order, each wired to a
//!   fixed pair of input lines
//! - **Signed readings**: 24-bit pulse count and 16-bit per-interval rate,
//!   positive forward and negative reverse
//! - **Sampling control**: 20 ms or 200 ms rate interval per channel
//! - **Explicit exhaustion**: claiming past the hardware limit is an error,
//!   and handles without a channel refuse every operation
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Register bus and pin-configuration abstractions
//! - `registers` - Control-register bit layout and data decoding
//! - `registry` - Channel allocation and mirrored settings
//! - `fabric` - Hardware context owning the bus and registry
//! - `channel` - Per-channel handle
//! - `hal` - Concrete implementations (mock for testing, mmio for hardware)
//!
//! ## Example
//!
//! ```rust
//! use fabric_quadrature::{
//!     QuadratureFabric, SampleRate,
//!     hal::{MockLines, MockRegisters},
//! };
//!
//! // One fabric per program, built from a register bus and a pin configurator
//! let fabric = QuadratureFabric::new(MockRegisters::new(), MockLines::new());
//!
//! let left = fabric.claim().unwrap();
//! let right = fabric.claim().unwrap();
//! right.set_sample_rate(SampleRate::Fast).unwrap();
//!
//! // In your control loop
//! let distance = left.read_count().unwrap();
//! let speed = right.read_rate().unwrap();
//! assert_eq!((distance, speed), (0, 0));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Per-channel handle and status snapshot.
pub mod channel;
/// Driver configuration (register addresses, pin origin, defaults).
pub mod config;
/// Error types.
pub mod error;
/// Hardware context that owns the register bus and channel registry.
pub mod fabric;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Control-register bit layout and count/rate decoding.
pub mod registers;
/// Channel allocation and mirrored per-channel settings.
pub mod registry;
/// Core traits for hardware abstraction.
pub mod traits;

// Re-exports for convenience
pub use channel::{ChannelStatus, QuadratureChannel};
pub use config::{FabricConfig, RegisterMap};
pub use error::QuadratureError;
pub use fabric::QuadratureFabric;
pub use registers::ControlWord;
pub use registry::{
    ChannelIndex, ChannelRegistry, ChannelSettings, SampleRate, INVALID_INDEX, MAX_CHANNELS,
};
pub use traits::{Direction, LineConfig, Register, RegisterBus};
