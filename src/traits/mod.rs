//! Trait definitions for hardware abstraction.
//!
//! This module defines the seams that let fabric-quadrature:
//! - Run against the real register file (memory-mapped, `mmio` feature)
//! - Run against the desktop mocks in [`crate::hal::mock`]
//!
//! # Hardware Abstraction
//!
//! - [`RegisterBus`]: byte access to the shared control, count and rate registers
//! - [`LineConfig`]: pin-configuration primitive for the decoder input lines
//! - [`Register`]: the registers themselves
//! - [`Direction`]: sign interpretation of readings

pub mod hardware;

pub use hardware::*;
