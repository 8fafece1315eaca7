//! Hardware context that owns the decoder register file and channel registry.
//!
//! A [`QuadratureFabric`] is created once at startup from a [`RegisterBus`]
//! and a [`LineConfig`]. Channels are then claimed from it and borrow it for
//! their lifetime, so there is one registry per fabric and no hidden global
//! state.
//!
//! # Example
//!
//! ```rust
//! use fabric_quadrature::{QuadratureFabric, hal::{MockLines, MockRegisters}};
//!
//! let fabric = QuadratureFabric::new(MockRegisters::new(), MockLines::new());
//! let left = fabric.claim().unwrap();
//! let right = fabric.claim().unwrap();
//!
//! assert_eq!(left.index().raw(), 0);
//! assert_eq!(right.index().raw(), 1);
//! assert_eq!(fabric.claimed(), 2);
//! ```
//!
//! # Register Protocol
//!
//! Every configuration change rewrites the whole control byte from the
//! channel's mirrored [`ChannelSettings`]. Reads write a bare select and then
//! read the data registers; the bus stays borrowed for the whole sequence so
//! no other access can slip in between select and read.

use core::cell::{Ref, RefCell, RefMut};

use crate::channel::QuadratureChannel;
use crate::config::FabricConfig;
use crate::error::QuadratureError;
use crate::registers::{decode_count, decode_rate, ControlWord};
use crate::registry::{ChannelIndex, ChannelRegistry, ChannelSettings, MAX_CHANNELS};
use crate::traits::{LineConfig, Register, RegisterBus};

/// Shared hardware context for all quadrature channels.
///
/// # Type Parameters
///
/// - `R`: register access ([`RegisterBus`] trait)
/// - `L`: pin configuration ([`LineConfig`] trait)
///
/// # Thread Safety
///
/// The fabric uses `RefCell` internally and is therefore `!Sync`. It is meant
/// for a single-threaded control loop. Sharing it between threads needs an
/// outer lock held across each channel operation.
pub struct QuadratureFabric<R, L> {
    bus: RefCell<R>,
    lines: RefCell<L>,
    registry: RefCell<ChannelRegistry>,
    config: FabricConfig,
}

impl<R: RegisterBus, L: LineConfig> QuadratureFabric<R, L> {
    /// Create a fabric with the default configuration
    pub fn new(bus: R, lines: L) -> Self {
        Self::with_config(bus, lines, FabricConfig::default())
    }

    /// Create a fabric with an explicit configuration
    pub fn with_config(bus: R, lines: L, config: FabricConfig) -> Self {
        Self {
            bus: RefCell::new(bus),
            lines: RefCell::new(lines),
            registry: RefCell::new(ChannelRegistry::new()),
            config,
        }
    }

    /// Claim the next hardware channel.
    ///
    /// # Errors
    ///
    /// - [`QuadratureError::ResourceExhausted`] once all channels are claimed
    /// - [`QuadratureError::Line`] if an input line cannot be configured
    pub fn claim(&self) -> Result<QuadratureChannel<'_, R, L>, QuadratureError<L::Error>> {
        QuadratureChannel::try_new(self)
    }

    /// The configuration this fabric was built with
    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    /// Number of channels claimed so far
    pub fn claimed(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Number of channels still available
    pub fn remaining(&self) -> usize {
        MAX_CHANNELS - self.claimed()
    }

    /// Mirrored settings of a claimed channel
    pub fn settings(&self, index: ChannelIndex) -> Option<ChannelSettings> {
        self.registry.borrow().settings(index).copied()
    }

    /// Borrow the register bus.
    ///
    /// # Panics
    ///
    /// Panics if a channel operation is in progress (cannot happen from a
    /// single thread) or a [`bus_mut`](Self::bus_mut) guard is still alive.
    pub fn bus(&self) -> Ref<'_, R> {
        self.bus.borrow()
    }

    /// Mutably borrow the register bus, e.g. to drive a simulated fabric.
    ///
    /// Drop the guard before calling channel operations.
    pub fn bus_mut(&self) -> RefMut<'_, R> {
        self.bus.borrow_mut()
    }

    /// Borrow the line configurator
    pub fn lines(&self) -> Ref<'_, L> {
        self.lines.borrow()
    }

    /// Tear the fabric down and hand back the bus and line configurator
    pub fn into_parts(self) -> (R, L) {
        (self.bus.into_inner(), self.lines.into_inner())
    }

    // ------------------------------------------------------------------------
    // Channel protocol (used by QuadratureChannel)
    // ------------------------------------------------------------------------

    pub(crate) fn allocate(&self) -> Option<ChannelIndex> {
        let index = self
            .registry
            .borrow_mut()
            .allocate(self.config.channel_defaults);

        #[cfg(feature = "defmt")]
        match index {
            Some(i) => defmt::debug!("quadrature: claimed channel {}", i.raw()),
            None => defmt::warn!("quadrature: all {} channels in use", MAX_CHANNELS),
        }

        index
    }

    pub(crate) fn route_lines(&self, index: ChannelIndex) -> Result<(), QuadratureError<L::Error>> {
        let (a, b) = index
            .lines(self.config.first_line)
            .ok_or(QuadratureError::InvalidChannel)?;
        let mut lines = self.lines.borrow_mut();
        lines.set_passthrough(a)?;
        lines.set_passthrough(b)?;
        Ok(())
    }

    pub(crate) fn update<F>(&self, index: ChannelIndex, f: F) -> Result<(), QuadratureError<L::Error>>
    where
        F: FnOnce(&mut ChannelSettings),
    {
        let settings = {
            let mut registry = self.registry.borrow_mut();
            let settings = registry
                .settings_mut(index)
                .ok_or(QuadratureError::InvalidChannel)?;
            f(settings);
            *settings
        };
        self.write_control(ControlWord::configure(
            index,
            settings.enabled,
            settings.sample_rate,
        ));
        Ok(())
    }

    pub(crate) fn sync(&self, index: ChannelIndex) -> Result<(), QuadratureError<L::Error>> {
        self.update(index, |_| {})
    }

    pub(crate) fn reset(&self, index: ChannelIndex) -> Result<(), QuadratureError<L::Error>> {
        let settings = self.settings(index).ok_or(QuadratureError::InvalidChannel)?;
        self.write_control(ControlWord::reset(
            index,
            settings.enabled,
            settings.sample_rate,
        ));

        #[cfg(feature = "defmt")]
        defmt::debug!("quadrature {}: counters reset", index.raw());

        Ok(())
    }

    pub(crate) fn read_count(&self, index: ChannelIndex) -> Result<i32, QuadratureError<L::Error>> {
        self.require(index)?;
        let mut bus = self.bus.borrow_mut();
        bus.write(Register::Control, ControlWord::select(index).bits());
        let low = bus.read(Register::Count0);
        let mid = bus.read(Register::Count1);
        let high = bus.read(Register::Count2);
        Ok(decode_count(low, mid, high))
    }

    pub(crate) fn read_rate(&self, index: ChannelIndex) -> Result<i16, QuadratureError<L::Error>> {
        self.require(index)?;
        let mut bus = self.bus.borrow_mut();
        bus.write(Register::Control, ControlWord::select(index).bits());
        let low = bus.read(Register::Rate0);
        let high = bus.read(Register::Rate1);
        Ok(decode_rate(low, high))
    }

    fn require(&self, index: ChannelIndex) -> Result<(), QuadratureError<L::Error>> {
        if self.registry.borrow().settings(index).is_some() {
            Ok(())
        } else {
            Err(QuadratureError::InvalidChannel)
        }
    }

    fn write_control(&self, word: ControlWord) {
        self.bus.borrow_mut().write(Register::Control, word.bits());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockLines, MockRegisters};
    use crate::registry::SampleRate;

    fn fabric() -> QuadratureFabric<MockRegisters, MockLines> {
        QuadratureFabric::new(MockRegisters::new(), MockLines::new())
    }

    // =========================================================================
    // Construction Tests
    // =========================================================================

    #[test]
    fn new_fabric_is_empty() {
        let fabric = fabric();
        assert_eq!(fabric.claimed(), 0);
        assert_eq!(fabric.remaining(), MAX_CHANNELS);
        assert!(fabric.bus().control_writes.is_empty());
        assert!(fabric.lines().configured.is_empty());
    }

    #[test]
    fn with_config_applies_defaults_to_new_channels() {
        let config = FabricConfig::default()
            .with_sample_rate(SampleRate::Fast)
            .with_enabled(false);
        let fabric = QuadratureFabric::with_config(MockRegisters::new(), MockLines::new(), config);
        let ch = fabric.claim().unwrap();

        let settings = fabric.settings(ch.index()).unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.sample_rate, SampleRate::Fast);
        assert_eq!(fabric.bus().last_control(), Some(0b0101_0000));
    }

    #[test]
    fn into_parts_returns_collaborators() {
        let fabric = fabric();
        fabric.claim().unwrap();
        let (regs, lines) = fabric.into_parts();
        assert_eq!(regs.control_writes.len(), 1);
        assert_eq!(lines.configured, [2, 3]);
    }

    // =========================================================================
    // Protocol Tests
    // =========================================================================

    #[test]
    fn protocol_rejects_unallocated_index() {
        let fabric = fabric();
        let idx = ChannelIndex::new(0);
        assert_eq!(fabric.sync(idx), Err(QuadratureError::InvalidChannel));
        assert_eq!(fabric.reset(idx), Err(QuadratureError::InvalidChannel));
        assert_eq!(fabric.read_count(idx), Err(QuadratureError::InvalidChannel));
        assert_eq!(fabric.read_rate(idx), Err(QuadratureError::InvalidChannel));
        assert!(fabric.bus().control_writes.is_empty());
    }

    #[test]
    fn route_lines_rejects_invalid_index() {
        let fabric = fabric();
        assert_eq!(
            fabric.route_lines(ChannelIndex::INVALID),
            Err(QuadratureError::InvalidChannel)
        );
        assert!(fabric.lines().configured.is_empty());
    }

    #[test]
    fn read_count_selects_then_reads_low_to_high() {
        let fabric = fabric();
        let ch = fabric.claim().unwrap();
        fabric.bus_mut().clear_log();

        fabric.read_count(ch.index()).unwrap();

        let bus = fabric.bus();
        assert_eq!(bus.control_writes, [0x00]);
        assert_eq!(
            bus.data_reads,
            [Register::Count0, Register::Count1, Register::Count2]
        );
    }

    #[test]
    fn read_rate_selects_then_reads_low_to_high() {
        let fabric = fabric();
        fabric.claim().unwrap();
        let ch = fabric.claim().unwrap();
        fabric.bus_mut().clear_log();

        fabric.read_rate(ch.index()).unwrap();

        let bus = fabric.bus();
        assert_eq!(bus.control_writes, [0x01]);
        assert_eq!(bus.data_reads, [Register::Rate0, Register::Rate1]);
    }
}
