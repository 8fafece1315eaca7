//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the hardware traits, enabling
//! development and testing on desktop without an FPGA board.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockRegisters`] | [`RegisterBus`] | Simulated decoder fabric, records every access |
//! | [`MockLines`] | [`LineConfig`] | Records configured lines, optional injected failure |
//!
//! # Example
//!
//! ```rust
//! use fabric_quadrature::QuadratureFabric;
//! use fabric_quadrature::hal::{MockLines, MockRegisters};
//!
//! let fabric = QuadratureFabric::new(MockRegisters::new(), MockLines::new());
//! let ch = fabric.claim().unwrap();
//!
//! // Drive the simulated decoder
//! fabric.bus_mut().pulse(0, 25);
//! fabric.bus_mut().set_rate(0, 5);
//!
//! assert_eq!(ch.read_count().unwrap(), 25);
//! assert_eq!(ch.read_rate().unwrap(), 5);
//!
//! // Verify the register traffic
//! assert_eq!(fabric.bus().last_control(), Some(0x00)); // select for the read
//! assert_eq!(fabric.lines().configured, [2, 3]);
//! ```
//!
//! [`RegisterBus`]: crate::traits::RegisterBus
//! [`LineConfig`]: crate::traits::LineConfig

use crate::registers::{decode_count, encode_count, ControlWord, MAX_SELECT};
use crate::registry::SampleRate;
use crate::traits::{LineConfig, Register, RegisterBus};

extern crate alloc;
use alloc::vec::Vec;

/// Number of decoder slots the select field can address.
const SLOTS: usize = MAX_SELECT as usize + 1;

// ============================================================================
// Register Mock
// ============================================================================

/// State of one simulated decoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimChannel {
    /// Whether the decoder counts pulses.
    pub enabled: bool,
    /// Sampling interval last configured.
    pub sample_rate: SampleRate,
    /// Count, kept within the 24-bit signed range.
    pub count: i32,
    /// Pulses in the last interval.
    pub rate: i16,
}

/// Mock register file simulating the decoder fabric.
///
/// Interprets control writes the way the hardware does:
/// - the low nibble selects the channel exposed by the data registers
/// - an enable or disable bit applies that state and the rate-select bit
/// - the reset bit zeroes the selected channel's count and rate
/// - a write with bits 7..4 clear only selects
///
/// Every control write and data read is logged for verification.
///
/// # Example
///
/// ```rust
/// use fabric_quadrature::hal::MockRegisters;
/// use fabric_quadrature::traits::{Register, RegisterBus};
///
/// let mut regs = MockRegisters::new();
/// regs.write(Register::Control, 0x82); // enable channel 2
/// regs.pulse(2, -1);
///
/// regs.write(Register::Control, 0x02); // select channel 2
/// assert_eq!(regs.read(Register::Count0), 0xFF);
/// assert_eq!(regs.read(Register::Count2), 0xFF);
/// assert_eq!(regs.control_writes, [0x82, 0x02]);
/// ```
#[derive(Debug, Clone)]
pub struct MockRegisters {
    channels: [SimChannel; SLOTS],
    selected: u8,
    /// Every byte written to the control register, in order.
    pub control_writes: Vec<u8>,
    /// Every data register read, in order.
    pub data_reads: Vec<Register>,
}

impl Default for MockRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegisters {
    /// Creates a fabric with every decoder disabled and zeroed.
    pub fn new() -> Self {
        Self {
            channels: [SimChannel::default(); SLOTS],
            selected: 0,
            control_writes: Vec::new(),
            data_reads: Vec::new(),
        }
    }

    /// State of a simulated decoder.
    pub fn channel(&self, index: u8) -> &SimChannel {
        &self.channels[Self::slot(index)]
    }

    /// Channel currently exposed by the data registers.
    pub fn selected(&self) -> u8 {
        self.selected
    }

    /// Last byte written to the control register.
    pub fn last_control(&self) -> Option<u8> {
        self.control_writes.last().copied()
    }

    /// Forget the access log (decoder state is kept).
    pub fn clear_log(&mut self) {
        self.control_writes.clear();
        self.data_reads.clear();
    }

    /// Encoder motion: adds `delta` to the count if the decoder is enabled.
    /// The count wraps at 24 bits like the hardware counter.
    pub fn pulse(&mut self, index: u8, delta: i32) {
        let ch = &mut self.channels[Self::slot(index)];
        if ch.enabled {
            ch.count = wrap24(ch.count.wrapping_add(delta));
        }
    }

    /// Overwrite the count (wrapped to 24 bits).
    pub fn set_count(&mut self, index: u8, count: i32) {
        self.channels[Self::slot(index)].count = wrap24(count);
    }

    /// Overwrite the count with raw register bytes `[low, mid, high]`.
    pub fn set_raw_count(&mut self, index: u8, bytes: [u8; 3]) {
        let [low, mid, high] = bytes;
        self.channels[Self::slot(index)].count = decode_count(low, mid, high);
    }

    /// Overwrite the rate, as if a sample interval just completed.
    pub fn set_rate(&mut self, index: u8, rate: i16) {
        self.channels[Self::slot(index)].rate = rate;
    }

    fn slot(index: u8) -> usize {
        (index & MAX_SELECT) as usize
    }

    fn apply_control(&mut self, word: ControlWord) {
        self.selected = word.channel();
        let ch = &mut self.channels[Self::slot(self.selected)];
        if word.enable() {
            ch.enabled = true;
            ch.sample_rate = word.sample_rate();
        } else if word.disable() {
            ch.enabled = false;
            ch.sample_rate = word.sample_rate();
        }
        if word.reset_requested() {
            ch.count = 0;
            ch.rate = 0;
        }
    }
}

fn wrap24(count: i32) -> i32 {
    let [low, mid, high] = encode_count(count);
    decode_count(low, mid, high)
}

impl RegisterBus for MockRegisters {
    fn write(&mut self, reg: Register, value: u8) {
        // Data registers are read-only; writes to them are dropped.
        if reg == Register::Control {
            self.control_writes.push(value);
            self.apply_control(ControlWord::from_bits(value));
        }
    }

    fn read(&mut self, reg: Register) -> u8 {
        let ch = self.channels[Self::slot(self.selected)];
        let [c0, c1, c2] = encode_count(ch.count);
        let [r0, r1] = ch.rate.to_le_bytes();
        if reg.is_data() {
            self.data_reads.push(reg);
        }
        match reg {
            Register::Control => self.last_control().unwrap_or(0),
            Register::Count0 => c0,
            Register::Count1 => c1,
            Register::Count2 => c2,
            Register::Rate0 => r0,
            Register::Rate1 => r1,
        }
    }
}

// ============================================================================
// Line Mock
// ============================================================================

/// Error returned by [`MockLines`] for the line it was told to fail on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockLineError(pub u8);

/// Mock pin configurator.
///
/// Records every line placed into pass-through state.
///
/// # Example
///
/// ```rust
/// use fabric_quadrature::hal::{MockLineError, MockLines};
/// use fabric_quadrature::traits::LineConfig;
///
/// let mut lines = MockLines::failing_on(5);
/// lines.set_passthrough(4).unwrap();
/// assert_eq!(lines.set_passthrough(5), Err(MockLineError(5)));
/// assert_eq!(lines.configured, [4]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MockLines {
    /// Lines configured so far, in order.
    pub configured: Vec<u8>,
    fail_on: Option<u8>,
}

impl MockLines {
    /// Creates a configurator that accepts every line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configurator that rejects `line`.
    pub fn failing_on(line: u8) -> Self {
        Self {
            configured: Vec::new(),
            fail_on: Some(line),
        }
    }
}

impl LineConfig for MockLines {
    type Error = MockLineError;

    fn set_passthrough(&mut self, line: u8) -> Result<(), MockLineError> {
        if self.fail_on == Some(line) {
            return Err(MockLineError(line));
        }
        self.configured.push(line);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
