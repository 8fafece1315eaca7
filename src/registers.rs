//! Control-register bit layout and data-register decoding.
//!
//! The control register is shared by all channels. A single byte write both
//! selects a channel (low nibble) and applies that channel's configuration
//! (high nibble):
//!
//! ```text
//!   bit   7       6        5       4          3..0
//!       +-------+--------+-------+----------+---------------+
//!       | QEEN  | QEDIS  | QEUP  | QERS     | channel index |
//!       +-------+--------+-------+----------+---------------+
//!        enable  disable  reset   1 = 20ms
//!                         pulse   0 = 200ms
//! ```
//!
//! The fabric wants both the enable bit and its complement on every
//! configuration write. A write with bits 7..4 clear is a pure select that
//! leaves the channel's configuration alone; reads use that form.
//!
//! # Example
//!
//! ```rust
//! use fabric_quadrature::registers::{ControlWord, decode_count, decode_rate};
//! use fabric_quadrature::{ChannelIndex, SampleRate};
//!
//! let word = ControlWord::configure(ChannelIndex::new(2), true, SampleRate::Fast);
//! assert_eq!(word.bits(), 0b1001_0010);
//!
//! assert_eq!(decode_count(0x00, 0x00, 0x80), -8_388_608);
//! assert_eq!(decode_rate(0xFF, 0xFF), -1);
//! ```

use crate::registry::{ChannelIndex, SampleRate};

/// Enable bit of the control register.
pub const QEEN: u8 = 7;
/// Disable bit of the control register.
pub const QEDIS: u8 = 6;
/// Count reset bit of the control register.
pub const QEUP: u8 = 5;
/// Sample rate select bit of the control register.
pub const QERS: u8 = 4;

/// Mask of the channel-select field.
pub const INDEX_MASK: u8 = 0x0F;

/// Largest channel index the select field can carry.
pub const MAX_SELECT: u8 = INDEX_MASK;

/// One encoded control-register byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlWord(u8);

impl ControlWord {
    /// Full configuration write for a channel.
    pub fn configure(index: ChannelIndex, enabled: bool, rate: SampleRate) -> Self {
        Self::build(index, enabled, false, rate)
    }

    /// Configuration write with the one-shot counter reset asserted.
    pub fn reset(index: ChannelIndex, enabled: bool, rate: SampleRate) -> Self {
        Self::build(index, enabled, true, rate)
    }

    /// Bare channel select, used ahead of count/rate reads.
    pub fn select(index: ChannelIndex) -> Self {
        Self(index.raw() & INDEX_MASK)
    }

    fn build(index: ChannelIndex, enabled: bool, reset: bool, rate: SampleRate) -> Self {
        let bits = ((enabled as u8) << QEEN)
            | ((!enabled as u8) << QEDIS)
            | ((reset as u8) << QEUP)
            | (rate.control_bit() << QERS)
            | (index.raw() & INDEX_MASK);
        Self(bits)
    }

    /// Wraps a raw byte, e.g. one captured from the bus.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// The byte written to the register.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Channel field (bits 3..0).
    #[inline]
    pub const fn channel(self) -> u8 {
        self.0 & INDEX_MASK
    }

    /// Enable bit.
    #[inline]
    pub const fn enable(self) -> bool {
        self.0 & (1 << QEEN) != 0
    }

    /// Disable bit.
    #[inline]
    pub const fn disable(self) -> bool {
        self.0 & (1 << QEDIS) != 0
    }

    /// Counter reset bit.
    #[inline]
    pub const fn reset_requested(self) -> bool {
        self.0 & (1 << QEUP) != 0
    }

    /// Sample-rate selector as written.
    #[inline]
    pub fn sample_rate(self) -> SampleRate {
        SampleRate::from_control_bit((self.0 >> QERS) & 1)
    }

    /// True when the write carries configuration rather than a bare select.
    #[inline]
    pub const fn is_select_only(self) -> bool {
        self.0 & !INDEX_MASK == 0
    }
}

impl From<ControlWord> for u8 {
    fn from(word: ControlWord) -> u8 {
        word.0
    }
}

/// Combines the three count bytes into a signed 32-bit count.
///
/// The hardware count is 24-bit two's-complement; bit 7 of `high` is the sign
/// and is extended through the top byte.
#[inline]
pub fn decode_count(low: u8, mid: u8, high: u8) -> i32 {
    let top = if high & 0x80 != 0 { 0xFF } else { 0x00 };
    i32::from_le_bytes([low, mid, high, top])
}

/// Combines the two rate bytes into a signed 16-bit rate.
#[inline]
pub fn decode_rate(low: u8, high: u8) -> i16 {
    i16::from_le_bytes([low, high])
}

/// Splits a count into the three bytes the hardware would present.
///
/// Values outside the 24-bit range wrap, as the hardware counter does.
#[inline]
pub fn encode_count(count: i32) -> [u8; 3] {
    let [low, mid, high, _] = count.to_le_bytes();
    [low, mid, high]
}
