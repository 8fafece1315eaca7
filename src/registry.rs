//! Channel registry: the allocation authority for hardware decoder slots.
//!
//! The fabric provides a fixed number of decoders, wired to fixed pins. The
//! registry hands those slots out in creation order and never takes one back,
//! so a channel index is stable for the life of the program.
//!
//! # Example
//!
//! ```rust
//! use fabric_quadrature::registry::{ChannelRegistry, ChannelSettings, MAX_CHANNELS};
//!
//! let mut registry = ChannelRegistry::new();
//! let first = registry.allocate(ChannelSettings::default()).unwrap();
//! assert_eq!(first.raw(), 0);
//!
//! for _ in 1..MAX_CHANNELS {
//!     registry.allocate(ChannelSettings::default()).unwrap();
//! }
//! assert!(registry.is_exhausted());
//! assert!(registry.allocate(ChannelSettings::default()).is_none());
//! ```

use heapless::Vec;

/// Number of decoder channels built into the fabric.
pub const MAX_CHANNELS: usize = 6;

/// Index value held by a handle that failed allocation.
pub const INVALID_INDEX: u8 = 255;

// ============================================================================
// Channel Index
// ============================================================================

/// Hardware index of a decoder channel.
///
/// Either a slot in `0..MAX_CHANNELS` or [`INVALID`](Self::INVALID).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelIndex(u8);

impl ChannelIndex {
    /// Sentinel for a handle the registry could not serve.
    pub const INVALID: ChannelIndex = ChannelIndex(INVALID_INDEX);

    /// Wraps a raw index. Indices at or past [`MAX_CHANNELS`] are invalid.
    #[inline]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw index value.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// The index as a `usize`, for slot lookups.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// True if this index addresses a real decoder.
    #[inline]
    pub const fn is_valid(self) -> bool {
        (self.0 as usize) < MAX_CHANNELS
    }

    /// The two physical lines wired to this channel, counting from
    /// `first_line` (line 2 on the reference board).
    ///
    /// Returns `None` for an invalid index.
    ///
    /// # Examples
    ///
    /// ```
    /// use fabric_quadrature::ChannelIndex;
    ///
    /// assert_eq!(ChannelIndex::new(0).lines(2), Some((2, 3)));
    /// assert_eq!(ChannelIndex::new(5).lines(2), Some((12, 13)));
    /// assert_eq!(ChannelIndex::INVALID.lines(2), None);
    /// ```
    pub fn lines(self, first_line: u8) -> Option<(u8, u8)> {
        if !self.is_valid() {
            return None;
        }
        let a = first_line.checked_add(self.0.checked_mul(2)?)?;
        let b = a.checked_add(1)?;
        Some((a, b))
    }
}

impl Default for ChannelIndex {
    fn default() -> Self {
        Self::INVALID
    }
}

// ============================================================================
// Sample Rate
// ============================================================================

/// Length of the interval over which the fabric measures rate.
///
/// # Default
///
/// Defaults to [`Slow`](Self::Slow), the hardware's power-on setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleRate {
    /// 20 ms interval.
    Fast,
    /// 200 ms interval.
    #[default]
    Slow,
}

impl SampleRate {
    /// Interval length in milliseconds.
    #[inline]
    pub const fn interval_ms(&self) -> u32 {
        match self {
            SampleRate::Fast => 20,
            SampleRate::Slow => 200,
        }
    }

    /// Value of the rate-select bit in the control register.
    #[inline]
    pub const fn control_bit(&self) -> u8 {
        match self {
            SampleRate::Fast => 1,
            SampleRate::Slow => 0,
        }
    }

    /// Inverse of [`control_bit`](Self::control_bit); any non-zero bit is fast.
    #[inline]
    pub const fn from_control_bit(bit: u8) -> Self {
        if bit != 0 {
            SampleRate::Fast
        } else {
            SampleRate::Slow
        }
    }

    /// Returns the rate as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use fabric_quadrature::SampleRate;
    ///
    /// assert_eq!(SampleRate::Fast.as_str(), "fast");
    /// assert_eq!(SampleRate::Slow.as_str(), "slow");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SampleRate::Fast => "fast",
            SampleRate::Slow => "slow",
        }
    }

    /// Parse a sample rate from text.
    ///
    /// Accepts the names (`"fast"`, `"slow"`) or the interval with or
    /// without a unit (`"20ms"`, `"200"`). Input is trimmed and
    /// case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use fabric_quadrature::SampleRate;
    ///
    /// assert_eq!(SampleRate::from_text("fast"), Some(SampleRate::Fast));
    /// assert_eq!(SampleRate::from_text(" 20ms "), Some(SampleRate::Fast));
    /// assert_eq!(SampleRate::from_text("200"), Some(SampleRate::Slow));
    /// assert_eq!(SampleRate::from_text("SLOW"), Some(SampleRate::Slow));
    /// assert_eq!(SampleRate::from_text("50ms"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("fast") || s.eq_ignore_ascii_case("20ms") || s == "20" {
            Some(SampleRate::Fast)
        } else if s.eq_ignore_ascii_case("slow") || s.eq_ignore_ascii_case("200ms") || s == "200"
        {
            Some(SampleRate::Slow)
        } else {
            None
        }
    }
}

// ============================================================================
// Channel Settings
// ============================================================================

/// Software mirror of one channel's configuration.
///
/// This is the source of truth for every control-register write; the
/// hardware configuration is regenerated from it in full each time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSettings {
    /// Rate sampling interval.
    pub sample_rate: SampleRate,
    /// Whether the decoder is counting.
    pub enabled: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::Slow,
            enabled: true,
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Fixed-capacity arena of channel settings.
///
/// The number of stored records doubles as the creation counter: it only
/// grows and never exceeds [`MAX_CHANNELS`].
#[derive(Clone, Debug, Default)]
pub struct ChannelRegistry {
    slots: Vec<ChannelSettings, MAX_CHANNELS>,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Claims the next free index and stores `settings` for it.
    ///
    /// Returns `None` once every hardware channel has been handed out.
    pub fn allocate(&mut self, settings: ChannelSettings) -> Option<ChannelIndex> {
        let index = self.slots.len();
        self.slots.push(settings).ok()?;
        Some(ChannelIndex::new(index as u8))
    }

    /// Number of channels created so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True before the first allocation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Channels still available.
    #[inline]
    pub fn remaining(&self) -> usize {
        MAX_CHANNELS - self.slots.len()
    }

    /// True once no further allocation can succeed.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.slots.is_full()
    }

    /// Settings of an allocated channel.
    pub fn settings(&self, index: ChannelIndex) -> Option<&ChannelSettings> {
        self.slots.get(index.as_usize())
    }

    /// Mutable settings of an allocated channel.
    pub fn settings_mut(&mut self, index: ChannelIndex) -> Option<&mut ChannelSettings> {
        self.slots.get_mut(index.as_usize())
    }

    /// Iterates allocated channels in index order.
    pub fn iter(&self) -> impl Iterator<Item = (ChannelIndex, &ChannelSettings)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| (ChannelIndex::new(i as u8), s))
    }
}
