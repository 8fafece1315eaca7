//! Quadrature channel handle.
//!
//! A [`QuadratureChannel`] is the application's view of one hardware
//! decoder. It holds the channel index handed out by the fabric's registry
//! and turns each call into control-register writes and data-register reads.
//!
//! # Overview
//!
//! - A new channel starts enabled, sampling every 200 ms, with both of its
//!   input lines routed to the fabric
//! - Count is the signed pulse total since the last reset (24-bit hardware
//!   counter, sign-extended)
//! - Rate is the signed pulse total over the last completed sample interval
//!
//! # Example
//!
//! ```rust
//! use fabric_quadrature::{QuadratureFabric, SampleRate, hal::{MockLines, MockRegisters}};
//!
//! let fabric = QuadratureFabric::new(MockRegisters::new(), MockLines::new());
//! let wheel = fabric.claim().unwrap();
//!
//! // Simulate the encoder turning backwards
//! fabric.bus_mut().pulse(0, -40);
//! assert_eq!(wheel.read_count().unwrap(), -40);
//!
//! wheel.set_sample_rate(SampleRate::Fast).unwrap();
//! wheel.reset().unwrap();
//! assert_eq!(wheel.read_count().unwrap(), 0);
//! ```
//!
//! # Exhaustion
//!
//! [`QuadratureChannel::new`] never fails: once every hardware channel is
//! taken it returns a handle whose [`is_valid`](QuadratureChannel::is_valid)
//! is false, and every operation on it returns
//! [`QuadratureError::InvalidChannel`] without touching the registers.
//!
//! ```rust
//! use fabric_quadrature::{QuadratureChannel, QuadratureError, QuadratureFabric, MAX_CHANNELS};
//! use fabric_quadrature::hal::{MockLines, MockRegisters};
//!
//! let fabric = QuadratureFabric::new(MockRegisters::new(), MockLines::new());
//! let all: Vec<_> = (0..MAX_CHANNELS).map(|_| QuadratureChannel::new(&fabric)).collect();
//! assert!(all.iter().all(|ch| ch.is_valid()));
//!
//! let extra = QuadratureChannel::new(&fabric);
//! assert!(!extra.is_valid());
//! assert_eq!(extra.enable(), Err(QuadratureError::InvalidChannel));
//! ```

use crate::error::QuadratureError;
use crate::fabric::QuadratureFabric;
use crate::registry::{ChannelIndex, SampleRate};
use crate::traits::{Direction, LineConfig, RegisterBus};

/// Handle to one hardware quadrature decoder.
///
/// Borrows the [`QuadratureFabric`] it was claimed from. The index is fixed
/// for the handle's lifetime and never handed to another handle.
pub struct QuadratureChannel<'a, R, L> {
    fabric: &'a QuadratureFabric<R, L>,
    index: ChannelIndex,
}

impl<'a, R: RegisterBus, L: LineConfig> QuadratureChannel<'a, R, L> {
    /// Claim the next channel, yielding an invalid handle if none is left.
    ///
    /// A handle is also invalid if its input lines could not be configured;
    /// the index it was given stays consumed. Use [`try_new`](Self::try_new)
    /// or [`QuadratureFabric::claim`] to see why construction failed.
    pub fn new(fabric: &'a QuadratureFabric<R, L>) -> Self {
        Self::try_new(fabric).unwrap_or(Self {
            fabric,
            index: ChannelIndex::INVALID,
        })
    }

    /// Claim the next channel.
    ///
    /// Routes the channel's two input lines to the fabric, then writes its
    /// initial configuration.
    ///
    /// # Errors
    ///
    /// - [`QuadratureError::ResourceExhausted`] once all channels are claimed
    /// - [`QuadratureError::Line`] if an input line cannot be configured
    pub fn try_new(fabric: &'a QuadratureFabric<R, L>) -> Result<Self, QuadratureError<L::Error>> {
        let index = fabric
            .allocate()
            .ok_or(QuadratureError::ResourceExhausted)?;
        fabric.route_lines(index)?;
        fabric.sync(index)?;
        Ok(Self { fabric, index })
    }

    /// The hardware index, or [`ChannelIndex::INVALID`].
    #[inline]
    pub fn index(&self) -> ChannelIndex {
        self.index
    }

    /// True if this handle owns a hardware channel.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.index.is_valid()
    }

    /// The two input lines this channel owns.
    pub fn lines(&self) -> Option<(u8, u8)> {
        self.index.lines(self.fabric.config().first_line)
    }

    /// Stop counting. Count and rate hold their values.
    pub fn disable(&self) -> Result<(), QuadratureError<L::Error>> {
        let index = self.checked()?;
        self.fabric.update(index, |s| s.enabled = false)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("quadrature {}: disabled", index.raw());

        Ok(())
    }

    /// Resume counting.
    pub fn enable(&self) -> Result<(), QuadratureError<L::Error>> {
        let index = self.checked()?;
        self.fabric.update(index, |s| s.enabled = true)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("quadrature {}: enabled", index.raw());

        Ok(())
    }

    /// Zero the hardware count and rate.
    ///
    /// Enable state and sample rate are unchanged.
    pub fn reset(&self) -> Result<(), QuadratureError<L::Error>> {
        let index = self.checked()?;
        self.fabric.reset(index)
    }

    /// Select the rate sampling interval.
    ///
    /// Affects only subsequent [`read_rate`](Self::read_rate) results.
    pub fn set_sample_rate(&self, rate: SampleRate) -> Result<(), QuadratureError<L::Error>> {
        let index = self.checked()?;
        self.fabric.update(index, |s| s.sample_rate = rate)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("quadrature {}: sampling every {} ms", index.raw(), rate.interval_ms());

        Ok(())
    }

    /// Rate counts pulses per 20 ms.
    pub fn sample_20ms(&self) -> Result<(), QuadratureError<L::Error>> {
        self.set_sample_rate(SampleRate::Fast)
    }

    /// Rate counts pulses per 200 ms (the default).
    pub fn sample_200ms(&self) -> Result<(), QuadratureError<L::Error>> {
        self.set_sample_rate(SampleRate::Slow)
    }

    /// Whether the channel is counting. Reads the mirrored setting only.
    ///
    /// An invalid handle reports `false`.
    pub fn is_enabled(&self) -> bool {
        self.fabric
            .settings(self.index)
            .map(|s| s.enabled)
            .unwrap_or(false)
    }

    /// Current sample rate, from the mirrored setting.
    pub fn sample_rate(&self) -> Option<SampleRate> {
        self.fabric.settings(self.index).map(|s| s.sample_rate)
    }

    /// Signed pulse count since the last reset; negative is reverse.
    pub fn read_count(&self) -> Result<i32, QuadratureError<L::Error>> {
        let index = self.checked()?;
        self.fabric.read_count(index)
    }

    /// Signed pulses seen during the last completed sample interval.
    pub fn read_rate(&self) -> Result<i16, QuadratureError<L::Error>> {
        let index = self.checked()?;
        self.fabric.read_rate(index)
    }

    /// Snapshot of settings and readings.
    pub fn status(&self) -> Result<ChannelStatus, QuadratureError<L::Error>> {
        let index = self.checked()?;
        let settings = self
            .fabric
            .settings(index)
            .ok_or(QuadratureError::InvalidChannel)?;
        Ok(ChannelStatus {
            index,
            enabled: settings.enabled,
            sample_rate: settings.sample_rate,
            count: self.fabric.read_count(index)?,
            rate: self.fabric.read_rate(index)?,
        })
    }

    fn checked(&self) -> Result<ChannelIndex, QuadratureError<L::Error>> {
        if self.index.is_valid() {
            Ok(self.index)
        } else {
            Err(QuadratureError::InvalidChannel)
        }
    }
}

impl<R, L> core::fmt::Debug for QuadratureChannel<'_, R, L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QuadratureChannel")
            .field("index", &self.index)
            .finish()
    }
}

/// Point-in-time view of a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelStatus {
    /// Hardware index.
    pub index: ChannelIndex,
    /// Whether the decoder is counting.
    pub enabled: bool,
    /// Rate sampling interval.
    pub sample_rate: SampleRate,
    /// Pulses since last reset.
    pub count: i32,
    /// Pulses in the last sample interval.
    pub rate: i16,
}

impl ChannelStatus {
    /// Direction of the most recent interval's motion.
    pub fn direction(&self) -> Direction {
        Direction::from_pulses(self.rate as i32)
    }

    /// Rate normalized to pulses per second.
    ///
    /// # Examples
    ///
    /// ```
    /// use fabric_quadrature::{ChannelIndex, ChannelStatus, SampleRate};
    ///
    /// let status = ChannelStatus {
    ///     index: ChannelIndex::new(0),
    ///     enabled: true,
    ///     sample_rate: SampleRate::Fast,
    ///     count: 0,
    ///     rate: -4,
    /// };
    /// assert_eq!(status.pulses_per_second(), -200);
    /// ```
    pub fn pulses_per_second(&self) -> i32 {
        self.rate as i32 * 1000 / self.sample_rate.interval_ms() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockLines, MockRegisters};
    use crate::registers::{ControlWord, QEUP};
    use crate::registry::MAX_CHANNELS;

    type Fabric = QuadratureFabric<MockRegisters, MockLines>;

    fn fabric() -> Fabric {
        QuadratureFabric::new(MockRegisters::new(), MockLines::new())
    }

    fn exhaust(fabric: &Fabric) {
        for _ in 0..MAX_CHANNELS {
            // Handles are dropped; the indices stay claimed.
            fabric.claim().unwrap();
        }
    }

    // =========================================================================
    // Construction Tests
    // =========================================================================

    #[test]
    fn new_channel_defaults() {
        let fabric = fabric();
        let ch = fabric.claim().unwrap();
        assert!(ch.is_valid());
        assert!(ch.is_enabled());
        assert_eq!(ch.sample_rate(), Some(SampleRate::Slow));
        assert_eq!(ch.lines(), Some((2, 3)));
    }

    #[test]
    fn construction_routes_lines_then_syncs() {
        let fabric = fabric();
        fabric.claim().unwrap();
        fabric.claim().unwrap();

        assert_eq!(fabric.lines().configured, [2, 3, 4, 5]);
        assert_eq!(fabric.bus().control_writes, [0x80, 0x81]);
    }

    #[test]
    fn indices_follow_creation_order() {
        let fabric = fabric();
        for k in 0..MAX_CHANNELS {
            let ch = QuadratureChannel::new(&fabric);
            assert_eq!(ch.index().as_usize(), k);
        }
    }

    #[test]
    fn claim_after_exhaustion_fails() {
        let fabric = fabric();
        exhaust(&fabric);
        let err = fabric.claim().unwrap_err();
        assert_eq!(err, QuadratureError::ResourceExhausted);
        assert_eq!(fabric.claimed(), MAX_CHANNELS);
    }

    #[test]
    fn line_failure_consumes_index_and_invalidates() {
        let fabric = QuadratureFabric::new(MockRegisters::new(), MockLines::failing_on(3));
        let ch = QuadratureChannel::new(&fabric);
        assert!(!ch.is_valid());
        assert_eq!(fabric.claimed(), 1);
        assert!(fabric.bus().control_writes.is_empty());

        let next = fabric.claim().unwrap();
        assert_eq!(next.index().raw(), 1);
    }

    #[test]
    fn try_new_reports_line_error() {
        let fabric = QuadratureFabric::new(MockRegisters::new(), MockLines::failing_on(2));
        let err = QuadratureChannel::try_new(&fabric).unwrap_err();
        assert_eq!(err, QuadratureError::Line(crate::hal::MockLineError(2)));
    }

    // =========================================================================
    // Invalid Handle Tests
    // =========================================================================

    #[test]
    fn invalid_handle_fails_fast() {
        let fabric = fabric();
        exhaust(&fabric);
        let writes_before = fabric.bus().control_writes.len();

        let ch = QuadratureChannel::new(&fabric);
        assert_eq!(ch.index(), ChannelIndex::INVALID);
        assert_eq!(ch.enable(), Err(QuadratureError::InvalidChannel));
        assert_eq!(ch.disable(), Err(QuadratureError::InvalidChannel));
        assert_eq!(ch.reset(), Err(QuadratureError::InvalidChannel));
        assert_eq!(
            ch.set_sample_rate(SampleRate::Fast),
            Err(QuadratureError::InvalidChannel)
        );
        assert_eq!(ch.read_count(), Err(QuadratureError::InvalidChannel));
        assert_eq!(ch.read_rate(), Err(QuadratureError::InvalidChannel));
        assert_eq!(ch.status(), Err(QuadratureError::InvalidChannel));
        assert!(!ch.is_enabled());
        assert_eq!(ch.sample_rate(), None);
        assert_eq!(ch.lines(), None);

        assert_eq!(fabric.bus().control_writes.len(), writes_before);
    }

    // =========================================================================
    // State Transition Tests
    // =========================================================================

    #[test]
    fn enable_disable_idempotent() {
        let fabric = fabric();
        let ch = fabric.claim().unwrap();

        ch.disable().unwrap();
        ch.disable().unwrap();
        assert!(!ch.is_enabled());

        ch.enable().unwrap();
        ch.enable().unwrap();
        assert!(ch.is_enabled());

        assert_eq!(fabric.bus().control_writes, [0x80, 0x40, 0x40, 0x80, 0x80]);
    }

    #[test]
    fn sample_rate_changes_only_rate_bit() {
        let fabric = fabric();
        fabric.claim().unwrap();
        let ch = fabric.claim().unwrap();

        ch.set_sample_rate(SampleRate::Fast).unwrap();
        let fast = ControlWord::from_bits(fabric.bus().last_control().unwrap());
        ch.set_sample_rate(SampleRate::Slow).unwrap();
        let slow = ControlWord::from_bits(fabric.bus().last_control().unwrap());

        assert_eq!(fast.bits(), 0b1001_0001);
        assert_eq!(slow.bits(), 0b1000_0001);
        assert!(ch.is_enabled());
        assert_eq!(ch.sample_rate(), Some(SampleRate::Slow));
    }

    #[test]
    fn sample_shortcuts() {
        let fabric = fabric();
        let ch = fabric.claim().unwrap();
        ch.sample_20ms().unwrap();
        assert_eq!(ch.sample_rate(), Some(SampleRate::Fast));
        ch.sample_200ms().unwrap();
        assert_eq!(ch.sample_rate(), Some(SampleRate::Slow));
    }

    #[test]
    fn reset_keeps_settings_and_pulses_reset_bit() {
        let fabric = fabric();
        let ch = fabric.claim().unwrap();
        ch.disable().unwrap();
        ch.sample_20ms().unwrap();

        ch.reset().unwrap();

        let word = ControlWord::from_bits(fabric.bus().last_control().unwrap());
        assert_eq!(word.bits(), 0b0111_0000);
        assert!(word.reset_requested());
        assert!(!ch.is_enabled());
        assert_eq!(ch.sample_rate(), Some(SampleRate::Fast));

        // Only the reset write carries the reset bit.
        let with_reset = fabric
            .bus()
            .control_writes
            .iter()
            .filter(|w| *w & (1 << QEUP) != 0)
            .count();
        assert_eq!(with_reset, 1);
    }

    // =========================================================================
    // Reading Tests
    // =========================================================================

    #[test]
    fn read_count_sign_extends() {
        let fabric = fabric();
        let ch = fabric.claim().unwrap();

        fabric.bus_mut().set_raw_count(0, [0x00, 0x00, 0x80]);
        assert_eq!(ch.read_count().unwrap(), -8_388_608);

        fabric.bus_mut().set_raw_count(0, [0xFF, 0xFF, 0x7F]);
        assert_eq!(ch.read_count().unwrap(), 8_388_607);
    }

    #[test]
    fn read_rate_signed() {
        let fabric = fabric();
        let ch = fabric.claim().unwrap();
        fabric.bus_mut().set_rate(0, -321);
        assert_eq!(ch.read_rate().unwrap(), -321);
    }

    #[test]
    fn reads_address_own_channel() {
        let fabric = fabric();
        let a = fabric.claim().unwrap();
        let b = fabric.claim().unwrap();
        fabric.bus_mut().set_count(0, 11);
        fabric.bus_mut().set_count(1, -22);

        assert_eq!(b.read_count().unwrap(), -22);
        assert_eq!(a.read_count().unwrap(), 11);
        assert_eq!(b.read_count().unwrap(), -22);
    }

    #[test]
    fn status_snapshot() {
        let fabric = fabric();
        let ch = fabric.claim().unwrap();
        ch.sample_20ms().unwrap();
        fabric.bus_mut().pulse(0, 90);
        fabric.bus_mut().set_rate(0, 3);

        let status = ch.status().unwrap();
        assert_eq!(status.index, ChannelIndex::new(0));
        assert!(status.enabled);
        assert_eq!(status.sample_rate, SampleRate::Fast);
        assert_eq!(status.count, 90);
        assert_eq!(status.rate, 3);
        assert_eq!(status.direction(), Direction::Forward);
        assert_eq!(status.pulses_per_second(), 150);
    }

    #[test]
    fn status_pulses_per_second_slow() {
        let status = ChannelStatus {
            index: ChannelIndex::new(1),
            enabled: true,
            sample_rate: SampleRate::Slow,
            count: 0,
            rate: 10,
        };
        assert_eq!(status.pulses_per_second(), 50);
        assert_eq!(
            ChannelStatus { rate: 0, ..status }.direction(),
            Direction::Stopped
        );
    }

    #[test]
    fn debug_shows_index() {
        let fabric = fabric();
        let ch = fabric.claim().unwrap();
        assert_eq!(
            format!("{:?}", ch),
            "QuadratureChannel { index: ChannelIndex(0) }"
        );
    }
}
