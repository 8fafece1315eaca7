//! Hardware abstraction traits for the decoder register file and pin setup.
//!
//! The decoders live in FPGA fabric and are reached through a handful of
//! 8-bit registers. This module names those registers and defines the two
//! seams the driver talks through, so it runs both against real silicon and
//! against the desktop mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`RegisterBus`] | 8-bit reads and writes of the decoder registers |
//! | [`LineConfig`] | Places a physical line into the fabric pass-through state |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For hardware, use `hal::mmio::MmioRegisters`
//! (requires `mmio` feature) together with a board-specific [`LineConfig`].
//!
//! # Example
//!
//! ```rust
//! use fabric_quadrature::traits::{Register, RegisterBus};
//! use fabric_quadrature::hal::MockRegisters;
//!
//! let mut regs = MockRegisters::new();
//! regs.write(Register::Control, 0x03);
//! assert_eq!(regs.last_control(), Some(0x03));
//! assert_eq!(regs.read(Register::Count0), 0);
//! ```

/// The decoder registers, in the order the hardware map lays them out.
///
/// One instance of each register is shared by every channel; the channel
/// index written into [`Control`](Self::Control) decides which decoder the
/// count and rate registers expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Control/select register.
    Control,
    /// Count bits 7..0.
    Count0,
    /// Count bits 15..8.
    Count1,
    /// Count bits 23..16 (bit 7 is the sign).
    Count2,
    /// Rate bits 7..0.
    Rate0,
    /// Rate bits 15..8 (bit 7 is the sign).
    Rate1,
}

impl Register {
    /// All registers, control first.
    pub const ALL: [Register; 6] = [
        Register::Control,
        Register::Count0,
        Register::Count1,
        Register::Count2,
        Register::Rate0,
        Register::Rate1,
    ];

    /// Returns the register name as used in the hardware documentation.
    ///
    /// # Examples
    ///
    /// ```
    /// use fabric_quadrature::traits::Register;
    ///
    /// assert_eq!(Register::Control.as_str(), "QECR");
    /// assert_eq!(Register::Count2.as_str(), "QECNT2");
    /// assert_eq!(Register::Rate1.as_str(), "QERAT1");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Register::Control => "QECR",
            Register::Count0 => "QECNT0",
            Register::Count1 => "QECNT1",
            Register::Count2 => "QECNT2",
            Register::Rate0 => "QERAT0",
            Register::Rate1 => "QERAT1",
        }
    }

    /// Returns true for the read-only data registers.
    #[inline]
    pub const fn is_data(&self) -> bool {
        !matches!(self, Register::Control)
    }
}

/// Register access trait - abstracts the 8-bit decoder register file.
///
/// Hardware register access is synchronous and always completes, so the
/// methods are infallible. Implementations must not reorder or elide
/// accesses: a control write followed by data reads is the protocol.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use fabric_quadrature::traits::{Register, RegisterBus};
///
/// struct SpiBridge { /* bus handle */ }
///
/// impl RegisterBus for SpiBridge {
///     fn write(&mut self, reg: Register, value: u8) {
///         // Shift address + value out...
///     }
///
///     fn read(&mut self, reg: Register) -> u8 {
///         // Shift address out, value in...
///         0
///     }
/// }
/// ```
pub trait RegisterBus {
    /// Write one byte to a register.
    fn write(&mut self, reg: Register, value: u8);

    /// Read one byte from a register.
    fn read(&mut self, reg: Register) -> u8;
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn write(&mut self, reg: Register, value: u8) {
        (**self).write(reg, value)
    }

    fn read(&mut self, reg: Register) -> u8 {
        (**self).read(reg)
    }
}

/// Pin configuration trait.
///
/// The decoder inputs are wired from physical I/O lines straight into the
/// fabric. Before a channel is used, both of its lines must be put into the
/// pass-through input state so the encoder signals reach the decoder.
///
/// # Implementation Notes
///
/// - `line` is the board's digital line number (channel *i* uses `2 + 2i`
///   and `3 + 2i` by default)
/// - Return an error only if the line cannot be configured at all
pub trait LineConfig {
    /// Error type for line configuration.
    type Error;

    /// Place `line` into the pass-through input state.
    fn set_passthrough(&mut self, line: u8) -> Result<(), Self::Error>;
}

/// Direction of rotation reported by a channel.
///
/// Derived from the sign of a rate or count reading: positive values are
/// forward motion, negative values reverse.
///
/// # Default
///
/// Defaults to [`Stopped`](Self::Stopped).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Positive pulses.
    Forward,
    /// Negative pulses.
    Reverse,
    /// No pulses.
    #[default]
    Stopped,
}

impl Direction {
    /// Returns the direction as a lowercase string.
    ///
    /// # Examples
    ///
    /// ```
    /// use fabric_quadrature::Direction;
    ///
    /// assert_eq!(Direction::Forward.as_str(), "forward");
    /// assert_eq!(Direction::Reverse.as_str(), "reverse");
    /// assert_eq!(Direction::Stopped.as_str(), "stopped");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
            Direction::Stopped => "stopped",
        }
    }

    /// Direction implied by the sign of a signed pulse value.
    ///
    /// # Examples
    ///
    /// ```
    /// use fabric_quadrature::Direction;
    ///
    /// assert_eq!(Direction::from_pulses(12), Direction::Forward);
    /// assert_eq!(Direction::from_pulses(-3), Direction::Reverse);
    /// assert_eq!(Direction::from_pulses(0), Direction::Stopped);
    /// ```
    #[inline]
    pub fn from_pulses(pulses: i32) -> Self {
        match pulses.signum() {
            1 => Direction::Forward,
            -1 => Direction::Reverse,
            _ => Direction::Stopped,
        }
    }
}
