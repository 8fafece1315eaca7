//! Driver configuration: register addresses, pin origin and channel defaults.
//!
//! The defaults describe the reference board: decoder registers at
//! `0xE0..=0xE7` in data space and channel 0 on lines 2 and 3.
//!
//! # Example
//!
//! ```rust
//! use fabric_quadrature::config::{FabricConfig, RegisterMap};
//! use fabric_quadrature::SampleRate;
//!
//! // Use defaults
//! let config = FabricConfig::default();
//! assert_eq!(config.registers.control, 0xE0);
//!
//! // Or customize
//! let config = FabricConfig::default()
//!     .with_first_line(4)
//!     .with_sample_rate(SampleRate::Fast)
//!     .with_registers(RegisterMap::default().with_base(0x1000));
//! assert_eq!(config.registers.control, 0x10E0);
//! ```

use crate::registry::{ChannelSettings, SampleRate};
use crate::traits::Register;

// ============================================================================
// Register Map
// ============================================================================

/// Address of each decoder register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegisterMap {
    /// Control/select register (QECR).
    pub control: usize,
    /// Count bytes, low to high (QECNT0..2).
    pub count: [usize; 3],
    /// Rate bytes, low to high (QERAT0..1).
    pub rate: [usize; 2],
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            control: 0xE0,
            count: [0xE2, 0xE3, 0xE4],
            rate: [0xE6, 0xE7],
        }
    }
}

impl RegisterMap {
    /// Offset every address by `base` (for buses that map data space
    /// somewhere other than zero).
    pub fn with_base(mut self, base: usize) -> Self {
        self.control += base;
        for addr in self.count.iter_mut().chain(self.rate.iter_mut()) {
            *addr += base;
        }
        self
    }

    /// Set the control register address
    pub fn with_control(mut self, addr: usize) -> Self {
        self.control = addr;
        self
    }

    /// Set the count register addresses (low, mid, high)
    pub fn with_count(mut self, addrs: [usize; 3]) -> Self {
        self.count = addrs;
        self
    }

    /// Set the rate register addresses (low, high)
    pub fn with_rate(mut self, addrs: [usize; 2]) -> Self {
        self.rate = addrs;
        self
    }

    /// Address of `reg`.
    pub fn address(&self, reg: Register) -> usize {
        match reg {
            Register::Control => self.control,
            Register::Count0 => self.count[0],
            Register::Count1 => self.count[1],
            Register::Count2 => self.count[2],
            Register::Rate0 => self.rate[0],
            Register::Rate1 => self.rate[1],
        }
    }
}

// ============================================================================
// Fabric Config
// ============================================================================

/// Complete driver configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FabricConfig {
    /// Register addresses
    pub registers: RegisterMap,
    /// Line wired to channel 0's first input; channel *i* owns
    /// `first_line + 2i` and `first_line + 2i + 1`
    pub first_line: u8,
    /// Settings each new channel starts with
    pub channel_defaults: ChannelSettings,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            registers: RegisterMap::default(),
            first_line: 2,
            channel_defaults: ChannelSettings::default(),
        }
    }
}

impl FabricConfig {
    /// Set register addresses
    pub fn with_registers(mut self, registers: RegisterMap) -> Self {
        self.registers = registers;
        self
    }

    /// Set the first decoder input line
    pub fn with_first_line(mut self, line: u8) -> Self {
        self.first_line = line;
        self
    }

    /// Set the sample rate new channels start with
    pub fn with_sample_rate(mut self, rate: SampleRate) -> Self {
        self.channel_defaults.sample_rate = rate;
        self
    }

    /// Set whether new channels start enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.channel_defaults.enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // RegisterMap Tests
    // =========================================================================

    #[test]
    fn register_map_defaults() {
        let map = RegisterMap::default();
        assert_eq!(map.address(Register::Control), 0xE0);
        assert_eq!(map.address(Register::Count0), 0xE2);
        assert_eq!(map.address(Register::Count1), 0xE3);
        assert_eq!(map.address(Register::Count2), 0xE4);
        assert_eq!(map.address(Register::Rate0), 0xE6);
        assert_eq!(map.address(Register::Rate1), 0xE7);
    }

    #[test]
    fn register_map_with_base_offsets_all() {
        let map = RegisterMap::default().with_base(0x100);
        for reg in Register::ALL {
            assert_eq!(map.address(reg), RegisterMap::default().address(reg) + 0x100);
        }
    }

    #[test]
    fn register_map_builders() {
        let map = RegisterMap::default()
            .with_control(0x10)
            .with_count([0x11, 0x12, 0x13])
            .with_rate([0x14, 0x15]);
        assert_eq!(map.address(Register::Control), 0x10);
        assert_eq!(map.address(Register::Count2), 0x13);
        assert_eq!(map.address(Register::Rate1), 0x15);
    }

    // =========================================================================
    // FabricConfig Tests
    // =========================================================================

    #[test]
    fn fabric_config_defaults() {
        let config = FabricConfig::default();
        assert_eq!(config.first_line, 2);
        assert!(config.channel_defaults.enabled);
        assert_eq!(config.channel_defaults.sample_rate, SampleRate::Slow);
    }

    #[test]
    fn fabric_config_builders() {
        let config = FabricConfig::default()
            .with_first_line(8)
            .with_sample_rate(SampleRate::Fast)
            .with_enabled(false);
        assert_eq!(config.first_line, 8);
        assert_eq!(config.channel_defaults.sample_rate, SampleRate::Fast);
        assert!(!config.channel_defaults.enabled);
    }
}
