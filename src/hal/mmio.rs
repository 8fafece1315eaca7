//! Memory-mapped register access for the decoder fabric.
//!
//! On the target the decoder registers appear as plain bytes in the data
//! address space. [`MmioRegisters`] reaches them with volatile reads and
//! writes so the compiler never merges, reorders or drops an access.
//!
//! # Example
//!
//! ```rust,ignore
//! use fabric_quadrature::QuadratureFabric;
//! use fabric_quadrature::config::RegisterMap;
//! use fabric_quadrature::hal::MmioRegisters;
//!
//! // SAFETY: the decoder registers live at their documented addresses on
//! // this board and nothing else touches them.
//! let regs = unsafe { MmioRegisters::new(RegisterMap::default()) };
//! let fabric = QuadratureFabric::new(regs, BoardPins::take());
//! let left = fabric.claim()?;
//! ```

use core::ptr::{read_volatile, write_volatile};

use crate::config::RegisterMap;
use crate::traits::{Register, RegisterBus};

/// Volatile access to the decoder register file.
#[derive(Debug)]
pub struct MmioRegisters {
    map: RegisterMap,
}

impl MmioRegisters {
    /// Wraps the registers at the addresses in `map`.
    ///
    /// # Safety
    ///
    /// Every address in `map` must be a valid, byte-accessible decoder
    /// register for the life of the returned value, and no other code may
    /// access those registers concurrently.
    pub unsafe fn new(map: RegisterMap) -> Self {
        Self { map }
    }

    /// The addresses in use.
    pub fn map(&self) -> &RegisterMap {
        &self.map
    }
}

impl RegisterBus for MmioRegisters {
    #[inline]
    fn write(&mut self, reg: Register, value: u8) {
        let ptr = self.map.address(reg) as *mut u8;
        // SAFETY: guaranteed by the contract of `MmioRegisters::new`.
        unsafe { write_volatile(ptr, value) }
    }

    #[inline]
    fn read(&mut self, reg: Register) -> u8 {
        let ptr = self.map.address(reg) as *const u8;
        // SAFETY: guaranteed by the contract of `MmioRegisters::new`.
        unsafe { read_volatile(ptr) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backs a register map with an ordinary byte array.
    fn backed_map(mem: &mut [u8; 8]) -> RegisterMap {
        let base = mem.as_mut_ptr() as usize;
        RegisterMap::default()
            .with_control(base)
            .with_count([base + 2, base + 3, base + 4])
            .with_rate([base + 6, base + 7])
    }

    #[test]
    fn mmio_writes_land_at_mapped_address() {
        let mut mem = [0u8; 8];
        let map = backed_map(&mut mem);
        // SAFETY: every mapped address is inside `mem`, which outlives `regs`.
        let mut regs = unsafe { MmioRegisters::new(map) };
        regs.write(Register::Control, 0x93);
        drop(regs);
        assert_eq!(mem[0], 0x93);
    }

    #[test]
    fn mmio_reads_mapped_bytes() {
        let mut mem = [0, 0, 0x11, 0x22, 0x33, 0, 0x44, 0x55];
        let map = backed_map(&mut mem);
        // SAFETY: every mapped address is inside `mem`, which outlives `regs`.
        let mut regs = unsafe { MmioRegisters::new(map) };
        assert_eq!(regs.read(Register::Count0), 0x11);
        assert_eq!(regs.read(Register::Count1), 0x22);
        assert_eq!(regs.read(Register::Count2), 0x33);
        assert_eq!(regs.read(Register::Rate0), 0x44);
        assert_eq!(regs.read(Register::Rate1), 0x55);
    }
}
