//! Undocumented temperature registers
//!
//! Offsets and bit layouts of the two BAR0 registers that carry junction
//! and memory temperatures on GA10x-class GPUs. Other generations use
//! different layouts and are not supported.

use crate::domain::Temperature;
use crate::error::RegisterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoded readings at or above this value are treated as bad reads
pub const SANITY_CEILING_CELSIUS: u32 = 127;

/// A temperature register with a known location and encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterKind {
    /// Junction (hotspot) temperature
    Hotspot,
    /// Memory (VRAM) temperature
    Vram,
}

impl RegisterKind {
    /// Byte offset of the register from the start of BAR0
    pub const fn offset(self) -> u32 {
        match self {
            Self::Hotspot => 0x0002_046C,
            Self::Vram => 0x0000_E2A8,
        }
    }

    /// Extract the temperature field without the sanity check
    ///
    /// Hotspot: 8-bit field at bit 8, whole degrees.
    /// VRAM: low 12 bits in 1/32 degree units.
    pub const fn extract(self, raw: u32) -> u32 {
        match self {
            Self::Hotspot => (raw >> 8) & 0xFF,
            Self::Vram => (raw & 0x0FFF) / 32,
        }
    }

    /// Decode a raw register value into a temperature
    pub fn decode(self, raw: u32) -> Result<Temperature, RegisterError> {
        let value = self.extract(raw);
        if value >= SANITY_CEILING_CELSIUS {
            return Err(RegisterError::OutOfRange { raw, value });
        }
        Ok(Temperature::from(value))
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hotspot => write!(f, "hotspot"),
            Self::Vram => write!(f, "vram"),
        }
    }
}

/// A raw 32-bit word and the physical address it was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRead {
    pub address: u64,
    pub value: u32,
}

impl RegisterRead {
    /// Decode this read as the given register
    pub fn decode(&self, kind: RegisterKind) -> Result<Temperature, RegisterError> {
        let temp = kind.decode(self.value);
        if let Err(ref e) = temp {
            log::debug!("{} register at {:#x}: {}", kind, self.address, e);
        }
        temp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotspot_decode() {
        assert_eq!(
            RegisterKind::Hotspot.decode(0x0000_4A00).unwrap(),
            Temperature::new(74)
        );
        assert_eq!(
            RegisterKind::Hotspot.decode(0x0000_3200).unwrap(),
            Temperature::new(50)
        );
    }

    #[test]
    fn test_hotspot_ignores_other_bits() {
        assert_eq!(
            RegisterKind::Hotspot.decode(0xFFFF_32FF).unwrap(),
            Temperature::new(50)
        );
    }

    #[test]
    fn test_vram_decode() {
        assert_eq!(
            RegisterKind::Vram.decode(0x0000_0280).unwrap(),
            Temperature::new(20)
        );
        assert_eq!(
            RegisterKind::Vram.decode(0x0000_0140).unwrap(),
            Temperature::new(10)
        );
    }

    #[test]
    fn test_vram_truncates_fraction_and_high_bits() {
        // 0x29F / 32 = 20.97
        assert_eq!(
            RegisterKind::Vram.decode(0xABCD_F29F).unwrap(),
            Temperature::new(20)
        );
    }

    #[test]
    fn test_ceiling_rejects_hotspot() {
        assert!(matches!(
            RegisterKind::Hotspot.decode(0x0000_7F00),
            Err(RegisterError::OutOfRange { value: 127, .. })
        ));
        assert!(RegisterKind::Hotspot.decode(0x0000_FF00).is_err());
        assert!(RegisterKind::Hotspot.decode(0x0000_7E00).is_ok());
    }

    #[test]
    fn test_ceiling_rejects_vram() {
        // 127 * 32 = 0xFE0
        assert!(RegisterKind::Vram.decode(0x0000_0FE0).is_err());
        assert!(RegisterKind::Vram.decode(0x0000_0FFF).is_err());
        assert_eq!(
            RegisterKind::Vram.decode(0x0000_0FDF).unwrap(),
            Temperature::new(126)
        );
    }

    #[test]
    fn test_offsets() {
        assert_eq!(RegisterKind::Hotspot.offset(), 0x2046C);
        assert_eq!(RegisterKind::Vram.offset(), 0xE2A8);
    }

    #[test]
    fn test_register_read_decode() {
        let read = RegisterRead {
            address: 0xfb02_046c,
            value: 0x0000_3200,
        };
        assert_eq!(
            read.decode(RegisterKind::Hotspot).unwrap(),
            Temperature::new(50)
        );
    }
}
