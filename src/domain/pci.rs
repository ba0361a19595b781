//! PCI domain types
//!
//! Identity and location types shared by the bus scanner, the NVML facade
//! and the correlator.

use crate::error::BusScanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// NVIDIA's PCI vendor id
pub const NVIDIA_VENDOR_ID: u16 = 0x10DE;

/// Pack a vendor id and device id the way NVML reports `pciDeviceId`
///
/// Device id occupies the high 16 bits, vendor id the low 16 bits.
#[inline]
pub const fn combined_id(vendor_id: u16, device_id: u16) -> u32 {
    ((device_id as u32) << 16) | vendor_id as u32
}

/// Location of a function on the PCI bus (`DDDD:BB:DD.F`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PciAddress {
    pub domain: u32,
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl PciAddress {
    /// Create a new address
    pub const fn new(domain: u32, bus: u8, device: u8, function: u8) -> Self {
        Self {
            domain,
            bus,
            device,
            function,
        }
    }
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.domain, self.bus, self.device, self.function
        )
    }
}

impl FromStr for PciAddress {
    type Err = BusScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || BusScanError::Malformed {
            address: s.to_string(),
            attribute: "address",
            value: s.to_string(),
        };

        let (domain, rest) = s.split_once(':').ok_or_else(malformed)?;
        let (bus, rest) = rest.split_once(':').ok_or_else(malformed)?;
        let (device, function) = rest.split_once('.').ok_or_else(malformed)?;

        Ok(Self {
            domain: u32::from_str_radix(domain, 16).map_err(|_| malformed())?,
            bus: u8::from_str_radix(bus, 16).map_err(|_| malformed())?,
            device: u8::from_str_radix(device, 16).map_err(|_| malformed())?,
            function: u8::from_str_radix(function, 16).map_err(|_| malformed())?,
        })
    }
}

/// A memory-mapped base address region advertised by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRegion {
    /// Physical start address
    pub start: u64,
    /// Length in bytes
    pub len: u64,
}

impl BaseRegion {
    /// Create a region from its inclusive start and end addresses
    pub fn from_bounds(start: u64, end: u64) -> Option<Self> {
        if start == 0 || end < start {
            return None;
        }
        Some(Self {
            start,
            len: end - start + 1,
        })
    }

    /// Whether a 32-bit register at `offset` fits inside the region
    pub fn contains_word(&self, offset: u32) -> bool {
        u64::from(offset) + 4 <= self.len
    }
}

/// One device found on the PCI bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciDevice {
    pub address: PciAddress,
    pub vendor_id: u16,
    pub device_id: u16,
    /// First base address region (BAR0), if assigned
    pub bar0: Option<BaseRegion>,
}

impl PciDevice {
    /// Vendor and device id packed as NVML reports them
    pub fn combined_id(&self) -> u32 {
        combined_id(self.vendor_id, self.device_id)
    }

    /// Whether this device is the one NVML describes with `identity`
    ///
    /// The function number is not compared.
    pub fn matches(&self, identity: &DeviceIdentity) -> bool {
        self.combined_id() == identity.combined_id
            && self.address.domain == identity.domain
            && u32::from(self.address.bus) == identity.bus
            && u32::from(self.address.device) == identity.device
    }
}

/// PCI identity of a GPU as reported by NVML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// `(device_id << 16) | vendor_id`
    pub combined_id: u32,
    pub domain: u32,
    pub bus: u32,
    pub device: u32,
}

impl DeviceIdentity {
    /// Create a new identity key
    pub fn new(combined_id: u32, domain: u32, bus: u32, device: u32) -> Self {
        Self {
            combined_id,
            domain,
            bus,
            device,
        }
    }

    /// Vendor id half of the combined id
    pub fn vendor_id(&self) -> u16 {
        (self.combined_id & 0xFFFF) as u16
    }

    /// Device id half of the combined id
    pub fn device_id(&self) -> u16 {
        (self.combined_id >> 16) as u16
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x} at {:04x}:{:02x}:{:02x}",
            self.vendor_id(),
            self.device_id(),
            self.domain,
            self.bus,
            self.device
        )
    }
}
