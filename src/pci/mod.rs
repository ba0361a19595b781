//! PCI bus enumeration and correlation
//!
//! The bus is scanned once into an immutable [`PciSnapshot`]; NVML devices
//! are then matched against it with [`locate`].

pub mod correlate;
pub mod scan;

pub use correlate::locate;
pub use scan::SysfsScanner;

use crate::domain::PciDevice;
use crate::error::BusScanError;

/// Produces a snapshot of the devices present on the PCI bus
pub trait BusScanner {
    /// Enumerate every device on the bus
    fn scan(&self) -> Result<PciSnapshot, BusScanError>;
}

/// Devices found by one bus scan, in enumeration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PciSnapshot {
    devices: Vec<PciDevice>,
}

impl PciSnapshot {
    /// Create a snapshot from already-enumerated devices
    pub fn new(devices: Vec<PciDevice>) -> Self {
        Self { devices }
    }

    /// Devices in enumeration order
    pub fn devices(&self) -> &[PciDevice] {
        &self.devices
    }

    /// Number of devices
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the scan found nothing
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PciDevice> {
        self.devices.iter()
    }
}

impl From<Vec<PciDevice>> for PciSnapshot {
    fn from(devices: Vec<PciDevice>) -> Self {
        Self::new(devices)
    }
}

impl<'a> IntoIterator for &'a PciSnapshot {
    type Item = &'a PciDevice;
    type IntoIter = std::slice::Iter<'a, PciDevice>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
