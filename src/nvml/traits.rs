//! Trait definitions for GPU management operations
//!
//! These traits abstract over NVML to enable testing with mocks.

use crate::domain::{DeviceIdentity, Temperature};
use crate::error::NvmlError;

/// Trait for the NVML queries a temperature session needs
///
/// Only the core temperature is available here; junction and memory
/// temperatures come from the PCI registers.
pub trait GpuDevice {
    /// Get the GPU name
    fn name(&self) -> Result<String, NvmlError>;

    /// Get current core temperature
    fn temperature(&self) -> Result<Temperature, NvmlError>;

    /// Get the PCI identity used to find this GPU on the bus
    fn pci_identity(&self) -> Result<DeviceIdentity, NvmlError>;
}

/// Trait for an initialized management API session
///
/// A value of this type is the session: creating it initializes the
/// library, and [`GpuManager::shutdown`] consumes it.
pub trait GpuManager {
    /// The device handle type returned by this manager
    type Device<'a>: GpuDevice
    where
        Self: 'a;

    /// Get the number of GPU devices
    fn device_count(&self) -> Result<u32, NvmlError>;

    /// Get a device handle by index
    fn device_by_index(&self, index: u32) -> Result<Self::Device<'_>, NvmlError>;

    /// Shut the management library down
    fn shutdown(self) -> Result<(), NvmlError>
    where
        Self: Sized;
}
