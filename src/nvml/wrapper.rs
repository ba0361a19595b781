//! NVML manager implementation
//!
//! Provides the main interface for NVML initialization and device discovery.

use crate::domain::{DeviceIdentity, Temperature};
use crate::error::NvmlError;
use crate::nvml::traits::{GpuDevice, GpuManager};

use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use nvml_wrapper::{Device, Nvml};

/// NVML manager for GPU discovery
pub struct NvmlManager {
    nvml: Nvml,
}

impl NvmlManager {
    /// Initialize NVML and create a new manager
    pub fn new() -> Result<Self, NvmlError> {
        let nvml = Nvml::init().map_err(|e| match e {
            nvml_wrapper::error::NvmlError::LibloadingError(_) => NvmlError::LibraryNotFound,
            nvml_wrapper::error::NvmlError::DriverNotLoaded => {
                NvmlError::InitializationFailed("NVIDIA driver not loaded".to_string())
            }
            nvml_wrapper::error::NvmlError::NoPermission => NvmlError::InsufficientPermissions(
                "Cannot open the NVIDIA device nodes".to_string(),
            ),
            other => NvmlError::InitializationFailed(other.to_string()),
        })?;

        log::debug!("NVML initialized");
        Ok(Self { nvml })
    }
}

impl GpuManager for NvmlManager {
    type Device<'a> = NvmlDevice<'a>;

    fn device_count(&self) -> Result<u32, NvmlError> {
        self.nvml.device_count().map_err(convert_error)
    }

    fn device_by_index(&self, index: u32) -> Result<Self::Device<'_>, NvmlError> {
        let device = self.nvml.device_by_index(index).map_err(|e| match e {
            nvml_wrapper::error::NvmlError::NotFound
            | nvml_wrapper::error::NvmlError::InvalidArg => NvmlError::DeviceNotFound(index),
            other => convert_error(other),
        })?;

        Ok(NvmlDevice { device })
    }

    fn shutdown(self) -> Result<(), NvmlError> {
        self.nvml.shutdown().map_err(convert_error)?;
        log::debug!("NVML shut down");
        Ok(())
    }
}

/// NVML device handle implementing GpuDevice
pub struct NvmlDevice<'a> {
    device: Device<'a>,
}

impl GpuDevice for NvmlDevice<'_> {
    fn name(&self) -> Result<String, NvmlError> {
        self.device.name().map_err(convert_error)
    }

    fn temperature(&self) -> Result<Temperature, NvmlError> {
        let temp = self
            .device
            .temperature(TemperatureSensor::Gpu)
            .map_err(convert_error)?;
        Ok(Temperature::from(temp))
    }

    fn pci_identity(&self) -> Result<DeviceIdentity, NvmlError> {
        let pci = self.device.pci_info().map_err(convert_error)?;
        Ok(DeviceIdentity::new(
            pci.pci_device_id,
            pci.domain,
            pci.bus,
            pci.device,
        ))
    }
}

/// Convert NVML error to our error type
fn convert_error(err: nvml_wrapper::error::NvmlError) -> NvmlError {
    use nvml_wrapper::error::NvmlError as NE;
    match err {
        NE::NotSupported => {
            NvmlError::NotSupported("Operation not supported by this GPU".to_string())
        }
        NE::NoPermission => {
            NvmlError::InsufficientPermissions("Insufficient permissions".to_string())
        }
        NE::GpuLost => NvmlError::GpuLost,
        _ => NvmlError::Unknown(err.to_string()),
    }
}
