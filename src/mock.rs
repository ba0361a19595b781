//! Mock implementations for testing
//!
//! Provides mock NVML, bus scanner and physical memory for unit testing
//! without real hardware or root.

use crate::domain::{DeviceIdentity, PciDevice, RegisterRead, Temperature};
use crate::error::{BusScanError, NvmlError, RegisterError, SessionError};
use crate::mem::PhysicalMemory;
use crate::nvml::{GpuDevice, GpuManager};
use crate::pci::{BusScanner, PciSnapshot};

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock GPU as NVML would report it
#[derive(Debug, Clone)]
pub struct MockGpu {
    pub name: String,
    pub temperature: Temperature,
    pub identity: DeviceIdentity,
    pub fail_temperature: bool,
    pub fail_identity: bool,
}

impl MockGpu {
    /// Create a mock GPU with the given PCI identity and a 45°C core
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            name: "Mock GPU".to_string(),
            temperature: Temperature::new(45),
            identity,
            fail_temperature: false,
            fail_identity: false,
        }
    }

    /// Builder: set core temperature
    pub fn with_temperature(mut self, celsius: i32) -> Self {
        self.temperature = Temperature::new(celsius);
        self
    }

    /// Builder: set name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Mock device handle
#[derive(Debug)]
pub struct MockDevice<'a> {
    gpu: &'a MockGpu,
}

impl GpuDevice for MockDevice<'_> {
    fn name(&self) -> Result<String, NvmlError> {
        Ok(self.gpu.name.clone())
    }

    fn temperature(&self) -> Result<Temperature, NvmlError> {
        if self.gpu.fail_temperature {
            return Err(NvmlError::GpuLost);
        }
        Ok(self.gpu.temperature)
    }

    fn pci_identity(&self) -> Result<DeviceIdentity, NvmlError> {
        if self.gpu.fail_identity {
            return Err(NvmlError::NotSupported("PCI info".to_string()));
        }
        Ok(self.gpu.identity)
    }
}

/// Mock GPU manager
#[derive(Debug, Default)]
pub struct MockManager {
    gpus: Vec<MockGpu>,
    /// Overrides the reported device count when set
    reported_count: Option<u32>,
    /// Make `device_count` fail
    pub fail_count: bool,
    shutdowns: Arc<AtomicUsize>,
    lookups: Cell<usize>,
}

impl MockManager {
    /// Create a manager with the given GPUs
    pub fn new(gpus: Vec<MockGpu>) -> Self {
        Self {
            gpus,
            ..Self::default()
        }
    }

    /// Builder: report a device count that differs from the GPU list
    pub fn with_reported_count(mut self, count: u32) -> Self {
        self.reported_count = Some(count);
        self
    }

    /// Counter incremented every time a manager sharing it is shut down
    pub fn shutdown_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.shutdowns)
    }

    /// Number of device handle lookups so far
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl GpuManager for MockManager {
    type Device<'a> = MockDevice<'a>;

    fn device_count(&self) -> Result<u32, NvmlError> {
        if self.fail_count {
            return Err(NvmlError::GpuLost);
        }
        Ok(self.reported_count.unwrap_or(self.gpus.len() as u32))
    }

    fn device_by_index(&self, index: u32) -> Result<Self::Device<'_>, NvmlError> {
        self.lookups.set(self.lookups.get() + 1);
        self.gpus
            .get(index as usize)
            .map(|gpu| MockDevice { gpu })
            .ok_or(NvmlError::DeviceNotFound(index))
    }

    fn shutdown(self) -> Result<(), NvmlError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Bus scanner returning a fixed device list
#[derive(Debug, Default)]
pub struct StaticScanner {
    devices: Vec<PciDevice>,
    fail: bool,
}

impl StaticScanner {
    /// Scanner that reports exactly these devices
    pub fn new(devices: Vec<PciDevice>) -> Self {
        Self {
            devices,
            fail: false,
        }
    }

    /// Scanner whose scan always fails
    pub fn failing() -> Self {
        Self {
            devices: Vec::new(),
            fail: true,
        }
    }
}

impl BusScanner for StaticScanner {
    fn scan(&self) -> Result<PciSnapshot, BusScanError> {
        if self.fail {
            return Err(BusScanError::ScanFailed {
                path: "/mock".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        Ok(PciSnapshot::new(self.devices.clone()))
    }
}

/// Physical memory backed by a map of word addresses
#[derive(Debug, Default)]
pub struct MockMemory {
    words: HashMap<u64, u32>,
    denied: bool,
    reads: Cell<usize>,
}

impl MockMemory {
    /// Create an empty memory where every unset word reads as zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: place a word at a physical address
    pub fn with_word(mut self, address: u64, value: u32) -> Self {
        self.words.insert(address, value);
        self
    }

    /// Builder: fail the privilege check
    pub fn denied(mut self) -> Self {
        self.denied = true;
        self
    }

    /// Number of register reads so far
    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl PhysicalMemory for MockMemory {
    fn check_access(&self) -> Result<(), SessionError> {
        if self.denied {
            return Err(SessionError::Privilege("mock access denied".to_string()));
        }
        Ok(())
    }

    fn read_u32(&self, base: u64, offset: u32) -> Result<RegisterRead, RegisterError> {
        self.reads.set(self.reads.get() + 1);
        let address = base
            .checked_add(u64::from(offset))
            .ok_or(RegisterError::AddressOverflow { base, offset })?;
        let value = self.words.get(&address).copied().unwrap_or(0);
        Ok(RegisterRead { address, value })
    }
}
