//! Temperature session
//!
//! Owns the PCI snapshot and the NVML session for the lifetime of a
//! monitoring run and answers "temperatures for GPU N" queries.
//!
//! The session performs no locking. A multi-threaded caller must wrap it
//! in a `Mutex` so only one query runs at a time.

use crate::domain::{PciDevice, RegisterKind, Temperature, TemperatureSample};
use crate::error::{NvmlError, RegisterError, SessionError};
use crate::mem::{DevMem, PhysicalMemory};
use crate::nvml::{GpuDevice, GpuManager, NvmlManager};
use crate::pci::{locate, BusScanner, PciSnapshot, SysfsScanner};

use std::path::Path;

/// Lifecycle of a session
///
/// There is no uninitialized state: a session only exists once
/// [`Session::open`] has started initializing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Acquiring privileges, the bus snapshot and the NVML session
    Initializing,
    /// Accepting queries
    Ready,
    /// Torn down; terminal
    Closed,
}

/// A session on the real hardware
pub type SystemSession = Session<NvmlManager, DevMem>;

/// Correlates NVML devices with PCI registers to read all GPU temperatures
pub struct Session<M: GpuManager, P: PhysicalMemory> {
    state: SessionState,
    memory: P,
    snapshot: Option<PciSnapshot>,
    manager: Option<M>,
    device_count: u32,
}

impl SystemSession {
    /// Open a session on `/dev/mem`, sysfs and NVML
    pub fn system() -> Result<Self, SessionError> {
        Session::open(DevMem::new(), &SysfsScanner::new(), NvmlManager::new)
    }

    /// Open a session with explicit memory device and sysfs paths
    pub fn with_paths(mem_device: &Path, pci_devices: &Path) -> Result<Self, SessionError> {
        Session::open(
            DevMem::with_path(mem_device),
            &SysfsScanner::with_root(pci_devices),
            NvmlManager::new,
        )
    }
}

impl<M: GpuManager, P: PhysicalMemory> Session<M, P> {
    /// Initialize a session
    ///
    /// Steps run in order: privilege check, bus scan, management API
    /// initialization, device count. On any failure everything acquired so
    /// far is released and the error is returned.
    pub fn open<S, F>(memory: P, scanner: &S, open_manager: F) -> Result<Self, SessionError>
    where
        S: BusScanner + ?Sized,
        F: FnOnce() -> Result<M, NvmlError>,
    {
        let mut session = Self {
            state: SessionState::Initializing,
            memory,
            snapshot: None,
            manager: None,
            device_count: 0,
        };

        match session.initialize(scanner, open_manager) {
            Ok(()) => {
                session.state = SessionState::Ready;
                log::info!("Session ready with {} GPU(s)", session.device_count);
                Ok(session)
            }
            Err(e) => {
                log::info!("Session initialization failed: {}", e);
                session.close();
                Err(e)
            }
        }
    }

    fn initialize<S, F>(&mut self, scanner: &S, open_manager: F) -> Result<(), SessionError>
    where
        S: BusScanner + ?Sized,
        F: FnOnce() -> Result<M, NvmlError>,
    {
        self.memory.check_access()?;

        let snapshot = scanner.scan()?;
        log::debug!("PCI snapshot holds {} device(s)", snapshot.len());
        self.snapshot = Some(snapshot);

        let manager = self
            .manager
            .insert(open_manager().map_err(SessionError::FacadeInit)?);

        let count = manager.device_count().map_err(SessionError::FacadeInit)?;
        if count == 0 {
            return Err(SessionError::NoDevices);
        }
        self.device_count = count;

        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of GPUs discovered at initialization
    pub fn device_count(&self) -> Result<u32, SessionError> {
        self.ready()?;
        Ok(self.device_count)
    }

    /// Name NVML reports for a GPU
    pub fn device_name(&self, index: u32) -> Result<String, SessionError> {
        let (manager, _) = self.ready()?;
        self.check_index(index)?;
        manager
            .device_by_index(index)
            .and_then(|device| device.name())
            .map_err(SessionError::FacadeQuery)
    }

    /// Read core, junction and memory temperatures for one GPU
    ///
    /// Either all three temperatures are returned or an error is; there is
    /// no partial result.
    pub fn temperatures(&self, index: u32) -> Result<TemperatureSample, SessionError> {
        let (manager, snapshot) = self.ready()?;
        self.check_index(index)?;

        let device = manager
            .device_by_index(index)
            .map_err(SessionError::FacadeQuery)?;
        let core = device.temperature().map_err(SessionError::FacadeQuery)?;
        let identity = device.pci_identity().map_err(SessionError::FacadeQuery)?;

        let pci = locate(&identity, snapshot)?;

        let junction = self.read_register(pci, RegisterKind::Hotspot)?;
        let vram = self.read_register(pci, RegisterKind::Vram)?;

        Ok(TemperatureSample::new(core, junction, vram))
    }

    /// Read temperatures for every GPU, one result per index
    pub fn temperatures_all(
        &self,
    ) -> Result<Vec<(u32, Result<TemperatureSample, SessionError>)>, SessionError> {
        let count = self.device_count()?;
        Ok((0..count).map(|i| (i, self.temperatures(i))).collect())
    }

    /// Release the NVML session and the PCI snapshot
    ///
    /// Safe to call more than once and on sessions that never became ready.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }

        if let Some(manager) = self.manager.take() {
            if let Err(e) = manager.shutdown() {
                log::warn!("NVML shutdown failed: {}", e);
            }
        }
        self.snapshot = None;
        self.device_count = 0;
        self.state = SessionState::Closed;
        log::debug!("Session closed");
    }

    fn ready(&self) -> Result<(&M, &PciSnapshot), SessionError> {
        match (self.state, &self.manager, &self.snapshot) {
            (SessionState::Ready, Some(manager), Some(snapshot)) => Ok((manager, snapshot)),
            _ => Err(SessionError::Closed),
        }
    }

    fn check_index(&self, index: u32) -> Result<(), SessionError> {
        if index >= self.device_count {
            return Err(SessionError::InvalidIndex {
                index,
                count: self.device_count,
            });
        }
        Ok(())
    }

    fn read_register(
        &self,
        pci: &PciDevice,
        kind: RegisterKind,
    ) -> Result<Temperature, SessionError> {
        let read = || -> Result<Temperature, RegisterError> {
            let region = pci.bar0.ok_or(RegisterError::NoBaseRegion)?;
            if !region.contains_word(kind.offset()) {
                return Err(RegisterError::OutsideRegion {
                    offset: kind.offset(),
                    len: region.len,
                });
            }
            self.memory.read_u32(region.start, kind.offset())?.decode(kind)
        };

        read().map_err(|source| SessionError::RegisterAccess { kind, source })
    }
}

impl<M: GpuManager, P: PhysicalMemory> Drop for Session<M, P> {
    fn drop(&mut self) {
        self.close();
    }
}
