//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod count;
pub mod read;
pub mod watch;

pub use count::run_count;
pub use read::run_read;
pub use watch::run_watch;

use crate::cli::output::{GpuTemperatures, TemperatureReport};
use crate::config::Config;
use crate::error::SessionError;
use crate::mem::PhysicalMemory;
use crate::nvml::GpuManager;
use crate::services::{SampleResult, Session, SystemSession};

/// Open a hardware session using the configured device paths
fn open_session(config: &Config) -> Result<SystemSession, SessionError> {
    SystemSession::with_paths(&config.paths.mem_device, &config.paths.pci_devices)
}

/// Turn a batch of session results into a printable report
fn build_report<M, P>(session: &Session<M, P>, batch: &[SampleResult]) -> TemperatureReport
where
    M: GpuManager,
    P: PhysicalMemory,
{
    let gpus = batch
        .iter()
        .map(|(index, result)| {
            let name = session.device_name(*index).ok();
            GpuTemperatures::from_result(*index, name, result)
        })
        .collect();

    TemperatureReport { gpus }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BaseRegion, DeviceIdentity, PciAddress, PciDevice};
    use crate::mock::{MockGpu, MockManager, MockMemory, StaticScanner};

    #[test]
    fn test_build_report() {
        let pci = PciDevice {
            address: PciAddress::new(0, 1, 0, 0),
            vendor_id: 0x10DE,
            device_id: 0x2204,
            bar0: BaseRegion::from_bounds(0xfb00_0000, 0xfbff_ffff),
        };
        let manager = MockManager::new(vec![
            MockGpu::new(DeviceIdentity::new(0x2204_10DE, 0, 1, 0)).with_name("RTX 3090"),
        ]);
        let memory = MockMemory::new()
            .with_word(0xfb02_046c, 0x0000_3200)
            .with_word(0xfb00_e2a8, 0x0000_0140);
        let session =
            Session::open(memory, &StaticScanner::new(vec![pci]), || Ok(manager)).unwrap();

        let batch = session.temperatures_all().unwrap();
        let report = build_report(&session, &batch);

        assert_eq!(report.gpus.len(), 1);
        assert_eq!(report.gpus[0].gpu_name.as_deref(), Some("RTX 3090"));
        assert_eq!(report.gpus[0].junction_temp, Some(50));
    }
}
