//! sysfs PCI scanner
//!
//! Reads `/sys/bus/pci/devices/*/{vendor,device,resource}`.

use crate::domain::{BaseRegion, PciAddress, PciDevice};
use crate::error::BusScanError;
use crate::pci::{BusScanner, PciSnapshot};

use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};

/// Default sysfs directory listing PCI devices
pub const DEFAULT_PCI_DEVICES: &str = "/sys/bus/pci/devices";

/// `IORESOURCE_MEM` flag in a sysfs `resource` line
const IORESOURCE_MEM: u64 = 0x0000_0200;

/// Scans the PCI bus through sysfs
#[derive(Debug, Clone)]
pub struct SysfsScanner {
    root: PathBuf,
}

impl SysfsScanner {
    /// Scanner for the system's sysfs tree
    pub fn new() -> Self {
        Self::with_root(DEFAULT_PCI_DEVICES)
    }

    /// Scanner rooted at an arbitrary directory laid out like sysfs
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn read_device(&self, name: &str, dir: &Path) -> Result<PciDevice, BusScanError> {
        let address: PciAddress = name.parse()?;
        let vendor_id = read_hex_u16(dir, name, "vendor")?;
        let device_id = read_hex_u16(dir, name, "device")?;

        // A missing resource file leaves the device without a region
        let bar0 = match fs::read_to_string(dir.join("resource")) {
            Ok(content) => parse_bar0(name, &content)?,
            Err(_) => None,
        };

        Ok(PciDevice {
            address,
            vendor_id,
            device_id,
            bar0,
        })
    }
}

impl Default for SysfsScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl BusScanner for SysfsScanner {
    fn scan(&self) -> Result<PciSnapshot, BusScanError> {
        let scan_failed = |source: io::Error| BusScanError::ScanFailed {
            path: self.root.display().to_string(),
            source,
        };

        let mut entries: Vec<(String, PathBuf)> = fs::read_dir(&self.root)
            .map_err(scan_failed)?
            .filter_map(entry_name)
            .collect();
        // read_dir order is unspecified; match lspci's address order
        entries.sort();

        let mut devices = Vec::with_capacity(entries.len());
        for (name, path) in entries {
            match self.read_device(&name, &path) {
                Ok(device) => devices.push(device),
                Err(e) => log::debug!("Skipping PCI entry {}: {}", name, e),
            }
        }

        log::debug!(
            "Found {} PCI device(s) under {}",
            devices.len(),
            self.root.display()
        );

        Ok(PciSnapshot::new(devices))
    }
}

/// Name and path of a directory entry, or `None` if it could not be read
fn entry_name(entry: io::Result<DirEntry>) -> Option<(String, PathBuf)> {
    match entry {
        Ok(e) => Some((e.file_name().to_string_lossy().to_string(), e.path())),
        Err(e) => {
            log::debug!("Skipping unreadable PCI entry: {}", e);
            None
        }
    }
}

fn read_hex_u16(dir: &Path, name: &str, attribute: &'static str) -> Result<u16, BusScanError> {
    let raw = fs::read_to_string(dir.join(attribute)).map_err(|_| BusScanError::Malformed {
        address: name.to_string(),
        attribute,
        value: String::new(),
    })?;

    parse_hex::<u16>(raw.trim()).ok_or_else(|| BusScanError::Malformed {
        address: name.to_string(),
        attribute,
        value: raw.trim().to_string(),
    })
}

fn parse_hex<T: TryFrom<u64>>(s: &str) -> Option<T> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16)
        .ok()
        .and_then(|v| T::try_from(v).ok())
}

/// Parse BAR0 from the first line of a sysfs `resource` file
///
/// Lines are `start end flags` in hex. I/O-port BARs and unassigned BARs
/// yield `None`.
fn parse_bar0(name: &str, content: &str) -> Result<Option<BaseRegion>, BusScanError> {
    let Some(line) = content.lines().next() else {
        return Ok(None);
    };

    let malformed = || BusScanError::Malformed {
        address: name.to_string(),
        attribute: "resource",
        value: line.to_string(),
    };

    let fields: Vec<u64> = line
        .split_whitespace()
        .map(parse_hex::<u64>)
        .collect::<Option<_>>()
        .ok_or_else(malformed)?;
    let &[start, end, flags] = fields.as_slice() else {
        return Err(malformed());
    };

    if flags & IORESOURCE_MEM == 0 {
        return Ok(None);
    }
    Ok(BaseRegion::from_bounds(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GPU_RESOURCE: &str = "0x00000000fb000000 0x00000000fbffffff 0x0000000000040200\n\
                                0x000000f000000000 0x000000f7ffffffff 0x000000000014220c\n";

    fn add_device(root: &Path, name: &str, vendor: &str, device: &str, resource: Option<&str>) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("vendor"), format!("{}\n", vendor)).unwrap();
        fs::write(dir.join("device"), format!("{}\n", device)).unwrap();
        if let Some(res) = resource {
            fs::write(dir.join("resource"), res).unwrap();
        }
    }

    #[test]
    fn test_scan_fake_sysfs() {
        let tmp = TempDir::new().unwrap();
        add_device(tmp.path(), "0000:01:00.0", "0x10de", "0x2204", Some(GPU_RESOURCE));
        add_device(
            tmp.path(),
            "0000:01:00.1",
            "0x10de",
            "0x1aef",
            Some("0x00000000fc080000 0x00000000fc083fff 0x0000000000040200\n"),
        );
        add_device(
            tmp.path(),
            "0000:00:00.0",
            "0x8086",
            "0x3e30",
            Some("0x0000000000000000 0x0000000000000000 0x0000000000000000\n"),
        );

        let snapshot = SysfsScanner::with_root(tmp.path()).scan().unwrap();
        assert_eq!(snapshot.len(), 3);

        let addrs: Vec<String> = snapshot.iter().map(|d| d.address.to_string()).collect();
        assert_eq!(addrs, ["0000:00:00.0", "0000:01:00.0", "0000:01:00.1"]);

        let gpu = &snapshot.devices()[1];
        assert_eq!(gpu.vendor_id, 0x10de);
        assert_eq!(gpu.device_id, 0x2204);
        assert_eq!(
            gpu.bar0,
            Some(BaseRegion {
                start: 0xfb00_0000,
                len: 0x0100_0000
            })
        );

        assert_eq!(snapshot.devices()[0].bar0, None);
    }

    #[test]
    fn test_scan_skips_malformed_entries() {
        let tmp = TempDir::new().unwrap();
        add_device(tmp.path(), "0000:01:00.0", "0x10de", "0x2204", Some(GPU_RESOURCE));
        add_device(tmp.path(), "0000:02:00.0", "garbage", "0x2204", None);
        fs::create_dir_all(tmp.path().join("not-a-device")).unwrap();

        let snapshot = SysfsScanner::with_root(tmp.path()).scan().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.devices()[0].address.bus, 1);
    }

    #[test]
    fn test_unreadable_entry_is_skipped() {
        let err = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(entry_name(Err(err)), None);

        let tmp = TempDir::new().unwrap();
        add_device(tmp.path(), "0000:01:00.0", "0x10de", "0x2204", Some(GPU_RESOURCE));
        let entry = fs::read_dir(tmp.path()).unwrap().next().unwrap();
        let (name, path) = entry_name(entry).unwrap();
        assert_eq!(name, "0000:01:00.0");
        assert_eq!(path, tmp.path().join("0000:01:00.0"));
    }

    #[test]
    fn test_scan_missing_root() {
        let result = SysfsScanner::with_root("/nonexistent/sys/bus/pci/devices").scan();
        assert!(matches!(result, Err(BusScanError::ScanFailed { .. })));
    }

    #[test]
    fn test_device_without_resource_has_no_region() {
        let tmp = TempDir::new().unwrap();
        add_device(tmp.path(), "0000:03:00.0", "0x10de", "0x2484", None);

        let snapshot = SysfsScanner::with_root(tmp.path()).scan().unwrap();
        assert_eq!(snapshot.devices()[0].bar0, None);
    }

    #[test]
    fn test_parse_bar0_io_port_region() {
        let line = "0x000000000000e000 0x000000000000e07f 0x0000000000040101\n";
        assert_eq!(parse_bar0("0000:00:1f.4", line).unwrap(), None);
    }

    #[test]
    fn test_parse_bar0_malformed() {
        assert!(parse_bar0("0000:01:00.0", "0xfb000000 0xfbffffff\n").is_err());
        assert!(parse_bar0("0000:01:00.0", "nope nope nope\n").is_err());
        assert_eq!(parse_bar0("0000:01:00.0", "").unwrap(), None);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex::<u16>("0x10de"), Some(0x10de));
        assert_eq!(parse_hex::<u16>("10DE"), Some(0x10de));
        assert_eq!(parse_hex::<u16>("0x1ffff"), None);
    }

    #[test]
    #[ignore = "Requires Linux sysfs"]
    fn test_scan_real_sysfs() {
        let snapshot = SysfsScanner::new().scan().unwrap();
        assert!(!snapshot.is_empty());
    }
}
