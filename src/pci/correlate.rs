//! NVML-to-PCI correlation
//!
//! NVML and the PCI bus enumerate devices independently and in different
//! orders. A device is matched on its combined vendor/device id plus its
//! domain, bus and device number.

use crate::domain::{DeviceIdentity, PciDevice};
use crate::error::SessionError;
use crate::pci::PciSnapshot;

/// Find the bus device NVML describes with `identity`
///
/// Returns the first match in enumeration order. Duplicate matches are
/// not disambiguated.
pub fn locate<'a>(
    identity: &DeviceIdentity,
    snapshot: &'a PciSnapshot,
) -> Result<&'a PciDevice, SessionError> {
    let found = snapshot.iter().find(|dev| dev.matches(identity));

    match found {
        Some(dev) => {
            log::debug!("Matched {} to PCI device {}", identity, dev.address);
            Ok(dev)
        }
        None => Err(SessionError::Correlation(*identity)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BaseRegion, PciAddress, NVIDIA_VENDOR_ID};

    fn device(bus: u8, dev: u8, func: u8, vendor: u16, device_id: u16, bar: u64) -> PciDevice {
        PciDevice {
            address: PciAddress::new(0, bus, dev, func),
            vendor_id: vendor,
            device_id,
            bar0: BaseRegion::from_bounds(bar, bar + 0x00ff_ffff),
        }
    }

    /// Two GPUs, their audio functions, and a host bridge
    fn topology() -> Vec<PciDevice> {
        vec![
            device(0x00, 0x00, 0, 0x8086, 0x3e30, 0),
            device(0x01, 0x00, 0, NVIDIA_VENDOR_ID, 0x2204, 0xfb00_0000),
            device(0x01, 0x00, 1, NVIDIA_VENDOR_ID, 0x1aef, 0xfc08_0000),
            device(0x02, 0x00, 0, NVIDIA_VENDOR_ID, 0x2204, 0xf900_0000),
            device(0x02, 0x00, 1, NVIDIA_VENDOR_ID, 0x1aef, 0xfa08_0000),
        ]
    }

    #[test]
    fn test_locate_by_bus() {
        let snapshot = PciSnapshot::new(topology());

        let first = DeviceIdentity::new(0x2204_10DE, 0, 0x01, 0x00);
        let second = DeviceIdentity::new(0x2204_10DE, 0, 0x02, 0x00);

        assert_eq!(
            locate(&first, &snapshot).unwrap().bar0.unwrap().start,
            0xfb00_0000
        );
        assert_eq!(
            locate(&second, &snapshot).unwrap().bar0.unwrap().start,
            0xf900_0000
        );
    }

    #[test]
    fn test_locate_is_order_independent() {
        let key = DeviceIdentity::new(0x2204_10DE, 0, 0x02, 0x00);
        let mut devices = topology();

        for rotation in 0..devices.len() {
            devices.rotate_left(1);
            let mut reversed = devices.clone();
            reversed.reverse();

            for list in [devices.clone(), reversed] {
                let snapshot = PciSnapshot::new(list);
                let found = locate(&key, &snapshot).unwrap();
                assert!(found.matches(&key), "rotation {}", rotation);
                assert_eq!(found.address, PciAddress::new(0, 0x02, 0x00, 0));
            }
        }
    }

    #[test]
    fn test_locate_skips_sibling_function_with_other_id() {
        // The audio function shares bus/device but not the device id
        let snapshot = PciSnapshot::new(topology());
        let key = DeviceIdentity::new(0x2204_10DE, 0, 0x01, 0x00);
        assert_eq!(locate(&key, &snapshot).unwrap().address.function, 0);
    }

    #[test]
    fn test_locate_not_found() {
        let snapshot = PciSnapshot::new(topology());

        let cases = [
            DeviceIdentity::new(0x2206_10DE, 0, 0x01, 0x00),
            DeviceIdentity::new(0x2204_10DE, 1, 0x01, 0x00),
            DeviceIdentity::new(0x2204_10DE, 0, 0x03, 0x00),
            DeviceIdentity::new(0x2204_10DE, 0, 0x01, 0x01),
        ];

        for key in cases {
            assert!(matches!(
                locate(&key, &snapshot),
                Err(SessionError::Correlation(k)) if k == key
            ));
        }
    }

    #[test]
    fn test_locate_empty_snapshot() {
        let key = DeviceIdentity::new(0x2204_10DE, 0, 0x01, 0x00);
        assert!(locate(&key, &PciSnapshot::default()).is_err());
    }

    #[test]
    fn test_locate_duplicate_returns_first() {
        let mut devices = topology();
        let mut twin = devices[1].clone();
        twin.bar0 = BaseRegion::from_bounds(0xe000_0000, 0xe0ff_ffff);
        devices.push(twin);

        let snapshot = PciSnapshot::new(devices);
        let key = DeviceIdentity::new(0x2204_10DE, 0, 0x01, 0x00);
        assert_eq!(
            locate(&key, &snapshot).unwrap().bar0.unwrap().start,
            0xfb00_0000
        );
    }
}
