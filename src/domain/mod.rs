//! Domain models for nvhot
//!
//! This module contains the value types shared across layers.
//! Types are validated on construction (fail-fast pattern).

pub mod pci;
pub mod register;
pub mod thermal;

pub use pci::{combined_id, BaseRegion, DeviceIdentity, PciAddress, PciDevice, NVIDIA_VENDOR_ID};
pub use register::{RegisterKind, RegisterRead, SANITY_CEILING_CELSIUS};
pub use thermal::{Temperature, TemperatureSample};
