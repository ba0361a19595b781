//! nvhot - NVIDIA GPU hotspot and VRAM temperature library
//!
//! NVML reports the core temperature of a GPU but not its junction
//! (hotspot) or memory temperatures on consumer cards. This library reads
//! those from undocumented registers in the GPU's BAR0 through `/dev/mem`,
//! after matching each NVML device to its PCI bus entry.
//!
//! # Modules
//!
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Domain models with validation
//! - [`error`]: Error types
//! - [`mem`]: Physical memory access
//! - [`nvml`]: NVML abstraction layer
//! - [`pci`]: PCI bus scanning and device correlation
//! - [`services`]: Temperature session and polling monitor

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod mem;
pub mod nvml;
pub mod pci;
pub mod services;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
pub use services::{Session, SystemSession};
