//! Unified error types for nvhot
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use crate::domain::{DeviceIdentity, RegisterKind};
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from the temperature session
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Some GPUs could not be sampled
    #[error("Failed to read temperatures for {failed} of {total} GPU(s)")]
    SampleFailed { failed: usize, total: usize },

    /// The interrupt handler could not be installed
    #[error("Failed to set signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    /// IO error (terminal output, file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from NVML wrapper operations
#[derive(Error, Debug)]
pub enum NvmlError {
    /// Failed to initialize NVML library
    #[error("Failed to initialize NVML: {0}")]
    InitializationFailed(String),

    /// NVML library not found
    #[error("NVML library not found. Is the NVIDIA driver installed?")]
    LibraryNotFound,

    /// Device not found at index
    #[error("GPU device not found at index {0}")]
    DeviceNotFound(u32),

    /// Operation not supported by this GPU
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Insufficient permissions
    #[error("Insufficient permissions: {0}. Try running with sudo.")]
    InsufficientPermissions(String),

    /// GPU is lost (fallen off bus, etc.)
    #[error("GPU is lost or has become inaccessible")]
    GpuLost,

    /// Unknown NVML error
    #[error("NVML error: {0}")]
    Unknown(String),
}

/// Errors from scanning the PCI bus
#[derive(Error, Debug)]
pub enum BusScanError {
    /// The device directory could not be listed
    #[error("Failed to scan PCI devices under {path}: {source}")]
    ScanFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A sysfs attribute could not be parsed
    #[error("Malformed PCI attribute {attribute} for {address}: {value:?}")]
    Malformed {
        address: String,
        attribute: &'static str,
        value: String,
    },
}

/// Errors from reading and decoding a hardware register
#[derive(Error, Debug)]
pub enum RegisterError {
    /// The memory device could not be opened
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The page containing the register could not be mapped
    #[error("Failed to map physical page {page:#x}: {source}")]
    Map {
        page: u64,
        #[source]
        source: std::io::Error,
    },

    /// Base address plus offset does not fit in the physical address space
    #[error("Register address overflows: base {base:#x} + offset {offset:#x}")]
    AddressOverflow { base: u64, offset: u32 },

    /// The register address is not 4-byte aligned
    #[error("Register address {address:#x} is not 4-byte aligned")]
    Misaligned { address: u64 },

    /// The device has no assigned base address region
    #[error("Device has no memory-mapped base address region")]
    NoBaseRegion,

    /// The register lies beyond the end of the device's region
    #[error("Register offset {offset:#x} lies outside a {len:#x}-byte region")]
    OutsideRegion { offset: u32, len: u64 },

    /// The decoded temperature failed the sanity ceiling
    #[error("Implausible reading {value}°C from raw register {raw:#010x}")]
    OutOfRange { raw: u32, value: u32 },
}

/// Errors from a temperature session
#[derive(Error, Debug)]
pub enum SessionError {
    /// The process may not read physical memory
    #[error("Insufficient privileges to read physical memory: {0}")]
    Privilege(String),

    /// Bus enumeration failed during initialization
    #[error("PCI bus enumeration failed: {0}")]
    BusScan(#[from] BusScanError),

    /// The management API could not be initialized
    #[error("Management API initialization failed: {0}")]
    FacadeInit(#[source] NvmlError),

    /// The management API reported no devices
    #[error("No NVIDIA GPUs detected")]
    NoDevices,

    /// A query named a device outside the discovered range
    #[error("GPU index {index} out of range (found {count} GPU(s))")]
    InvalidIndex { index: u32, count: u32 },

    /// The management API failed mid-query
    #[error("NVML query failed: {0}")]
    FacadeQuery(#[source] NvmlError),

    /// No bus device matched the identity reported by the management API
    #[error("No PCI device matches {0}")]
    Correlation(DeviceIdentity),

    /// Reading or decoding a register failed
    #[error("Failed to read {kind} register: {source}")]
    RegisterAccess {
        kind: RegisterKind,
        #[source]
        source: RegisterError,
    },

    /// The session has been closed
    #[error("Session is closed")]
    Closed,
}

impl SessionError {
    /// Whether this error ends the session's usefulness rather than a single query
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Privilege(_)
                | Self::BusScan(_)
                | Self::FacadeInit(_)
                | Self::NoDevices
                | Self::Closed
        )
    }
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
