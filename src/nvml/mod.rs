//! NVML abstraction layer
//!
//! Provides trait-based abstractions over NVML for testability.

pub mod traits;
pub mod wrapper;

pub use traits::{GpuDevice, GpuManager};
pub use wrapper::{NvmlDevice, NvmlManager};
