//! Physical memory access
//!
//! Trait-based abstraction over the raw memory device so sessions can be
//! tested without root or hardware.

pub mod devmem;

pub use devmem::DevMem;

use crate::domain::RegisterRead;
use crate::error::{RegisterError, SessionError};

/// Reads 32-bit words from physical memory
pub trait PhysicalMemory {
    /// Verify once, up front, that this process may read physical memory
    fn check_access(&self) -> Result<(), SessionError>;

    /// Read the word at `base + offset`
    ///
    /// Nothing is cached between calls; every read maps and unmaps its page.
    fn read_u32(&self, base: u64, offset: u32) -> Result<RegisterRead, RegisterError>;
}
