//! `/dev/mem` reader
//!
//! Maps the single page that holds a register, reads one word, and unmaps.

use crate::domain::RegisterRead;
use crate::error::{RegisterError, SessionError};
use crate::mem::PhysicalMemory;

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr;

/// Default raw physical memory device
pub const DEFAULT_MEM_DEVICE: &str = "/dev/mem";

/// Fallback when sysconf cannot report the page size
const FALLBACK_PAGE_SIZE: u64 = 4096;

/// Raw physical memory device reader
#[derive(Debug, Clone)]
pub struct DevMem {
    path: PathBuf,
    page_size: u64,
}

impl DevMem {
    /// Reader for `/dev/mem`
    pub fn new() -> Self {
        Self::with_path(DEFAULT_MEM_DEVICE)
    }

    /// Reader for an arbitrary memory device or file
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            page_size: system_page_size(),
        }
    }

    /// Path of the underlying device
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Page size used for mapping
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    fn open(&self) -> Result<File, RegisterError> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(&self.path)
            .map_err(|source| RegisterError::Open {
                path: self.path.display().to_string(),
                source,
            })
    }
}

impl Default for DevMem {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicalMemory for DevMem {
    fn check_access(&self) -> Result<(), SessionError> {
        // SAFETY: geteuid has no preconditions and cannot fail
        let euid = unsafe { libc::geteuid() };
        if euid != 0 {
            return Err(SessionError::Privilege(format!(
                "{} requires root (effective uid is {})",
                self.path.display(),
                euid
            )));
        }
        Ok(())
    }

    fn read_u32(&self, base: u64, offset: u32) -> Result<RegisterRead, RegisterError> {
        let address = base
            .checked_add(u64::from(offset))
            .ok_or(RegisterError::AddressOverflow { base, offset })?;
        if address % 4 != 0 {
            return Err(RegisterError::Misaligned { address });
        }

        let origin = page_origin(address, self.page_size);
        let in_page = (address - origin) as usize;

        let file = self.open()?;
        let page = PageMapping::map(&file, origin, self.page_size as usize)
            .map_err(|source| RegisterError::Map {
                page: origin,
                source,
            })?;
        let value = page.read_u32(in_page);

        log::debug!(
            "read {:#010x} from {:#x} (page {:#x} + {:#x})",
            value,
            address,
            origin,
            in_page
        );

        Ok(RegisterRead { address, value })
    }
}

/// Page-aligned origin of the page containing `address`
#[inline]
pub fn page_origin(address: u64, page_size: u64) -> u64 {
    address & !(page_size - 1)
}

fn system_page_size() -> u64 {
    // SAFETY: sysconf only reads a system constant
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as u64
    } else {
        FALLBACK_PAGE_SIZE
    }
}

/// A read-only shared mapping of one page, unmapped on drop
struct PageMapping {
    base: *mut libc::c_void,
    len: usize,
}

impl PageMapping {
    fn map(file: &File, origin: u64, len: usize) -> io::Result<Self> {
        let offset = libc::off_t::try_from(origin).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "page offset exceeds off_t")
        })?;

        // SAFETY: a fresh read-only mapping chosen by the kernel; the fd is
        // valid for the duration of the call and the mapping outlives it.
        let base = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                offset,
            )
        };
        if base == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self { base, len })
    }

    fn read_u32(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.len);
        // SAFETY: offset is in bounds and 4-byte aligned inside a
        // page-aligned mapping. Volatile keeps the MMIO read from being
        // elided or split.
        unsafe { ptr::read_volatile(self.base.cast::<u8>().add(offset).cast::<u32>()) }
    }
}

impl Drop for PageMapping {
    fn drop(&mut self) {
        // SAFETY: base/len are exactly what mmap returned
        let rc = unsafe { libc::munmap(self.base, self.len) };
        if rc != 0 {
            log::warn!("munmap failed: {}", io::Error::last_os_error());
        }
    }
}
