//! Memory-mapped register window
//!
//! Maps the controller's registers out of a device file: a UIO node, a PCIe
//! `resourceN` file, `/dev/mem`, or a plain file standing in for one. The
//! only unsafe code is the mapping itself and the volatile word accesses;
//! every access is alignment- and bounds-checked first.

use crate::backend::{check_access, BackendType, RegisterTransport};
use crate::config::I3cConfig;
use crate::error::{I3cError, Result};
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// Memory-mapped register window
///
/// `base` need not be page aligned: the mapping starts at the enclosing
/// page and accesses are shifted by the remainder.
#[derive(Debug)]
pub struct MmapRegion {
    /// Start of the mapping (page aligned)
    map: NonNull<u8>,
    /// Bytes mapped, including the leading page remainder
    map_len: usize,
    /// Distance from the mapping start to the window base
    skew: usize,
    /// Window size in bytes
    size: usize,
    _file: File,
    path: PathBuf,
    base: u64,
}

impl MmapRegion {
    /// Map `size` bytes of `path` starting at byte `base`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The file cannot be opened read/write
    /// - `size` is zero or not a multiple of 4, or `base` is not word aligned
    /// - A regular file is shorter than `base + size`
    /// - mmap fails
    pub fn new(path: impl AsRef<Path>, base: u64, size: usize) -> Result<Self> {
        let path = path.as_ref();

        if size == 0 || size % 4 != 0 {
            return Err(I3cError::map_failed(format!(
                "window size {size:#x} must be a non-zero multiple of 4"
            )));
        }
        if base % 4 != 0 {
            return Err(I3cError::map_failed(format!("base {base:#x} is not word aligned")));
        }

        tracing::debug!("Mapping {} @ {base:#x} (+{size:#x})", path.display());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| I3cError::map_failed(format!("Cannot open {}: {e}", path.display())))?;

        // Device nodes report a length of 0; only regular files can be checked.
        let meta = file.metadata()?;
        let end = base.saturating_add(size as u64);
        if meta.is_file() && meta.len() < end {
            return Err(I3cError::map_failed(format!(
                "{} is {:#x} bytes, window ends at {end:#x}",
                path.display(),
                meta.len()
            )));
        }

        let page = rustix::param::page_size() as u64;
        let page_base = base & !(page - 1);
        #[allow(clippy::cast_possible_truncation)] // remainder is below one page
        let skew = (base - page_base) as usize;
        let map_len = size + skew;

        // SAFETY: mmap is unsafe but all preconditions are validated:
        // - File descriptor is valid (just opened via OpenOptions)
        // - map_len is non-zero (size checked above)
        // - page_base is page aligned as mmap requires
        // - MAP_SHARED so stores reach the device rather than a private copy
        // - The file is stored in the struct, keeping the fd open for the mapping's lifetime
        // - Drop unmaps exactly (map, map_len)
        let map = unsafe {
            let addr = mmap(
                std::ptr::null_mut(),
                map_len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                page_base,
            )
            .map_err(|e| I3cError::map_failed(format!("mmap failed: {e}")))?;

            NonNull::new(addr.cast::<u8>())
                .ok_or_else(|| I3cError::map_failed("mmap returned a null mapping"))?
        };

        tracing::info!(
            "Mapped {} @ {base:#x}, {size:#x} bytes at {map:p}",
            path.display()
        );

        Ok(Self {
            map,
            map_len,
            skew,
            size,
            _file: file,
            path: path.to_path_buf(),
            base,
        })
    }

    /// Map the window described by `config`.
    ///
    /// # Errors
    ///
    /// See [`MmapRegion::new`].
    pub fn from_config(config: &I3cConfig) -> Result<Self> {
        Self::new(&config.device_path, config.base_address, config.window_size)
    }

    /// Window size in bytes
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Device file backing the mapping
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the window inside the device file
    #[must_use]
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// Pointer to the word at `offset`. Only dereference after `check_access`.
    #[allow(clippy::cast_ptr_alignment)]
    fn word_ptr(&self, offset: usize) -> *mut u32 {
        self.map.as_ptr().wrapping_add(self.skew + offset).cast::<u32>()
    }
}

impl RegisterTransport for MmapRegion {
    fn read32(&self, offset: usize) -> Result<u32> {
        check_access(offset, self.size)?;

        // SAFETY: Volatile read from the mapped register window.
        // - Bounds and 4-byte alignment of `offset` validated above
        // - base is word aligned (checked in new), so skew + offset is too
        // - skew + offset + 4 <= map_len, inside the live mapping
        // - read_volatile keeps the compiler from merging or eliding the load
        let value = unsafe { self.word_ptr(offset).read_volatile() };

        tracing::trace!("Read u32 @ {offset:#x} = {value:#x}");
        Ok(value)
    }

    fn write32(&mut self, offset: usize, value: u32) -> Result<()> {
        check_access(offset, self.size)?;

        tracing::trace!("Write u32 @ {offset:#x} = {value:#x}");

        // SAFETY: Volatile write to the mapped register window.
        // Same invariants as read32; write_volatile keeps the store in program order.
        unsafe {
            self.word_ptr(offset).write_volatile(value);
        }

        Ok(())
    }

    fn size(&self) -> usize {
        self.size
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Mmap
    }
}

impl Drop for MmapRegion {
    fn drop(&mut self) {
        tracing::debug!("Unmapping {} @ {:#x}", self.path.display(), self.base);

        // SAFETY: map and map_len are exactly what mmap returned and was given in new();
        // Drop runs once, so the region is still mapped here.
        unsafe {
            if let Err(e) = munmap(self.map.as_ptr().cast(), self.map_len) {
                tracing::error!("munmap failed during drop: {e}");
            }
        }
    }
}

// SAFETY: MmapRegion owns its mapping exclusively; moving it between threads does
// not invalidate the mapping, and the fd travels with it.
unsafe impl Send for MmapRegion {}

// SAFETY: Stores require &mut self, so the borrow checker serializes writers.
// Loads through &self are volatile single-word reads.
unsafe impl Sync for MmapRegion {}
