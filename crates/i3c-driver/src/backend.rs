//! Register transport abstraction
//!
//! A transport performs exactly one aligned 32-bit load or store per call at
//! a byte offset inside the controller's register window. It never retries
//! and never reads back: a store to a read-only bit simply has no effect.

use crate::config::I3cConfig;
use crate::error::{I3cError, Result};
use std::fmt::Debug;

/// Bytes moved by one transport access.
pub const ACCESS_BYTES: usize = 4;

/// Aligned 32-bit load/store primitive over a register window.
pub trait RegisterTransport: Debug + Send + Sync {
    /// Load the word at `offset`.
    ///
    /// # Errors
    ///
    /// Returns error if `offset` is misaligned or outside the window.
    fn read32(&self, offset: usize) -> Result<u32>;

    /// Store `value` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns error if `offset` is misaligned or outside the window.
    fn write32(&mut self, offset: usize, value: u32) -> Result<()>;

    /// Window size in bytes.
    fn size(&self) -> usize;

    /// Backend type for debugging
    fn backend_type(&self) -> BackendType;
}

impl<T: RegisterTransport + ?Sized> RegisterTransport for Box<T> {
    fn read32(&self, offset: usize) -> Result<u32> {
        (**self).read32(offset)
    }

    fn write32(&mut self, offset: usize, value: u32) -> Result<()> {
        (**self).write32(offset, value)
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn backend_type(&self) -> BackendType {
        (**self).backend_type()
    }
}

/// Validate a single word access against a window of `limit` bytes.
///
/// # Errors
///
/// `Misaligned` if `offset` is not a multiple of 4, `OutOfBounds` if the
/// word does not fit inside the window.
pub fn check_access(offset: usize, limit: usize) -> Result<()> {
    if offset % ACCESS_BYTES != 0 {
        return Err(I3cError::misaligned(offset));
    }
    match offset.checked_add(ACCESS_BYTES) {
        Some(end) if end <= limit => Ok(()),
        _ => Err(I3cError::out_of_bounds(offset, limit)),
    }
}

/// Backend type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Memory-mapped device file (`/dev/uio*`, `/dev/mem`, or a plain file)
    Mmap,

    /// In-memory controller model, no hardware required
    Software,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mmap => write!(f, "mmap"),
            Self::Software => write!(f, "Software (model)"),
        }
    }
}

/// Backend selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSelection {
    /// Map the configured device if it exists, otherwise use the model
    Auto,

    /// Force the memory-mapped backend
    Mmap,

    /// Force the software model
    Software,
}

/// Select a transport for `config`.
///
/// # Errors
///
/// Returns error if the requested backend cannot be opened.
pub fn select_backend(
    selection: BackendSelection,
    config: &I3cConfig,
) -> Result<Box<dyn RegisterTransport>> {
    use crate::backends::mmap::MmapRegion;
    use crate::backends::software::SoftwareRegisters;

    match selection {
        BackendSelection::Auto => {
            if config.device_path.exists() {
                tracing::info!("Using mmap backend for {}", config.device_path.display());
                return MmapRegion::from_config(config)
                    .map(|b| Box::new(b) as Box<dyn RegisterTransport>);
            }

            tracing::warn!(
                "{} not present, falling back to the software model",
                config.device_path.display()
            );
            Ok(Box::new(SoftwareRegisters::i3c_controller(config.window_size)))
        }

        BackendSelection::Mmap => {
            MmapRegion::from_config(config).map(|b| Box::new(b) as Box<dyn RegisterTransport>)
        }

        BackendSelection::Software => {
            Ok(Box::new(SoftwareRegisters::i3c_controller(config.window_size)))
        }
    }
}
