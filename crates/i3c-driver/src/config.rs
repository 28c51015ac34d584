//! Register window configuration
//!
//! Defaults describe the controller's standard memory map exposed through a
//! UIO node. Environment variables override the defaults; the CLI overrides
//! both.
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `I3C_DEVICE_PATH` | Device file to map |
//! | `I3C_BASE_ADDR` | Byte offset of the controller inside that file |
//! | `I3C_WINDOW_SIZE` | Bytes to map |
//!
//! Numbers accept `0x` hex or decimal.

use crate::error::{I3cError, Result};
use i3c_chip::TableLayout;
use std::path::PathBuf;
use tracing::debug;

/// Default device file.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/uio0";
/// Default window: CSRs, DAT and DCT.
pub const DEFAULT_WINDOW_SIZE: usize = 0x1000;

/// Where the controller lives and how its tables are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I3cConfig {
    /// Device file to map
    pub device_path: PathBuf,
    /// Byte offset of the controller base inside `device_path`
    pub base_address: u64,
    /// Bytes of register window to map
    pub window_size: usize,
    /// DAT geometry
    pub dat: TableLayout,
    /// DCT geometry
    pub dct: TableLayout,
}

impl Default for I3cConfig {
    fn default() -> Self {
        Self {
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
            base_address: 0,
            window_size: DEFAULT_WINDOW_SIZE,
            dat: TableLayout::DAT,
            dct: TableLayout::DCT,
        }
    }
}

impl I3cConfig {
    /// Defaults overlaid with `I3C_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup` (environment, or a map in tests).
    ///
    /// # Errors
    ///
    /// Returns error if a numeric value does not parse.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = lookup("I3C_DEVICE_PATH") {
            self.device_path = PathBuf::from(path);
        }
        if let Some(base) = lookup("I3C_BASE_ADDR") {
            self.base_address = parse_number(&base)?;
        }
        if let Some(size) = lookup("I3C_WINDOW_SIZE") {
            self.window_size = usize::try_from(parse_number(&size)?)
                .map_err(|_| I3cError::invalid_config(format!("window size {size} too large")))?;
        }
        debug!("I3C config: {self:?}");
        Ok(self)
    }

    /// Use a different device file.
    #[must_use]
    pub fn with_device_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.device_path = path.into();
        self
    }

    /// Use a different base address.
    #[must_use]
    pub const fn with_base_address(mut self, base: u64) -> Self {
        self.base_address = base;
        self
    }

    /// Map a different window size.
    #[must_use]
    pub const fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Check the window is word aligned and holds both tables.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` describing the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        if self.base_address % 4 != 0 {
            return Err(I3cError::invalid_config(format!(
                "base address {:#x} is not word aligned",
                self.base_address
            )));
        }
        if self.window_size == 0 || self.window_size % 4 != 0 {
            return Err(I3cError::invalid_config(format!(
                "window size {:#x} must be a non-zero multiple of 4",
                self.window_size
            )));
        }
        for layout in [&self.dat, &self.dct] {
            check_layout_fits(layout, self.window_size)?;
        }
        Ok(())
    }
}

/// Check `layout` ends inside a window of `window_size` bytes.
///
/// # Errors
///
/// `InvalidConfig` if the table's extent overflows or passes the window.
pub(crate) fn check_layout_fits(layout: &TableLayout, window_size: usize) -> Result<()> {
    let Some(end) = layout.end() else {
        return Err(I3cError::invalid_config(format!(
            "{} at {:#x} with {} entries overflows the address space",
            layout.kind, layout.offset, layout.capacity
        )));
    };
    if end > window_size {
        return Err(I3cError::invalid_config(format!(
            "{} ends at {end:#x}, past the {window_size:#x}-byte window",
            layout.kind
        )));
    }
    Ok(())
}

/// Parse `0x`-prefixed hex or decimal.
///
/// # Errors
///
/// `InvalidConfig` if the text is not a number.
pub fn parse_number(text: &str) -> Result<u64> {
    let text = text.trim().replace('_', "");
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|e| I3cError::invalid_config(format!("'{text}' is not a number: {e}")))
}
