//! Register transport implementations
//!
//! Two backends available:
//! - **Mmap**: maps the controller window out of a device file (UIO node,
//!   `/dev/mem`, PCIe resource file, or a plain file in tests)
//! - **Software**: in-memory controller model with read-only masks, no
//!   hardware required

pub mod mmap;
pub mod software;

pub use mmap::MmapRegion;
pub use software::{SoftwareRegisters, TransactionStats};
