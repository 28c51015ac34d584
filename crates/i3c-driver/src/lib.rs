//! Register and table access driver for the I3C host controller.
//!
//! Everything above the bus sits on one primitive: an aligned 32-bit load or
//! store at a byte offset in the controller's window. On top of that this
//! crate layers the field codec from `i3c-chip`, a flat CSR accessor, and
//! bounds-checked handles for the Device Address Table and Device
//! Characteristics Table.
//!
//! # Layers
//!
//! ```text
//! I3cController   owns the transport, hands out views per address space
//!   ├─ Registers  CSR space: whole-register and field read/write
//!   └─ Table      DAT / DCT: entry and field read/write, index checked
//! RegisterTransport
//!   ├─ MmapRegion         device file mapping (volatile access)
//!   └─ SoftwareRegisters  reset values + writable masks, counts accesses
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use i3c_driver::{I3cConfig, I3cController, MmapRegion};
//! use i3c_driver::regs::{self, controller_device_addr};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = I3cConfig::from_env()?;
//! let mut ctrl = I3cController::from_config(MmapRegion::from_config(&config)?, &config)?;
//!
//! ctrl.csr().write_field(regs::CONTROLLER_DEVICE_ADDR, controller_device_addr::DYNAMIC_ADDR, 0x5F)?;
//! ctrl.dat().write_entry(5, &[0xdead_beef, 0xabcd_9876])?;
//! println!("{:?}", ctrl.read_dat_entry(5)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod backend;
pub mod backends;
mod config;
mod controller;
mod csr;
mod error;
pub mod smoke;
pub mod state;
mod table;

/// Register map and table layouts (re-exported from i3c-chip).
pub use i3c_chip::{regs, table as layout};

pub use backend::{
    check_access, select_backend, BackendSelection, BackendType, RegisterTransport, ACCESS_BYTES,
};
pub use backends::{MmapRegion, SoftwareRegisters, TransactionStats};
pub use config::{parse_number, I3cConfig, DEFAULT_DEVICE_PATH, DEFAULT_WINDOW_SIZE};
pub use controller::{I3cController, SpaceView};
pub use csr::Registers;
pub use error::{I3cError, Result};
pub use i3c_chip::{DatEntry, DctEntry, Field, Space, TableKind, TableLayout};
pub use smoke::{Check, SmokeReport};
pub use state::{HarnessState, InterruptKind, InterruptSource};
pub use table::Table;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        DatEntry, DctEntry, Field, HarnessState, I3cConfig, I3cController, I3cError,
        RegisterTransport, Result, SmokeReport, Space, TableKind,
    };
}
