//! Register model of the I3C host controller peripheral.
//!
//! This crate has **no dependencies** and **no hardware access**: it is a
//! pure description of the controller's register window, the bit-field
//! codec, and the geometry of the two indexed tables.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`field`] | Field descriptors, `extract` / `inject` codec |
//! | [`regs`] | CSR offsets, field descriptors, reset values |
//! | [`table`] | DAT / DCT layout, entry fields, typed entries |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod field;
pub mod regs;
pub mod table;

pub use field::{extract, inject, Field};
pub use table::{DatEntry, DctEntry, Space, TableKind, TableLayout};
