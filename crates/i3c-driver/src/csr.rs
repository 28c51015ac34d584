//! Flat register accessor
//!
//! Composes a [`RegisterTransport`] with the field codec over one base
//! offset. Whole-register operations issue exactly one transaction; field
//! writes issue one read and one write and never touch bits outside the
//! field's mask. Nothing is cached: every call goes to the hardware.

use crate::backend::RegisterTransport;
use crate::error::{I3cError, Result};
use i3c_chip::field::{self, Field};
use i3c_chip::table::WORD_BYTES;
use tracing::{debug, trace};

/// Register view rooted at `base` inside a transport's window.
#[derive(Debug)]
pub struct Registers<'a, T: RegisterTransport + ?Sized> {
    io: &'a mut T,
    base: usize,
}

impl<'a, T: RegisterTransport + ?Sized> Registers<'a, T> {
    /// View of the registers starting at `base`.
    pub fn new(io: &'a mut T, base: usize) -> Self {
        Self { io, base }
    }

    /// Base offset of this view.
    pub const fn base(&self) -> usize {
        self.base
    }

    fn address(&self, offset: usize) -> Result<usize> {
        self.base
            .checked_add(offset)
            .ok_or_else(|| I3cError::out_of_bounds(offset, self.io.size()))
    }

    fn field_address(&self, offset: usize, field: Field) -> Result<usize> {
        let word = usize::from(field.word) * WORD_BYTES;
        offset
            .checked_add(word)
            .ok_or_else(|| I3cError::out_of_bounds(offset, self.io.size()))
            .and_then(|o| self.address(o))
    }

    /// Read the register at `offset` verbatim.
    ///
    /// # Errors
    ///
    /// Returns error if the offset is misaligned or outside the window.
    pub fn read_register(&self, offset: usize) -> Result<u32> {
        self.io.read32(self.address(offset)?)
    }

    /// Write `value` to the register at `offset`.
    ///
    /// Read-only bits keep their value; this accessor does not check.
    ///
    /// # Errors
    ///
    /// Returns error if the offset is misaligned or outside the window.
    pub fn write_register(&mut self, offset: usize, value: u32) -> Result<()> {
        let addr = self.address(offset)?;
        self.io.write32(addr, value)
    }

    /// Read `field` of the register at `offset`.
    ///
    /// `field.word` selects a later word: the register read is at
    /// `offset + 4 * field.word`.
    ///
    /// # Errors
    ///
    /// Returns error if the effective offset is misaligned or outside the window.
    pub fn read_field(&self, offset: usize, field: Field) -> Result<u32> {
        let addr = self.field_address(offset, field)?;
        let value = field.get(self.io.read32(addr)?);
        trace!("Field @ {addr:#x} [{:#x} >> {}] = {value:#x}", field.mask, field.low_bit);
        Ok(value)
    }

    /// Read-modify-write `field` of the register at `offset`.
    ///
    /// Not atomic: a concurrent writer between the read and the write is lost.
    ///
    /// # Errors
    ///
    /// Returns error if the effective offset is misaligned or outside the window.
    pub fn write_field(&mut self, offset: usize, field: Field, value: u32) -> Result<()> {
        let addr = self.field_address(offset, field)?;
        let old = self.io.read32(addr)?;
        let new = field.set(old, value);
        debug!("RMW @ {addr:#x}: {old:#x} -> {new:#x}");
        self.io.write32(addr, new)
    }

    /// [`read_field`](Self::read_field) with a raw `(low_bit, mask)` pair.
    ///
    /// # Errors
    ///
    /// Returns error if the offset is misaligned or outside the window.
    pub fn read_bits(&self, offset: usize, low_bit: u8, mask: u32) -> Result<u32> {
        let raw = self.read_register(offset)?;
        Ok(field::extract(raw, low_bit, mask))
    }

    /// [`write_field`](Self::write_field) with a raw `(low_bit, mask)` pair.
    ///
    /// # Errors
    ///
    /// Returns error if the offset is misaligned or outside the window.
    pub fn write_bits(&mut self, offset: usize, low_bit: u8, mask: u32, value: u32) -> Result<()> {
        self.write_field(offset, Field::new(low_bit, mask), value)
    }
}
