//! Indexed table accessor for the DAT and DCT
//!
//! A [`Table`] is a capability: it carries the table's layout, including its
//! capacity, so every index is checked before an address reaches the
//! transport. Entry `i` lives at `layout.offset + i * entry_bytes`; multi-word
//! entries are written and read as independent 32-bit accesses in ascending
//! word order (the bus has no wider store).

use crate::backend::RegisterTransport;
use crate::csr::Registers;
use crate::error::{I3cError, Result};
use i3c_chip::field::Field;
use i3c_chip::table::WORD_BYTES;
use i3c_chip::TableLayout;
use tracing::debug;

/// Bounds-checked view of one indexed table.
#[derive(Debug)]
pub struct Table<'a, T: RegisterTransport + ?Sized> {
    regs: Registers<'a, T>,
    layout: TableLayout,
}

impl<'a, T: RegisterTransport + ?Sized> Table<'a, T> {
    /// View `layout` through `io`.
    pub fn new(io: &'a mut T, layout: TableLayout) -> Self {
        Self {
            regs: Registers::new(io, layout.offset),
            layout,
        }
    }

    /// Geometry of this table.
    pub const fn layout(&self) -> &TableLayout {
        &self.layout
    }

    /// Number of entries.
    pub const fn capacity(&self) -> usize {
        self.layout.capacity
    }

    /// Byte offset of entry `index` from the table start.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if `index >= capacity`, or if the end of the entry
    /// is not addressable.
    pub fn entry_offset(&self, index: usize) -> Result<usize> {
        let out_of_range = || I3cError::IndexOutOfRange {
            table: self.layout.kind,
            index,
            capacity: self.layout.capacity,
        };
        if index >= self.layout.capacity {
            return Err(out_of_range());
        }
        // Every word of the entry must be addressable, not just the first.
        self.layout.entry_offset(index + 1).ok_or_else(out_of_range)?;
        self.layout.entry_offset(index).ok_or_else(out_of_range)
    }

    fn check_words(&self, words: usize) -> Result<()> {
        if words > self.layout.entry_words {
            return Err(I3cError::EntryTooLong {
                table: self.layout.kind,
                words,
                entry_words: self.layout.entry_words,
            });
        }
        Ok(())
    }

    fn check_field(&self, field: Field) -> Result<()> {
        let word = usize::from(field.word);
        if word >= self.layout.entry_words {
            return Err(I3cError::WordOutOfRange {
                table: self.layout.kind,
                word,
                entry_words: self.layout.entry_words,
            });
        }
        Ok(())
    }

    /// First word of 64-bit pair `pair`.
    fn pair_word(&self, pair: usize) -> Result<usize> {
        if pair >= self.layout.entry_words / 2 {
            return Err(I3cError::WordOutOfRange {
                table: self.layout.kind,
                word: pair.saturating_mul(2),
                entry_words: self.layout.entry_words,
            });
        }
        Ok(pair * 2)
    }

    /// Write `words` to entry `index`, lowest word first.
    ///
    /// Fewer words than the entry width leave the remaining words untouched.
    ///
    /// # Errors
    ///
    /// Returns error if the index is out of range, `words` is longer than an
    /// entry, or a store fails.
    pub fn write_entry(&mut self, index: usize, words: &[u32]) -> Result<()> {
        let base = self.entry_offset(index)?;
        self.check_words(words.len())?;
        debug!("{} entry {index} <- {words:#x?}", self.layout.kind);
        for (i, &word) in words.iter().enumerate() {
            self.regs.write_register(base + i * WORD_BYTES, word)?;
        }
        Ok(())
    }

    /// Read the first `word_count` words of entry `index`.
    ///
    /// # Errors
    ///
    /// Returns error if the index is out of range, `word_count` is larger
    /// than an entry, or a load fails.
    pub fn read_entry(&self, index: usize, word_count: usize) -> Result<Vec<u32>> {
        let base = self.entry_offset(index)?;
        self.check_words(word_count)?;
        (0..word_count)
            .map(|i| self.regs.read_register(base + i * WORD_BYTES))
            .collect()
    }

    /// Read a whole entry into a fixed-size array.
    ///
    /// # Errors
    ///
    /// Returns error if the index is out of range, `N` is larger than an
    /// entry, or a load fails.
    pub fn read_words<const N: usize>(&self, index: usize) -> Result<[u32; N]> {
        let base = self.entry_offset(index)?;
        self.check_words(N)?;
        let mut words = [0u32; N];
        for (i, word) in words.iter_mut().enumerate() {
            *word = self.regs.read_register(base + i * WORD_BYTES)?;
        }
        Ok(words)
    }

    /// Read `field` of entry `index`. `field.word` selects the entry word.
    ///
    /// # Errors
    ///
    /// Returns error if the index is out of range, the field's word is past
    /// the end of the entry, or the load fails.
    pub fn read_field(&self, index: usize, field: Field) -> Result<u32> {
        let base = self.entry_offset(index)?;
        self.check_field(field)?;
        self.regs.read_field(base, field)
    }

    /// Read-modify-write `field` of entry `index`.
    ///
    /// # Errors
    ///
    /// Returns error if the index is out of range, the field's word is past
    /// the end of the entry, or an access fails.
    pub fn write_field(&mut self, index: usize, field: Field, value: u32) -> Result<()> {
        let base = self.entry_offset(index)?;
        self.check_field(field)?;
        self.regs.write_field(base, field, value)
    }

    /// Read a field of word 0 from a raw `(low_bit, mask)` pair.
    ///
    /// # Errors
    ///
    /// See [`read_field`](Self::read_field).
    pub fn read_bits(&self, index: usize, low_bit: u8, mask: u32) -> Result<u32> {
        self.read_field(index, Field::new(low_bit, mask))
    }

    /// Write a field of word 0 from a raw `(low_bit, mask)` pair.
    ///
    /// # Errors
    ///
    /// See [`write_field`](Self::write_field).
    pub fn write_bits(&mut self, index: usize, low_bit: u8, mask: u32, value: u32) -> Result<()> {
        self.write_field(index, Field::new(low_bit, mask), value)
    }

    /// Write a 64-bit value across words `2 * pair` (low half) and
    /// `2 * pair + 1` (high half) of entry `index`.
    ///
    /// # Errors
    ///
    /// Returns error if the index is out of range, the pair is past the end
    /// of the entry, or a store fails.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write_dword(&mut self, index: usize, pair: usize, value: u64) -> Result<()> {
        let first = self.pair_word(pair)?;
        let base = self.entry_offset(index)?;
        let lo = (value & 0xFFFF_FFFF) as u32;
        let hi = (value >> 32) as u32;
        self.regs.write_register(base + first * WORD_BYTES, lo)?;
        self.regs.write_register(base + (first + 1) * WORD_BYTES, hi)
    }

    /// Read a 64-bit value from words `2 * pair` and `2 * pair + 1`.
    ///
    /// # Errors
    ///
    /// Returns error if the index is out of range, the pair is past the end
    /// of the entry, or a load fails.
    pub fn read_dword(&self, index: usize, pair: usize) -> Result<u64> {
        let first = self.pair_word(pair)?;
        let base = self.entry_offset(index)?;
        let lo = u64::from(self.regs.read_register(base + first * WORD_BYTES)?);
        let hi = u64::from(self.regs.read_register(base + (first + 1) * WORD_BYTES)?);
        Ok((hi << 32) | lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::software::SoftwareRegisters;
    use i3c_chip::table::{dat, dct};
    use i3c_chip::TableKind;

    fn model() -> SoftwareRegisters {
        SoftwareRegisters::i3c_controller(0x1000)
    }

    #[test]
    fn dat_entry_five_round_trip() {
        let mut io = model();
        let mut table = Table::new(&mut io, TableLayout::DAT);
        table.write_entry(5, &[0xdead_beef, 0xabcd_9876]).unwrap();
        assert_eq!(table.read_entry(5, 2).unwrap(), vec![0xdead_beef, 0xabcd_9876]);
        drop(table);
        assert_eq!(io.peek(0x400 + 40), Some(0xdead_beef));
        assert_eq!(io.peek(0x400 + 44), Some(0xabcd_9876));
    }

    #[test]
    fn retry_count_keeps_addresses() {
        let mut io = model();
        let mut table = Table::new(&mut io, TableLayout::DAT);
        table.write_field(0, dat::STATIC_ADDRESS, 0x50).unwrap();
        table.write_field(0, dat::DYNAMIC_ADDRESS, 0x5F).unwrap();
        table.write_field(0, dat::DEV_NACK_RETRY_CNT, 2).unwrap();
        assert_eq!(table.read_field(0, dat::DEV_NACK_RETRY_CNT).unwrap(), 2);
        assert_eq!(table.read_field(0, dat::STATIC_ADDRESS).unwrap(), 0x50);
        assert_eq!(table.read_field(0, dat::DYNAMIC_ADDRESS).unwrap(), 0x5F);
    }

    #[test]
    fn later_words_are_addressable() {
        let mut io = model();
        let mut table = Table::new(&mut io, TableLayout::DCT);
        table.write_field(2, dct::BCR, 0x07).unwrap();
        table.write_field(2, dct::DYNAMIC_ADDRESS, 0x21).unwrap();
        assert_eq!(table.read_entry(2, 4).unwrap(), vec![0, 0, 0x0700, 0x21]);
        drop(table);
        assert_eq!(io.peek(0x800 + 32 + 12), Some(0x21));
    }

    #[test]
    fn index_past_capacity_is_rejected() {
        let mut io = model();
        let mut table = Table::new(&mut io, TableLayout::DAT);
        let err = table.write_entry(128, &[1, 2]).unwrap_err();
        assert!(matches!(
            err,
            I3cError::IndexOutOfRange { table: TableKind::Dat, index: 128, capacity: 128 }
        ));
        assert!(table.read_field(usize::MAX, dat::DEVICE).is_err());
        drop(table);
        assert_eq!(io.stats().writes, 0);
    }

    #[test]
    fn oversized_entries_are_rejected() {
        let mut io = model();
        let mut table = Table::new(&mut io, TableLayout::DAT);
        assert!(matches!(
            table.write_entry(0, &[1, 2, 3]),
            Err(I3cError::EntryTooLong { words: 3, entry_words: 2, .. })
        ));
        assert!(matches!(table.read_entry(0, 3), Err(I3cError::EntryTooLong { .. })));
        assert!(matches!(
            table.read_field(0, dct::DYNAMIC_ADDRESS),
            Err(I3cError::WordOutOfRange { word: 3, .. })
        ));
    }

    #[test]
    fn dword_split_is_bitwise() {
        let mut io = model();
        let mut table = Table::new(&mut io, TableLayout::DCT);
        table.write_dword(1, 0, 0x0123_4567_89AB_CDEF).unwrap();
        table.write_dword(1, 1, 0xFEDC_BA98_7654_3210).unwrap();
        assert_eq!(table.read_words::<4>(1).unwrap(), [0x89AB_CDEF, 0x0123_4567, 0x7654_3210, 0xFEDC_BA98]);
        assert_eq!(table.read_dword(1, 1).unwrap(), 0xFEDC_BA98_7654_3210);
        assert!(matches!(
            table.read_dword(1, 2),
            Err(I3cError::WordOutOfRange { word: 4, entry_words: 4, .. })
        ));
    }

    #[test]
    fn huge_pair_index_is_rejected_before_any_access() {
        let mut io = model();
        let mut table = Table::new(&mut io, TableLayout::DCT);
        assert!(matches!(
            table.read_dword(0, usize::MAX),
            Err(I3cError::WordOutOfRange { word: usize::MAX, entry_words: 4, .. })
        ));
        assert!(matches!(
            table.write_dword(0, usize::MAX, 1),
            Err(I3cError::WordOutOfRange { .. })
        ));
        assert!(matches!(
            Table::new(&mut model(), TableLayout::DAT).read_dword(0, 1),
            Err(I3cError::WordOutOfRange { word: 2, entry_words: 2, .. })
        ));
        drop(table);
        assert_eq!(io.stats().total(), 0);
    }

    #[test]
    fn unaddressable_entries_are_rejected() {
        let mut io = model();
        let layout = TableLayout::DCT.with_capacity(usize::MAX);
        let mut table = Table::new(&mut io, layout);
        let index = usize::MAX / 16;
        assert!(matches!(
            table.write_entry(index, &[1]),
            Err(I3cError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            table.read_field(usize::MAX - 1, dct::PID_HI),
            Err(I3cError::IndexOutOfRange { .. })
        ));
        drop(table);
        assert_eq!(io.stats().total(), 0);
    }
}
