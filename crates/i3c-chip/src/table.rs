//! Device Address Table and Device Characteristics Table layout.
//!
//! Both tables are arrays of fixed-width entries inside the controller's
//! register window:
//!
//! ```text
//! Table  Offset  Entry      Stride  Entries  Span
//! ─────  ──────  ─────────  ──────  ───────  ──────
//! DAT    0x400   64 bit     8 B     128      0x400
//! DCT    0x800   128 bit    16 B    128      0x800
//! ```
//!
//! An entry's byte offset is `table_offset + index * entry_bytes`. Fields are
//! numbered across the whole entry in the register description; the
//! descriptors below are already split into `(word, low_bit, mask)`.

use crate::field::Field;

/// DAT byte offset from the controller base.
pub const DAT_OFFSET: usize = 0x400;
/// DAT entry width in bits.
pub const DAT_ENTRY_BITS: usize = 64;
/// DAT entries in the memory map.
pub const DAT_CAPACITY: usize = 128;

/// DCT byte offset from the controller base.
pub const DCT_OFFSET: usize = 0x800;
/// DCT entry width in bits.
pub const DCT_ENTRY_BITS: usize = 128;
/// DCT entries in the memory map.
pub const DCT_CAPACITY: usize = 128;

/// Bytes per 32-bit word.
pub const WORD_BYTES: usize = 4;

/// Which indexed table an access targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Device Address Table.
    Dat,
    /// Device Characteristics Table.
    Dct,
}

impl TableKind {
    /// Compiled-in layout of this table.
    #[must_use]
    pub const fn layout(self) -> TableLayout {
        match self {
            Self::Dat => TableLayout::DAT,
            Self::Dct => TableLayout::DCT,
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dat => write!(f, "DAT"),
            Self::Dct => write!(f, "DCT"),
        }
    }
}

/// Address space an operation is directed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    /// Flat CSR space.
    Csr,
    /// DAT memory.
    Dat,
    /// DCT memory.
    Dct,
}

impl Space {
    /// The table behind this space, if it is indexed.
    #[must_use]
    pub const fn table(self) -> Option<TableKind> {
        match self {
            Self::Csr => None,
            Self::Dat => Some(TableKind::Dat),
            Self::Dct => Some(TableKind::Dct),
        }
    }
}

/// Placement and geometry of one indexed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    /// Table identity.
    pub kind: TableKind,
    /// Byte offset of entry 0 from the controller base.
    pub offset: usize,
    /// 32-bit words per entry.
    pub entry_words: usize,
    /// Number of addressable entries.
    pub capacity: usize,
}

impl TableLayout {
    /// Default DAT layout.
    pub const DAT: Self = Self {
        kind: TableKind::Dat,
        offset: DAT_OFFSET,
        entry_words: DAT_ENTRY_BITS / 32,
        capacity: DAT_CAPACITY,
    };

    /// Default DCT layout.
    pub const DCT: Self = Self {
        kind: TableKind::Dct,
        offset: DCT_OFFSET,
        entry_words: DCT_ENTRY_BITS / 32,
        capacity: DCT_CAPACITY,
    };

    /// Bytes between consecutive entries. Saturates.
    #[must_use]
    pub const fn entry_bytes(&self) -> usize {
        self.entry_words.saturating_mul(WORD_BYTES)
    }

    /// Offset of entry `index` relative to the table start, or `None` on
    /// overflow. Capacity is not checked.
    #[must_use]
    pub const fn entry_offset(&self, index: usize) -> Option<usize> {
        index.checked_mul(self.entry_bytes())
    }

    /// Total bytes the table occupies, or `None` on overflow.
    #[must_use]
    pub const fn span(&self) -> Option<usize> {
        self.capacity.checked_mul(self.entry_bytes())
    }

    /// First byte past the table, relative to the controller base, or `None`
    /// on overflow.
    #[must_use]
    pub const fn end(&self) -> Option<usize> {
        match self.span() {
            Some(span) => self.offset.checked_add(span),
            None => None,
        }
    }

    /// Same layout with a different capacity.
    #[must_use]
    pub const fn with_capacity(self, capacity: usize) -> Self {
        Self { capacity, ..self }
    }

    /// Same layout at a different offset.
    #[must_use]
    pub const fn with_offset(self, offset: usize) -> Self {
        Self { offset, ..self }
    }
}

// ── DAT entry fields ─────────────────────────────────────────────────────────

/// DAT fields. Bit numbers count across the 64-bit entry.
pub mod dat {
    use crate::field::Field;

    /// Static address of the device.
    pub const STATIC_ADDRESS: Field = Field::from_entry_bit(0, 0x0000_007F);
    /// IBIs from the device carry a payload.
    pub const IBI_PAYLOAD: Field = Field::from_entry_bit(12, 0x0000_1000);
    /// NACK IBIs from the device.
    pub const IBI_REJECT: Field = Field::from_entry_bit(13, 0x0000_2000);
    /// NACK controller role requests from the device.
    pub const CRR_REJECT: Field = Field::from_entry_bit(14, 0x0000_4000);
    /// Timestamp IBIs.
    pub const TS: Field = Field::from_entry_bit(15, 0x0000_8000);
    /// Dynamic address, parity in bit 23.
    pub const DYNAMIC_ADDRESS: Field = Field::from_entry_bit(16, 0x00FF_0000);
    /// IBI ring.
    pub const RING_ID: Field = Field::from_entry_bit(26, 0x1C00_0000);
    /// Retries after the device NACKs.
    pub const DEV_NACK_RETRY_CNT: Field = Field::from_entry_bit(29, 0x6000_0000);
    /// 1 for legacy I2C devices.
    pub const DEVICE: Field = Field::from_entry_bit(31, 0x8000_0000);
    /// Auto-command IBI mask.
    pub const AUTOCMD_MASK: Field = Field::from_entry_bit(32, 0x0000_00FF);
    /// Auto-command IBI match value.
    pub const AUTOCMD_VALUE: Field = Field::from_entry_bit(40, 0x0000_FF00);
    /// Auto-command mode.
    pub const AUTOCMD_MODE: Field = Field::from_entry_bit(48, 0x0007_0000);
    /// Auto-command HDR code.
    pub const AUTOCMD_HDR_CODE: Field = Field::from_entry_bit(51, 0x07F8_0000);
}

// ── DCT entry fields ─────────────────────────────────────────────────────────

/// DCT fields, filled by hardware during dynamic address assignment.
pub mod dct {
    use crate::field::Field;

    /// Upper 32 bits of the 48-bit provisioned ID.
    pub const PID_HI: Field = Field::from_entry_bit(0, 0xFFFF_FFFF);
    /// Lower 16 bits of the provisioned ID.
    pub const PID_LO: Field = Field::from_entry_bit(32, 0x0000_FFFF);
    /// Device characteristics register.
    pub const DCR: Field = Field::from_entry_bit(64, 0x0000_00FF);
    /// Bus characteristics register.
    pub const BCR: Field = Field::from_entry_bit(72, 0x0000_FF00);
    /// Assigned dynamic address.
    pub const DYNAMIC_ADDRESS: Field = Field::from_entry_bit(96, 0x0000_00FF);
}

/// Decoded DAT entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatEntry {
    /// See [`dat::STATIC_ADDRESS`].
    pub static_address: u8,
    /// See [`dat::IBI_PAYLOAD`].
    pub ibi_payload: bool,
    /// See [`dat::IBI_REJECT`].
    pub ibi_reject: bool,
    /// See [`dat::CRR_REJECT`].
    pub crr_reject: bool,
    /// See [`dat::TS`].
    pub ts: bool,
    /// Dynamic address with its parity bit.
    pub dynamic_address: u8,
    /// See [`dat::RING_ID`].
    pub ring_id: u8,
    /// See [`dat::DEV_NACK_RETRY_CNT`].
    pub dev_nack_retry_cnt: u8,
    /// Legacy I2C device.
    pub device: bool,
    /// See [`dat::AUTOCMD_MASK`].
    pub autocmd_mask: u8,
    /// See [`dat::AUTOCMD_VALUE`].
    pub autocmd_value: u8,
    /// See [`dat::AUTOCMD_MODE`].
    pub autocmd_mode: u8,
    /// See [`dat::AUTOCMD_HDR_CODE`].
    pub autocmd_hdr_code: u8,
}

impl DatEntry {
    /// Pack into the two entry words. Out-of-range values are truncated.
    #[must_use]
    pub fn to_words(&self) -> [u32; 2] {
        let mut words = [0u32; 2];
        let mut put = |f: Field, v: u32| {
            let w = usize::from(f.word);
            words[w] = f.set(words[w], v);
        };
        put(dat::STATIC_ADDRESS, self.static_address.into());
        put(dat::IBI_PAYLOAD, self.ibi_payload.into());
        put(dat::IBI_REJECT, self.ibi_reject.into());
        put(dat::CRR_REJECT, self.crr_reject.into());
        put(dat::TS, self.ts.into());
        put(dat::DYNAMIC_ADDRESS, self.dynamic_address.into());
        put(dat::RING_ID, self.ring_id.into());
        put(dat::DEV_NACK_RETRY_CNT, self.dev_nack_retry_cnt.into());
        put(dat::DEVICE, self.device.into());
        put(dat::AUTOCMD_MASK, self.autocmd_mask.into());
        put(dat::AUTOCMD_VALUE, self.autocmd_value.into());
        put(dat::AUTOCMD_MODE, self.autocmd_mode.into());
        put(dat::AUTOCMD_HDR_CODE, self.autocmd_hdr_code.into());
        words
    }

    /// Unpack from the two entry words.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // every field is at most 8 bits wide
    pub fn from_words(words: [u32; 2]) -> Self {
        let get = |f: Field| f.get(words[usize::from(f.word)]);
        Self {
            static_address: get(dat::STATIC_ADDRESS) as u8,
            ibi_payload: get(dat::IBI_PAYLOAD) != 0,
            ibi_reject: get(dat::IBI_REJECT) != 0,
            crr_reject: get(dat::CRR_REJECT) != 0,
            ts: get(dat::TS) != 0,
            dynamic_address: get(dat::DYNAMIC_ADDRESS) as u8,
            ring_id: get(dat::RING_ID) as u8,
            dev_nack_retry_cnt: get(dat::DEV_NACK_RETRY_CNT) as u8,
            device: get(dat::DEVICE) != 0,
            autocmd_mask: get(dat::AUTOCMD_MASK) as u8,
            autocmd_value: get(dat::AUTOCMD_VALUE) as u8,
            autocmd_mode: get(dat::AUTOCMD_MODE) as u8,
            autocmd_hdr_code: get(dat::AUTOCMD_HDR_CODE) as u8,
        }
    }
}

/// Decoded DCT entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DctEntry {
    /// 48-bit provisioned ID.
    pub pid: u64,
    /// Device characteristics register.
    pub dcr: u8,
    /// Bus characteristics register.
    pub bcr: u8,
    /// Assigned dynamic address.
    pub dynamic_address: u8,
}

impl DctEntry {
    /// Pack into the four entry words.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_words(&self) -> [u32; 4] {
        let mut words = [0u32; 4];
        words[0] = dct::PID_HI.set(0, (self.pid >> 16) as u32);
        words[1] = dct::PID_LO.set(0, (self.pid & 0xFFFF) as u32);
        words[2] = dct::BCR.set(dct::DCR.set(0, self.dcr.into()), self.bcr.into());
        words[3] = dct::DYNAMIC_ADDRESS.set(0, self.dynamic_address.into());
        words
    }

    /// Unpack from the four entry words.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_words(words: [u32; 4]) -> Self {
        let pid_hi = u64::from(dct::PID_HI.get(words[0]));
        let pid_lo = u64::from(dct::PID_LO.get(words[1]));
        Self {
            pid: (pid_hi << 16) | pid_lo,
            dcr: dct::DCR.get(words[2]) as u8,
            bcr: dct::BCR.get(words[2]) as u8,
            dynamic_address: dct::DYNAMIC_ADDRESS.get(words[3]) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides() {
        assert_eq!(TableLayout::DAT.entry_bytes(), 8);
        assert_eq!(TableLayout::DCT.entry_bytes(), 16);
        assert_eq!(TableLayout::DAT.entry_offset(5), Some(40));
        assert_eq!(TableLayout::DCT.entry_offset(3), Some(48));
    }

    #[test]
    fn tables_do_not_overlap() {
        assert!(TableLayout::DAT.end() <= Some(TableLayout::DCT.offset));
        assert_eq!(TableLayout::DCT.end(), Some(0x1000));
    }

    #[test]
    fn oversized_layouts_do_not_wrap() {
        let huge = TableLayout::DAT.with_capacity(usize::MAX);
        assert_eq!(huge.span(), None);
        assert_eq!(huge.end(), None);
        assert_eq!(TableLayout::DCT.with_offset(usize::MAX).end(), None);
        assert_eq!(TableLayout::DCT.entry_offset(usize::MAX), None);
    }

    #[test]
    fn field_words_fit_entries() {
        for f in [dat::STATIC_ADDRESS, dat::DEVICE, dat::AUTOCMD_HDR_CODE] {
            assert!(usize::from(f.word) < TableLayout::DAT.entry_words);
        }
        for f in [dct::PID_HI, dct::PID_LO, dct::BCR, dct::DYNAMIC_ADDRESS] {
            assert!(usize::from(f.word) < TableLayout::DCT.entry_words);
        }
    }

    #[test]
    fn dat_entry_packing_matches_bit_layout() {
        let entry = DatEntry {
            static_address: 0x50,
            dynamic_address: 0x5F,
            dev_nack_retry_cnt: 2,
            autocmd_hdr_code: 0xAB,
            ..DatEntry::default()
        };
        let words = entry.to_words();
        assert_eq!(words[0], 0x50 | 0x5F << 16 | 2 << 29);
        assert_eq!(words[1], 0xAB << 19);
        assert_eq!(DatEntry::from_words(words), entry);
    }

    #[test]
    fn dct_entry_splits_pid() {
        let entry = DctEntry {
            pid: 0x0123_4567_89AB,
            dcr: 0xC6,
            bcr: 0x07,
            dynamic_address: 0x21,
        };
        let words = entry.to_words();
        assert_eq!(words, [0x0123_4567, 0x89AB, 0x07C6, 0x21]);
        assert_eq!(DctEntry::from_words(words), entry);
    }
}
