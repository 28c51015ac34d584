//! Bit-field descriptors and the extract/inject codec.
//!
//! A field is a `(low_bit, mask)` pair taken verbatim from the register
//! description. The mask is expressed in the register's own bit positions
//! (pre-shift), so `DYNAMIC_ADDR` at bits `[22:16]` is `low = 16`,
//! `mask = 0x007F_0000`. The codec trusts the pair: a mask that does not
//! start at `low_bit` silently yields a wrong value.
//!
//! Table entries span several 32-bit words. The register description numbers
//! their bits across the whole entry (`AUTOCMD_MASK` has `low = 32`), while
//! the mask stays relative to the word it lives in. [`Field::from_entry_bit`]
//! splits such a descriptor into `(word, low_bit, mask)`.

/// Extract a field: `(value & mask) >> low_bit`.
#[must_use]
pub const fn extract(value: u32, low_bit: u8, mask: u32) -> u32 {
    (value & mask).wrapping_shr(low_bit as u32)
}

/// Inject a field into `old`, leaving every bit outside `mask` untouched.
///
/// The new field value is shifted into place and clamped by `mask`, so
/// oversized values lose their high bits instead of spilling into neighbours.
#[must_use]
pub const fn inject(old: u32, low_bit: u8, mask: u32, field: u32) -> u32 {
    (old & !mask) | (field.wrapping_shl(low_bit as u32) & mask)
}

/// A named sub-range of bits inside one 32-bit word of a register or entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    /// Word index inside a multi-word table entry (0 for CSRs).
    pub word: u8,
    /// Lowest bit of the field inside its word.
    pub low_bit: u8,
    /// Pre-shift mask in the word's bit positions.
    pub mask: u32,
}

impl Field {
    /// Field in word 0, the only form flat CSRs use.
    #[must_use]
    pub const fn new(low_bit: u8, mask: u32) -> Self {
        Self { word: 0, low_bit, mask }
    }

    /// Field in an explicit word of a multi-word entry.
    #[must_use]
    pub const fn in_word(word: u8, low_bit: u8, mask: u32) -> Self {
        Self { word, low_bit, mask }
    }

    /// Build from entry-relative bit numbering (`low` may exceed 31).
    #[must_use]
    pub const fn from_entry_bit(low: u16, mask: u32) -> Self {
        Self {
            word: (low / 32) as u8,
            low_bit: (low % 32) as u8,
            mask,
        }
    }

    /// Contiguous field of `width` bits starting at `low_bit`.
    #[must_use]
    pub const fn bits(low_bit: u8, width: u8) -> Self {
        Self::new(low_bit, mask_of(low_bit, width))
    }

    /// Same field moved to another word.
    #[must_use]
    pub const fn at_word(self, word: u8) -> Self {
        Self { word, ..self }
    }

    /// Largest value the field can hold, after shifting down.
    #[must_use]
    pub const fn max_value(&self) -> u32 {
        extract(self.mask, self.low_bit, self.mask)
    }

    /// Read this field out of a raw word.
    #[must_use]
    pub const fn get(&self, word: u32) -> u32 {
        extract(word, self.low_bit, self.mask)
    }

    /// Write `value` into this field of a raw word.
    #[must_use]
    pub const fn set(&self, word: u32, value: u32) -> u32 {
        inject(word, self.low_bit, self.mask, value)
    }
}

/// Mask of `width` ones starting at `low_bit`.
#[must_use]
pub const fn mask_of(low_bit: u8, width: u8) -> u32 {
    let ones = if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    };
    ones.wrapping_shl(low_bit as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_and_inject_follow_the_mask() {
        let dynamic_addr = Field::new(16, 0x007F_0000);
        let reg = dynamic_addr.set(0x8000_0001, 0x5F);
        assert_eq!(reg, 0x805F_0001);
        assert_eq!(dynamic_addr.get(reg), 0x5F);
    }

    #[test]
    fn inject_clamps_oversized_values() {
        let nibble = Field::bits(4, 4);
        assert_eq!(nibble.set(0x0000_000F, 0x1FF), 0x0000_00FF);
    }

    #[test]
    fn top_bit_fields_do_not_overflow() {
        let bus_enable = Field::new(31, 0x8000_0000);
        assert_eq!(bus_enable.set(0, 1), 0x8000_0000);
        assert_eq!(bus_enable.get(0xFFFF_FFFF), 1);
        assert_eq!(Field::bits(0, 32).mask, u32::MAX);
    }

    #[test]
    fn entry_bit_numbering_selects_word() {
        // AUTOCMD_HDR_CODE: low = 51, mask relative to word 1.
        let f = Field::from_entry_bit(51, 0x07F8_0000);
        assert_eq!(f, Field::in_word(1, 19, 0x07F8_0000));
        assert_eq!(f.max_value(), 0xFF);

        let dct_dynamic = Field::from_entry_bit(96, 0xFF);
        assert_eq!(dct_dynamic.word, 3);
        assert_eq!(dct_dynamic.low_bit, 0);
    }

    #[test]
    fn mismatched_pair_is_not_detected() {
        // Mask at [7:4] but low_bit 0: the codec returns the unshifted bits.
        assert_eq!(extract(0xA0, 0, 0xF0), 0xA0);
    }
}
