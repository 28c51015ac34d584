//! Software model of the controller's register window
//!
//! Implements `RegisterTransport` over an in-memory word array. Each word
//! carries a reset value and a software-writable mask, so stores to
//! read-only bits are dropped the way the hardware drops them. This enables:
//!
//! 1. **CI without hardware**: every accessor and the smoke sequence run
//!    against [`SoftwareRegisters::i3c_controller`].
//!
//! 2. **Transaction accounting**: reads and writes are counted, so the
//!    "one read, one write per field update" contract is observable.
//!
//! The model does not emulate side effects (W1C, queue ports, soft reset).

use crate::backend::{check_access, BackendType, RegisterTransport, ACCESS_BYTES};
use crate::error::Result;
use i3c_chip::regs::{self, reset};
use i3c_chip::regs::{controller_device_addr, hc_control, section_offset};
use i3c_chip::TableLayout;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Transport-level access counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStats {
    /// Completed 32-bit loads
    pub reads: u64,
    /// Completed 32-bit stores
    pub writes: u64,
}

impl TransactionStats {
    /// Loads plus stores.
    pub const fn total(&self) -> u64 {
        self.reads + self.writes
    }
}

/// In-memory register window with per-word writable masks.
#[derive(Debug)]
pub struct SoftwareRegisters {
    words: Vec<u32>,
    reset: Vec<u32>,
    writable: Vec<u32>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl SoftwareRegisters {
    /// Fully writable window of `size` bytes, reset to zero.
    ///
    /// `size` is rounded down to whole words.
    pub fn new(size: usize) -> Self {
        let count = size / ACCESS_BYTES;
        Self {
            words: vec![0; count],
            reset: vec![0; count],
            writable: vec![u32::MAX; count],
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Model of the I3C controller out of reset.
    ///
    /// Read-only: `HCI_VERSION`, `HC_CAPABILITIES`, `DAT_SECTION_OFFSET` and
    /// `QUEUE_SIZE`. `DCT_SECTION_OFFSET` takes stores to `TABLE_INDEX` only,
    /// `RESET_CONTROL` to its six request bits and `PIO_CONTROL` to its three
    /// LSBs. DAT and DCT memory are fully writable.
    pub fn i3c_controller(size: usize) -> Self {
        let device_addr_writable =
            controller_device_addr::DYNAMIC_ADDR.mask | controller_device_addr::DYNAMIC_ADDR_VALID.mask;
        let hc_control_writable = [
            hc_control::IBA_INCLUDE,
            hc_control::AUTOCMD_DATA_RPT,
            hc_control::DATA_BYTE_ORDER_MODE,
            hc_control::MODE_SELECTOR,
            hc_control::I2C_DEV_PRESENT,
            hc_control::HOT_JOIN_CTRL,
            hc_control::HALT_ON_CMD_SEQ_TIMEOUT,
            hc_control::ABORT,
            hc_control::RESUME,
            hc_control::BUS_ENABLE,
        ]
        .iter()
        .fold(0, |acc, f| acc | f.mask);

        let model = Self::new(size)
            .with_register(regs::HCI_VERSION, reset::HCI_VERSION, 0)
            .with_register(regs::HC_CONTROL, reset::HC_CONTROL, hc_control_writable)
            .with_register(regs::CONTROLLER_DEVICE_ADDR, 0, device_addr_writable)
            .with_register(regs::HC_CAPABILITIES, 0, 0)
            .with_register(regs::RESET_CONTROL, 0, regs::RESET_CONTROL_WRITABLE)
            .with_register(regs::PRESENT_STATE, 0, 0)
            .with_register(regs::DAT_SECTION_OFFSET, reset::DAT_SECTION_OFFSET, 0)
            .with_register(
                regs::DCT_SECTION_OFFSET,
                reset::DCT_SECTION_OFFSET,
                section_offset::TABLE_INDEX.mask,
            )
            .with_register(regs::INT_CTRL_CMDS_EN, reset::INT_CTRL_CMDS_EN, 0)
            .with_register(regs::QUEUE_THLD_CTRL, reset::QUEUE_THLD_CTRL, u32::MAX)
            .with_register(regs::DATA_BUFFER_THLD_CTRL, reset::DATA_BUFFER_THLD_CTRL, u32::MAX)
            .with_register(regs::QUEUE_SIZE, reset::QUEUE_SIZE, 0)
            .with_register(regs::PIO_CONTROL, 0, regs::PIO_CONTROL_WRITABLE);

        debug!(
            "Software I3C model: {} words, DAT {} x {}, DCT {} x {}",
            model.words.len(),
            TableLayout::DAT.capacity,
            TableLayout::DAT.entry_words,
            TableLayout::DCT.capacity,
            TableLayout::DCT.entry_words,
        );
        model
    }

    /// Set the reset value and writable mask of the word at `offset`.
    ///
    /// Offsets outside the window are ignored.
    #[must_use]
    pub fn with_register(mut self, offset: usize, reset_value: u32, writable: u32) -> Self {
        let i = offset / ACCESS_BYTES;
        if i < self.words.len() {
            self.words[i] = reset_value;
            self.reset[i] = reset_value;
            self.writable[i] = writable;
        }
        self
    }

    /// Restore every word to its reset value. Counters are kept.
    pub fn reset(&mut self) {
        self.words.copy_from_slice(&self.reset);
        debug!("Software I3C model reset");
    }

    /// Backdoor read: no bounds error, no transaction counted.
    pub fn peek(&self, offset: usize) -> Option<u32> {
        self.words.get(offset / ACCESS_BYTES).copied()
    }

    /// Backdoor write that ignores the writable mask, as hardware would.
    pub fn poke(&mut self, offset: usize, value: u32) {
        if let Some(w) = self.words.get_mut(offset / ACCESS_BYTES) {
            *w = value;
        }
    }

    /// Transactions issued so far.
    pub fn stats(&self) -> TransactionStats {
        TransactionStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }

    /// Zero the transaction counters.
    pub fn reset_stats(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
    }
}

impl RegisterTransport for SoftwareRegisters {
    fn read32(&self, offset: usize) -> Result<u32> {
        check_access(offset, self.size())?;
        let value = self.words[offset / ACCESS_BYTES];
        self.reads.fetch_add(1, Ordering::Relaxed);
        trace!("Read u32 @ {offset:#x} = {value:#x}");
        Ok(value)
    }

    fn write32(&mut self, offset: usize, value: u32) -> Result<()> {
        check_access(offset, self.size())?;
        let i = offset / ACCESS_BYTES;
        let mask = self.writable[i];
        self.words[i] = (self.words[i] & !mask) | (value & mask);
        self.writes.fetch_add(1, Ordering::Relaxed);
        trace!("Write u32 @ {offset:#x} = {value:#x} (stored {:#x})", self.words[i]);
        Ok(())
    }

    fn size(&self) -> usize {
        self.words.len() * ACCESS_BYTES
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Software
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::I3cError;

    #[test]
    fn read_only_words_drop_stores() {
        let mut m = SoftwareRegisters::i3c_controller(0x1000);
        m.write32(regs::HCI_VERSION, 0).unwrap();
        assert_eq!(m.read32(regs::HCI_VERSION).unwrap(), 0x120);
    }

    #[test]
    fn partially_writable_word() {
        let mut m = SoftwareRegisters::i3c_controller(0x1000);
        m.write32(regs::PIO_CONTROL, 0xFFFF_FFFF).unwrap();
        assert_eq!(m.read32(regs::PIO_CONTROL).unwrap(), 0x7);
    }

    #[test]
    fn reset_control_keeps_request_bits() {
        let mut m = SoftwareRegisters::i3c_controller(0x1000);
        m.write32(regs::RESET_CONTROL, 0xFFFF_FFFF).unwrap();
        assert_eq!(m.read32(regs::RESET_CONTROL).unwrap(), 0x3F);
    }

    #[test]
    fn dct_index_is_the_only_writable_section_field() {
        let mut m = SoftwareRegisters::i3c_controller(0x1000);
        m.write32(regs::DCT_SECTION_OFFSET, 0xFFFF_FFFF).unwrap();
        let raw = m.read32(regs::DCT_SECTION_OFFSET).unwrap();
        assert_eq!(section_offset::TABLE_INDEX.get(raw), 0x1F);
        assert_eq!(section_offset::TABLE_OFFSET.get(raw), 0x800);
        assert_eq!(section_offset::TABLE_SIZE.get(raw), 0x7F);
        assert_eq!(section_offset::ENTRY_SIZE.get(raw), 0);

        m.write32(regs::DAT_SECTION_OFFSET, 0xFFFF_FFFF).unwrap();
        assert_eq!(m.read32(regs::DAT_SECTION_OFFSET).unwrap(), reset::DAT_SECTION_OFFSET);
    }

    #[test]
    fn reset_restores_values() {
        let mut m = SoftwareRegisters::i3c_controller(0x1000);
        m.write32(regs::HC_CONTROL, 0x8000_0000).unwrap();
        m.write32(0x400, 0xdead_beef).unwrap();
        m.reset();
        assert_eq!(m.peek(regs::HC_CONTROL), Some(reset::HC_CONTROL));
        assert_eq!(m.peek(0x400), Some(0));
    }

    #[test]
    fn counts_transactions() {
        let mut m = SoftwareRegisters::new(64);
        m.write32(0, 1).unwrap();
        let _ = m.read32(0).unwrap();
        let _ = m.read32(4).unwrap();
        assert_eq!(m.stats(), TransactionStats { reads: 2, writes: 1 });
        m.reset_stats();
        assert_eq!(m.stats().total(), 0);
    }

    #[test]
    fn rejects_bad_offsets_without_counting() {
        let mut m = SoftwareRegisters::new(16);
        assert!(matches!(m.read32(1), Err(I3cError::Misaligned { .. })));
        assert!(matches!(m.write32(16, 0), Err(I3cError::OutOfBounds { .. })));
        assert_eq!(m.stats().total(), 0);
    }
}
