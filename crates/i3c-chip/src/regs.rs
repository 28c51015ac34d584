//! CSR map of the I3C host controller (HCI 1.2 register layout).
//!
//! Offsets are bytes from the controller's base address. Field descriptors
//! carry the `(low, mask)` pairs of the register description unchanged.
//!
//! ```text
//! 0x000  I3CBASE      HCI capability and operational registers
//! 0x080  PIOCONTROL   PIO queues, thresholds and control
//! 0x100  I3C_EC       extended capabilities
//! 0x400  DAT          Device Address Table   (see `table`)
//! 0x800  DCT          Device Characteristics Table
//! ```

// ── I3CBASE ──────────────────────────────────────────────────────────────────

/// HCI version, read-only. Reads [`reset::HCI_VERSION`].
pub const HCI_VERSION: usize = 0x000;
/// Host controller control.
pub const HC_CONTROL: usize = 0x004;
/// Controller's own dynamic address.
pub const CONTROLLER_DEVICE_ADDR: usize = 0x008;
/// Host controller capabilities, read-only.
pub const HC_CAPABILITIES: usize = 0x00C;
/// Soft reset and queue reset requests.
pub const RESET_CONTROL: usize = 0x010;
/// Present state.
pub const PRESENT_STATE: usize = 0x014;
/// Interrupt status.
pub const INTR_STATUS: usize = 0x020;
/// Interrupt status enable.
pub const INTR_STATUS_ENABLE: usize = 0x024;
/// Interrupt signal enable.
pub const INTR_SIGNAL_ENABLE: usize = 0x028;
/// Interrupt force.
pub const INTR_FORCE: usize = 0x02C;
/// DAT location, size and entry size.
pub const DAT_SECTION_OFFSET: usize = 0x030;
/// DCT location, size and entry size.
pub const DCT_SECTION_OFFSET: usize = 0x034;
/// Ring headers section offset.
pub const RING_HEADERS_SECTION_OFFSET: usize = 0x038;
/// PIO section offset.
pub const PIO_SECTION_OFFSET: usize = 0x03C;
/// Extended capabilities section offset.
pub const EXT_CAPS_SECTION_OFFSET: usize = 0x040;
/// Internal control commands enable.
pub const INT_CTRL_CMDS_EN: usize = 0x04C;
/// IBI notification control.
pub const IBI_NOTIFY_CTRL: usize = 0x058;
/// IBI data abort control.
pub const IBI_DATA_ABORT_CTRL: usize = 0x05C;
/// Device context base, low word.
pub const DEV_CTX_BASE_LO: usize = 0x060;
/// Device context base, high word.
pub const DEV_CTX_BASE_HI: usize = 0x064;
/// Device context scatter-gather.
pub const DEV_CTX_SG: usize = 0x068;

// ── PIOCONTROL ───────────────────────────────────────────────────────────────

/// Command descriptor port (write).
pub const COMMAND_PORT: usize = 0x080;
/// Response descriptor port (read).
pub const RESPONSE_PORT: usize = 0x084;
/// TX data port (write), shares its offset with [`RX_DATA_PORT`].
pub const TX_DATA_PORT: usize = 0x088;
/// RX data port (read).
pub const RX_DATA_PORT: usize = 0x088;
/// IBI port (read).
pub const IBI_PORT: usize = 0x08C;
/// Queue thresholds.
pub const QUEUE_THLD_CTRL: usize = 0x090;
/// Data buffer thresholds.
pub const DATA_BUFFER_THLD_CTRL: usize = 0x094;
/// Queue and buffer sizes, read-only.
pub const QUEUE_SIZE: usize = 0x098;
/// Alternate queue sizes.
pub const ALT_QUEUE_SIZE: usize = 0x09C;
/// PIO interrupt status.
pub const PIO_INTR_STATUS: usize = 0x0A0;
/// PIO interrupt status enable.
pub const PIO_INTR_STATUS_ENABLE: usize = 0x0A4;
/// PIO interrupt signal enable.
pub const PIO_INTR_SIGNAL_ENABLE: usize = 0x0A8;
/// PIO interrupt force.
pub const PIO_INTR_FORCE: usize = 0x0AC;
/// PIO control. Only the three LSBs are writable.
pub const PIO_CONTROL: usize = 0x0B0;

// ── Extended capabilities ────────────────────────────────────────────────────

/// First extended capability header (secure firmware recovery interface).
pub const EXTCAP_BASE: usize = 0x100;

// ── Field descriptors ────────────────────────────────────────────────────────

/// `HCI_VERSION` fields.
pub mod hci_version {
    use crate::field::Field;
    /// Whole register.
    pub const VERSION: Field = Field::new(0, 0xFFFF_FFFF);
}

/// `HC_CONTROL` fields.
pub mod hc_control {
    use crate::field::Field;
    /// Include the I3C broadcast address in private transfers.
    pub const IBA_INCLUDE: Field = Field::new(0, 0x0000_0001);
    /// Auto-command data report.
    pub const AUTOCMD_DATA_RPT: Field = Field::new(3, 0x0000_0008);
    /// Data byte order, 0 for little endian.
    pub const DATA_BYTE_ORDER_MODE: Field = Field::new(4, 0x0000_0010);
    /// Controller operating mode, 1 for I3C.
    pub const MODE_SELECTOR: Field = Field::new(6, 0x0000_0040);
    /// Legacy I2C devices on the bus.
    pub const I2C_DEV_PRESENT: Field = Field::new(7, 0x0000_0080);
    /// Reject hot-join requests.
    pub const HOT_JOIN_CTRL: Field = Field::new(8, 0x0000_0100);
    /// Halt when a command sequence times out.
    pub const HALT_ON_CMD_SEQ_TIMEOUT: Field = Field::new(12, 0x0000_1000);
    /// Abort the current transfer.
    pub const ABORT: Field = Field::new(29, 0x2000_0000);
    /// Resume after an error halt.
    pub const RESUME: Field = Field::new(30, 0x4000_0000);
    /// Enable the bus.
    pub const BUS_ENABLE: Field = Field::new(31, 0x8000_0000);
}

/// `CONTROLLER_DEVICE_ADDR` fields.
pub mod controller_device_addr {
    use crate::field::Field;
    /// Dynamic address.
    pub const DYNAMIC_ADDR: Field = Field::new(16, 0x007F_0000);
    /// Dynamic address is valid.
    pub const DYNAMIC_ADDR_VALID: Field = Field::new(31, 0x8000_0000);
}

/// `RESET_CONTROL` request bits, self-clearing in hardware.
pub mod reset_control {
    use crate::field::Field;
    /// Whole-controller soft reset.
    pub const SOFT_RST: Field = Field::new(0, 0x01);
    /// Command queue reset.
    pub const CMD_QUEUE_RST: Field = Field::new(1, 0x02);
    /// Response queue reset.
    pub const RESP_QUEUE_RST: Field = Field::new(2, 0x04);
    /// TX FIFO reset.
    pub const TX_FIFO_RST: Field = Field::new(3, 0x08);
    /// RX FIFO reset.
    pub const RX_FIFO_RST: Field = Field::new(4, 0x10);
    /// IBI queue reset.
    pub const IBI_QUEUE_RST: Field = Field::new(5, 0x20);
}

/// `INTR_STATUS` bits.
pub mod intr_status {
    use crate::field::Field;
    /// Internal error.
    pub const HC_INTERNAL_ERR: Field = Field::new(10, 0x0400);
    /// Command sequence cancelled.
    pub const HC_SEQ_CANCEL: Field = Field::new(11, 0x0800);
    /// Command sequence stalled.
    pub const HC_WARN_CMD_SEQ_STALL: Field = Field::new(12, 0x1000);
    /// Command sequence timed out.
    pub const HC_ERR_CMD_SEQ_TIMEOUT: Field = Field::new(13, 0x2000);
    /// Scheduled command missed its tick.
    pub const SCHED_CMD_MISSED_TICK: Field = Field::new(14, 0x4000);
}

/// Layout shared by `DAT_SECTION_OFFSET` and `DCT_SECTION_OFFSET`.
pub mod section_offset {
    use crate::field::Field;
    /// Byte offset of the table from the controller base.
    pub const TABLE_OFFSET: Field = Field::new(0, 0x0000_0FFF);
    /// Number of entries the table holds.
    pub const TABLE_SIZE: Field = Field::new(12, 0x0007_F000);
    /// DCT only: index of the next entry hardware will fill.
    pub const TABLE_INDEX: Field = Field::new(19, 0x00F8_0000);
    /// Entry size encoding; 0 means the default width.
    pub const ENTRY_SIZE: Field = Field::new(28, 0xF000_0000);
}

/// `QUEUE_SIZE` fields, read-only.
pub mod queue_size {
    use crate::field::Field;
    /// Command and response queue depth.
    pub const CR_QUEUE_SIZE: Field = Field::new(0, 0x0000_00FF);
    /// IBI status queue depth.
    pub const IBI_STATUS_SIZE: Field = Field::new(8, 0x0000_FF00);
    /// Encoded as N, the buffer holds 2^(N+1) DWORDs.
    pub const RX_DATA_BUFFER_SIZE: Field = Field::new(16, 0x00FF_0000);
    /// Encoded as N, the buffer holds 2^(N+1) DWORDs.
    pub const TX_DATA_BUFFER_SIZE: Field = Field::new(24, 0xFF00_0000);
}

/// `PIO_CONTROL` bits.
pub mod pio_control {
    use crate::field::Field;
    /// PIO enable.
    pub const ENABLE: Field = Field::new(0, 0x1);
    /// Run/stop.
    pub const RS: Field = Field::new(1, 0x2);
    /// Abort queued PIO operations.
    pub const ABORT: Field = Field::new(2, 0x4);
}

/// Every software-writable bit of `PIO_CONTROL`.
pub const PIO_CONTROL_WRITABLE: u32 = 0x7;

/// Every request bit of `RESET_CONTROL`.
pub const RESET_CONTROL_WRITABLE: u32 = 0x3F;

// ── Reset values ─────────────────────────────────────────────────────────────

/// Values the CSRs hold after reset.
pub mod reset {
    use super::section_offset;

    /// HCI version 1.2.
    pub const HCI_VERSION: u32 = 0x120;
    /// MODE_SELECTOR set out of reset.
    pub const HC_CONTROL: u32 = 1 << 6;
    /// DAT at 0x400, TABLE_SIZE 0x7F.
    pub const DAT_SECTION_OFFSET: u32 =
        section_offset::TABLE_SIZE.set(crate::table::DAT_OFFSET as u32, 0x7F);
    /// DCT at 0x800, TABLE_SIZE 0x7F.
    pub const DCT_SECTION_OFFSET: u32 =
        section_offset::TABLE_SIZE.set(crate::table::DCT_OFFSET as u32, 0x7F);
    /// Internal control commands enabled out of reset.
    pub const INT_CTRL_CMDS_EN: u32 = 0x35 << 1 | 0x1;
    /// Every queue threshold at 1.
    pub const QUEUE_THLD_CTRL: u32 = 0x1 << 24 | 0x1 << 16 | 0x1 << 8 | 0x1;
    /// Every buffer threshold at 1.
    pub const DATA_BUFFER_THLD_CTRL: u32 = 0x1 << 24 | 0x1 << 16 | 0x1 << 8 | 0x1;
    /// TX/RX data buffers of 2^(5+1) DWORDs, 64-entry command and IBI queues.
    pub const QUEUE_SIZE: u32 = 0x5 << 24 | 0x5 << 16 | 0x40 << 8 | 0x40;
}

/// Decode a `*_DATA_BUFFER_SIZE` field into a size in DWORDs.
#[must_use]
pub const fn buffer_size_dwords(encoded: u32) -> u32 {
    1 << (encoded + 1)
}

/// All named CSRs, for dumps and sweeps.
pub const ALL: &[(&str, usize)] = &[
    ("HCI_VERSION", HCI_VERSION),
    ("HC_CONTROL", HC_CONTROL),
    ("CONTROLLER_DEVICE_ADDR", CONTROLLER_DEVICE_ADDR),
    ("HC_CAPABILITIES", HC_CAPABILITIES),
    ("RESET_CONTROL", RESET_CONTROL),
    ("PRESENT_STATE", PRESENT_STATE),
    ("INTR_STATUS", INTR_STATUS),
    ("INTR_STATUS_ENABLE", INTR_STATUS_ENABLE),
    ("INTR_SIGNAL_ENABLE", INTR_SIGNAL_ENABLE),
    ("INTR_FORCE", INTR_FORCE),
    ("DAT_SECTION_OFFSET", DAT_SECTION_OFFSET),
    ("DCT_SECTION_OFFSET", DCT_SECTION_OFFSET),
    ("RING_HEADERS_SECTION_OFFSET", RING_HEADERS_SECTION_OFFSET),
    ("PIO_SECTION_OFFSET", PIO_SECTION_OFFSET),
    ("EXT_CAPS_SECTION_OFFSET", EXT_CAPS_SECTION_OFFSET),
    ("INT_CTRL_CMDS_EN", INT_CTRL_CMDS_EN),
    ("IBI_NOTIFY_CTRL", IBI_NOTIFY_CTRL),
    ("IBI_DATA_ABORT_CTRL", IBI_DATA_ABORT_CTRL),
    ("DEV_CTX_BASE_LO", DEV_CTX_BASE_LO),
    ("DEV_CTX_BASE_HI", DEV_CTX_BASE_HI),
    ("DEV_CTX_SG", DEV_CTX_SG),
    ("QUEUE_THLD_CTRL", QUEUE_THLD_CTRL),
    ("DATA_BUFFER_THLD_CTRL", DATA_BUFFER_THLD_CTRL),
    ("QUEUE_SIZE", QUEUE_SIZE),
    ("ALT_QUEUE_SIZE", ALT_QUEUE_SIZE),
    ("PIO_INTR_STATUS", PIO_INTR_STATUS),
    ("PIO_INTR_STATUS_ENABLE", PIO_INTR_STATUS_ENABLE),
    ("PIO_INTR_SIGNAL_ENABLE", PIO_INTR_SIGNAL_ENABLE),
    ("PIO_INTR_FORCE", PIO_INTR_FORCE),
    ("PIO_CONTROL", PIO_CONTROL),
];

/// Look up a CSR offset by name (case-insensitive).
#[must_use]
pub fn by_name(name: &str) -> Option<usize> {
    ALL.iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, offset)| offset)
}
