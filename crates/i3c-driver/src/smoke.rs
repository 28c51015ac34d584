//! CSR, DAT and DCT smoke sequence
//!
//! A fixed script over the controller: write, read back, compare. Every
//! comparison is recorded whether it passes or not; the script never branches
//! on a result. Only transport errors stop it early.

use crate::backend::RegisterTransport;
use crate::controller::I3cController;
use crate::error::Result;
use crate::state::{HarnessState, InterruptKind, InterruptSource};
use i3c_chip::regs::{self, controller_device_addr, hc_control, queue_size, reset};
use i3c_chip::table::{dat, dct};
use std::fmt;
use tracing::{info, warn};

/// Dynamic address the controller assigns itself.
pub const TEST_ADDR: u32 = 0x5F;
/// Static address programmed into DAT entry 0.
pub const TEST_STATIC_ADDR: u32 = 0x50;
/// NACK retry count programmed into DAT entry 0.
pub const TEST_RETRY_COUNT: u32 = 2;
/// DAT entry exercised with a whole-entry write.
pub const DAT_TEST_INDEX: usize = 5;
/// Words written to [`DAT_TEST_INDEX`].
pub const DAT_TEST_WORDS: [u32; 2] = [0xdead_beef, 0xabcd_9876];
/// DCT entry exercised with a whole-entry write.
pub const DCT_TEST_INDEX: usize = 3;
/// Words written to [`DCT_TEST_INDEX`]: PID, DCR 0xC6, BCR 0x27, address 0x09.
pub const DCT_TEST_WORDS: [u32; 4] = [0x0123_4567, 0x0000_89AB, 0x0000_27C6, 0x0000_0009];
/// TX/RX data buffer size encoding out of reset (2^(5+1) DWORDs).
pub const BUFFER_SIZE_AT_RESET: u32 = 5;
/// PIO_CONTROL after writing all ones.
pub const PIO_CONTROL_ENABLED: u32 = regs::PIO_CONTROL_WRITABLE;

/// One expected/actual comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// What was compared
    pub name: String,
    /// Expected value
    pub expected: u32,
    /// Value read back
    pub actual: u32,
}

impl Check {
    /// Whether the value read back matches.
    pub const fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            write!(f, "PASS  {}: {:#x}", self.name, self.actual)
        } else {
            write!(
                f,
                "FAIL  {}: expected {:#x}, got {:#x}",
                self.name, self.expected, self.actual
            )
        }
    }
}

/// Outcome of a smoke run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmokeReport {
    checks: Vec<Check>,
}

impl SmokeReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a comparison.
    pub fn check(&mut self, name: impl Into<String>, expected: u32, actual: u32) {
        let check = Check { name: name.into(), expected, actual };
        if check.passed() {
            info!("{check}");
        } else {
            warn!("{check}");
        }
        self.checks.push(check);
    }

    /// All recorded checks, in order.
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Checks that did not match.
    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| !c.passed())
    }

    /// Number of passing checks.
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    /// Number of failing checks.
    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    /// True when every check passed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

impl fmt::Display for SmokeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            writeln!(f, "{check}")?;
        }
        write!(f, "{} passed, {} failed", self.passed(), self.failed())
    }
}

/// Run the smoke sequence against `ctrl`.
///
/// Leaves the controller enabled with the test values programmed.
///
/// # Errors
///
/// Returns error if a register access fails. Value mismatches are not
/// errors; they are recorded in the report.
pub fn run<T: RegisterTransport>(
    ctrl: &mut I3cController<T>,
    state: &HarnessState,
) -> Result<SmokeReport> {
    let mut report = SmokeReport::new();

    // ── I3CBASE ──
    info!("Testing I3C base registers");
    let mut csr = ctrl.csr();
    csr.write_register(regs::HCI_VERSION, 0)?;
    report.check("HCI_VERSION", reset::HCI_VERSION, csr.read_register(regs::HCI_VERSION)?);

    csr.write_field(regs::HC_CONTROL, hc_control::BUS_ENABLE, 1)?;
    report.check(
        "HC_CONTROL.BUS_ENABLE",
        1,
        csr.read_field(regs::HC_CONTROL, hc_control::BUS_ENABLE)?,
    );

    csr.write_field(regs::CONTROLLER_DEVICE_ADDR, controller_device_addr::DYNAMIC_ADDR, TEST_ADDR)?;
    csr.write_field(
        regs::CONTROLLER_DEVICE_ADDR,
        controller_device_addr::DYNAMIC_ADDR_VALID,
        1,
    )?;
    report.check(
        "CONTROLLER_DEVICE_ADDR.DYNAMIC_ADDR",
        TEST_ADDR,
        csr.read_field(regs::CONTROLLER_DEVICE_ADDR, controller_device_addr::DYNAMIC_ADDR)?,
    );
    report.check(
        "CONTROLLER_DEVICE_ADDR.DYNAMIC_ADDR_VALID",
        1,
        csr.read_field(regs::CONTROLLER_DEVICE_ADDR, controller_device_addr::DYNAMIC_ADDR_VALID)?,
    );

    // ── PIOCONTROL ──
    info!("Testing I3C PIO control registers");
    report.check(
        "QUEUE_SIZE.TX_DATA_BUFFER_SIZE",
        BUFFER_SIZE_AT_RESET,
        csr.read_field(regs::QUEUE_SIZE, queue_size::TX_DATA_BUFFER_SIZE)?,
    );
    report.check(
        "QUEUE_SIZE.RX_DATA_BUFFER_SIZE",
        BUFFER_SIZE_AT_RESET,
        csr.read_field(regs::QUEUE_SIZE, queue_size::RX_DATA_BUFFER_SIZE)?,
    );

    csr.write_register(regs::PIO_CONTROL, u32::MAX)?;
    report.check("PIO_CONTROL", PIO_CONTROL_ENABLED, csr.read_register(regs::PIO_CONTROL)?);

    // ── DAT ──
    info!("Testing DAT memory");
    let mut table = ctrl.dat();
    table.write_entry(DAT_TEST_INDEX, &DAT_TEST_WORDS)?;
    let words = table.read_words::<2>(DAT_TEST_INDEX)?;
    for (i, (&expected, actual)) in DAT_TEST_WORDS.iter().zip(words).enumerate() {
        report.check(format!("DAT[{DAT_TEST_INDEX}] word {i}"), expected, actual);
    }

    table.write_field(0, dat::STATIC_ADDRESS, TEST_STATIC_ADDR)?;
    table.write_field(0, dat::DYNAMIC_ADDRESS, TEST_ADDR)?;
    table.write_field(0, dat::DEV_NACK_RETRY_CNT, TEST_RETRY_COUNT)?;
    report.check(
        "DAT[0].DEV_NACK_RETRY_CNT",
        TEST_RETRY_COUNT,
        table.read_field(0, dat::DEV_NACK_RETRY_CNT)?,
    );
    report.check("DAT[0].STATIC_ADDRESS", TEST_STATIC_ADDR, table.read_field(0, dat::STATIC_ADDRESS)?);
    report.check("DAT[0].DYNAMIC_ADDRESS", TEST_ADDR, table.read_field(0, dat::DYNAMIC_ADDRESS)?);

    // ── DCT ──
    info!("Testing DCT memory");
    let mut table = ctrl.dct();
    table.write_entry(DCT_TEST_INDEX, &DCT_TEST_WORDS)?;
    let words = table.read_words::<4>(DCT_TEST_INDEX)?;
    for (i, (&expected, actual)) in DCT_TEST_WORDS.iter().zip(words).enumerate() {
        report.check(format!("DCT[{DCT_TEST_INDEX}] word {i}"), expected, actual);
    }
    report.check(
        format!("DCT[{DCT_TEST_INDEX}].DCR"),
        dct::DCR.get(DCT_TEST_WORDS[2]),
        table.read_field(DCT_TEST_INDEX, dct::DCR)?,
    );
    report.check(
        format!("DCT[{DCT_TEST_INDEX}].BCR"),
        dct::BCR.get(DCT_TEST_WORDS[2]),
        table.read_field(DCT_TEST_INDEX, dct::BCR)?,
    );

    report.check(
        "I3C error interrupt",
        0,
        u32::from(state.is_pending(InterruptSource::I3c, InterruptKind::Error)),
    );

    info!("Smoke run: {} passed, {} failed", report.passed(), report.failed());
    Ok(report)
}
