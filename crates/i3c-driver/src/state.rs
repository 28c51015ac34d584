//! Test harness bookkeeping
//!
//! Interrupt-received flags for every peripheral on the SoC interrupt
//! controller, an interrupt counter, and a reset counter that survives
//! [`HarnessState::record_reset`]. One value is created at startup and passed
//! to whatever raises or inspects interrupts.

use std::fmt;

/// Peripheral that can raise an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptSource {
    /// Deobfuscation engine
    Doe,
    /// ECC engine
    Ecc,
    /// HMAC engine
    Hmac,
    /// Key vault
    KeyVault,
    /// SHA-512 engine
    Sha512,
    /// SHA-256 engine
    Sha256,
    /// QSPI controller
    Qspi,
    /// UART
    Uart,
    /// I3C host controller
    I3c,
    /// SoC interface
    SocIfc,
    /// SHA-512 accelerator
    Sha512Acc,
}

impl InterruptSource {
    /// Every source, in interrupt-controller order.
    pub const ALL: [Self; 11] = [
        Self::Doe,
        Self::Ecc,
        Self::Hmac,
        Self::KeyVault,
        Self::Sha512,
        Self::Sha256,
        Self::Qspi,
        Self::Uart,
        Self::I3c,
        Self::SocIfc,
        Self::Sha512Acc,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for InterruptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Doe => "doe",
            Self::Ecc => "ecc",
            Self::Hmac => "hmac",
            Self::KeyVault => "kv",
            Self::Sha512 => "sha512",
            Self::Sha256 => "sha256",
            Self::Qspi => "qspi",
            Self::Uart => "uart",
            Self::I3c => "i3c",
            Self::SocIfc => "soc_ifc",
            Self::Sha512Acc => "sha512_acc",
        };
        f.write_str(name)
    }
}

/// Error or notification line of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptKind {
    /// Error interrupt
    Error,
    /// Notification interrupt
    Notification,
}

impl InterruptKind {
    const fn index(self) -> usize {
        match self {
            Self::Error => 0,
            Self::Notification => 1,
        }
    }
}

/// Harness-wide mutable state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessState {
    received: [[bool; 2]; InterruptSource::ALL.len()],
    interrupt_count: u32,
    reset_count: u32,
}

impl HarnessState {
    /// Clear flags, zero counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that `source` raised a `kind` interrupt.
    pub fn record_interrupt(&mut self, source: InterruptSource, kind: InterruptKind) {
        self.received[source.index()][kind.index()] = true;
        self.interrupt_count = self.interrupt_count.wrapping_add(1);
        tracing::debug!("Interrupt {source} {kind:?} (#{})", self.interrupt_count);
    }

    /// Whether a `kind` interrupt from `source` is pending.
    pub const fn is_pending(&self, source: InterruptSource, kind: InterruptKind) -> bool {
        self.received[source.index()][kind.index()]
    }

    /// Clear the flag and return whether it was set.
    pub fn take(&mut self, source: InterruptSource, kind: InterruptKind) -> bool {
        std::mem::take(&mut self.received[source.index()][kind.index()])
    }

    /// Sources with a pending error interrupt.
    pub fn pending_errors(&self) -> impl Iterator<Item = InterruptSource> + '_ {
        InterruptSource::ALL
            .into_iter()
            .filter(move |s| self.is_pending(*s, InterruptKind::Error))
    }

    /// Interrupts recorded since startup or the last reset.
    pub const fn interrupt_count(&self) -> u32 {
        self.interrupt_count
    }

    /// Resets recorded since startup.
    pub const fn reset_count(&self) -> u32 {
        self.reset_count
    }

    /// A warm reset: flags and the interrupt counter clear, the reset
    /// counter increments.
    pub fn record_reset(&mut self) {
        self.received = Default::default();
        self.interrupt_count = 0;
        self.reset_count = self.reset_count.wrapping_add(1);
        tracing::info!("Reset #{}", self.reset_count);
    }
}
