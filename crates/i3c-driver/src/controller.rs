//! Controller facade
//!
//! Owns one transport and hands out borrowed accessors for the three address
//! spaces. Mutating accessors borrow the controller mutably, so the single
//! writer discipline the read-modify-write sequences rely on is enforced by
//! the borrow checker.

use crate::backend::RegisterTransport;
use crate::config::{check_layout_fits, I3cConfig};
use crate::csr::Registers;
use crate::error::{I3cError, Result};
use crate::table::Table;
use i3c_chip::field::Field;
use i3c_chip::regs::{self, section_offset};
use i3c_chip::{DatEntry, DctEntry, Space, TableKind, TableLayout};
use tracing::{info, warn};

/// Accessor for one address space, see [`I3cController::space`].
#[derive(Debug)]
pub enum SpaceView<'a, T: RegisterTransport> {
    /// Flat CSR space, located by byte offset
    Csr(Registers<'a, T>),
    /// DAT or DCT, located by entry index
    Table(Table<'a, T>),
}

impl<T: RegisterTransport> SpaceView<'_, T> {
    /// Read `field` at `location`.
    ///
    /// # Errors
    ///
    /// Propagates accessor errors.
    pub fn read_field(&self, location: usize, field: Field) -> Result<u32> {
        match self {
            Self::Csr(regs) => regs.read_field(location, field),
            Self::Table(table) => table.read_field(location, field),
        }
    }

    /// Read-modify-write `field` at `location`.
    ///
    /// # Errors
    ///
    /// Propagates accessor errors.
    pub fn write_field(&mut self, location: usize, field: Field, value: u32) -> Result<()> {
        match self {
            Self::Csr(regs) => regs.write_field(location, field, value),
            Self::Table(table) => table.write_field(location, field, value),
        }
    }
}

/// I3C host controller register window.
#[derive(Debug)]
pub struct I3cController<T: RegisterTransport> {
    io: T,
    dat: TableLayout,
    dct: TableLayout,
}

impl<T: RegisterTransport> I3cController<T> {
    /// Controller with the default table layouts.
    pub fn new(io: T) -> Self {
        Self::with_layouts(io, TableLayout::DAT, TableLayout::DCT)
    }

    /// Controller with explicit table layouts.
    pub fn with_layouts(io: T, dat: TableLayout, dct: TableLayout) -> Self {
        Self { io, dat, dct }
    }

    /// Controller using the layouts from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the config is invalid or a table does not fit the
    /// transport's window.
    pub fn from_config(io: T, config: &I3cConfig) -> Result<Self> {
        config.validate()?;
        let ctrl = Self::with_layouts(io, config.dat, config.dct);
        ctrl.check_fits(&ctrl.dat)?;
        ctrl.check_fits(&ctrl.dct)?;
        Ok(ctrl)
    }

    fn check_fits(&self, layout: &TableLayout) -> Result<()> {
        check_layout_fits(layout, self.io.size())
    }

    /// Underlying transport.
    pub const fn transport(&self) -> &T {
        &self.io
    }

    /// Underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.io
    }

    /// Give the transport back.
    pub fn into_inner(self) -> T {
        self.io
    }

    /// Current layout of `kind`.
    pub const fn layout(&self, kind: TableKind) -> &TableLayout {
        match kind {
            TableKind::Dat => &self.dat,
            TableKind::Dct => &self.dct,
        }
    }

    /// CSR space accessor.
    pub fn csr(&mut self) -> Registers<'_, T> {
        Registers::new(&mut self.io, 0)
    }

    /// DAT accessor.
    pub fn dat(&mut self) -> Table<'_, T> {
        Table::new(&mut self.io, self.dat)
    }

    /// DCT accessor.
    pub fn dct(&mut self) -> Table<'_, T> {
        Table::new(&mut self.io, self.dct)
    }

    /// Accessor for either table.
    pub fn table(&mut self, kind: TableKind) -> Table<'_, T> {
        match kind {
            TableKind::Dat => self.dat(),
            TableKind::Dct => self.dct(),
        }
    }

    /// Accessor for `space`.
    pub fn space(&mut self, space: Space) -> SpaceView<'_, T> {
        match space.table() {
            None => SpaceView::Csr(self.csr()),
            Some(kind) => SpaceView::Table(self.table(kind)),
        }
    }

    /// Read a field in any space.
    ///
    /// `location` is a byte offset for [`Space::Csr`] and an entry index for
    /// the tables.
    ///
    /// # Errors
    ///
    /// Propagates accessor errors.
    pub fn read_field(&mut self, space: Space, location: usize, field: Field) -> Result<u32> {
        self.space(space).read_field(location, field)
    }

    /// Write a field in any space. See [`read_field`](Self::read_field).
    ///
    /// # Errors
    ///
    /// Propagates accessor errors.
    pub fn write_field(
        &mut self,
        space: Space,
        location: usize,
        field: Field,
        value: u32,
    ) -> Result<()> {
        self.space(space).write_field(location, field, value)
    }

    /// Read a DAT entry and decode it.
    ///
    /// # Errors
    ///
    /// Propagates accessor errors.
    pub fn read_dat_entry(&mut self, index: usize) -> Result<DatEntry> {
        self.dat().read_words::<2>(index).map(DatEntry::from_words)
    }

    /// Encode and write a DAT entry.
    ///
    /// # Errors
    ///
    /// Propagates accessor errors.
    pub fn write_dat_entry(&mut self, index: usize, entry: &DatEntry) -> Result<()> {
        self.dat().write_entry(index, &entry.to_words())
    }

    /// Read a DCT entry and decode it.
    ///
    /// # Errors
    ///
    /// Propagates accessor errors.
    pub fn read_dct_entry(&mut self, index: usize) -> Result<DctEntry> {
        self.dct().read_words::<4>(index).map(DctEntry::from_words)
    }

    /// Encode and write a DCT entry.
    ///
    /// # Errors
    ///
    /// Propagates accessor errors.
    pub fn write_dct_entry(&mut self, index: usize, entry: &DctEntry) -> Result<()> {
        self.dct().write_entry(index, &entry.to_words())
    }

    /// Adopt the table layouts the controller advertises.
    ///
    /// Reads `DAT_SECTION_OFFSET` and `DCT_SECTION_OFFSET`. A zero offset or
    /// size keeps the current layout for that table; a non-default entry size
    /// is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns error if a section register cannot be read or an advertised
    /// table does not fit the window.
    pub fn discover_layout(&mut self) -> Result<(TableLayout, TableLayout)> {
        let dat = self.discover_one(regs::DAT_SECTION_OFFSET, self.dat)?;
        let dct = self.discover_one(regs::DCT_SECTION_OFFSET, self.dct)?;
        self.check_fits(&dat)?;
        self.check_fits(&dct)?;
        self.dat = dat;
        self.dct = dct;
        info!(
            "Discovered DAT @ {:#x} x {}, DCT @ {:#x} x {}",
            dat.offset, dat.capacity, dct.offset, dct.capacity
        );
        Ok((dat, dct))
    }

    fn discover_one(&mut self, reg: usize, current: TableLayout) -> Result<TableLayout> {
        let raw = self.csr().read_register(reg)?;
        let offset = section_offset::TABLE_OFFSET.get(raw) as usize;
        let size = section_offset::TABLE_SIZE.get(raw) as usize;
        let entry_size = section_offset::ENTRY_SIZE.get(raw);

        if entry_size != 0 {
            warn!(
                "{} advertises entry size {entry_size}, keeping {} words",
                current.kind, current.entry_words
            );
        }

        let mut layout = current;
        if offset != 0 {
            layout = layout.with_offset(offset);
        }
        if size != 0 {
            layout = layout.with_capacity(size);
        }
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::software::SoftwareRegisters;
    use i3c_chip::regs::hc_control;
    use i3c_chip::table::dat;

    fn controller() -> I3cController<SoftwareRegisters> {
        I3cController::new(SoftwareRegisters::i3c_controller(0x1000))
    }

    #[test]
    fn spaces_route_to_their_memories() {
        let mut ctrl = controller();
        ctrl.write_field(Space::Csr, regs::HC_CONTROL, hc_control::BUS_ENABLE, 1).unwrap();
        ctrl.write_field(Space::Dat, 3, dat::STATIC_ADDRESS, 0x22).unwrap();
        ctrl.write_field(Space::Dct, 3, Field::new(0, 0xFF), 0x33).unwrap();

        let io = ctrl.transport();
        assert_eq!(io.peek(regs::HC_CONTROL), Some(0x8000_0040));
        assert_eq!(io.peek(0x400 + 3 * 8), Some(0x22));
        assert_eq!(io.peek(0x800 + 3 * 16), Some(0x33));
    }

    #[test]
    fn typed_dat_entries() {
        let mut ctrl = controller();
        let entry = DatEntry {
            static_address: 0x50,
            dynamic_address: 0x5F,
            ring_id: 3,
            autocmd_mode: 5,
            ..DatEntry::default()
        };
        ctrl.write_dat_entry(9, &entry).unwrap();
        assert_eq!(ctrl.read_dat_entry(9).unwrap(), entry);
        assert_eq!(ctrl.dat().read_field(9, dat::RING_ID).unwrap(), 3);
    }

    #[test]
    fn typed_dct_entries() {
        let mut ctrl = controller();
        let entry = DctEntry { pid: 0xA1B2_C3D4_E5F6, dcr: 0xC6, bcr: 0x27, dynamic_address: 0x09 };
        ctrl.write_dct_entry(127, &entry).unwrap();
        assert_eq!(ctrl.read_dct_entry(127).unwrap(), entry);
    }

    #[test]
    fn discovery_reads_section_offsets() {
        let mut ctrl = controller();
        let (dat, dct) = ctrl.discover_layout().unwrap();
        assert_eq!(dat.offset, 0x400);
        assert_eq!(dat.capacity, 0x7F);
        assert_eq!(dct.offset, 0x800);
        assert_eq!(ctrl.layout(TableKind::Dat).capacity, 0x7F);
        assert!(ctrl.dat().write_entry(0x7F, &[0]).is_err());
    }

    #[test]
    fn discovery_rejects_tables_past_the_window() {
        let io = SoftwareRegisters::i3c_controller(0x1000)
            .with_register(regs::DCT_SECTION_OFFSET, 0x7F << 12 | 0xC00, 0);
        let mut ctrl = I3cController::new(io);
        assert!(matches!(ctrl.discover_layout(), Err(I3cError::InvalidConfig { .. })));
        assert_eq!(ctrl.layout(TableKind::Dct).offset, 0x800);
    }

    #[test]
    fn overflowing_layouts_are_rejected() {
        let io = SoftwareRegisters::i3c_controller(0x1000);
        let config = I3cConfig {
            dct: TableLayout::DCT.with_capacity(usize::MAX / 2),
            ..I3cConfig::default()
        };
        let err = I3cController::from_config(io, &config).unwrap_err();
        assert!(matches!(err, I3cError::InvalidConfig { .. }));

        let mut ctrl = I3cController::with_layouts(
            SoftwareRegisters::i3c_controller(0x1000),
            TableLayout::DAT,
            TableLayout::DCT.with_offset(usize::MAX),
        );
        assert!(matches!(ctrl.check_fits(&ctrl.dct), Err(I3cError::InvalidConfig { .. })));
        assert!(ctrl.discover_layout().is_ok());
    }

    #[test]
    fn config_must_fit_transport() {
        let io = SoftwareRegisters::i3c_controller(0x800);
        let err = I3cController::from_config(io, &I3cConfig::default()).unwrap_err();
        assert!(matches!(err, I3cError::InvalidConfig { .. }));
    }
}
