//! Algebraic properties of the register and table accessors
//!
//! Run against the software model: `SoftwareRegisters::new` is fully
//! writable, `i3c_controller` carries the read-only masks.

use i3c_driver::layout::{DAT_CAPACITY, DCT_CAPACITY};
use i3c_driver::{
    Field, I3cController, Registers, RegisterTransport, SoftwareRegisters, Table, TableLayout,
};
use proptest::prelude::*;

const WINDOW: usize = 0x1000;

/// A contiguous field: low bit plus a width that still fits the word.
fn field() -> impl Strategy<Value = Field> {
    (0u8..32).prop_flat_map(|low| (Just(low), 1u8..=(32 - low)).prop_map(|(l, w)| Field::bits(l, w)))
}

fn csr_offset() -> impl Strategy<Value = usize> {
    (0usize..0x100).prop_map(|w| w * 4)
}

proptest! {
    #[test]
    fn field_round_trip_keeps_other_bits(
        offset in csr_offset(),
        initial in any::<u32>(),
        field in field(),
        value in any::<u32>(),
    ) {
        let mut io = SoftwareRegisters::new(WINDOW);
        io.poke(offset, initial);
        let mut csr = Registers::new(&mut io, 0);
        csr.write_field(offset, field, value).unwrap();

        prop_assert_eq!(csr.read_field(offset, field).unwrap(), value & field.max_value());
        let raw = csr.read_register(offset).unwrap();
        prop_assert_eq!(raw & !field.mask, initial & !field.mask);
    }

    #[test]
    fn field_access_costs_at_most_two_transactions(
        offset in csr_offset(),
        field in field(),
        value in any::<u32>(),
    ) {
        let mut io = SoftwareRegisters::new(WINDOW);
        Registers::new(&mut io, 0).write_field(offset, field, value).unwrap();
        prop_assert_eq!(io.stats().total(), 2);

        io.reset_stats();
        let _ = Registers::new(&mut io, 0).read_field(offset, field).unwrap();
        prop_assert_eq!(io.stats().total(), 1);
    }

    #[test]
    fn dat_entry_round_trip(index in 0..DAT_CAPACITY, words in any::<[u32; 2]>()) {
        let mut io = SoftwareRegisters::i3c_controller(WINDOW);
        let mut dat = Table::new(&mut io, TableLayout::DAT);
        dat.write_entry(index, &words).unwrap();
        prop_assert_eq!(dat.read_entry(index, 2).unwrap(), words.to_vec());
    }

    #[test]
    fn dct_entry_round_trip(index in 0..DCT_CAPACITY, words in any::<[u32; 4]>()) {
        let mut io = SoftwareRegisters::i3c_controller(WINDOW);
        let mut dct = Table::new(&mut io, TableLayout::DCT);
        dct.write_entry(index, &words).unwrap();
        prop_assert_eq!(dct.read_words::<4>(index).unwrap(), words);
    }

    #[test]
    fn dat_entries_do_not_overlap(
        i in 0..DAT_CAPACITY,
        j in 0..DAT_CAPACITY,
        before in any::<[u32; 2]>(),
        after in any::<[u32; 2]>(),
    ) {
        prop_assume!(i != j);
        let mut io = SoftwareRegisters::i3c_controller(WINDOW);
        let mut dat = Table::new(&mut io, TableLayout::DAT);
        dat.write_entry(j, &before).unwrap();
        dat.write_entry(i, &after).unwrap();
        prop_assert_eq!(dat.read_words::<2>(j).unwrap(), before);
    }

    #[test]
    fn dct_entries_do_not_overlap(
        i in 0..DCT_CAPACITY,
        j in 0..DCT_CAPACITY,
        before in any::<[u32; 4]>(),
        after in any::<[u32; 4]>(),
    ) {
        prop_assume!(i != j);
        let mut io = SoftwareRegisters::i3c_controller(WINDOW);
        let mut dct = Table::new(&mut io, TableLayout::DCT);
        dct.write_entry(j, &before).unwrap();
        dct.write_entry(i, &after).unwrap();
        prop_assert_eq!(dct.read_words::<4>(j).unwrap(), before);
        prop_assert_eq!(dct.read_words::<4>(i).unwrap(), after);
    }

    #[test]
    fn dword_halves_are_independent(index in 0..DCT_CAPACITY, lo in any::<u64>(), hi in any::<u64>()) {
        let mut io = SoftwareRegisters::i3c_controller(WINDOW);
        let mut dct = Table::new(&mut io, TableLayout::DCT);
        dct.write_dword(index, 0, lo).unwrap();
        dct.write_dword(index, 1, hi).unwrap();
        prop_assert_eq!(dct.read_dword(index, 0).unwrap(), lo);
        prop_assert_eq!(dct.read_dword(index, 1).unwrap(), hi);
    }

    #[test]
    fn indices_past_capacity_never_reach_the_bus(index in DAT_CAPACITY..usize::MAX, value in any::<u32>()) {
        let mut io = SoftwareRegisters::i3c_controller(WINDOW);
        let mut dat = Table::new(&mut io, TableLayout::DAT);
        prop_assert!(dat.write_entry(index, &[value]).is_err());
        prop_assert!(dat.read_entry(index, 1).is_err());
        prop_assert_eq!(io.stats().total(), 0);
    }
}

#[test]
fn read_only_register_ignores_writes() {
    let mut ctrl = I3cController::new(SoftwareRegisters::i3c_controller(WINDOW));
    let before = ctrl.csr().read_register(i3c_driver::regs::HCI_VERSION).unwrap();
    ctrl.csr().write_register(i3c_driver::regs::HCI_VERSION, !before).unwrap();
    assert_eq!(ctrl.csr().read_register(i3c_driver::regs::HCI_VERSION).unwrap(), before);
}

#[test]
fn adjacent_fields_are_isolated() {
    let mut io = SoftwareRegisters::new(WINDOW);
    let low = Field::new(0, 0x0F);
    let high = Field::new(4, 0xF0);
    let mut csr = Registers::new(&mut io, 0);
    csr.write_field(0x40, low, 0xA).unwrap();
    csr.write_field(0x40, high, 0x5).unwrap();
    assert_eq!(csr.read_field(0x40, low).unwrap(), 0xA);
    assert_eq!(csr.read_field(0x40, high).unwrap(), 0x5);
    assert_eq!(csr.read_register(0x40).unwrap(), 0x5A);
    drop(csr);
    assert_eq!(io.backend_type(), i3c_driver::BackendType::Software);
}

#[test]
fn dat_scenario() {
    use i3c_driver::layout::dat;

    let mut ctrl = I3cController::new(SoftwareRegisters::i3c_controller(WINDOW));
    let mut table = ctrl.dat();
    table.write_entry(5, &[0xdead_beef, 0xabcd_9876]).unwrap();
    assert_eq!(table.read_entry(5, 2).unwrap(), [0xdead_beef, 0xabcd_9876]);

    table.write_field(0, dat::STATIC_ADDRESS, 0x50).unwrap();
    table.write_field(0, dat::DYNAMIC_ADDRESS, 0x5F).unwrap();
    table.write_field(0, dat::DEV_NACK_RETRY_CNT, 2).unwrap();
    assert_eq!(table.read_field(0, dat::DEV_NACK_RETRY_CNT).unwrap(), 2);
    assert_eq!(table.read_field(0, dat::STATIC_ADDRESS).unwrap(), 0x50);
    assert_eq!(table.read_field(0, dat::DYNAMIC_ADDRESS).unwrap(), 0x5F);

    let entry = ctrl.read_dat_entry(0).unwrap();
    assert_eq!(entry.dev_nack_retry_cnt, 2);
    assert_eq!(entry.static_address, 0x50);
    assert_eq!(entry.dynamic_address, 0x5F);
}
