//! Backend parity
//!
//! The same access sequence against the software model and against a mapped
//! file must observe the same values wherever the model has no read-only
//! bits.

use i3c_driver::layout::{dat, dct};
use i3c_driver::regs::{self, controller_device_addr, hc_control};
use i3c_driver::{
    DatEntry, DctEntry, I3cController, MmapRegion, RegisterTransport, SoftwareRegisters,
};

const WINDOW: usize = 0x1000;

/// Run a fixed sequence and collect every value read back.
fn exercise<T: RegisterTransport>(ctrl: &mut I3cController<T>) -> Vec<u32> {
    let mut seen = Vec::new();

    let mut csr = ctrl.csr();
    csr.write_field(regs::HC_CONTROL, hc_control::BUS_ENABLE, 1).unwrap();
    csr.write_field(regs::CONTROLLER_DEVICE_ADDR, controller_device_addr::DYNAMIC_ADDR, 0x2A)
        .unwrap();
    seen.push(csr.read_field(regs::HC_CONTROL, hc_control::BUS_ENABLE).unwrap());
    seen.push(csr.read_register(regs::CONTROLLER_DEVICE_ADDR).unwrap());

    for index in [0, 1, 63, 127] {
        let entry = DatEntry {
            static_address: 0x10 + index as u8,
            dynamic_address: 0x40 + index as u8,
            dev_nack_retry_cnt: 3,
            autocmd_hdr_code: 0xA5,
            ..DatEntry::default()
        };
        ctrl.write_dat_entry(index, &entry).unwrap();
        ctrl.write_field(i3c_driver::Space::Dat, index, dat::RING_ID, 6).unwrap();
        seen.extend(ctrl.dat().read_words::<2>(index).unwrap());

        let dev = DctEntry {
            pid: 0x0000_1234_5678_9ABC + index as u64,
            dcr: 0xC6,
            bcr: 0x27,
            dynamic_address: 0x40 + index as u8,
        };
        ctrl.write_dct_entry(index, &dev).unwrap();
        seen.push(ctrl.dct().read_field(index, dct::BCR).unwrap());
        seen.extend(ctrl.dct().read_words::<4>(index).unwrap());
    }
    seen
}

#[test]
fn software_and_mmap_agree() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    file.as_file().set_len(WINDOW as u64).expect("set_len");

    // HC_CONTROL resets with MODE_SELECTOR set in the model; mirror it in the file.
    let mut mapped = I3cController::new(MmapRegion::new(file.path(), 0, WINDOW).unwrap());
    mapped.csr().write_register(regs::HC_CONTROL, regs::reset::HC_CONTROL).unwrap();
    let mut model = I3cController::new(SoftwareRegisters::i3c_controller(WINDOW));

    assert_eq!(exercise(&mut mapped), exercise(&mut model));
    assert_eq!(model.transport().peek(regs::CONTROLLER_DEVICE_ADDR), Some(0x002A_0000));
}
