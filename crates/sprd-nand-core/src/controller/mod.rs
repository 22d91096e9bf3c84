//! NAND controller session
//!
//! [`NandController`] is the single owning handle for one controller and
//! its attached device. It holds everything the command stream mutates:
//! the tracker state, the armed ECC direction, the latched ID and the
//! staging buffer the generic layer reads and writes page bytes through.

mod callbacks;
mod config;

pub use callbacks::NandCallbacks;
pub use config::ControllerConfig;

use log::{debug, error, info, trace, warn};

use crate::dispatch::{Dispatcher, ReadyStatus};
use crate::ecc::{self, EccCode, EccMode, PageCorrection};
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::mover;
use crate::regs::opcodes::{self, MAX_OOB_SIZE, MAX_PAGE_SIZE};
use crate::regs::{HwBuffer, IntSource, NfcBus, Register, AHB_CTL0_NFC_EN};
use crate::tracker::{AreaMode, CtrlFlags, NandCommand, OperationAddress, Token, Tracker, WriteReadMode};

/// Size of the staging buffer: largest page plus largest spare area
pub const STAGING_SIZE: usize = MAX_PAGE_SIZE + MAX_OOB_SIZE;

/// Controller session for one attached NAND device
pub struct NandController<B: NfcBus> {
    bus: B,
    geometry: Geometry,
    config: ControllerConfig,
    dispatcher: Dispatcher,
    tracker: Tracker,
    ecc_mode: EccMode,
    flash_id: u32,
    staging: [u8; STAGING_SIZE],
}

impl<B: NfcBus> NandController<B> {
    /// Attach to a controller and bring it up
    ///
    /// Enables the NFC clocks and interrupt sources, deasserts write
    /// protect and programs the timing for the configured AHB clock.
    /// The geometry is fixed for the lifetime of the session.
    pub fn attach(bus: B, geometry: Geometry, config: ControllerConfig) -> Result<Self> {
        geometry.validate()?;

        let mut nfc = Self {
            bus,
            geometry,
            config,
            dispatcher: Dispatcher::new(&geometry, config.timeout_polls),
            tracker: Tracker::default(),
            ecc_mode: EccMode::None,
            flash_id: 0,
            staging: [0xFF; STAGING_SIZE],
        };
        nfc.init_hw();

        info!(
            "SC88xx NAND: {} byte pages, {} byte spare, {} pages per block",
            geometry.page_size,
            geometry.oob_size,
            geometry.pages_per_block()
        );
        Ok(nfc)
    }

    fn init_hw(&mut self) {
        self.bus.set_bits(Register::AhbCtl0, AHB_CTL0_NFC_EN);
        self.bus.set_bits(Register::IntSrc, IntSource::all().bits());
        self.bus.write_reg(Register::Wpn, 1);
        self.bus.write_reg(Register::MemDelay, 0);
        self.dispatcher
            .set_timing(&mut self.bus, self.config.ahb_clock_mhz);
    }

    /// Release the controller and hand back the bus
    pub fn detach(self) -> B {
        self.bus
    }

    /// Configuration in use
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Underlying bus, mutable
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Direction of the in-flight operation
    pub fn mode(&self) -> WriteReadMode {
        self.tracker.mode
    }

    /// Area of the in-flight operation
    pub fn area(&self) -> AreaMode {
        self.tracker.area
    }

    /// Address collected for the in-flight operation
    pub fn address(&self) -> &OperationAddress {
        &self.tracker.address
    }

    /// Staging buffer contents
    pub fn staging(&self) -> &[u8] {
        &self.staging
    }

    fn handle_address(&mut self, value: u32) {
        let Some((row, area)) = self.tracker.push_address(value, &self.geometry) else {
            return;
        };
        let window = match area {
            AreaMode::Oob => self.geometry.oob_window(row),
            _ => self.geometry.data_window(row),
        };
        self.dispatcher.program_window(&mut self.bus, window);
    }

    fn handle_command(&mut self, cmd: NandCommand) -> Result<()> {
        trace!("command {:?}", cmd);
        match cmd {
            NandCommand::Reset => {
                let result = self.dispatcher.issue_plain(&mut self.bus, opcodes::RESET);
                self.bus.delay_us(self.config.reset_delay_us);
                result
            }
            NandCommand::Status => self.capture_status(),
            NandCommand::ReadId => {
                self.dispatcher.issue_plain(&mut self.bus, opcodes::READID)?;
                self.flash_id = self.bus.read_reg(Register::IdStatus);
                debug!("NAND id 0x{:08x}", self.flash_id);
                Ok(())
            }
            NandCommand::Erase1 => {
                self.tracker.address.reset();
                Ok(())
            }
            NandCommand::Erase2 => self.erase(),
            NandCommand::Read0 => {
                self.abandon_in_flight();
                self.tracker.begin(WriteReadMode::Read);
                mover::fill_erased(&mut self.staging);
                Ok(())
            }
            NandCommand::ReadStart => {
                let result = self.read_start();
                self.tracker.finish();
                result
            }
            NandCommand::SeqIn => {
                self.abandon_in_flight();
                self.tracker.begin(WriteReadMode::Write);
                mover::fill_erased(&mut self.staging);
                Ok(())
            }
            NandCommand::PageProg => {
                let result = self.page_program();
                self.tracker.finish();
                result
            }
        }
    }

    fn abandon_in_flight(&self) {
        if self.tracker.in_flight() {
            debug!("{:?} operation abandoned before its confirm", self.tracker.mode);
        }
    }

    fn capture_status(&mut self) -> Result<()> {
        self.dispatcher.issue_plain(&mut self.bus, opcodes::STATUS)?;
        let raw = self.bus.read_reg(Register::IdStatus);
        mover::fill_erased(&mut self.staging);
        mover::copy(&raw.to_be_bytes(), &mut self.staging);
        Ok(())
    }

    fn erase(&mut self) -> Result<()> {
        let Some(row) = self.tracker.address.erase_row() else {
            error!("erase address error: no address phase before ERASE2");
            return Err(Error::AddressNotSet);
        };
        self.dispatcher.erase(&mut self.bus, &self.geometry, row)
    }

    fn read_start(&mut self) -> Result<()> {
        let page = self.geometry.page_size as usize;
        let oob = self.geometry.oob_size as usize;

        match self.tracker.area {
            AreaMode::Oob => {
                self.dispatcher
                    .issue_page_op(&mut self.bus, opcodes::READ0, false)?;
                mover::copy(self.bus.buffer(HwBuffer::Spare), &mut self.staging[..oob]);
            }
            AreaMode::Data | AreaMode::DataOob => {
                // page reads always bring the spare along for the ECC path
                self.tracker.area = AreaMode::DataOob;
                self.open_combined_window();
                self.dispatcher
                    .issue_page_op(&mut self.bus, opcodes::READ0, true)?;
                mover::copy(self.bus.buffer(HwBuffer::Main), &mut self.staging[..page]);
            }
            AreaMode::None => {
                warn!(
                    "READSTART with unsupported column 0x{:x}",
                    self.tracker.address.column()
                );
            }
        }
        Ok(())
    }

    fn page_program(&mut self) -> Result<()> {
        let page = self.geometry.page_size as usize;
        let oob = self.geometry.oob_size as usize;

        match self.tracker.area {
            AreaMode::Oob => {
                mover::copy(&self.staging[..oob], self.bus.buffer(HwBuffer::Spare));
                self.dispatcher
                    .issue_page_op(&mut self.bus, opcodes::SEQIN, false)
            }
            AreaMode::Data => {
                mover::copy(&self.staging[..page], self.bus.buffer(HwBuffer::Main));
                self.dispatcher
                    .issue_page_op(&mut self.bus, opcodes::SEQIN, false)
            }
            AreaMode::DataOob => {
                // main buffer was filled by the ECC capture, spare by write_oob
                self.open_combined_window();
                self.dispatcher
                    .issue_page_op(&mut self.bus, opcodes::SEQIN, true)
            }
            AreaMode::None => {
                warn!(
                    "PAGEPROG with unsupported column 0x{:x}",
                    self.tracker.address.column()
                );
                Ok(())
            }
        }
    }

    /// Unbound the window end so data and spare move in one transfer
    fn open_combined_window(&mut self) {
        let window = self.geometry.combined_window(self.tracker.address.row());
        self.bus.write_reg(Register::End0, window.end);
    }

    fn read_ecc_registers(&mut self) -> EccCode {
        let mut regs = [0u32; 4];
        for (i, reg) in regs.iter_mut().enumerate().take(self.geometry.ecc_steps()) {
            *reg = self.bus.read_reg(Register::PageEcc(i as u8));
        }
        ecc::code_from_registers(regs)
    }
}

impl<B: NfcBus> NandCallbacks for NandController<B> {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn select_chip(&mut self, chip: i32) {
        trace!("select chip {}", chip);
    }

    fn cmd_ctrl(&mut self, dat: i32, ctrl: CtrlFlags) -> Result<()> {
        match Token::decode(dat, ctrl) {
            Token::None => Ok(()),
            Token::Unknown(opcode) => {
                debug!("ignoring unsupported NAND opcode 0x{:02x}", opcode);
                Ok(())
            }
            Token::Address(value) => {
                self.handle_address(value);
                Ok(())
            }
            Token::Command(cmd) => self.handle_command(cmd),
        }
    }

    fn dev_ready(&mut self) -> Result<ReadyStatus> {
        self.dispatcher.read_status(&mut self.bus)
    }

    fn read_id(&self) -> u32 {
        self.flash_id
    }

    fn write_oob(&mut self) {
        let oob = self.geometry.oob_size as usize;
        mover::copy(&self.staging[..oob], self.bus.buffer(HwBuffer::Spare));
        self.tracker.area = self.tracker.area.with_oob();
    }

    fn enable_hwecc(&mut self, mode: EccMode) {
        self.ecc_mode = mode;
    }

    fn calculate_ecc(&mut self) -> Result<EccCode> {
        let page = self.geometry.page_size as usize;
        let oob = self.geometry.oob_size as usize;

        match core::mem::take(&mut self.ecc_mode) {
            EccMode::Write => {
                self.bus.write_reg(Register::EccEn, 1);
                mover::copy(&self.staging[..page], self.bus.buffer(HwBuffer::Main));
                let code = self.read_ecc_registers();
                self.bus.write_reg(Register::EccEn, 0);
                mover::fill_erased(&mut self.staging);
                Ok(code)
            }
            EccMode::Read => {
                let code = self.read_ecc_registers();
                mover::fill_erased(&mut self.staging);
                mover::copy(self.bus.buffer(HwBuffer::Spare), &mut self.staging[..oob]);
                Ok(code)
            }
            EccMode::None => {
                warn!("ECC calculation requested but hardware ECC is not armed");
                Err(Error::EccNotArmed)
            }
        }
    }

    fn correct_data(&mut self, dat: &mut [u8], read_ecc: &[u8], calc_ecc: &[u8]) -> PageCorrection {
        let report = ecc::correct_page(dat, read_ecc, calc_ecc, self.geometry.ecc_steps());
        let outcome = report.outcome();
        if outcome != PageCorrection::Clean {
            debug!("ECC {:?} ({:?})", outcome, report.steps());
        }
        outcome
    }

    fn read_buf(&mut self, buf: &mut [u8]) {
        mover::copy(&self.staging, buf);
    }

    fn write_buf(&mut self, buf: &[u8]) {
        mover::copy(buf, &mut self.staging);
    }

    fn read_byte(&mut self) -> u8 {
        self.staging[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::{StatusBits, CMD_BUSY};
    use std::vec::Vec;

    /// Register block double that records every write
    struct MockBus {
        writes: Vec<(Register, u32)>,
        ahb_ctl0: u32,
        int_src: u32,
        id_status: u32,
        page_ecc: [u32; 4],
        stuck_busy: bool,
        main: [u8; 2048],
        spare: [u8; 64],
        delayed_us: u32,
    }

    impl MockBus {
        fn new() -> Self {
            Self {
                writes: Vec::new(),
                ahb_ctl0: 0x1,
                int_src: 0,
                id_status: StatusBits::READY.bits() | StatusBits::WRITE_ENABLED.bits(),
                page_ecc: [0; 4],
                stuck_busy: false,
                main: [0; 2048],
                spare: [0; 64],
                delayed_us: 0,
            }
        }

        fn writes_to(&self, reg: Register) -> Vec<u32> {
            self.writes
                .iter()
                .filter(|(r, _)| *r == reg)
                .map(|(_, v)| *v)
                .collect()
        }
    }

    impl NfcBus for MockBus {
        fn read_reg(&mut self, reg: Register) -> u32 {
            match reg {
                Register::Cmd if self.stuck_busy => CMD_BUSY,
                Register::IdStatus => self.id_status,
                Register::PageEcc(i) => self.page_ecc[i as usize],
                Register::AhbCtl0 => self.ahb_ctl0,
                Register::IntSrc => self.int_src,
                _ => 0,
            }
        }

        fn write_reg(&mut self, reg: Register, value: u32) {
            match reg {
                Register::AhbCtl0 => self.ahb_ctl0 = value,
                Register::IntSrc => self.int_src = value,
                _ => {}
            }
            self.writes.push((reg, value));
        }

        fn buffer(&mut self, buf: HwBuffer) -> &mut [u8] {
            match buf {
                HwBuffer::Main => &mut self.main,
                HwBuffer::Spare => &mut self.spare,
            }
        }

        fn delay_us(&mut self, us: u32) {
            self.delayed_us += us;
        }
    }

    fn attach() -> NandController<MockBus> {
        let config = ControllerConfig::default().with_timeout_polls(16);
        let mut nfc = NandController::attach(MockBus::new(), Geometry::LARGE_PAGE, config).unwrap();
        nfc.bus_mut().writes.clear();
        nfc
    }

    fn cmd(nfc: &mut NandController<MockBus>, opcode: u8) -> Result<()> {
        nfc.cmd_ctrl(opcode as i32, CtrlFlags::CLE | CtrlFlags::NCE)
    }

    fn addr(nfc: &mut NandController<MockBus>, value: u32) {
        nfc.cmd_ctrl(value as i32, CtrlFlags::ALE | CtrlFlags::NCE)
            .unwrap();
    }

    const PAGE_SETTING: u32 = 0x8084_0000;
    const DATA_OOB: u32 = 1 << 21;

    #[test]
    fn test_attach_initialises_controller() {
        let nfc = NandController::attach(
            MockBus::new(),
            Geometry::LARGE_PAGE,
            ControllerConfig::default(),
        )
        .unwrap();
        let bus = nfc.detach();

        assert_eq!(bus.ahb_ctl0, 0x1 | AHB_CTL0_NFC_EN);
        assert_eq!(bus.int_src, 0x31);
        assert_eq!(bus.writes_to(Register::Wpn), [1]);
        assert_eq!(bus.writes_to(Register::MemDelay), [0]);
        assert_eq!(bus.writes_to(Register::Para), [opcodes::PARA_53MHZ]);
    }

    #[test]
    fn test_attach_rejects_bad_geometry() {
        let geometry = Geometry {
            page_size: 4096,
            oob_size: 128,
            block_size: 256 * 1024,
        };
        let result = NandController::attach(MockBus::new(), geometry, ControllerConfig::default());
        assert_eq!(result.err(), Some(Error::InvalidGeometry));
    }

    #[test]
    fn test_erase_uses_row_address() {
        let mut nfc = attach();
        cmd(&mut nfc, opcodes::ERASE1).unwrap();
        addr(&mut nfc, 0x00);
        addr(&mut nfc, 0x10);
        nfc.bus_mut().writes.clear();
        cmd(&mut nfc, opcodes::ERASE2).unwrap();

        let g = Geometry::LARGE_PAGE;
        let (block, page) = g.split_row(0x10);
        let expected = block * 64 * 2048 * 2 + page * 2048 * 2;
        assert_eq!(
            nfc.bus().writes,
            [
                (Register::Str0, expected),
                (Register::Cmd, PAGE_SETTING | opcodes::ERASE1 as u32),
            ]
        );
    }

    #[test]
    fn test_erase_folds_single_phase_into_row() {
        let mut nfc = attach();
        cmd(&mut nfc, opcodes::ERASE1).unwrap();
        addr(&mut nfc, 0x80);
        cmd(&mut nfc, opcodes::ERASE2).unwrap();

        assert_eq!(nfc.bus().writes_to(Register::Str0), [0x80 * 2048 * 2]);
    }

    #[test]
    fn test_erase_without_address_touches_nothing() {
        let mut nfc = attach();
        cmd(&mut nfc, opcodes::ERASE1).unwrap();
        nfc.bus_mut().writes.clear();

        assert_eq!(cmd(&mut nfc, opcodes::ERASE2), Err(Error::AddressNotSet));
        assert!(nfc.bus().writes.is_empty());
    }

    #[test]
    fn test_page_read_sequence() {
        let mut nfc = attach();
        for (i, b) in nfc.bus_mut().main.iter_mut().enumerate() {
            *b = i as u8;
        }

        cmd(&mut nfc, opcodes::READ0).unwrap();
        assert_eq!(nfc.mode(), WriteReadMode::Read);
        addr(&mut nfc, 0);
        addr(&mut nfc, 5);
        assert_eq!(nfc.area(), AreaMode::Data);
        cmd(&mut nfc, opcodes::READSTART).unwrap();

        let base = 5 * 2048 * 2;
        assert_eq!(
            nfc.bus().writes,
            [
                (Register::Str0, base),
                (Register::End0, base + 2047),
                (Register::End0, u32::MAX),
                (Register::Cmd, PAGE_SETTING | DATA_OOB | opcodes::READ0 as u32),
            ]
        );
        assert_eq!(nfc.mode(), WriteReadMode::None);
        assert_eq!(nfc.area(), AreaMode::None);

        let mut data = [0u8; 2048];
        nfc.read_buf(&mut data);
        assert_eq!(data, nfc.bus().main);
    }

    #[test]
    fn test_oob_read_sequence() {
        let mut nfc = attach();
        nfc.bus_mut().spare = [0x3C; 64];

        cmd(&mut nfc, opcodes::READ0).unwrap();
        addr(&mut nfc, 2048);
        addr(&mut nfc, 0x41);
        assert_eq!(nfc.area(), AreaMode::Oob);
        cmd(&mut nfc, opcodes::READSTART).unwrap();

        let base = 64 * 2048 * 2 + 2048 * 2;
        assert_eq!(nfc.bus().writes_to(Register::Str0), [base + 2048]);
        assert_eq!(nfc.bus().writes_to(Register::End0), [base + 2048 + 63]);
        assert_eq!(
            nfc.bus().writes_to(Register::Cmd),
            [PAGE_SETTING | opcodes::READ0 as u32]
        );
        assert_eq!(nfc.staging()[..64], [0x3C; 64]);
        assert_eq!(nfc.staging()[64], 0xFF);
    }

    #[test]
    fn test_program_with_ecc_and_oob() {
        let mut nfc = attach();
        nfc.bus_mut().page_ecc = [0xA1B2_C300, 0x0102_0300, 0x0405_0600, 0x0708_0900];

        let data: Vec<u8> = (0..2048).map(|i| (i * 3) as u8).collect();
        cmd(&mut nfc, opcodes::SEQIN).unwrap();
        assert_eq!(nfc.mode(), WriteReadMode::Write);
        addr(&mut nfc, 0);
        addr(&mut nfc, 2);
        nfc.write_buf(&data);

        nfc.enable_hwecc(EccMode::Write);
        let code = nfc.calculate_ecc().unwrap();
        assert_eq!(
            code,
            [0xA1, 0xB2, 0xC3, 1, 2, 3, 4, 5, 6, 7, 8, 9]
        );
        assert_eq!(nfc.bus().main[..], data[..]);
        assert_eq!(nfc.bus().writes_to(Register::EccEn), [1, 0]);
        assert!(nfc.staging().iter().all(|&b| b == 0xFF));

        let mut oob = [0xFFu8; 64];
        oob[52..].copy_from_slice(&code);
        nfc.write_buf(&oob);
        nfc.write_oob();
        assert_eq!(nfc.area(), AreaMode::DataOob);
        assert_eq!(nfc.bus().spare, oob);

        nfc.bus_mut().writes.clear();
        cmd(&mut nfc, opcodes::PAGEPROG).unwrap();
        assert_eq!(
            nfc.bus().writes,
            [
                (Register::End0, u32::MAX),
                (Register::Cmd, PAGE_SETTING | DATA_OOB | opcodes::SEQIN as u32),
            ]
        );
        assert_eq!(nfc.mode(), WriteReadMode::None);
    }

    #[test]
    fn test_program_data_only() {
        let mut nfc = attach();
        cmd(&mut nfc, opcodes::SEQIN).unwrap();
        addr(&mut nfc, 0);
        addr(&mut nfc, 9);
        nfc.write_buf(&[0x5A; 2048]);
        cmd(&mut nfc, opcodes::PAGEPROG).unwrap();

        assert_eq!(nfc.bus().main, [0x5A; 2048]);
        assert_eq!(
            nfc.bus().writes_to(Register::Cmd),
            [PAGE_SETTING | opcodes::SEQIN as u32]
        );
    }

    #[test]
    fn test_program_oob_only() {
        let mut nfc = attach();
        cmd(&mut nfc, opcodes::SEQIN).unwrap();
        addr(&mut nfc, 2048);
        addr(&mut nfc, 1);
        nfc.write_buf(&[0x00; 4]);
        cmd(&mut nfc, opcodes::PAGEPROG).unwrap();

        assert_eq!(nfc.bus().spare[..4], [0; 4]);
        assert_eq!(nfc.bus().spare[4], 0xFF);
    }

    #[test]
    fn test_read_path_ecc_recovers_spare() {
        let mut nfc = attach();
        nfc.bus_mut().page_ecc = [0x1122_3300, 0, 0, 0x4455_6600];
        nfc.bus_mut().spare = [0x77; 64];

        nfc.enable_hwecc(EccMode::Read);
        let code = nfc.calculate_ecc().unwrap();
        assert_eq!(code[..3], [0x11, 0x22, 0x33]);
        assert_eq!(code[9..], [0x44, 0x55, 0x66]);
        assert_eq!(nfc.staging()[..64], [0x77; 64]);
        assert_eq!(nfc.staging()[64], 0xFF);
        assert!(nfc.bus().writes_to(Register::EccEn).is_empty());
    }

    #[test]
    fn test_ecc_requires_arming() {
        let mut nfc = attach();
        assert_eq!(nfc.calculate_ecc(), Err(Error::EccNotArmed));

        nfc.enable_hwecc(EccMode::Read);
        assert!(nfc.calculate_ecc().is_ok());
        // one shot
        assert_eq!(nfc.calculate_ecc(), Err(Error::EccNotArmed));
    }

    #[test]
    fn test_status_and_ready() {
        let mut nfc = attach();
        nfc.bus_mut().id_status = 0xE0;
        cmd(&mut nfc, opcodes::STATUS).unwrap();
        let mut status = [0u8; 4];
        nfc.read_buf(&mut status);
        assert_eq!(u32::from_be_bytes(status), 0xE0);
        assert_eq!(nfc.staging()[4], 0xFF);
        assert_eq!(nfc.dev_ready(), Ok(ReadyStatus::Ready));

        nfc.bus_mut().id_status = 0x80;
        assert_eq!(nfc.dev_ready(), Ok(ReadyStatus::Busy));

        nfc.bus_mut().id_status = 0xC1;
        assert_eq!(nfc.dev_ready(), Ok(ReadyStatus::Fail));
    }

    #[test]
    fn test_ready_reports_timeout() {
        let mut nfc = attach();
        nfc.bus_mut().stuck_busy = true;
        assert_eq!(nfc.dev_ready(), Err(Error::Timeout));
    }

    #[test]
    fn test_timeout_still_closes_operation() {
        let mut nfc = attach();
        cmd(&mut nfc, opcodes::READ0).unwrap();
        addr(&mut nfc, 0);
        addr(&mut nfc, 1);
        nfc.bus_mut().stuck_busy = true;

        assert_eq!(cmd(&mut nfc, opcodes::READSTART), Err(Error::Timeout));
        assert_eq!(nfc.mode(), WriteReadMode::None);
        assert_eq!(nfc.area(), AreaMode::None);
    }

    #[test]
    fn test_read_id_and_reset() {
        let mut nfc = attach();
        nfc.bus_mut().id_status = 0xECF1_0095;
        cmd(&mut nfc, opcodes::READID).unwrap();
        assert_eq!(nfc.read_id(), 0xECF1_0095);

        cmd(&mut nfc, opcodes::RESET).unwrap();
        assert_eq!(nfc.bus().delayed_us, 2000);
        assert_eq!(
            nfc.bus().writes_to(Register::Cmd),
            [0x8000_0090, 0x8000_00FF]
        );
    }

    #[test]
    fn test_ignored_tokens() {
        let mut nfc = attach();
        nfc.cmd_ctrl(opcodes::CMD_NONE, CtrlFlags::CHANGE).unwrap();
        nfc.cmd_ctrl(0x42, CtrlFlags::NCE).unwrap();
        cmd(&mut nfc, 0xEE).unwrap();
        assert!(nfc.bus().writes.is_empty());

        cmd(&mut nfc, opcodes::READ0).unwrap();
        addr(&mut nfc, 0);
        addr(&mut nfc, 3);
        nfc.bus_mut().writes.clear();
        addr(&mut nfc, 7);
        assert!(nfc.bus().writes.is_empty());
        assert_eq!(nfc.address().row(), 3);
    }

    #[test]
    fn test_correct_data_small_page() {
        let mut nfc = NandController::attach(
            MockBus::new(),
            Geometry::SMALL_PAGE,
            ControllerConfig::default(),
        )
        .unwrap();

        let original = [0x96u8; 512];
        let stored = ecc::hamming::calculate(&original);
        let mut data = original;
        data[77] ^= 0x08;
        let calc = ecc::hamming::calculate(&data);

        assert_eq!(
            nfc.correct_data(&mut data, &stored, &calc),
            PageCorrection::Corrected { bits: 1 }
        );
        assert_eq!(data, original);
    }
}
