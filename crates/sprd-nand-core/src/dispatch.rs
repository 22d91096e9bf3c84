//! Controller command dispatch
//!
//! Turns completed operations into register programming: the transfer
//! window (`Str0`/`End0`), the packed command word and the bounded busy
//! wait that follows every command.

use log::{debug, error, trace};

use crate::error::{Error, Result};
use crate::geometry::{Geometry, Window};
use crate::regs::opcodes::{self, timing_for_clock};
use crate::regs::{CmdSetting, NfcBus, Register, StatusBits, CMD_BUSY};

/// Device readiness as reported by the status bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyStatus {
    /// The last program or erase failed
    Fail,
    /// The device is still working; poll again
    Busy,
    /// The device is idle
    Ready,
}

impl ReadyStatus {
    /// Classify a raw `IdStatus` value
    pub fn from_status(raw: u32) -> Self {
        let bits = StatusBits::from_bits_truncate(raw);
        if bits.contains(StatusBits::FAIL) {
            Self::Fail
        } else if !bits.contains(StatusBits::READY) {
            Self::Busy
        } else {
            Self::Ready
        }
    }
}

/// Programs the controller for one command at a time
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    page_setting: CmdSetting,
    timeout_polls: u32,
}

impl Dispatcher {
    /// Create a dispatcher for a device geometry
    pub fn new(geometry: &Geometry, timeout_polls: u32) -> Self {
        Self {
            page_setting: CmdSetting::for_page_op(geometry.is_large_page()),
            timeout_polls,
        }
    }

    /// Poll the busy bit until it clears
    ///
    /// Gives up after `timeout_polls` busy reads. A timeout leaves the
    /// controller as is; the caller must treat the transfer as failed.
    pub fn wait_command_finish<B: NfcBus + ?Sized>(&self, bus: &mut B) -> Result<()> {
        let mut polls = 0u32;
        loop {
            let cmd = bus.read_reg(Register::Cmd);
            if cmd & CMD_BUSY == 0 {
                trace!("command done after {} polls", polls);
                return Ok(());
            }
            polls += 1;
            if polls >= self.timeout_polls {
                error!(
                    "NFC command 0x{:08x} still busy after {} polls",
                    cmd, polls
                );
                return Err(Error::Timeout);
            }
        }
    }

    /// Write a command word and wait for it to complete
    pub fn issue<B: NfcBus + ?Sized>(
        &self,
        bus: &mut B,
        setting: CmdSetting,
        opcode: u8,
    ) -> Result<()> {
        let word = setting.command_word(opcode);
        debug!("NFC cmd 0x{:08x}", word);
        bus.write_reg(Register::Cmd, word);
        self.wait_command_finish(bus)
    }

    /// Issue a command that needs no window (reset, read ID, status)
    pub fn issue_plain<B: NfcBus + ?Sized>(&self, bus: &mut B, opcode: u8) -> Result<()> {
        self.issue(bus, CmdSetting::START, opcode)
    }

    /// Issue a page or block command using the programmed window
    pub fn issue_page_op<B: NfcBus + ?Sized>(
        &self,
        bus: &mut B,
        opcode: u8,
        combined: bool,
    ) -> Result<()> {
        let mut setting = self.page_setting;
        if combined {
            setting |= CmdSetting::DATA_OOB;
        }
        self.issue(bus, setting, opcode)
    }

    /// Program the transfer window
    pub fn program_window<B: NfcBus + ?Sized>(&self, bus: &mut B, window: Window) {
        debug!("NFC window 0x{:08x}..=0x{:08x}", window.start, window.end);
        bus.write_reg(Register::Str0, window.start);
        bus.write_reg(Register::End0, window.end);
    }

    /// Erase the block containing `row`
    pub fn erase<B: NfcBus + ?Sized>(
        &self,
        bus: &mut B,
        geometry: &Geometry,
        row: u32,
    ) -> Result<()> {
        let start = geometry.page_base(row);
        debug!("NFC erase row 0x{:x} at 0x{:08x}", row, start);
        bus.write_reg(Register::Str0, start);
        self.issue_page_op(bus, opcodes::ERASE1, false)
    }

    /// Issue STATUS and classify the result
    ///
    /// A timeout is reported as an error, never as one of the status
    /// outcomes.
    pub fn read_status<B: NfcBus + ?Sized>(&self, bus: &mut B) -> Result<ReadyStatus> {
        self.issue_plain(bus, opcodes::STATUS)?;
        let raw = bus.read_reg(Register::IdStatus);
        Ok(ReadyStatus::from_status(raw))
    }

    /// Program the timing parameters for an AHB clock
    ///
    /// Waits for any running command first. A timeout there is logged and
    /// the parameters are written anyway.
    pub fn set_timing<B: NfcBus + ?Sized>(&self, bus: &mut B, ahb_mhz: u32) {
        if self.wait_command_finish(bus).is_err() {
            error!("NFC busy while setting timing for {} MHz", ahb_mhz);
        }
        let para = timing_for_clock(ahb_mhz);
        debug!("NFC timing for {} MHz: 0x{:05x}", ahb_mhz, para);
        bus.write_reg(Register::Para, para);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::HwBuffer;

    /// Bus that stays busy for a fixed number of polls
    struct SlowBus {
        busy_for: u32,
        polls: u32,
        status: u32,
        writes: std::vec::Vec<(Register, u32)>,
        scratch: [u8; 4],
    }

    impl SlowBus {
        fn new(busy_for: u32) -> Self {
            Self {
                busy_for,
                polls: 0,
                status: StatusBits::READY.bits(),
                writes: std::vec::Vec::new(),
                scratch: [0; 4],
            }
        }
    }

    impl NfcBus for SlowBus {
        fn read_reg(&mut self, reg: Register) -> u32 {
            match reg {
                Register::Cmd => {
                    self.polls += 1;
                    if self.polls <= self.busy_for {
                        CMD_BUSY
                    } else {
                        0
                    }
                }
                Register::IdStatus => self.status,
                _ => 0,
            }
        }

        fn write_reg(&mut self, reg: Register, value: u32) {
            self.writes.push((reg, value));
        }

        fn buffer(&mut self, _buf: HwBuffer) -> &mut [u8] {
            &mut self.scratch
        }

        fn delay_us(&mut self, _us: u32) {}
    }

    #[test]
    fn test_ready_status_classification() {
        assert_eq!(ReadyStatus::from_status(0xE0), ReadyStatus::Ready);
        assert_eq!(ReadyStatus::from_status(0x60), ReadyStatus::Ready);
        assert_eq!(ReadyStatus::from_status(0x80), ReadyStatus::Busy);
        assert_eq!(ReadyStatus::from_status(0xE1), ReadyStatus::Fail);
        assert_eq!(ReadyStatus::from_status(0x01), ReadyStatus::Fail);
    }

    #[test]
    fn test_wait_completes_within_bound() {
        let d = Dispatcher::new(&Geometry::LARGE_PAGE, 100);
        let mut bus = SlowBus::new(10);
        assert!(d.wait_command_finish(&mut bus).is_ok());
        assert_eq!(bus.polls, 11);
    }

    #[test]
    fn test_wait_times_out() {
        let d = Dispatcher::new(&Geometry::LARGE_PAGE, 50);
        let mut bus = SlowBus::new(u32::MAX);
        assert_eq!(d.wait_command_finish(&mut bus), Err(Error::Timeout));
        assert_eq!(bus.polls, 50);
    }

    #[test]
    fn test_status_timeout_is_not_a_status() {
        let d = Dispatcher::new(&Geometry::LARGE_PAGE, 8);
        let mut bus = SlowBus::new(u32::MAX);
        assert_eq!(d.read_status(&mut bus), Err(Error::Timeout));

        let mut bus = SlowBus::new(0);
        bus.status = StatusBits::FAIL.bits() | StatusBits::READY.bits();
        assert_eq!(d.read_status(&mut bus), Ok(ReadyStatus::Fail));
    }

    #[test]
    fn test_erase_programs_start_and_command() {
        let g = Geometry::LARGE_PAGE;
        let d = Dispatcher::new(&g, 8);
        let mut bus = SlowBus::new(0);
        d.erase(&mut bus, &g, 0x40).unwrap();
        assert_eq!(
            bus.writes,
            std::vec![
                (Register::Str0, 0x40 * 2048 * 2),
                (Register::Cmd, 0x8084_0060),
            ]
        );
    }

    #[test]
    fn test_set_timing() {
        let d = Dispatcher::new(&Geometry::SMALL_PAGE, 8);
        let mut bus = SlowBus::new(0);
        d.set_timing(&mut bus, 40);
        assert_eq!(bus.writes, std::vec![(Register::Para, opcodes::PARA_40MHZ)]);
    }
}
