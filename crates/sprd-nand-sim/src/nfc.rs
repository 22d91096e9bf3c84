//! Simulated NFC register block and NAND array
//!
//! [`SimNfc`] implements [`NfcBus`] over memory. Writing the command
//! register executes the command against the array at once; the busy bit
//! then stays set for `busy_polls` reads of the command register so the
//! core's completion wait is exercised.
//!
//! The controller addresses each page through a `2 * page_size` slot:
//! the data area at offset 0 and the spare area at offset `page_size`.
//! `Str0` is decoded back into (page, area) the same way. A command with
//! the combined data+spare bit set transfers both areas of the page.

use log::{debug, trace, warn};
use sprd_nand_core::ecc::{self, hamming};
use sprd_nand_core::geometry::{Geometry, ECC_STEP};
use sprd_nand_core::regs::opcodes;
use sprd_nand_core::regs::{
    command_opcode, CmdSetting, HwBuffer, NfcBus, Register, StatusBits, CMD_BUSY, PAGE_ECC_REGS,
};

use crate::error::{Result, SimError};
use crate::profile::SimProfile;

/// Page area selected by the transfer window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Data,
    Spare,
    Both,
}

/// Register file of the simulated controller
#[derive(Debug, Default, Clone)]
struct Registers {
    cmd: u32,
    str0: u32,
    end0: u32,
    para: u32,
    id_status: u32,
    ecc_en: u32,
    wpn: u32,
    int_src: u32,
    ahb_ctl0: u32,
    mem_delay: u32,
}

/// In-memory NAND controller and flash array
pub struct SimNfc {
    profile: SimProfile,
    regs: Registers,
    array: Vec<u8>,
    main: Vec<u8>,
    spare: Vec<u8>,
    latched_ecc: [u32; PAGE_ECC_REGS],
    busy_remaining: u32,
    stuck_busy: bool,
    fail_next: bool,
    last_failed: bool,
    device_busy_reads: u32,
    commands: Vec<u32>,
    delayed_us: u64,
}

impl SimNfc {
    /// Create a simulator with an erased array
    pub fn new(profile: SimProfile) -> Result<Self> {
        profile.validate()?;
        let geometry = profile.geometry;
        let size = profile.image_size();
        Ok(Self {
            regs: Registers::default(),
            array: vec![0xFF; size],
            main: vec![0xFF; geometry.page_size as usize],
            spare: vec![0xFF; geometry.oob_size as usize],
            latched_ecc: [0; PAGE_ECC_REGS],
            busy_remaining: 0,
            stuck_busy: false,
            fail_next: false,
            last_failed: false,
            device_busy_reads: 0,
            commands: Vec::new(),
            delayed_us: 0,
            profile,
        })
    }

    /// Create a simulator preloaded with a raw array image
    pub fn with_image(profile: SimProfile, image: &[u8]) -> Result<Self> {
        let mut sim = Self::new(profile)?;
        sim.load_image(image)?;
        Ok(sim)
    }

    /// Replace the array contents with a raw image
    pub fn load_image(&mut self, image: &[u8]) -> Result<()> {
        if image.len() != self.array.len() {
            return Err(SimError::ImageSize {
                expected: self.array.len(),
                actual: image.len(),
            });
        }
        self.array.copy_from_slice(image);
        Ok(())
    }

    /// Raw array image: every page as data followed by spare
    pub fn image(&self) -> &[u8] {
        &self.array
    }

    /// Profile the simulator was built from
    pub fn profile(&self) -> &SimProfile {
        &self.profile
    }

    /// Raw bytes (data then spare) of one page
    pub fn page(&self, page: u32) -> Option<&[u8]> {
        let range = self.page_range(page)?;
        Some(&self.array[range])
    }

    /// Invert one stored bit; `byte` indexes the raw page (data then spare)
    pub fn flip_bit(&mut self, page: u32, byte: usize, bit: u8) -> Result<()> {
        let out_of_range = SimError::OutOfRange { page, byte };
        if byte >= self.geometry().raw_page_size() || bit > 7 {
            return Err(out_of_range);
        }
        let range = self.page_range(page).ok_or(out_of_range)?;
        self.array[range.start + byte] ^= 1 << bit;
        debug!("flipped page {} byte {} bit {}", page, byte, bit);
        Ok(())
    }

    /// Keep the busy bit set forever
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Make the next program or erase report failure
    pub fn fail_next_operation(&mut self) {
        self.fail_next = true;
    }

    /// Report the device busy for the next `reads` STATUS commands
    pub fn set_device_busy(&mut self, reads: u32) {
        self.device_busy_reads = reads;
    }

    /// Command words written so far
    pub fn commands(&self) -> &[u32] {
        &self.commands
    }

    /// Total requested delay in microseconds
    pub fn delayed_us(&self) -> u64 {
        self.delayed_us
    }

    /// Timing parameters last programmed
    pub fn timing(&self) -> u32 {
        self.regs.para
    }

    fn geometry(&self) -> Geometry {
        self.profile.geometry
    }

    fn page_range(&self, page: u32) -> Option<std::ops::Range<usize>> {
        if page >= self.profile.total_pages() {
            return None;
        }
        let raw = self.geometry().raw_page_size();
        let start = page as usize * raw;
        Some(start..start + raw)
    }

    /// Decode the window start into (page, slot)
    fn decode_window(&self, combined: bool) -> Option<(u32, Slot)> {
        let page_size = self.geometry().page_size;
        let slot_size = page_size * 2;
        let page = self.regs.str0 / slot_size;
        let offset = self.regs.str0 % slot_size;
        let slot = match (offset, combined) {
            (0, true) => Slot::Both,
            (0, false) => Slot::Data,
            (o, false) if o == page_size => Slot::Spare,
            _ => {
                warn!(
                    "unsupported window start 0x{:08x} (combined: {})",
                    self.regs.str0, combined
                );
                return None;
            }
        };
        Some((page, slot))
    }

    fn execute(&mut self, word: u32) {
        self.commands.push(word);
        let opcode = command_opcode(word);
        let combined = word & CmdSetting::DATA_OOB.bits() != 0;
        trace!("sim: command 0x{:08x}", word);

        match opcode {
            opcodes::RESET => {
                self.last_failed = false;
                self.device_busy_reads = 0;
            }
            opcodes::READID => self.regs.id_status = self.profile.id,
            opcodes::STATUS => self.regs.id_status = self.status(),
            opcodes::ERASE1 => self.erase(),
            opcodes::READ0 => self.read(combined),
            opcodes::SEQIN => self.program(combined),
            other => warn!("sim: unknown opcode 0x{:02x}", other),
        }

        self.busy_remaining = self.profile.busy_polls;
    }

    fn status(&mut self) -> u32 {
        let mut bits = StatusBits::empty();
        if self.device_busy_reads > 0 {
            self.device_busy_reads -= 1;
        } else {
            bits |= StatusBits::READY;
        }
        if self.regs.wpn & 1 == 1 {
            bits |= StatusBits::WRITE_ENABLED;
        }
        if self.last_failed {
            bits |= StatusBits::FAIL;
        }
        bits.bits()
    }

    /// Consume an injected failure, or the write-protect state
    fn take_failure(&mut self) -> bool {
        let failed = std::mem::take(&mut self.fail_next) || self.regs.wpn & 1 == 0;
        self.last_failed = failed;
        failed
    }

    fn erase(&mut self) {
        let geometry = self.geometry();
        let page = self.regs.str0 / (geometry.page_size * 2);
        let ppb = geometry.pages_per_block();
        let first = page - page % ppb;

        if self.take_failure() {
            debug!("sim: erase of block {} failed", first / ppb);
            return;
        }
        let (Some(start), Some(end)) = (
            self.page_range(first),
            self.page_range(first + ppb - 1),
        ) else {
            warn!("sim: erase beyond device at page {}", page);
            self.last_failed = true;
            return;
        };
        self.array[start.start..end.end].fill(0xFF);
        debug!("sim: erased block {}", first / ppb);
    }

    fn read(&mut self, combined: bool) {
        let Some((page, slot)) = self.decode_window(combined) else {
            return;
        };
        let Some(range) = self.page_range(page) else {
            warn!("sim: read beyond device at page {}", page);
            self.main.fill(0xFF);
            self.spare.fill(0xFF);
            return;
        };
        let page_size = self.geometry().page_size as usize;
        let raw = &self.array[range];

        if matches!(slot, Slot::Data | Slot::Both) {
            self.main.copy_from_slice(&raw[..page_size]);
            self.latched_ecc = Self::parity(&self.main);
        }
        if matches!(slot, Slot::Spare | Slot::Both) {
            self.spare.copy_from_slice(&raw[page_size..]);
        }
        trace!("sim: read page {} {:?}", page, slot);
    }

    fn program(&mut self, combined: bool) {
        let Some((page, slot)) = self.decode_window(combined) else {
            return;
        };
        if self.take_failure() {
            debug!("sim: program of page {} failed", page);
            return;
        }
        let Some(range) = self.page_range(page) else {
            warn!("sim: program beyond device at page {}", page);
            self.last_failed = true;
            return;
        };
        let page_size = self.geometry().page_size as usize;
        let raw = &mut self.array[range];

        // programming only clears bits
        if matches!(slot, Slot::Data | Slot::Both) {
            for (cell, &b) in raw[..page_size].iter_mut().zip(&self.main) {
                *cell &= b;
            }
        }
        if matches!(slot, Slot::Spare | Slot::Both) {
            for (cell, &b) in raw[page_size..].iter_mut().zip(&self.spare) {
                *cell &= b;
            }
        }
        trace!("sim: programmed page {} {:?}", page, slot);
    }

    /// Parity accumulator contents for a main buffer
    fn parity(main: &[u8]) -> [u32; PAGE_ECC_REGS] {
        let mut regs = [0u32; PAGE_ECC_REGS];
        for (reg, chunk) in regs.iter_mut().zip(main.chunks(ECC_STEP)) {
            *reg = ecc::register_from_code(hamming::calculate(chunk));
        }
        regs
    }

    fn read_cmd(&mut self) -> u32 {
        if self.stuck_busy {
            return self.regs.cmd | CMD_BUSY;
        }
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            return self.regs.cmd | CMD_BUSY;
        }
        self.regs.cmd & !CMD_BUSY
    }
}

impl NfcBus for SimNfc {
    fn read_reg(&mut self, reg: Register) -> u32 {
        match reg {
            Register::Cmd => self.read_cmd(),
            Register::Str0 => self.regs.str0,
            Register::End0 => self.regs.end0,
            Register::Para => self.regs.para,
            Register::IdStatus => self.regs.id_status,
            Register::EccEn => self.regs.ecc_en,
            Register::PageEcc(i) => {
                let i = i as usize;
                if i >= PAGE_ECC_REGS {
                    return 0;
                }
                if self.regs.ecc_en & 1 == 1 {
                    // accumulating: parity follows the main buffer
                    Self::parity(&self.main)[i]
                } else {
                    self.latched_ecc[i]
                }
            }
            Register::Wpn => self.regs.wpn,
            Register::IntSrc => self.regs.int_src,
            Register::AhbCtl0 => self.regs.ahb_ctl0,
            Register::MemDelay => self.regs.mem_delay,
        }
    }

    fn write_reg(&mut self, reg: Register, value: u32) {
        match reg {
            Register::Cmd => {
                self.regs.cmd = value;
                if value & CmdSetting::START.bits() != 0 {
                    self.execute(value);
                }
            }
            Register::Str0 => self.regs.str0 = value,
            Register::End0 => self.regs.end0 = value,
            Register::Para => self.regs.para = value,
            Register::IdStatus => {}
            Register::EccEn => {
                self.regs.ecc_en = value;
                if value & 1 == 0 {
                    self.latched_ecc = Self::parity(&self.main);
                }
            }
            Register::PageEcc(_) => {}
            Register::Wpn => self.regs.wpn = value,
            Register::IntSrc => self.regs.int_src = value,
            Register::AhbCtl0 => self.regs.ahb_ctl0 = value,
            Register::MemDelay => self.regs.mem_delay = value,
        }
    }

    fn buffer(&mut self, buf: HwBuffer) -> &mut [u8] {
        match buf {
            HwBuffer::Main => &mut self.main,
            HwBuffer::Spare => &mut self.spare,
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.delayed_us += u64::from(us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> SimNfc {
        let mut profile = SimProfile::large_page();
        profile.busy_polls = 0;
        let mut sim = SimNfc::new(profile).unwrap();
        sim.write_reg(Register::Wpn, 1);
        sim
    }

    fn command(sim: &mut SimNfc, setting: CmdSetting, opcode: u8) {
        sim.write_reg(Register::Cmd, setting.command_word(opcode));
    }

    fn select(sim: &mut SimNfc, start: u32) {
        sim.write_reg(Register::Str0, start);
        sim.write_reg(Register::End0, u32::MAX);
    }

    #[test]
    fn test_starts_erased() {
        let sim = sim();
        assert_eq!(sim.image().len(), 64 * 64 * 2112);
        assert!(sim.image().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_read_id_and_status() {
        let mut sim = sim();
        command(&mut sim, CmdSetting::START, opcodes::READID);
        assert_eq!(sim.read_reg(Register::IdStatus), 0xECDA_1095);

        command(&mut sim, CmdSetting::START, opcodes::STATUS);
        assert_eq!(sim.read_reg(Register::IdStatus), 0xC0);

        sim.write_reg(Register::Wpn, 0);
        command(&mut sim, CmdSetting::START, opcodes::STATUS);
        assert_eq!(sim.read_reg(Register::IdStatus), 0x40);
    }

    #[test]
    fn test_program_clears_bits_only() {
        let mut sim = sim();
        let setting = CmdSetting::for_page_op(true);
        select(&mut sim, 3 * 4096);

        sim.buffer(HwBuffer::Main).fill(0xF0);
        command(&mut sim, setting, opcodes::SEQIN);
        sim.buffer(HwBuffer::Main).fill(0x3C);
        command(&mut sim, setting, opcodes::SEQIN);

        let page = sim.page(3).unwrap();
        assert!(page[..2048].iter().all(|&b| b == 0x30));
        assert!(page[2048..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_combined_and_spare_slots() {
        let mut sim = sim();
        let setting = CmdSetting::for_page_op(true);

        select(&mut sim, 7 * 4096);
        sim.buffer(HwBuffer::Main).fill(0x11);
        sim.buffer(HwBuffer::Spare).fill(0x22);
        command(&mut sim, setting | CmdSetting::DATA_OOB, opcodes::SEQIN);

        select(&mut sim, 8 * 4096 + 2048);
        sim.buffer(HwBuffer::Spare).fill(0x33);
        command(&mut sim, setting, opcodes::SEQIN);

        let page = sim.page(7).unwrap();
        assert!(page[..2048].iter().all(|&b| b == 0x11));
        assert!(page[2048..].iter().all(|&b| b == 0x22));
        let page = sim.page(8).unwrap();
        assert!(page[..2048].iter().all(|&b| b == 0xFF));
        assert!(page[2048..].iter().all(|&b| b == 0x33));

        sim.buffer(HwBuffer::Main).fill(0);
        sim.buffer(HwBuffer::Spare).fill(0);
        select(&mut sim, 7 * 4096);
        command(&mut sim, setting | CmdSetting::DATA_OOB, opcodes::READ0);
        assert!(sim.buffer(HwBuffer::Main).iter().all(|&b| b == 0x11));
        assert!(sim.buffer(HwBuffer::Spare).iter().all(|&b| b == 0x22));
    }

    #[test]
    fn test_erase_whole_block() {
        let mut sim = sim();
        let setting = CmdSetting::for_page_op(true);
        for page in [64, 127, 128] {
            select(&mut sim, page * 4096);
            sim.buffer(HwBuffer::Main).fill(0);
            command(&mut sim, setting, opcodes::SEQIN);
        }

        select(&mut sim, 70 * 4096);
        command(&mut sim, setting, opcodes::ERASE1);

        assert!(sim.page(64).unwrap().iter().all(|&b| b == 0xFF));
        assert!(sim.page(127).unwrap().iter().all(|&b| b == 0xFF));
        assert_eq!(sim.page(128).unwrap()[0], 0);
    }

    #[test]
    fn test_busy_latency_and_stuck_busy() {
        let mut profile = SimProfile::small_page();
        profile.busy_polls = 3;
        let mut sim = SimNfc::new(profile).unwrap();

        command(&mut sim, CmdSetting::START, opcodes::RESET);
        let busy: Vec<bool> = (0..5)
            .map(|_| sim.read_reg(Register::Cmd) & CMD_BUSY != 0)
            .collect();
        assert_eq!(busy, [true, true, true, false, false]);

        sim.set_stuck_busy(true);
        assert_ne!(sim.read_reg(Register::Cmd) & CMD_BUSY, 0);
    }

    #[test]
    fn test_fail_next_operation() {
        let mut sim = sim();
        let setting = CmdSetting::for_page_op(true);
        sim.fail_next_operation();
        select(&mut sim, 0);
        sim.buffer(HwBuffer::Main).fill(0);
        command(&mut sim, setting, opcodes::SEQIN);

        assert!(sim.page(0).unwrap().iter().all(|&b| b == 0xFF));
        command(&mut sim, CmdSetting::START, opcodes::STATUS);
        assert_eq!(sim.read_reg(Register::IdStatus) & 0x01, 0x01);

        command(&mut sim, setting, opcodes::SEQIN);
        command(&mut sim, CmdSetting::START, opcodes::STATUS);
        assert_eq!(sim.read_reg(Register::IdStatus) & 0x01, 0);
    }

    #[test]
    fn test_ecc_latched_and_live() {
        let mut sim = sim();
        let setting = CmdSetting::for_page_op(true);
        let data: Vec<u8> = (0..2048).map(|i| (i * 7 + 3) as u8).collect();

        sim.write_reg(Register::EccEn, 1);
        sim.buffer(HwBuffer::Main).copy_from_slice(&data);
        let live: Vec<u32> = (0..4).map(|i| sim.read_reg(Register::PageEcc(i))).collect();
        sim.write_reg(Register::EccEn, 0);
        assert_eq!(
            live[1],
            ecc::register_from_code(hamming::calculate(&data[512..1024]))
        );

        select(&mut sim, 0);
        command(&mut sim, setting, opcodes::SEQIN);
        sim.buffer(HwBuffer::Main).fill(0);
        command(&mut sim, setting | CmdSetting::DATA_OOB, opcodes::READ0);
        let latched: Vec<u32> = (0..4).map(|i| sim.read_reg(Register::PageEcc(i))).collect();
        assert_eq!(latched, live);
    }

    #[test]
    fn test_image_round_trip() {
        let mut sim = sim();
        sim.flip_bit(5, 100, 3).unwrap();
        let image = sim.image().to_vec();

        let restored = SimNfc::with_image(SimProfile::large_page(), &image).unwrap();
        assert_eq!(restored.page(5).unwrap()[100], 0xF7);

        assert!(matches!(
            SimNfc::with_image(SimProfile::large_page(), &image[1..]),
            Err(SimError::ImageSize { .. })
        ));
        assert!(matches!(
            sim.flip_bit(64 * 64, 0, 0),
            Err(SimError::OutOfRange { .. })
        ));
        assert!(matches!(
            sim.flip_bit(0, 2112, 0),
            Err(SimError::OutOfRange { .. })
        ));
    }
}
