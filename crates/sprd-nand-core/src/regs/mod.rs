//! NAND flash controller register model
//!
//! Register names, command word packing and status bits of the SC88xx NFC,
//! plus the [`NfcBus`] trait through which the controller core reaches the
//! hardware.

mod bus;
pub mod opcodes;

pub use bus::NfcBus;

use bitflags::bitflags;

/// Controller registers the core touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Command register (write: start a command, read: bit 31 is busy)
    Cmd,
    /// Start address of the transfer window
    Str0,
    /// End address of the transfer window (inclusive)
    End0,
    /// Timing parameters
    Para,
    /// ID / status result of the last READID or STATUS command
    IdStatus,
    /// Hardware ECC accumulate enable
    EccEn,
    /// Parity accumulator for 512-byte sub-block 0..=3
    PageEcc(u8),
    /// Write-protect pin control (1 = write enabled)
    Wpn,
    /// Interrupt source enables
    IntSrc,
    /// AHB control 0 (NFC clock gate lives here)
    AhbCtl0,
    /// NFC memory delay
    MemDelay,
}

/// Controller-side data buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwBuffer {
    /// Main (page data) buffer
    Main,
    /// Spare (OOB) buffer
    Spare,
}

bitflags! {
    /// Setting bits of the command register
    ///
    /// The low byte of the command word carries the NAND opcode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CmdSetting: u32 {
        /// Start the command; reads back as busy until it completes
        const START      = 1 << 31;
        /// Address cycle count field (two bits)
        const ADDR_CYCLE = 0b11 << 24;
        /// Advance mode
        const ADVANCE    = 1 << 23;
        /// Transfer data and spare area in one command
        const DATA_OOB   = 1 << 21;
        /// 16-bit bus width
        const BUS_16     = 1 << 19;
        /// Large-page device
        const LARGE_PAGE = 1 << 18;
    }
}

impl CmdSetting {
    /// Setting used for page and block operations on a device
    pub fn for_page_op(large_page: bool) -> Self {
        let mut setting = Self::START | Self::ADVANCE;
        if large_page {
            setting |= Self::LARGE_PAGE;
        }
        setting
    }

    /// Pack this setting and an opcode into a command register value
    pub const fn command_word(self, opcode: u8) -> u32 {
        self.bits() | opcode as u32
    }
}

/// Busy bit of the command register
pub const CMD_BUSY: u32 = 1 << 31;

/// Extract the opcode byte from a command register value
pub const fn command_opcode(word: u32) -> u8 {
    (word & 0xFF) as u8
}

bitflags! {
    /// Device status bits reported in `IdStatus` after a STATUS command
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusBits: u32 {
        /// Last program/erase failed
        const FAIL          = 0x01;
        /// Device is ready
        const READY         = 0x40;
        /// Write protect is deasserted
        const WRITE_ENABLED = 0x80;
    }
}

bitflags! {
    /// Interrupt sources enabled at attach
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IntSource: u32 {
        /// Command done
        const DONE     = 1 << 0;
        /// ECC done
        const ECC_DONE = 1 << 4;
        /// Timeout
        const TIMEOUT  = 1 << 5;
    }
}

/// AHB_CTL0 bits that gate the NFC clocks
pub const AHB_CTL0_NFC_EN: u32 = (1 << 8) | (1 << 9);

/// Number of parity accumulator registers
pub const PAGE_ECC_REGS: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_word() {
        let setting = CmdSetting::for_page_op(true);
        assert_eq!(setting.command_word(opcodes::READ0), 0x8084_0000);
        assert_eq!(
            (setting | CmdSetting::DATA_OOB).command_word(opcodes::SEQIN),
            0x80A4_0080
        );
        assert_eq!(CmdSetting::START.command_word(opcodes::STATUS), 0x8000_0070);
    }

    #[test]
    fn test_small_page_setting() {
        let setting = CmdSetting::for_page_op(false);
        assert!(!setting.contains(CmdSetting::LARGE_PAGE));
        assert_eq!(command_opcode(setting.command_word(opcodes::ERASE1)), 0x60);
    }
}
