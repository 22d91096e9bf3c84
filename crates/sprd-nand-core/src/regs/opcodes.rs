//! Standard NAND flash opcodes and controller constants
//!
//! The opcodes are the ONFI/legacy large-page command set the generic NAND
//! layer sends through `cmd_ctrl`. The controller executes most of them
//! itself once the window registers are programmed.

// ============================================================================
// Identification and status
// ============================================================================

/// Reset the device
pub const RESET: u8 = 0xFF;
/// Read the device ID
pub const READID: u8 = 0x90;
/// Read the status register
pub const STATUS: u8 = 0x70;

// ============================================================================
// Erase
// ============================================================================

/// Block erase setup
pub const ERASE1: u8 = 0x60;
/// Block erase confirm
pub const ERASE2: u8 = 0xD0;

// ============================================================================
// Read
// ============================================================================

/// Read setup (first cycle)
pub const READ0: u8 = 0x00;
/// Read confirm for large-page devices
pub const READSTART: u8 = 0x30;

// ============================================================================
// Program
// ============================================================================

/// Serial data input (program setup)
pub const SEQIN: u8 = 0x80;
/// Page program confirm
pub const PAGEPROG: u8 = 0x10;

/// Value the generic layer passes to `cmd_ctrl` for "no command"
pub const CMD_NONE: i32 = -1;

// ============================================================================
// Controller timing (NFC_PARA) per AHB clock
// ============================================================================

/// trwl = 0, trwh = 0
pub const PARA_20MHZ: u32 = 0x7ac05;
/// trwl = 1, trwh = 0
pub const PARA_40MHZ: u32 = 0x7ac15;
/// trwl = 2, trwh = 1
pub const PARA_53MHZ: u32 = 0x7ad26;
/// trwl = 3, trwh = 1
pub const PARA_80MHZ: u32 = 0x7ad37;
/// trwl = 7, trwh = 1
pub const PARA_DEFAULT: u32 = 0x7ad77;

/// Timing parameter word for the given AHB clock in MHz
pub const fn timing_for_clock(ahb_mhz: u32) -> u32 {
    match ahb_mhz {
        20 => PARA_20MHZ,
        40 => PARA_40MHZ,
        53 => PARA_53MHZ,
        80 => PARA_80MHZ,
        _ => PARA_DEFAULT,
    }
}

/// Default number of busy-bit polls before a command is declared timed out
pub const DEFAULT_TIMEOUT_POLLS: u32 = 0x0100_0000;

/// Largest page the staging buffer can hold
pub const MAX_PAGE_SIZE: usize = 4096;
/// Largest spare area the staging buffer can hold
pub const MAX_OOB_SIZE: usize = 128;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_for_clock() {
        assert_eq!(timing_for_clock(20), PARA_20MHZ);
        assert_eq!(timing_for_clock(53), PARA_53MHZ);
        assert_eq!(timing_for_clock(80), PARA_80MHZ);
        assert_eq!(timing_for_clock(104), PARA_DEFAULT);
    }
}
