//! Hardware ECC support
//!
//! The controller accumulates a 3-byte Hamming code for every 512-byte
//! sub-block it moves through the main buffer. This module converts the
//! accumulator registers into the canonical code layout and corrects data
//! against a stored code:
//!
//! - [`code_from_registers`] - reorder the four `PageEcc` words into 12 bytes
//! - [`correct`] - single-bit correction for one sub-block
//! - [`correct_page`] - run [`correct`] over every sub-block of a page
//! - [`hamming::calculate`] - software model of the accumulator

pub mod hamming;

use heapless::Vec;
use log::{debug, error, warn};

use crate::geometry::ECC_STEP;
use crate::regs::PAGE_ECC_REGS;

/// ECC bytes per sub-block
pub const ECC_BYTES_PER_STEP: usize = 3;
/// ECC bytes for the largest supported page
pub const ECC_BYTES: usize = ECC_BYTES_PER_STEP * MAX_ECC_STEPS;
/// Sub-blocks in the largest supported page
pub const MAX_ECC_STEPS: usize = PAGE_ECC_REGS;

/// ECC code for one page, 3 bytes per 512-byte sub-block
pub type EccCode = [u8; ECC_BYTES];

/// Direction the hardware ECC is armed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EccMode {
    /// Not armed
    #[default]
    None,
    /// Capture parity of data just read from the device
    Read,
    /// Compute parity of data about to be programmed
    Write,
}

/// Reorder the parity accumulator registers into canonical code order
///
/// Each register holds one sub-block's code in its upper three bytes, most
/// significant byte first; the low byte is unused.
pub fn code_from_registers(regs: [u32; PAGE_ECC_REGS]) -> EccCode {
    let mut code = [0u8; ECC_BYTES];
    for (triplet, reg) in code.chunks_exact_mut(ECC_BYTES_PER_STEP).zip(regs) {
        let bytes = reg.to_be_bytes();
        triplet.copy_from_slice(&bytes[..ECC_BYTES_PER_STEP]);
    }
    code
}

/// Pack a canonical triplet back into register layout
pub fn register_from_code(code: [u8; ECC_BYTES_PER_STEP]) -> u32 {
    u32::from_be_bytes([code[0], code[1], code[2], 0])
}

/// Result of correcting one sub-block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Stored and calculated codes match
    Clean,
    /// One data bit was wrong and has been flipped back
    Corrected {
        /// Byte offset within the sub-block
        byte: u16,
        /// Bit within the byte
        bit: u8,
    },
    /// The stored code itself has one flipped bit; data is intact
    ParityOnly,
    /// More errors than the code can correct
    Uncorrectable,
}

/// Hamming self-complementary check: every bit pair differs
fn is_single_bit_pattern(diff: u32) -> bool {
    (diff ^ (diff >> 1)) & 0x55 == 0x55
}

/// Correct one 512-byte sub-block in place
///
/// `read_ecc` is the code stored alongside the data, `calc_ecc` the code the
/// hardware computed while reading it back. The bit positions used to
/// locate the error are fixed by the accumulator layout.
pub fn correct(
    dat: &mut [u8],
    read_ecc: &[u8; ECC_BYTES_PER_STEP],
    calc_ecc: &[u8; ECC_BYTES_PER_STEP],
) -> Correction {
    let diff0 = (read_ecc[0] ^ calc_ecc[0]) as u32;
    let diff1 = (read_ecc[1] ^ calc_ecc[1]) as u32;
    let diff2 = (read_ecc[2] ^ calc_ecc[2]) as u32;

    if diff0 == 0 && diff1 == 0 && diff2 == 0 {
        return Correction::Clean;
    }

    if is_single_bit_pattern(diff0) && is_single_bit_pattern(diff1) && is_single_bit_pattern(diff2)
    {
        let bit = ((diff2 >> 2) & 1) | ((diff2 >> 3) & 2) | ((diff2 >> 4) & 4);

        let byte = ((diff1 << 1) & 0x80)
            | ((diff1 << 2) & 0x40)
            | ((diff1 << 3) & 0x20)
            | ((diff1 << 4) & 0x10)
            | ((diff0 >> 3) & 0x08)
            | ((diff0 >> 2) & 0x04)
            | ((diff0 >> 1) & 0x02)
            | (diff0 & 0x01)
            | ((diff2 << 8) & 0x100);

        return match dat.get_mut(byte as usize) {
            Some(b) => {
                *b ^= 1 << bit;
                debug!("ECC: corrected bit {} of byte {}", bit, byte);
                Correction::Corrected {
                    byte: byte as u16,
                    bit: bit as u8,
                }
            }
            None => Correction::Uncorrectable,
        };
    }

    let packed = diff0 | (diff1 << 8) | (diff2 << 16);
    if packed.is_power_of_two() {
        Correction::ParityOnly
    } else {
        Correction::Uncorrectable
    }
}

/// Outcome for a whole page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCorrection {
    /// No errors
    Clean,
    /// Data bits were corrected
    Corrected {
        /// Number of corrected bits
        bits: u8,
    },
    /// Only stored parity was damaged; data is intact
    ParityOnly,
    /// At least one sub-block could not be corrected; the page is unreadable
    Uncorrectable,
}

impl PageCorrection {
    /// Whether the page data can be trusted
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Uncorrectable)
    }
}

/// Per sub-block correction results for a page
#[derive(Debug, Clone, Default)]
pub struct EccReport {
    steps: Vec<Correction, MAX_ECC_STEPS>,
}

impl EccReport {
    /// Results in sub-block order
    pub fn steps(&self) -> &[Correction] {
        &self.steps
    }

    /// Number of data bits corrected
    pub fn corrected_bits(&self) -> u8 {
        self.steps
            .iter()
            .filter(|c| matches!(c, Correction::Corrected { .. }))
            .count() as u8
    }

    /// Fold the sub-block results into one page outcome
    ///
    /// Any uncorrectable sub-block makes the page uncorrectable regardless
    /// of the others.
    pub fn outcome(&self) -> PageCorrection {
        if self.steps.contains(&Correction::Uncorrectable) {
            PageCorrection::Uncorrectable
        } else if self.corrected_bits() > 0 {
            PageCorrection::Corrected {
                bits: self.corrected_bits(),
            }
        } else if self.steps.contains(&Correction::ParityOnly) {
            PageCorrection::ParityOnly
        } else {
            PageCorrection::Clean
        }
    }
}

/// Correct `steps` consecutive 512-byte sub-blocks of a page
///
/// A sub-block whose data or code does not fit the given slices counts as
/// uncorrectable.
pub fn correct_page(dat: &mut [u8], read_ecc: &[u8], calc_ecc: &[u8], steps: usize) -> EccReport {
    let mut report = EccReport::default();

    for step in 0..steps.min(MAX_ECC_STEPS) {
        let code = step * ECC_BYTES_PER_STEP..(step + 1) * ECC_BYTES_PER_STEP;
        let data = step * ECC_STEP..(step + 1) * ECC_STEP;

        let outcome = match (
            triplet(read_ecc, code.clone()),
            triplet(calc_ecc, code),
            dat.get_mut(data),
        ) {
            (Some(read), Some(calc), Some(block)) => correct(block, &read, &calc),
            _ => Correction::Uncorrectable,
        };

        match outcome {
            Correction::ParityOnly => warn!("ECC: parity error in sub-block {}, data intact", step),
            Correction::Uncorrectable => error!("ECC: uncorrectable error in sub-block {}", step),
            _ => {}
        }

        if report.steps.push(outcome).is_err() {
            break;
        }
    }

    report
}

fn triplet(code: &[u8], range: core::ops::Range<usize>) -> Option<[u8; ECC_BYTES_PER_STEP]> {
    let bytes = code.get(range)?;
    Some([bytes[0], bytes[1], bytes[2]])
}
