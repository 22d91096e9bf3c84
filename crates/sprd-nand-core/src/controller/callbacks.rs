//! Callback surface used by the generic NAND layer

use crate::dispatch::ReadyStatus;
use crate::ecc::{EccCode, EccMode, PageCorrection};
use crate::error::Result;
use crate::geometry::Geometry;
use crate::tracker::CtrlFlags;

/// Hooks a NAND controller driver exposes to the generic NAND layer
///
/// The generic layer owns the protocol: it decides which commands and
/// address phases to send and when to move data. A driver only reacts to
/// each call. Calls for one device are serialised by the caller, so every
/// hook takes `&mut self` and there is at most one operation in flight.
///
/// ## Page read
///
/// ```ignore
/// chip.cmd_ctrl(opcodes::READ0 as i32, CtrlFlags::CLE)?;
/// chip.cmd_ctrl(0, CtrlFlags::ALE)?;              // column
/// chip.cmd_ctrl(page as i32, CtrlFlags::ALE)?;    // row
/// chip.cmd_ctrl(opcodes::READSTART as i32, CtrlFlags::CLE)?;
/// chip.read_buf(&mut data);
/// chip.enable_hwecc(EccMode::Read);
/// let calc = chip.calculate_ecc()?;
/// chip.read_buf(&mut oob);
/// let outcome = chip.correct_data(&mut data, &oob[ecc_pos..], &calc);
/// ```
///
/// ## Page program
///
/// ```ignore
/// chip.cmd_ctrl(opcodes::SEQIN as i32, CtrlFlags::CLE)?;
/// chip.cmd_ctrl(0, CtrlFlags::ALE)?;
/// chip.cmd_ctrl(page as i32, CtrlFlags::ALE)?;
/// chip.write_buf(&data);
/// chip.enable_hwecc(EccMode::Write);
/// let code = chip.calculate_ecc()?;
/// chip.write_buf(&oob_with(code));
/// chip.write_oob();
/// chip.cmd_ctrl(opcodes::PAGEPROG as i32, CtrlFlags::CLE)?;
/// ```
pub trait NandCallbacks {
    /// Geometry fixed at attach
    fn geometry(&self) -> &Geometry;

    /// Select a chip; `-1` deselects
    fn select_chip(&mut self, chip: i32);

    /// Feed one command, address or no-op token
    ///
    /// Errors are hardware timeouts and protocol violations of the command
    /// that just completed; the caller must fail the in-flight I/O.
    fn cmd_ctrl(&mut self, dat: i32, ctrl: CtrlFlags) -> Result<()>;

    /// Query device readiness
    fn dev_ready(&mut self) -> Result<ReadyStatus>;

    /// ID latched by the last READID command
    fn read_id(&self) -> u32;

    /// Stage the spare bytes in the staging buffer for the next program
    fn write_oob(&mut self);

    /// Arm the hardware ECC for one direction
    fn enable_hwecc(&mut self, mode: EccMode);

    /// Capture the hardware ECC for the armed direction
    fn calculate_ecc(&mut self) -> Result<EccCode>;

    /// Correct page data against its stored code
    fn correct_data(&mut self, dat: &mut [u8], read_ecc: &[u8], calc_ecc: &[u8]) -> PageCorrection;

    /// Copy bytes out of the staging buffer
    fn read_buf(&mut self, buf: &mut [u8]);

    /// Copy bytes into the staging buffer
    fn write_buf(&mut self, buf: &[u8]);

    /// First byte of the staging buffer
    fn read_byte(&mut self) -> u8;
}
