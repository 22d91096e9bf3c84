//! Minimal generic-layer sequencing
//!
//! [`NandHost`] drives any [`NandCallbacks`] implementation the way a
//! generic NAND layer would: it sends command and address tokens, polls for
//! readiness, moves page bytes through the staging buffer and runs the
//! hardware ECC around page transfers. It carries no bad-block or wear
//! handling.
//!
//! ECC codes are stored at the tail of the spare area, `ecc_bytes` wide.

use log::{debug, error, warn};
use sprd_nand_core::dispatch::ReadyStatus;
use sprd_nand_core::ecc::{EccMode, PageCorrection};
use sprd_nand_core::regs::opcodes;
use sprd_nand_core::tracker::CtrlFlags;
use sprd_nand_core::{Error, NandCallbacks, Result};

/// Default number of status polls before giving up on a busy device
pub const DEFAULT_READY_RETRIES: u32 = 1000;

/// Page-level front end over the controller callbacks
pub struct NandHost<C> {
    chip: C,
    ready_retries: u32,
    total_pages: Option<u32>,
}

impl<C: NandCallbacks> NandHost<C> {
    /// Wrap a controller
    pub fn new(chip: C) -> Self {
        Self {
            chip,
            ready_retries: DEFAULT_READY_RETRIES,
            total_pages: None,
        }
    }

    /// Bound the number of status polls in [`NandHost::wait_ready`]
    pub fn with_ready_retries(mut self, retries: u32) -> Self {
        self.ready_retries = retries;
        self
    }

    /// Reject page indices at or beyond `pages`
    pub fn with_total_pages(mut self, pages: u32) -> Self {
        self.total_pages = Some(pages);
        self
    }

    /// The wrapped controller
    pub fn chip(&self) -> &C {
        &self.chip
    }

    /// The wrapped controller, mutable
    pub fn chip_mut(&mut self) -> &mut C {
        &mut self.chip
    }

    /// Unwrap the controller
    pub fn into_inner(self) -> C {
        self.chip
    }

    /// Offset of the ECC code within the spare area
    ///
    /// Attach only accepts geometries whose spare area holds the code.
    pub fn ecc_offset(&self) -> usize {
        let geometry = self.chip.geometry();
        geometry.oob_size as usize - geometry.ecc_bytes()
    }

    fn command(&mut self, opcode: u8) -> Result<()> {
        self.chip
            .cmd_ctrl(opcode as i32, CtrlFlags::NCE | CtrlFlags::CLE | CtrlFlags::CHANGE)
    }

    fn address(&mut self, value: u32) -> Result<()> {
        self.chip
            .cmd_ctrl(value as i32, CtrlFlags::NCE | CtrlFlags::ALE | CtrlFlags::CHANGE)
    }

    fn page_address(&mut self, column: u32, page: u32) -> Result<()> {
        self.address(column)?;
        self.address(page)
    }

    fn check_page(&self, page: u32) -> Result<()> {
        match self.total_pages {
            Some(total) if page >= total => Err(Error::AddressOutOfBounds),
            _ => Ok(()),
        }
    }

    /// Run `op` with the chip selected, deselecting afterwards
    fn selected<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.chip.select_chip(0);
        let result = op(self);
        self.chip.select_chip(-1);
        result
    }

    /// Reset the device
    pub fn reset(&mut self) -> Result<()> {
        self.selected(|host| {
            host.command(opcodes::RESET)?;
            host.wait_ready()
        })
    }

    /// Read the device ID
    pub fn read_id(&mut self) -> Result<u32> {
        self.selected(|host| {
            host.command(opcodes::READID)?;
            Ok(host.chip.read_id())
        })
    }

    /// Raw status word
    pub fn status(&mut self) -> Result<u32> {
        self.selected(|host| {
            host.command(opcodes::STATUS)?;
            let mut raw = [0u8; 4];
            host.chip.read_buf(&mut raw);
            Ok(u32::from_be_bytes(raw))
        })
    }

    /// Poll until the device is ready
    ///
    /// A device that reports failure yields [`Error::OperationFailed`]; one
    /// that is still busy after the retry bound yields [`Error::DeviceBusy`].
    pub fn wait_ready(&mut self) -> Result<()> {
        for _ in 0..self.ready_retries {
            match self.chip.dev_ready()? {
                ReadyStatus::Ready => return Ok(()),
                ReadyStatus::Busy => continue,
                ReadyStatus::Fail => return Err(Error::OperationFailed),
            }
        }
        warn!("device still busy after {} polls", self.ready_retries);
        Err(Error::DeviceBusy)
    }

    /// Erase one block
    pub fn erase_block(&mut self, block: u32) -> Result<()> {
        let page = block
            .checked_mul(self.chip.geometry().pages_per_block())
            .ok_or(Error::AddressOutOfBounds)?;
        self.check_page(page)?;
        debug!("erase block {} (page {})", block, page);
        self.selected(|host| {
            host.command(opcodes::ERASE1)?;
            host.address(page)?;
            host.command(opcodes::ERASE2)?;
            host.wait_ready()
        })
    }

    /// Program one page with hardware ECC
    ///
    /// `oob` supplies the free spare bytes (the ECC tail is overwritten);
    /// `None` leaves them erased.
    pub fn program_page(&mut self, page: u32, data: &[u8], oob: Option<&[u8]>) -> Result<()> {
        let geometry = *self.chip.geometry();
        let page_size = geometry.page_size as usize;
        let oob_size = geometry.oob_size as usize;
        if data.len() < page_size || oob.is_some_and(|o| o.len() < oob_size) {
            return Err(Error::BufferTooSmall);
        }

        let mut spare = [0xFFu8; opcodes::MAX_OOB_SIZE];
        let spare = &mut spare[..oob_size];
        if let Some(oob) = oob {
            spare.copy_from_slice(&oob[..oob_size]);
        }
        let ecc_offset = self.ecc_offset();
        let ecc_bytes = geometry.ecc_bytes();
        self.check_page(page)?;

        self.selected(|host| {
            host.command(opcodes::SEQIN)?;
            host.page_address(0, page)?;
            host.chip.write_buf(&data[..page_size]);

            host.chip.enable_hwecc(EccMode::Write);
            let code = host.chip.calculate_ecc()?;
            spare[ecc_offset..].copy_from_slice(&code[..ecc_bytes]);

            host.chip.write_buf(spare);
            host.chip.write_oob();
            host.command(opcodes::PAGEPROG)?;
            host.wait_ready()
        })
    }

    /// Read one page and correct it with hardware ECC
    ///
    /// Returns the correction outcome; an uncorrectable page is an error.
    /// A page whose stored code is erased was never programmed with ECC
    /// and is returned as read.
    pub fn read_page(&mut self, page: u32, data: &mut [u8], oob: &mut [u8]) -> Result<PageCorrection> {
        let geometry = *self.chip.geometry();
        let page_size = geometry.page_size as usize;
        let oob_size = geometry.oob_size as usize;
        if data.len() < page_size || oob.len() < oob_size {
            return Err(Error::BufferTooSmall);
        }
        let ecc_offset = self.ecc_offset();
        let ecc_bytes = geometry.ecc_bytes();

        self.check_page(page)?;

        let calc = self.selected(|host| {
            host.command(opcodes::READ0)?;
            host.page_address(0, page)?;
            host.command(opcodes::READSTART)?;
            host.chip.read_buf(&mut data[..page_size]);

            host.chip.enable_hwecc(EccMode::Read);
            let calc = host.chip.calculate_ecc()?;
            host.chip.read_buf(&mut oob[..oob_size]);
            Ok(calc)
        })?;

        let stored = &oob[ecc_offset..ecc_offset + ecc_bytes];
        if stored.iter().all(|&b| b == 0xFF) {
            return Ok(PageCorrection::Clean);
        }

        let outcome = self
            .chip
            .correct_data(&mut data[..page_size], stored, &calc[..ecc_bytes]);
        match outcome {
            PageCorrection::Uncorrectable => {
                error!("uncorrectable ECC error in page {}", page);
                Err(Error::EccUncorrectable { page })
            }
            PageCorrection::Corrected { bits } => {
                debug!("page {}: corrected {} bit(s)", page, bits);
                Ok(outcome)
            }
            PageCorrection::ParityOnly | PageCorrection::Clean => Ok(outcome),
        }
    }

    /// Read the spare area of one page
    pub fn read_oob(&mut self, page: u32, oob: &mut [u8]) -> Result<()> {
        let geometry = *self.chip.geometry();
        let oob_size = geometry.oob_size as usize;
        if oob.len() < oob_size {
            return Err(Error::BufferTooSmall);
        }
        self.check_page(page)?;
        self.selected(|host| {
            host.command(opcodes::READ0)?;
            host.page_address(geometry.page_size, page)?;
            host.command(opcodes::READSTART)?;
            host.chip.read_buf(&mut oob[..oob_size]);
            Ok(())
        })
    }

    /// Program the spare area of one page
    pub fn write_oob(&mut self, page: u32, oob: &[u8]) -> Result<()> {
        let geometry = *self.chip.geometry();
        let oob_size = geometry.oob_size as usize;
        if oob.len() < oob_size {
            return Err(Error::BufferTooSmall);
        }
        self.check_page(page)?;
        self.selected(|host| {
            host.command(opcodes::SEQIN)?;
            host.page_address(geometry.page_size, page)?;
            host.chip.write_buf(&oob[..oob_size]);
            host.command(opcodes::PAGEPROG)?;
            host.wait_ready()
        })
    }
}
