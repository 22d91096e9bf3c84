//! NAND geometry and controller address-space math
//!
//! The controller sees the device as one linear address space in which every
//! page occupies two slots of `page_size` bytes: the data slot followed by a
//! slot that holds the spare area. Row (page index) addresses from the
//! generic layer are turned into windows in that space here.

use crate::error::{Error, Result};
use crate::regs::opcodes::{MAX_OOB_SIZE, MAX_PAGE_SIZE};

/// Size of one ECC-protected sub-block
pub const ECC_STEP: usize = 512;

/// Device geometry, supplied once at attach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    /// Page (write unit) size in bytes
    pub page_size: u32,
    /// Spare area size per page in bytes
    pub oob_size: u32,
    /// Erase block size in bytes
    pub block_size: u32,
}

/// Inclusive start/end addresses programmed into `Str0`/`End0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// First byte of the transfer
    pub start: u32,
    /// Last byte of the transfer
    pub end: u32,
}

/// End address meaning "no bound"; used for combined data + spare access
pub const UNBOUNDED_END: u32 = u32::MAX;

impl Geometry {
    /// 2 KiB page, 64 byte spare, 128 KiB block
    pub const LARGE_PAGE: Self = Self {
        page_size: 2048,
        oob_size: 64,
        block_size: 128 * 1024,
    };

    /// 512 byte page, 16 byte spare, 16 KiB block
    pub const SMALL_PAGE: Self = Self {
        page_size: 512,
        oob_size: 16,
        block_size: 16 * 1024,
    };

    /// Check that the controller can drive this geometry
    ///
    /// The hardware ECC covers either one or four 512-byte sub-blocks, so
    /// only 512 and 2048 byte pages are accepted. The spare area must hold
    /// the ECC code of every sub-block.
    pub fn validate(&self) -> Result<()> {
        let page_ok = matches!(self.page_size, 512 | 2048)
            && self.page_size as usize <= MAX_PAGE_SIZE;
        if !page_ok {
            return Err(Error::InvalidGeometry);
        }
        let oob_ok = self.oob_size as usize >= self.ecc_bytes()
            && self.oob_size as usize <= MAX_OOB_SIZE;
        let block_ok = self.block_size >= self.page_size
            && self.block_size % self.page_size == 0;

        if oob_ok && block_ok {
            Ok(())
        } else {
            Err(Error::InvalidGeometry)
        }
    }

    /// Pages per erase block
    pub fn pages_per_block(&self) -> u32 {
        self.block_size / self.page_size
    }

    /// Whether this is a large-page device
    pub fn is_large_page(&self) -> bool {
        self.page_size as usize > ECC_STEP
    }

    /// Number of 512-byte ECC sub-blocks per page
    pub fn ecc_steps(&self) -> usize {
        (self.page_size as usize / ECC_STEP).max(1)
    }

    /// Number of meaningful ECC bytes per page
    pub fn ecc_bytes(&self) -> usize {
        self.ecc_steps() * 3
    }

    /// Page size plus spare size
    pub fn raw_page_size(&self) -> usize {
        (self.page_size + self.oob_size) as usize
    }

    /// Split a row address into (physical block, page in block)
    pub fn split_row(&self, row: u32) -> (u32, u32) {
        let ppb = self.pages_per_block();
        (row / ppb, row % ppb)
    }

    /// Controller address of the data slot of a page
    ///
    /// Every page takes `2 * page_size` bytes of controller address space,
    /// so this is `block * ppb * page * 2 + page_in_block * page * 2` in
    /// 32-bit register arithmetic.
    pub fn page_base(&self, row: u32) -> u32 {
        let ppb = self.pages_per_block();
        let (block, page) = self.split_row(row);
        let slot = self.page_size.wrapping_mul(2);
        block
            .wrapping_mul(ppb)
            .wrapping_mul(slot)
            .wrapping_add(page.wrapping_mul(slot))
    }

    /// Window covering only the data area of a page
    pub fn data_window(&self, row: u32) -> Window {
        let start = self.page_base(row);
        Window {
            start,
            end: start.wrapping_add(self.page_size - 1),
        }
    }

    /// Window covering only the spare area of a page
    pub fn oob_window(&self, row: u32) -> Window {
        let start = self.page_base(row).wrapping_add(self.page_size);
        Window {
            start,
            end: start.wrapping_add(self.oob_size - 1),
        }
    }

    /// Window covering data and spare in one transfer
    ///
    /// The end is left unbounded; the controller stops on its own once the
    /// combined transfer is done.
    pub fn combined_window(&self, row: u32) -> Window {
        Window {
            start: self.page_base(row),
            end: UNBOUNDED_END,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Geometry::LARGE_PAGE.validate().is_ok());
        assert!(Geometry::SMALL_PAGE.validate().is_ok());

        let odd_page = Geometry {
            page_size: 1024,
            ..Geometry::LARGE_PAGE
        };
        assert_eq!(odd_page.validate(), Err(Error::InvalidGeometry));

        let ragged_block = Geometry {
            block_size: 3000,
            ..Geometry::LARGE_PAGE
        };
        assert_eq!(ragged_block.validate(), Err(Error::InvalidGeometry));

        let no_oob = Geometry {
            oob_size: 0,
            ..Geometry::LARGE_PAGE
        };
        assert_eq!(no_oob.validate(), Err(Error::InvalidGeometry));

        let no_page = Geometry {
            page_size: 0,
            ..Geometry::SMALL_PAGE
        };
        assert_eq!(no_page.validate(), Err(Error::InvalidGeometry));

        // four sub-blocks need 12 code bytes
        let short_oob = Geometry {
            oob_size: 8,
            ..Geometry::LARGE_PAGE
        };
        assert_eq!(short_oob.validate(), Err(Error::InvalidGeometry));
        let tight_oob = Geometry {
            oob_size: 12,
            ..Geometry::LARGE_PAGE
        };
        assert!(tight_oob.validate().is_ok());
        let small_oob = Geometry {
            oob_size: 3,
            ..Geometry::SMALL_PAGE
        };
        assert!(small_oob.validate().is_ok());
    }

    #[test]
    fn test_page_base_formula() {
        let g = Geometry::LARGE_PAGE;
        assert_eq!(g.pages_per_block(), 64);

        // row 0x45 = block 1, page 5
        assert_eq!(g.split_row(0x45), (1, 5));
        assert_eq!(g.page_base(0x45), 64 * 2048 * 2 + 5 * 2048 * 2);
        assert_eq!(g.page_base(0x10), 0x10 * 2048 * 2);
    }

    #[test]
    fn test_windows() {
        let g = Geometry::LARGE_PAGE;
        let base = g.page_base(3);

        assert_eq!(g.data_window(3), Window { start: base, end: base + 2047 });
        assert_eq!(
            g.oob_window(3),
            Window {
                start: base + 2048,
                end: base + 2048 + 63
            }
        );
        assert_eq!(g.combined_window(3).end, UNBOUNDED_END);
    }

    #[test]
    fn test_ecc_steps() {
        assert_eq!(Geometry::LARGE_PAGE.ecc_steps(), 4);
        assert_eq!(Geometry::LARGE_PAGE.ecc_bytes(), 12);
        assert_eq!(Geometry::SMALL_PAGE.ecc_steps(), 1);
        assert!(!Geometry::SMALL_PAGE.is_large_page());
    }
}
