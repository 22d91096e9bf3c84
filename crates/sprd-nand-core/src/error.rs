//! Error types for sprd-nand-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Controller errors
    /// The controller busy bit did not clear within the poll bound
    Timeout,
    /// The device reported a failed program or erase
    OperationFailed,
    /// The device stayed busy for longer than the caller was willing to poll
    DeviceBusy,

    // Protocol errors
    /// Erase was issued without any address phase
    AddressNotSet,
    /// ECC was requested without arming a direction first
    EccNotArmed,

    // Data errors
    /// Page contains more bit errors than the ECC can correct
    EccUncorrectable {
        /// Page (row) index that failed
        page: u32,
    },

    // Setup errors
    /// Geometry is not supported by the controller
    InvalidGeometry,
    /// Page or block index is beyond the device
    AddressOutOfBounds,
    /// Provided buffer is too small for the operation
    BufferTooSmall,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "NAND controller command timed out"),
            Self::OperationFailed => write!(f, "NAND device reported operation failure"),
            Self::DeviceBusy => write!(f, "NAND device stayed busy"),
            Self::AddressNotSet => write!(f, "erase issued without an address"),
            Self::EccNotArmed => write!(f, "ECC calculation requested without a direction"),
            Self::EccUncorrectable { page } => {
                write!(f, "uncorrectable ECC error in page 0x{:08X}", page)
            }
            Self::InvalidGeometry => write!(f, "unsupported NAND geometry"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
