//! sprd-nand-core - NAND flash controller core for SC88xx SoCs
//!
//! This crate drives the SC88xx NAND flash controller (NFC) on behalf of a
//! generic NAND layer. The generic layer talks to the controller through a
//! narrow callback surface ([`NandCallbacks`]): it selects the chip, sends
//! command and address tokens, polls for readiness, moves page bytes through
//! a staging buffer and asks for hardware ECC. This crate turns that token
//! stream into register programming.
//!
//! It is `no_std` and never allocates. The hardware itself sits behind the
//! [`regs::NfcBus`] trait so the same controller logic runs against MMIO or
//! a simulated register block.
//!
//! # Pieces
//!
//! - [`tracker`] - accumulates column/row address phases and tracks the
//!   direction and area of the in-flight operation
//! - [`dispatch`] - maps operations onto the command, window and timing
//!   registers and waits for completion
//! - [`mover`] - alignment-aware copies between hardware buffers and the
//!   staging buffer
//! - [`ecc`] - parity capture, reordering and single-bit correction
//! - [`controller`] - the owning session that ties the above together
//!
//! # Features
//!
//! - `std` - Enable standard library support (serde derives for
//!   configuration types and `std::error::Error` for [`Error`])
//!
//! # Example
//!
//! ```ignore
//! use sprd_nand_core::{NandController, NandCallbacks, ControllerConfig, Geometry};
//!
//! let mut nfc = NandController::attach(bus, Geometry::LARGE_PAGE, ControllerConfig::default())?;
//! nfc.cmd_ctrl(opcodes::READID as i32, CtrlFlags::CLE)?;
//! println!("flash id: {:08x}", nfc.read_id());
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod controller;
pub mod dispatch;
pub mod ecc;
pub mod error;
pub mod geometry;
pub mod mover;
pub mod regs;
pub mod tracker;

pub use controller::{ControllerConfig, NandCallbacks, NandController};
pub use error::{Error, Result};
pub use geometry::Geometry;
