//! Command/address tracking
//!
//! The generic NAND layer describes every operation as a stream of
//! `cmd_ctrl` calls: command bytes (CLE), address values (ALE) and no-op
//! tokens. This module decodes that stream into [`Token`]s and keeps the
//! per-operation state the dispatcher needs: the two address phases, the
//! transfer direction and which page area is targeted.

use bitflags::bitflags;
use log::{trace, warn};

use crate::geometry::Geometry;
use crate::regs::opcodes;

bitflags! {
    /// Control lines accompanying a `cmd_ctrl` call
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CtrlFlags: u32 {
        /// Chip enable
        const NCE    = 0x01;
        /// Command latch enable: the value is a command
        const CLE    = 0x02;
        /// Address latch enable: the value is an address phase
        const ALE    = 0x04;
        /// Control lines changed with this call
        const CHANGE = 0x80;
    }
}

/// Commands the controller understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NandCommand {
    /// Reset the device
    Reset,
    /// Read the device ID
    ReadId,
    /// Read the status register
    Status,
    /// Erase setup
    Erase1,
    /// Erase confirm
    Erase2,
    /// Read setup
    Read0,
    /// Read confirm
    ReadStart,
    /// Program setup
    SeqIn,
    /// Program confirm
    PageProg,
}

impl NandCommand {
    /// Decode an opcode byte
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        Some(match opcode {
            opcodes::RESET => Self::Reset,
            opcodes::READID => Self::ReadId,
            opcodes::STATUS => Self::Status,
            opcodes::ERASE1 => Self::Erase1,
            opcodes::ERASE2 => Self::Erase2,
            opcodes::READ0 => Self::Read0,
            opcodes::READSTART => Self::ReadStart,
            opcodes::SEQIN => Self::SeqIn,
            opcodes::PAGEPROG => Self::PageProg,
            _ => return None,
        })
    }

    /// Opcode byte of this command
    pub fn opcode(self) -> u8 {
        match self {
            Self::Reset => opcodes::RESET,
            Self::ReadId => opcodes::READID,
            Self::Status => opcodes::STATUS,
            Self::Erase1 => opcodes::ERASE1,
            Self::Erase2 => opcodes::ERASE2,
            Self::Read0 => opcodes::READ0,
            Self::ReadStart => opcodes::READSTART,
            Self::SeqIn => opcodes::SEQIN,
            Self::PageProg => opcodes::PAGEPROG,
        }
    }
}

/// One decoded `cmd_ctrl` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A recognised command
    Command(NandCommand),
    /// A command byte the controller does not implement
    Unknown(u8),
    /// One address phase
    Address(u32),
    /// Nothing to do
    None,
}

impl Token {
    /// Decode a `cmd_ctrl(dat, ctrl)` call
    pub fn decode(dat: i32, ctrl: CtrlFlags) -> Self {
        if dat == opcodes::CMD_NONE {
            return Self::None;
        }
        if ctrl.contains(CtrlFlags::CLE) {
            let opcode = dat as u8;
            match NandCommand::from_opcode(opcode) {
                Some(cmd) => Self::Command(cmd),
                None => Self::Unknown(opcode),
            }
        } else if ctrl.contains(CtrlFlags::ALE) {
            Self::Address(dat as u32)
        } else {
            Self::None
        }
    }
}

/// Direction of the in-flight operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteReadMode {
    /// No page operation in progress
    #[default]
    None,
    /// Program sequence started (SEQIN seen)
    Write,
    /// Read sequence started (READ0 seen)
    Read,
}

/// Page area the in-flight transfer targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaMode {
    /// Not yet known
    #[default]
    None,
    /// Main data area
    Data,
    /// Spare area
    Oob,
    /// Main data and spare in one transfer
    DataOob,
}

impl AreaMode {
    /// Area addressed by a column value
    ///
    /// Column 0 starts the data area and column `page_size` starts the
    /// spare area. Other columns are not supported by the controller.
    pub fn for_column(column: u32, geometry: &Geometry) -> Option<Self> {
        if column == geometry.page_size {
            Some(Self::Oob)
        } else if column == 0 {
            Some(Self::Data)
        } else {
            None
        }
    }

    /// Area after spare bytes have been staged for this operation
    pub fn with_oob(self) -> Self {
        match self {
            Self::None | Self::Oob => Self::Oob,
            Self::Data | Self::DataOob => Self::DataOob,
        }
    }
}

/// Which phase an address token filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressPhase {
    /// First phase: column
    Column,
    /// Second phase: row; the address is now complete
    Row,
    /// Both phases were already set; the value was dropped
    Ignored,
}

/// Column/row address of the current operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationAddress {
    column: u32,
    row: u32,
    column_set: bool,
    row_set: bool,
}

impl OperationAddress {
    /// Forget both phases
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one address value
    pub fn push(&mut self, value: u32) -> AddressPhase {
        if !self.column_set {
            self.column = value;
            self.column_set = true;
            AddressPhase::Column
        } else if !self.row_set {
            self.row = value;
            self.row_set = true;
            AddressPhase::Row
        } else {
            AddressPhase::Ignored
        }
    }

    /// Column (byte offset within the page)
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Row (page index)
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Whether the column phase was seen
    pub fn column_set(&self) -> bool {
        self.column_set
    }

    /// Whether the row phase was seen
    pub fn row_set(&self) -> bool {
        self.row_set
    }

    /// Whether any phase was seen
    pub fn is_empty(&self) -> bool {
        !self.column_set && !self.row_set
    }

    /// Whether both phases were seen
    pub fn is_complete(&self) -> bool {
        self.column_set && self.row_set
    }

    /// Erase addressing: a lone first phase is the row
    ///
    /// Block erase only sends page address cycles, so the first value lands
    /// in the column slot. Move it to the row. Returns the row to erase, or
    /// `None` if no phase was seen.
    pub fn erase_row(&mut self) -> Option<u32> {
        if self.column_set && !self.row_set {
            self.row = self.column;
            self.row_set = true;
            self.column = 0;
            self.column_set = false;
        }
        self.row_set.then_some(self.row)
    }
}

/// Per-operation tracker state
#[derive(Debug, Clone, Copy, Default)]
pub struct Tracker {
    /// Address phases collected so far
    pub address: OperationAddress,
    /// Direction of the operation
    pub mode: WriteReadMode,
    /// Targeted area
    pub area: AreaMode,
}

impl Tracker {
    /// Start a new addressed operation
    pub fn begin(&mut self, mode: WriteReadMode) {
        self.address.reset();
        self.mode = mode;
        self.area = AreaMode::None;
    }

    /// Close the current operation
    pub fn finish(&mut self) {
        self.mode = WriteReadMode::None;
        self.area = AreaMode::None;
    }

    /// Feed an address value; returns the row and area once both phases
    /// are known and the column names a supported area
    pub fn push_address(&mut self, value: u32, geometry: &Geometry) -> Option<(u32, AreaMode)> {
        match self.address.push(value) {
            AddressPhase::Column => {
                trace!("column = 0x{:x}", value);
                None
            }
            AddressPhase::Row => {
                trace!("row = 0x{:x}", value);
                let column = self.address.column();
                match AreaMode::for_column(column, geometry) {
                    Some(area) => {
                        self.area = area;
                        Some((self.address.row(), area))
                    }
                    None => {
                        warn!("unsupported column 0x{:x}, no area selected", column);
                        None
                    }
                }
            }
            AddressPhase::Ignored => {
                trace!("extra address value 0x{:x} ignored", value);
                None
            }
        }
    }

    /// Whether an operation is in flight; the generic layer polls this
    /// through readiness
    pub fn in_flight(&self) -> bool {
        self.mode != WriteReadMode::None
    }
}
