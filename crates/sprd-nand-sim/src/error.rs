//! Error types for the simulator

use std::io;
use thiserror::Error;

/// Simulator setup and image errors
#[derive(Debug, Error)]
pub enum SimError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Profile file could not be parsed
    #[error("Failed to parse profile: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Profile values are inconsistent
    #[error("Invalid profile '{name}': {reason}")]
    InvalidProfile { name: String, reason: String },

    /// No built-in profile with this name
    #[error("Unknown preset '{0}' (expected 'large' or 'small')")]
    UnknownPreset(String),

    /// Image does not match the array size
    #[error("Image is {actual} bytes, expected {expected}")]
    ImageSize { expected: usize, actual: usize },

    /// Page or byte beyond the array
    #[error("Page {page} byte {byte} is outside the array")]
    OutOfRange { page: u32, byte: usize },

    /// Controller core error
    #[error("NAND error: {0}")]
    Nand(#[from] sprd_nand_core::Error),
}

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;
