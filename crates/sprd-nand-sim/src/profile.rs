//! Simulated device profiles
//!
//! A profile describes the NAND part behind the simulated controller. It
//! can come from one of the built-in presets or from a RON file:
//!
//! ```ron
//! (
//!     name: "K9F2G08",
//!     id: 0xECDA1095,
//!     geometry: (page_size: 2048, oob_size: 64, block_size: 131072),
//!     blocks: 64,
//!     busy_polls: 4,
//! )
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sprd_nand_core::{ControllerConfig, Geometry};

use crate::error::{Result, SimError};

/// Device and controller parameters for one simulated part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimProfile {
    /// Part name, for display
    pub name: String,
    /// Value READID latches into the ID register
    pub id: u32,
    /// Page, spare and block sizes
    pub geometry: Geometry,
    /// Number of erase blocks
    pub blocks: u32,
    /// Busy-bit polls each command takes to complete
    #[serde(default)]
    pub busy_polls: u32,
    /// Controller tunables
    #[serde(default)]
    pub controller: ControllerConfig,
}

impl SimProfile {
    /// 2 KiB page part with 64 byte spare (K9F2G08-like, trimmed to 64 blocks)
    pub fn large_page() -> Self {
        Self {
            name: "K9F2G08".into(),
            id: 0xECDA_1095,
            geometry: Geometry::LARGE_PAGE,
            blocks: 64,
            busy_polls: 4,
            controller: ControllerConfig::default(),
        }
    }

    /// 512 byte page part with 16 byte spare (K9F1208-like, trimmed to 256 blocks)
    pub fn small_page() -> Self {
        Self {
            name: "K9F1208".into(),
            id: 0xEC76_5A3F,
            geometry: Geometry::SMALL_PAGE,
            blocks: 256,
            busy_polls: 2,
            controller: ControllerConfig::default(),
        }
    }

    /// Look up a built-in preset by name
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "large" => Ok(Self::large_page()),
            "small" => Ok(Self::small_page()),
            other => Err(SimError::UnknownPreset(other.to_string())),
        }
    }

    /// Parse a profile from a RON string
    pub fn from_ron(content: &str) -> Result<Self> {
        let profile: Self = ron::from_str(content)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Check the profile describes a device the controller can drive
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| SimError::InvalidProfile {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.geometry.validate().is_err() {
            return Err(invalid("unsupported geometry"));
        }
        if self.blocks == 0 {
            return Err(invalid("device has no blocks"));
        }
        if self
            .blocks
            .checked_mul(self.geometry.pages_per_block())
            .is_none()
        {
            return Err(invalid("too many pages"));
        }
        if self.controller.timeout_polls == 0 {
            return Err(invalid("timeout_polls must be non-zero"));
        }
        Ok(())
    }

    /// Total number of pages
    pub fn total_pages(&self) -> u32 {
        self.blocks * self.geometry.pages_per_block()
    }

    /// Size of a raw array image (data and spare of every page)
    pub fn image_size(&self) -> usize {
        self.total_pages() as usize * self.geometry.raw_page_size()
    }
}
