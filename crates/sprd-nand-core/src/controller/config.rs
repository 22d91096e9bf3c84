//! Controller configuration

use crate::regs::opcodes::DEFAULT_TIMEOUT_POLLS;

/// Tunables applied at attach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct ControllerConfig {
    /// Busy-bit polls before a command is declared timed out
    pub timeout_polls: u32,
    /// AHB clock in MHz, selects the timing parameters
    pub ahb_clock_mhz: u32,
    /// Settle time after RESET in microseconds
    pub reset_delay_us: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            timeout_polls: DEFAULT_TIMEOUT_POLLS,
            ahb_clock_mhz: 53,
            reset_delay_us: 2000,
        }
    }
}

impl ControllerConfig {
    /// Same configuration with a different poll bound
    pub fn with_timeout_polls(mut self, timeout_polls: u32) -> Self {
        self.timeout_polls = timeout_polls;
        self
    }
}
