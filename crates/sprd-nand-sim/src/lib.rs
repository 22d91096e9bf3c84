//! sprd-nand-sim - Simulated SC88xx NAND controller for testing
//!
//! This crate models the SC88xx NFC register block and a NAND array in
//! memory so the controller core can run without hardware. It also carries
//! a small front end ([`NandHost`]) that sequences page reads, programs and
//! erases through the controller callbacks the way a generic NAND layer
//! does.
//!
//! # Example
//!
//! ```ignore
//! use sprd_nand_sim::{attach, SimNfc, SimProfile};
//!
//! let mut host = attach(SimNfc::new(SimProfile::large_page())?)?;
//! host.erase_block(0)?;
//! host.program_page(0, &data, None)?;
//! let outcome = host.read_page(0, &mut buf, &mut oob)?;
//! ```

pub mod error;
pub mod host;
pub mod nfc;
pub mod profile;

pub use error::{Result, SimError};
pub use host::NandHost;
pub use nfc::SimNfc;
pub use profile::SimProfile;

use sprd_nand_core::NandController;

/// Controller session over the simulator
pub type SimController = NandController<SimNfc>;

/// Page front end over a simulated controller
pub type SimHost = NandHost<SimController>;

/// Attach a controller to a simulator and wrap it in a host
///
/// Uses the geometry and controller settings of the simulator's profile
/// and bounds page indices to the simulated array.
pub fn attach(sim: SimNfc) -> Result<SimHost> {
    let profile = sim.profile().clone();
    let nfc = NandController::attach(sim, profile.geometry, profile.controller)?;
    Ok(NandHost::new(nfc).with_total_pages(profile.total_pages()))
}
