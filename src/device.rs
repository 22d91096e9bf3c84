//! Opening the simulated device
//!
//! Resolves the profile from `--profile` or `--preset`, loads the backing
//! image if one exists and attaches the controller.

use std::fs;
use std::path::PathBuf;

use sprd_nand_sim::{SimHost, SimNfc, SimProfile};

use crate::cli::DeviceArgs;

/// Attached controller plus where to persist the array
pub struct Device {
    pub host: SimHost,
    pub profile: SimProfile,
    image: Option<PathBuf>,
}

/// Resolve the device profile from the command line
pub fn load_profile(args: &DeviceArgs) -> Result<SimProfile, Box<dyn std::error::Error>> {
    let profile = match &args.profile {
        Some(path) => {
            let profile = SimProfile::load(path)?;
            log::info!("Loaded profile '{}' from {:?}", profile.name, path);
            profile
        }
        None => SimProfile::preset(&args.preset)?,
    };
    Ok(profile)
}

/// Open the simulated device described by the command line
pub fn open_device(args: &DeviceArgs) -> Result<Device, Box<dyn std::error::Error>> {
    let profile = load_profile(args)?;

    let sim = match args.image.as_deref() {
        Some(path) if path.exists() => {
            let image = fs::read(path)?;
            log::debug!("Loaded {} byte image from {:?}", image.len(), path);
            SimNfc::with_image(profile.clone(), &image)?
        }
        Some(path) => {
            log::info!("{:?} does not exist, starting from an erased array", path);
            SimNfc::new(profile.clone())?
        }
        None => SimNfc::new(profile.clone())?,
    };

    let host = sprd_nand_sim::attach(sim)?;
    Ok(Device {
        host,
        profile,
        image: args.image.clone(),
    })
}

impl Device {
    /// Write the array back to the image file, if one was given
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(path) = self.image.as_deref() else {
            log::warn!("No --image given, changes are discarded");
            return Ok(());
        };
        fs::write(path, self.host.chip().bus().image())?;
        log::info!("Saved image to {:?}", path);
        Ok(())
    }
}
