//! Erase command implementation

use super::{check_range, progress_bar};
use crate::device::Device;

/// Run the erase command
pub fn run_erase(
    device: &mut Device,
    first: u32,
    count: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    check_range(first, count, device.profile.blocks, "blocks")?;

    let pb = progress_bar(count as u64, "blocks")?;
    for block in first..first + count {
        device.host.erase_block(block)?;
        pb.inc(1);
    }
    pb.finish_with_message("Erase complete");

    device.save()?;
    println!("Erased {} block(s) starting at block {}", count, first);
    Ok(())
}
