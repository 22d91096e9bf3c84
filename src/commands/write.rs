//! Write command implementation

use std::fs;
use std::path::Path;

use super::{check_range, progress_bar};
use crate::device::Device;

/// Run the write command
///
/// Pages must be erased first; programming only clears bits.
pub fn run_write(
    device: &mut Device,
    first: u32,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut data = fs::read(input)?;
    let page_size = device.profile.geometry.page_size as usize;
    if data.is_empty() {
        return Err(format!("{:?} is empty", input).into());
    }
    let padded = data.len().div_ceil(page_size) * page_size;
    data.resize(padded, 0xFF);
    let count = u32::try_from(padded / page_size).map_err(|_| format!("{:?} is too large", input))?;

    check_range(first, count, device.profile.total_pages(), "pages")?;
    let last = first + count - 1;

    let pb = progress_bar(count as u64, "pages")?;
    for (i, chunk) in data.chunks_exact(page_size).enumerate() {
        device.host.program_page(first + i as u32, chunk, None)?;
        pb.inc(1);
    }
    pb.finish_with_message("Write complete");

    device.save()?;
    println!("Programmed pages {}..={}", first, last);
    Ok(())
}
