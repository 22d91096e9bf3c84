//! Read command implementation

use sprd_nand_core::ecc::PageCorrection;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::{check_range, progress_bar};
use crate::device::Device;

/// Run the read command
pub fn run_read(
    device: &mut Device,
    page: u32,
    count: u32,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_pages_with_progress(device, page, count)?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Read a run of pages, correcting each with ECC
pub fn read_pages_with_progress(
    device: &mut Device,
    first: u32,
    count: u32,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    check_range(first, count, device.profile.total_pages(), "pages")?;
    let geometry = device.profile.geometry;
    let page_size = geometry.page_size as usize;
    let mut data = vec![0xFFu8; page_size * count as usize];
    let mut oob = vec![0u8; geometry.oob_size as usize];
    let mut corrected = 0u32;

    let pb = progress_bar(count as u64, "pages")?;
    for (i, chunk) in data.chunks_exact_mut(page_size).enumerate() {
        let page = first + i as u32;
        match device.host.read_page(page, chunk, &mut oob)? {
            PageCorrection::Corrected { bits } => {
                log::info!("Page {}: corrected {} bit(s)", page, bits);
                corrected += u32::from(bits);
            }
            PageCorrection::ParityOnly => {
                log::warn!("Page {}: stored ECC damaged, data intact", page);
            }
            PageCorrection::Clean | PageCorrection::Uncorrectable => {}
        }
        pb.inc(1);
    }
    pb.finish_with_message("Read complete");

    if corrected > 0 {
        println!("Corrected {} bit error(s)", corrected);
    }
    Ok(data)
}
