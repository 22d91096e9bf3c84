//! Spare area commands

use crate::device::Device;

/// Run the read-oob command
pub fn run_read_oob(device: &mut Device, page: u32) -> Result<(), Box<dyn std::error::Error>> {
    let mut oob = vec![0u8; device.profile.geometry.oob_size as usize];
    device.host.read_oob(page, &mut oob)?;

    let ecc_offset = device.host.ecc_offset();
    println!("Page {} spare:", page);
    for (row, chunk) in oob.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
        println!("  {:04X}: {}", row * 16, hex.join(" "));
    }
    println!(
        "  ECC: {}",
        oob[ecc_offset..]
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    );
    Ok(())
}
