//! Bit-flip injection

use crate::device::Device;

/// Run the flip command
pub fn run_flip(
    device: &mut Device,
    page: u32,
    byte: u32,
    bit: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    device
        .host
        .chip_mut()
        .bus_mut()
        .flip_bit(page, byte as usize, bit)?;
    device.save()?;
    println!("Flipped page {} byte {} bit {}", page, byte, bit);
    Ok(())
}
