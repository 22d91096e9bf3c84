//! Info and status commands

use sprd_nand_core::regs::StatusBits;

use crate::device::Device;

/// Run the info command
pub fn run_info(device: &mut Device) -> Result<(), Box<dyn std::error::Error>> {
    device.host.reset()?;
    let id = device.host.read_id()?;
    let profile = &device.profile;
    let geometry = profile.geometry;

    println!("Device: {}", profile.name);
    println!("  ID:          0x{:08X}", id);
    println!(
        "  Page:        {} bytes + {} bytes spare",
        geometry.page_size, geometry.oob_size
    );
    println!(
        "  Block:       {} KiB ({} pages)",
        geometry.block_size / 1024,
        geometry.pages_per_block()
    );
    println!(
        "  Size:        {} blocks, {} pages",
        profile.blocks,
        profile.total_pages()
    );
    println!(
        "  ECC:         {} x 3 bytes at spare offset {}",
        geometry.ecc_steps(),
        device.host.ecc_offset()
    );
    println!(
        "  Timing:      0x{:05X} ({} MHz AHB)",
        device.host.chip().bus().timing(),
        device.host.chip().config().ahb_clock_mhz
    );
    Ok(())
}

/// Run the status command
pub fn run_status(device: &mut Device) -> Result<(), Box<dyn std::error::Error>> {
    let raw = device.host.status()?;
    let bits = StatusBits::from_bits_truncate(raw);

    println!("Status: 0x{:02X}", raw);
    println!(
        "  Ready:         {}",
        if bits.contains(StatusBits::READY) { "yes" } else { "no" }
    );
    println!(
        "  Write enabled: {}",
        if bits.contains(StatusBits::WRITE_ENABLED) { "yes" } else { "no" }
    );
    println!(
        "  Last op:       {}",
        if bits.contains(StatusBits::FAIL) { "FAILED" } else { "ok" }
    );
    Ok(())
}
