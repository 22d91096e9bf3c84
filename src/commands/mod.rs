//! CLI command implementations
//!
//! Every command works on an attached [`crate::device::Device`]. Commands
//! that change the array save it back to the image afterwards.

pub mod erase;
pub mod flip;
pub mod info;
pub mod oob;
pub mod read;
pub mod write;

use indicatif::{ProgressBar, ProgressStyle};

/// Check that `count` units starting at `first` lie within `total`
pub(crate) fn check_range(first: u32, count: u32, total: u32, unit: &str) -> Result<(), String> {
    match first.checked_add(count) {
        Some(end) if count > 0 && end <= total => Ok(()),
        _ => Err(format!(
            "{} {} from {} {} exceed the device ({} {})",
            count, unit, unit, first, total, unit
        )),
    }
}

/// Progress bar counting pages or blocks
pub(crate) fn progress_bar(total: u64, unit: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{eta}})",
                unit
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range() {
        assert!(check_range(0, 64, 64, "blocks").is_ok());
        assert!(check_range(63, 1, 64, "blocks").is_ok());
        assert!(check_range(63, 2, 64, "blocks").is_err());
        assert!(check_range(0, 0, 64, "blocks").is_err());
        assert!(check_range(u32::MAX, 2, 64, "blocks").is_err());
        assert!(check_range(0, u32::MAX, 4096, "pages").is_err());
    }
}
