//! Data mover between controller buffers and the staging buffer
//!
//! The controller buffers are happiest with word accesses, so copies use
//! the widest transfer the destination alignment allows. The access width
//! never changes the result: every path produces the same bytes as a plain
//! byte copy, including any tail shorter than one transfer.

/// Access width chosen for a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// 32-bit transfers
    Word,
    /// 16-bit transfers
    HalfWord,
    /// 8-bit transfers
    Byte,
}

impl Width {
    /// Widest access usable at `addr`
    pub fn for_address(addr: usize) -> Self {
        match addr & 0x3 {
            0 => Self::Word,
            2 => Self::HalfWord,
            _ => Self::Byte,
        }
    }
}

/// Copy `src` into the front of `dst`
///
/// Copies `min(src.len(), dst.len())` bytes and returns that count.
pub fn copy(src: &[u8], dst: &mut [u8]) -> usize {
    let len = src.len().min(dst.len());
    let src = &src[..len];
    let dst = &mut dst[..len];

    match Width::for_address(dst.as_ptr() as usize) {
        Width::Word => copy_words(src, dst),
        Width::HalfWord => copy_half_words(src, dst),
        Width::Byte => copy_bytes(src, dst),
    }
    len
}

/// Fill a buffer with the erased-flash pattern
pub fn fill_erased(dst: &mut [u8]) {
    dst.fill(0xFF);
}

fn copy_words(src: &[u8], dst: &mut [u8]) {
    let mut dst_words = dst.chunks_exact_mut(4);
    let mut src_words = src.chunks_exact(4);
    for (d, s) in dst_words.by_ref().zip(src_words.by_ref()) {
        let word = u32::from_ne_bytes([s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&word.to_ne_bytes());
    }
    copy_bytes(src_words.remainder(), dst_words.into_remainder());
}

fn copy_half_words(src: &[u8], dst: &mut [u8]) {
    let mut dst_halves = dst.chunks_exact_mut(2);
    let mut src_halves = src.chunks_exact(2);
    for (d, s) in dst_halves.by_ref().zip(src_halves.by_ref()) {
        let half = u16::from_ne_bytes([s[0], s[1]]);
        d.copy_from_slice(&half.to_ne_bytes());
    }
    copy_bytes(src_halves.remainder(), dst_halves.into_remainder());
}

fn copy_bytes(src: &[u8], dst: &mut [u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = *s;
    }
}
