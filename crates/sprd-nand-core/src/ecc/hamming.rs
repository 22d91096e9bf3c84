//! Software model of the hardware parity accumulator
//!
//! Produces the 3-byte code for one 512-byte sub-block in canonical order,
//! i.e. the layout [`super::correct`] decodes. Each of the 12 address bits
//! of a data bit (9 byte-index bits, 3 bit-index bits) owns a pair of
//! parity bits: the even bit covers data bits whose address bit is 1, the
//! odd bit covers those where it is 0.
//!
//! | Code byte | Bits 1:0 | Bits 3:2 | Bits 5:4 | Bits 7:6 |
//! |-----------|----------|----------|----------|----------|
//! | 0         | byte[0]  | byte[1]  | byte[2]  | byte[3]  |
//! | 1         | byte[4]  | byte[5]  | byte[6]  | byte[7]  |
//! | 2         | byte[8]  | bit[0]   | bit[1]   | bit[2]   |

/// Column masks selecting bit positions whose bit-index bit `j` is set
const COLUMN_ONE: [u8; 3] = [0xAA, 0xCC, 0xF0];

/// Calculate the parity code of one sub-block (up to 512 bytes)
pub fn calculate(data: &[u8]) -> [u8; 3] {
    let mut line_one: u16 = 0;
    let mut line_zero: u16 = 0;
    let mut column: u8 = 0;

    for (i, &b) in data.iter().enumerate() {
        column ^= b;
        if b.count_ones() & 1 == 1 {
            let index = i as u16 & 0x1FF;
            line_one ^= index;
            line_zero ^= !index & 0x1FF;
        }
    }

    let pair = |one: bool, zero: bool| (one as u8) | ((zero as u8) << 1);
    let line = |k: u32| pair((line_one >> k) & 1 == 1, (line_zero >> k) & 1 == 1);
    let col = |j: usize| {
        pair(
            (column & COLUMN_ONE[j]).count_ones() & 1 == 1,
            (column & !COLUMN_ONE[j]).count_ones() & 1 == 1,
        )
    };

    let mut code = [0u8; 3];
    for k in 0..4 {
        code[0] |= line(k) << (2 * k);
        code[1] |= line(k + 4) << (2 * k);
    }
    code[2] = line(8) | (col(0) << 2) | (col(1) << 4) | (col(2) << 6);
    code
}
