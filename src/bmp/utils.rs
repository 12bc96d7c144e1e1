//! BMP bit unpacking and bitfield scaling.
//!
//! Forked from zune-bmp 0.5.2 by Caleb Etemesi (MIT/Apache-2.0/Zlib).

/// Unpack sub-byte palette indices (1, 2 or 4 bits per pixel), MSB first.
///
/// Fills `out` from `input` until either runs out; a trailing partial byte
/// fills the remainder of `out`.
pub(crate) fn expand_bits_to_byte(depth: usize, input: &[u8], out: &mut [u8]) {
    let per_byte = match depth {
        1 | 2 | 4 => 8 / depth,
        _ => return,
    };
    let mask = (1u8 << depth) - 1;

    let mut in_iter = input.iter();
    let mut out_iter = out.chunks_exact_mut(per_byte);

    (&mut out_iter)
        .zip(&mut in_iter)
        .for_each(|(out_vals, in_val)| {
            for (pos, out_val) in out_vals.iter_mut().enumerate() {
                let shift = 8 - depth * (pos + 1);
                *out_val = (in_val >> shift) & mask;
            }
        });

    if let Some(in_val) = in_iter.next() {
        let remainder_iter = out_iter.into_remainder().iter_mut();
        remainder_iter.enumerate().for_each(|(pos, out_val)| {
            let shift = 8 - depth * (pos + 1);
            *out_val = (in_val >> shift) & mask;
        });
    }
}

/// Bitfield shift/scale table for converting N-bit values to 8-bit.
pub(crate) const MUL_TABLE: [u32; 9] = [
    0,    // 0 bits
    0xff, // 1 bit:  0b11111111
    0x55, // 2 bits: 0b01010101
    0x49, // 3 bits: 0b01001001
    0x11, // 4 bits: 0b00010001
    0x21, // 5 bits: 0b00100001
    0x41, // 6 bits: 0b01000001
    0x81, // 7 bits: 0b10000001
    0x01, // 8 bits: 0b00000001
];

pub(crate) const SHIFT_TABLE: [i32; 9] = [0, 0, 0, 1, 0, 2, 4, 6, 0];

/// Extract and scale a bitfield value to 8-bit range.
pub(crate) fn shift_signed(mut v: u32, shift: i32, mut bits: u32) -> u32 {
    if shift < 0 {
        v <<= -shift;
    } else {
        v >>= shift;
    }
    bits = bits.clamp(0, 8);
    v >>= 8 - bits;
    (v.wrapping_mul(MUL_TABLE[bits as usize])) >> SHIFT_TABLE[bits as usize]
}

/// Scale the field selected by `mask` out of `v` to 0..=255.
pub(crate) fn mask_channel(v: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let high = 31 - mask.leading_zeros() as i32;
    shift_signed(v & mask, high - 7, mask.count_ones()) as u8
}
