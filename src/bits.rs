// SPDX-License-Identifier: MIT

//! Bit extraction from report payloads.
//!
//! HID report fields are packed LSB-first with no alignment, so a field
//! of 1 to 7 bits routinely straddles a byte boundary. [slice] copies
//! an arbitrary bit run out of a buffer into the smallest byte buffer that
//! holds it, with the result's little-endian unsigned value equal to the
//! requested bits.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SliceError {
    #[error("Invalid bit length {length}")]
    InvalidArgument { length: usize },
    #[error("Bits {offset}..{offset}+{length} out of range for {available} bits")]
    OutOfRange {
        offset: usize,
        length: usize,
        available: usize,
    },
}

/// Extract `length` bits starting at bit `offset` of `buffer`.
///
/// The returned buffer has `ceil(length / 8)` bytes and any bits above
/// `length` in the last byte are zero.
///
/// ```
/// # use hiddecode::bits::slice;
/// // bits 4..12 of 0xAB 0xCD are 0xDA
/// assert_eq!(slice(&[0xAB, 0xCD], 4, 8).unwrap(), vec![0xDA]);
/// assert_eq!(slice(&[0b0000_0101], 2, 1).unwrap(), vec![1]);
/// ```
pub fn slice(buffer: &[u8], offset: usize, length: usize) -> Result<Vec<u8>, SliceError> {
    ensure!(length > 0, SliceError::InvalidArgument { length });

    let available = buffer.len() * 8;
    let in_range = offset
        .checked_add(length)
        .is_some_and(|end| end <= available);
    ensure!(
        in_range,
        SliceError::OutOfRange {
            offset,
            length,
            available,
        }
    );

    let start = offset / 8;
    let shift = offset % 8;
    let nbytes = length.div_ceil(8);

    let mut result: Vec<u8> = (0..nbytes)
        .map(|i| {
            let lo = buffer[start + i] >> shift;
            let hi = match shift {
                0 => 0,
                _ => buffer
                    .get(start + i + 1)
                    .map_or(0, |b| *b << (8 - shift)),
            };
            lo | hi
        })
        .collect();

    let excess = length % 8;
    if excess != 0 {
        if let Some(last) = result.last_mut() {
            *last &= (1u8 << excess) - 1;
        }
    }

    Ok(result)
}

/// Interpret up to 8 bytes as a little-endian unsigned value. Bytes beyond
/// the eighth are ignored.
pub fn le_to_u64(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .enumerate()
        .fold(0u64, |acc, (i, b)| acc | (*b as u64) << (8 * i))
}

/// Sign-extend the lowest `nbits` of `value` into an [i64].
pub fn sign_extend(value: u64, nbits: usize) -> i64 {
    match nbits {
        0 => 0,
        1..=63 => {
            let shift = 64 - nbits;
            ((value << shift) as i64) >> shift
        }
        _ => value as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(buffer: &[u8], offset: usize, length: usize) -> u128 {
        let value = buffer
            .iter()
            .enumerate()
            .fold(0u128, |acc, (i, b)| acc | (*b as u128) << (8 * i));
        let mask = if length >= 128 {
            u128::MAX
        } else {
            (1u128 << length) - 1
        };
        (value >> offset) & mask
    }

    fn as_u128(bytes: &[u8]) -> u128 {
        bytes
            .iter()
            .enumerate()
            .fold(0u128, |acc, (i, b)| acc | (*b as u128) << (8 * i))
    }

    #[test]
    fn slice_matches_shift_and_mask() {
        let buffers: [&[u8]; 4] = [
            &[0xff; 16],
            &[0x01, 0x80, 0x55, 0xaa, 0x0f, 0xf0, 0x12, 0x34],
            &[0b1010_0101],
            &[
                0xde, 0xad, 0xbe, 0xef, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88,
                0x99, 0xaa, 0xbb,
            ],
        ];

        for buffer in buffers {
            let nbits = buffer.len() * 8;
            for offset in 0..nbits {
                for length in 1..=(nbits - offset) {
                    let bytes = slice(buffer, offset, length).unwrap();
                    assert_eq!(bytes.len(), length.div_ceil(8), "offset {offset} length {length}");
                    assert_eq!(
                        as_u128(&bytes),
                        reference(buffer, offset, length),
                        "offset {offset} length {length}"
                    );
                }
            }
        }
    }

    #[test]
    fn slice_straddling_fields() {
        // 3 bits at offset 6 cover the top two bits of byte 0 and bit 0 of byte 1
        assert_eq!(slice(&[0b1100_0000, 0b0000_0001], 6, 3).unwrap(), vec![0b111]);
        assert_eq!(slice(&[0b0100_0000, 0b0000_0000], 6, 3).unwrap(), vec![0b001]);
        // 12 bits at offset 4
        assert_eq!(slice(&[0x21, 0x43, 0x65], 4, 12).unwrap(), vec![0x32, 0x04]);
    }

    #[test]
    fn slice_errors() {
        assert_eq!(
            slice(&[0xff], 0, 0),
            Err(SliceError::InvalidArgument { length: 0 })
        );
        assert_eq!(
            slice(&[0xff], 4, 5),
            Err(SliceError::OutOfRange {
                offset: 4,
                length: 5,
                available: 8
            })
        );
        assert!(matches!(
            slice(&[], 0, 1),
            Err(SliceError::OutOfRange { .. })
        ));
        assert!(matches!(
            slice(&[0xff], usize::MAX, 2),
            Err(SliceError::OutOfRange { .. })
        ));
    }

    #[test]
    fn values() {
        assert_eq!(le_to_u64(&[0x34, 0x12]), 0x1234);
        assert_eq!(le_to_u64(&[]), 0);
        assert_eq!(sign_extend(0xfb, 8), -5);
        assert_eq!(sign_extend(0x7f, 8), 127);
        assert_eq!(sign_extend(0b11, 2), -1);
        assert_eq!(sign_extend(0b01, 2), 1);
        assert_eq!(sign_extend(0x8000, 16), -32768);
        assert_eq!(sign_extend(u64::MAX, 64), -1);
    }
}
