//! Base64 VLQ encoding as used by source map `mappings` strings.
//!
//! Each value is zig-zag encoded (sign in the lowest bit) and split into 5-bit groups,
//! least significant first, with bit 6 of each base64 digit marking continuation.

use thiserror::Error;

const B64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const CONTINUATION: u8 = 0x20;

/// Errors produced while decoding a `mappings` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid base64 digit {0:?} in mappings")]
    InvalidDigit(char),
    #[error("mappings end in the middle of a value")]
    UnexpectedEnd,
    #[error("VLQ value does not fit in 64 bits")]
    Overflow,
    #[error("segment has {0} fields; expected 1, 4 or 5")]
    BadSegmentLength(usize),
    #[error("segment field resolves to a negative index or position")]
    NegativeValue,
}

/// Appends the VLQ encoding of `value` to `out`.
pub fn encode(value: i64, out: &mut String) {
    let mut v = if value < 0 {
        (value.unsigned_abs() << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (v & 0x1f) as u8;
        v >>= 5;
        if v > 0 {
            digit |= CONTINUATION;
        }
        out.push(B64[digit as usize] as char);
        if v == 0 {
            break;
        }
    }
}

fn digit_value(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Decodes one value starting at `*pos`, advancing `*pos` past it.
pub fn decode(input: &[u8], pos: &mut usize) -> Result<i64, DecodeError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = *input.get(*pos).ok_or(DecodeError::UnexpectedEnd)?;
        let digit = digit_value(byte).ok_or(DecodeError::InvalidDigit(byte as char))?;
        *pos += 1;
        if shift > 60 {
            return Err(DecodeError::Overflow);
        }
        result |= u64::from(digit & 0x1f) << shift;
        shift += 5;
        if digit & CONTINUATION == 0 {
            break;
        }
    }
    let magnitude = (result >> 1) as i64;
    Ok(if result & 1 == 1 { -magnitude } else { magnitude })
}
