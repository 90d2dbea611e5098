//! Packed BCD codec and decimal range checks
//!
//! Most DS1302 registers share their byte with a flag bit or two, so the number of bits that belong
//! to the tens digit differs per field. [decode] is told how many of the byte's bits are decimal
//! data through a width tag: 0-4 only keep (part of) the ones nibble, 5-8 add a tens digit made of
//! the next 1-4 bits.

use crate::error::{ConfigError, RangeError};

/// Widest valid decode tag; a full two-digit byte
pub const MAX_WIDTH: u8 = 8;

/// Encode `value` as two-digit packed BCD
///
/// `value` must already be within `[0, 99]`; see [`check_range`]
#[must_use]
pub const fn encode(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

/// Decode the low `width` bits of a packed BCD byte
///
/// # Errors
/// Returns [`ConfigError::Width`] if `width` is greater than [`MAX_WIDTH`]
pub const fn decode(width: u8, raw: u8) -> Result<u8, ConfigError> {
    let ones = raw & 0x0f;

    let decoded = match width {
        0 => 0,
        1 => ones & 0x01,
        2 => ones & 0x03,
        3 => ones & 0x07,
        4 => ones,
        5 => ones + ((raw & 0x10) >> 4) * 10,
        6 => ones + ((raw & 0x30) >> 4) * 10,
        7 => ones + ((raw & 0x70) >> 4) * 10,
        8 => ones + ((raw & 0xf0) >> 4) * 10,
        _ => return Err(ConfigError::Width(width)),
    };

    Ok(decoded)
}

/// Pass `value` through if it lies within `[min, max]`
///
/// # Errors
/// Returns a [`RangeError`] describing the violated bound otherwise
pub const fn check_range(min: u8, max: u8, value: u8) -> Result<u8, RangeError> {
    if value < min || value > max {
        Err(RangeError { min, max, value })
    } else {
        Ok(value)
    }
}
