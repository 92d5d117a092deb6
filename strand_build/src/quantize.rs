// Copyright 2025 the Strand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conservative fixed-point conversions.
//!
//! Lower bounds round toward negative infinity and upper bounds toward
//! positive infinity before clamping, so a quantized box never shrinks
//! inside the representable range.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Every cast below follows a clamp into the target range."
)]

/// Largest byte grid coordinate.
pub const BYTE_MAX: f32 = 255.0;

/// Symmetric limit of the 16-bit grid. `-32768` is never produced.
pub const SHORT_LIMIT: f32 = 32767.0;

/// Scale applied to unit basis vectors before truncation to a signed byte.
pub const BASIS_SCALE: f32 = 126.0;

/// Lower bound on the byte grid.
#[inline]
pub fn floor_u8(x: f32) -> u8 {
    libm::floorf(x).clamp(0.0, BYTE_MAX) as u8
}

/// Upper bound on the byte grid.
#[inline]
pub fn ceil_u8(x: f32) -> u8 {
    libm::ceilf(x).clamp(0.0, BYTE_MAX) as u8
}

/// Lower bound on the 16-bit grid.
#[inline]
pub fn floor_i16(x: f32) -> i16 {
    libm::floorf(x).clamp(-SHORT_LIMIT, SHORT_LIMIT) as i16
}

/// Upper bound on the 16-bit grid.
#[inline]
pub fn ceil_i16(x: f32) -> i16 {
    libm::ceilf(x).clamp(-SHORT_LIMIT, SHORT_LIMIT) as i16
}

/// One component of a unit basis vector as a signed byte.
///
/// Truncates toward zero, so the result never exceeds `BASIS_SCALE` in magnitude.
#[inline]
pub fn basis_i8(x: f32) -> i8 {
    libm::truncf(BASIS_SCALE * x).clamp(-BASIS_SCALE, BASIS_SCALE) as i8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_outward() {
        assert_eq!(floor_u8(3.9), 3);
        assert_eq!(ceil_u8(3.1), 4);
        assert_eq!(floor_i16(-3.1), -4);
        assert_eq!(ceil_i16(-3.9), -3);
        assert_eq!(floor_u8(7.0), 7);
        assert_eq!(ceil_u8(7.0), 7);
    }

    #[test]
    fn clamps_to_range() {
        assert_eq!(floor_u8(-10.0), 0);
        assert_eq!(ceil_u8(300.0), 255);
        assert_eq!(floor_i16(-1.0e9), -32767);
        assert_eq!(ceil_i16(1.0e9), 32767);
    }

    #[test]
    fn basis_truncates_toward_zero() {
        assert_eq!(basis_i8(1.0), 126);
        assert_eq!(basis_i8(-1.0), -126);
        assert_eq!(basis_i8(0.5), 63);
        assert_eq!(basis_i8(-0.999), -125);
    }
}
