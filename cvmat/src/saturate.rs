/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Saturating numeric conversions between depths.
//!
//! All conversions route through `f64`, which represents every value of every supported
//! depth exactly. Narrowing to an integer depth rounds half-to-even and then clamps to the
//! target range (`NaN` becomes `0`). Narrowing to a floating point depth is a plain cast.

use half::f16;

use crate::types::Depth;

/// Per-type conversion table used by fills, conversions, and expression evaluation.
pub trait SaturatingCast: Copy {
    fn to_f64(self) -> f64;

    fn saturate_from_f64(v: f64) -> Self;
}

macro_rules! integer_cast {
    ($($T:ty),*) => {
        $(
            impl SaturatingCast for $T {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn saturate_from_f64(v: f64) -> Self {
                    // Float-to-int `as` casts clamp to the target range and map NaN to 0.
                    v.round_ties_even() as $T
                }
            }
        )*
    };
}

integer_cast!(u8, i8, u16, i16, i32);

impl SaturatingCast for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn saturate_from_f64(v: f64) -> Self {
        v as f32
    }
}

impl SaturatingCast for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn saturate_from_f64(v: f64) -> Self {
        v
    }
}

impl SaturatingCast for f16 {
    #[inline]
    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    #[inline]
    fn saturate_from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }
}

fn read<T: SaturatingCast + bytemuck::Pod>(bytes: &[u8]) -> f64 {
    bytemuck::pod_read_unaligned::<T>(bytes).to_f64()
}

fn write<T: SaturatingCast + bytemuck::Pod>(v: f64, out: &mut [u8]) {
    out.copy_from_slice(bytemuck::bytes_of(&T::saturate_from_f64(v)));
}

/// Decode one scalar of `depth` from `bytes`, which must be exactly `depth.size()` long.
pub(crate) fn read_f64(depth: Depth, bytes: &[u8]) -> f64 {
    match depth {
        Depth::U8 => read::<u8>(bytes),
        Depth::S8 => read::<i8>(bytes),
        Depth::U16 => read::<u16>(bytes),
        Depth::S16 => read::<i16>(bytes),
        Depth::S32 => read::<i32>(bytes),
        Depth::F32 => read::<f32>(bytes),
        Depth::F64 => read::<f64>(bytes),
        Depth::F16 => read::<f16>(bytes),
    }
}

/// Saturate `v` into one scalar of `depth`, writing it to `out` (exactly `depth.size()`
/// bytes).
pub(crate) fn write_f64(depth: Depth, v: f64, out: &mut [u8]) {
    match depth {
        Depth::U8 => write::<u8>(v, out),
        Depth::S8 => write::<i8>(v, out),
        Depth::U16 => write::<u16>(v, out),
        Depth::S16 => write::<i16>(v, out),
        Depth::S32 => write::<i32>(v, out),
        Depth::F32 => write::<f32>(v, out),
        Depth::F64 => write::<f64>(v, out),
        Depth::F16 => write::<f16>(v, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_narrowing_rounds_half_to_even_and_clamps() {
        assert_eq!(u8::saturate_from_f64(2.5), 2);
        assert_eq!(u8::saturate_from_f64(3.5), 4);
        assert_eq!(u8::saturate_from_f64(-0.5), 0);
        assert_eq!(u8::saturate_from_f64(-7.0), 0);
        assert_eq!(u8::saturate_from_f64(255.4), 255);
        assert_eq!(u8::saturate_from_f64(300.0), 255);
        assert_eq!(u8::saturate_from_f64(f64::NAN), 0);

        assert_eq!(i8::saturate_from_f64(-128.6), -128);
        assert_eq!(i8::saturate_from_f64(127.5), 127);
        assert_eq!(i16::saturate_from_f64(-40000.0), i16::MIN);
        assert_eq!(u16::saturate_from_f64(65535.5), u16::MAX);
        assert_eq!(i32::saturate_from_f64(1e12), i32::MAX);
        assert_eq!(i32::saturate_from_f64(-1.5), -2);
    }

    #[test]
    fn float_targets_are_plain_casts() {
        assert_eq!(f32::saturate_from_f64(0.1), 0.1f32);
        assert_eq!(f64::saturate_from_f64(1e300), 1e300);
        assert_eq!(f16::saturate_from_f64(1.5), f16::from_f32(1.5));
        assert!(f16::saturate_from_f64(1e6).is_infinite());
    }

    #[test]
    fn dynamic_read_write() {
        for depth in Depth::ALL {
            let mut buf = vec![0u8; depth.size()];
            write_f64(depth, 42.0, &mut buf);
            assert_eq!(read_f64(depth, &buf), 42.0, "failed for {depth}");

            write_f64(depth, -1.0, &mut buf);
            let expected = match depth {
                Depth::U8 | Depth::U16 => 0.0,
                _ => -1.0,
            };
            assert_eq!(read_f64(depth, &buf), expected, "failed for {depth}");
        }
    }
}
