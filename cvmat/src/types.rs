/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Element type encoding.
//!
//! An array's element type is the pair `(depth, channels)`. The depth is the primitive
//! scalar stored per channel and the channel count is the number of such scalars that make
//! up one element. The pair packs into a single integer code as
//! `depth + ((channels - 1) << 3)`, which is the code stored in the low bits of
//! [`crate::Mat::flags`].

use std::fmt::{self, Debug};

use bytemuck::Pod;
use half::f16;

use crate::{config::defaults::MAX_CHANNELS, saturate::SaturatingCast, MatError};

const DEPTH_BITS: u32 = 3;
const DEPTH_MASK: i32 = (1 << DEPTH_BITS) - 1;

/// The largest packed type code.
pub(crate) const TYPE_MASK: u32 = ((MAX_CHANNELS as u32) << DEPTH_BITS) - 1;

/// The primitive scalar type of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Depth {
    U8 = 0,
    S8 = 1,
    U16 = 2,
    S16 = 3,
    S32 = 4,
    F32 = 5,
    F64 = 6,
    F16 = 7,
}

impl Depth {
    /// All depths in code order.
    pub const ALL: [Depth; 8] = [
        Depth::U8,
        Depth::S8,
        Depth::U16,
        Depth::S16,
        Depth::S32,
        Depth::F32,
        Depth::F64,
        Depth::F16,
    ];

    /// Size in bytes of one scalar of this depth.
    pub const fn size(self) -> usize {
        match self {
            Depth::U8 | Depth::S8 => 1,
            Depth::U16 | Depth::S16 | Depth::F16 => 2,
            Depth::S32 | Depth::F32 => 4,
            Depth::F64 => 8,
        }
    }

    pub const fn code(self) -> i32 {
        self as i32
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Depth::U8),
            1 => Some(Depth::S8),
            2 => Some(Depth::U16),
            3 => Some(Depth::S16),
            4 => Some(Depth::S32),
            5 => Some(Depth::F32),
            6 => Some(Depth::F64),
            7 => Some(Depth::F16),
            _ => None,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Depth::F16 | Depth::F32 | Depth::F64)
    }

    const fn name(self) -> &'static str {
        match self {
            Depth::U8 => "8U",
            Depth::S8 => "8S",
            Depth::U16 => "16U",
            Depth::S16 => "16S",
            Depth::S32 => "32S",
            Depth::F32 => "32F",
            Depth::F64 => "64F",
            Depth::F16 => "16F",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `(depth, channels)` element type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatType {
    depth: Depth,
    channels: u16,
}

impl MatType {
    pub const U8C1: Self = Self::with_channels(Depth::U8, 1);
    pub const U8C2: Self = Self::with_channels(Depth::U8, 2);
    pub const U8C3: Self = Self::with_channels(Depth::U8, 3);
    pub const U8C4: Self = Self::with_channels(Depth::U8, 4);
    pub const S8C1: Self = Self::with_channels(Depth::S8, 1);
    pub const U16C1: Self = Self::with_channels(Depth::U16, 1);
    pub const S16C1: Self = Self::with_channels(Depth::S16, 1);
    pub const S32C1: Self = Self::with_channels(Depth::S32, 1);
    pub const S32C2: Self = Self::with_channels(Depth::S32, 2);
    pub const F32C1: Self = Self::with_channels(Depth::F32, 1);
    pub const F32C2: Self = Self::with_channels(Depth::F32, 2);
    pub const F32C3: Self = Self::with_channels(Depth::F32, 3);
    pub const F64C1: Self = Self::with_channels(Depth::F64, 1);
    pub const F16C1: Self = Self::with_channels(Depth::F16, 1);

    /// Construct a new type, checking that `channels` is in `1..=MAX_CHANNELS`.
    pub fn new(depth: Depth, channels: usize) -> Result<Self, MatError> {
        if channels == 0 || channels > MAX_CHANNELS {
            Err(MatError::BadChannels(channels))
        } else {
            Ok(Self::with_channels(depth, channels))
        }
    }

    /// Construct a new type in a `const` context.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is not in `1..=MAX_CHANNELS`.
    pub const fn with_channels(depth: Depth, channels: usize) -> Self {
        assert!(
            channels >= 1 && channels <= MAX_CHANNELS,
            "channel count out of range"
        );
        Self {
            depth,
            // CAST: bounded by `MAX_CHANNELS`.
            channels: channels as u16,
        }
    }

    /// Decode a packed type code.
    pub fn from_code(code: i32) -> Result<Self, MatError> {
        if !(0..=TYPE_MASK as i32).contains(&code) {
            return Err(MatError::BadTypeCode(code));
        }
        let depth = Depth::from_code(code & DEPTH_MASK).ok_or(MatError::BadTypeCode(code))?;
        // CAST: `code` is non-negative and bounded by `TYPE_MASK`.
        Ok(Self::with_channels(depth, ((code >> DEPTH_BITS) + 1) as usize))
    }

    pub const fn code(self) -> i32 {
        self.depth.code() + ((self.channels as i32 - 1) << DEPTH_BITS)
    }

    pub const fn depth(self) -> Depth {
        self.depth
    }

    pub const fn channels(self) -> usize {
        self.channels as usize
    }

    /// Return the same depth with a different channel count.
    pub fn to_channels(self, channels: usize) -> Result<Self, MatError> {
        Self::new(self.depth, channels)
    }

    /// Size in bytes of one element (all channels).
    pub const fn elem_size(self) -> usize {
        self.depth.size() * self.channels()
    }

    /// Size in bytes of one channel.
    pub const fn elem_size1(self) -> usize {
        self.depth.size()
    }
}

impl fmt::Display for MatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}C{}", self.depth, self.channels)
    }
}

impl Debug for MatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatType({self})")
    }
}

impl Default for MatType {
    fn default() -> Self {
        Self::U8C1
    }
}

//////////////
// Elements //
//////////////

/// A primitive scalar that can be stored in one channel.
pub trait Element: Pod + SaturatingCast + PartialEq + Debug + Send + Sync + 'static {
    const DEPTH: Depth;
}

/// A Rust type that views one whole array element.
///
/// Implemented for every [`Element`] (one channel) and for `[T; N]` (N channels).
/// Typed access checks `size_of::<Self>()` against the array's element size at runtime,
/// so implementations for user-defined `#[repr(C)]` types cannot cause out-of-bounds
/// reads, only panics.
pub trait DataType: Pod {
    type Channel: Element;
    const CHANNELS: usize;

    fn mat_type() -> MatType {
        MatType::with_channels(Self::Channel::DEPTH, Self::CHANNELS)
    }
}

macro_rules! element {
    ($($T:ty => $depth:ident),* $(,)?) => {
        $(
            impl Element for $T {
                const DEPTH: Depth = Depth::$depth;
            }

            impl DataType for $T {
                type Channel = $T;
                const CHANNELS: usize = 1;
            }
        )*
    };
}

element!(
    u8 => U8,
    i8 => S8,
    u16 => U16,
    i16 => S16,
    i32 => S32,
    f32 => F32,
    f64 => F64,
    f16 => F16,
);

impl<T, const N: usize> DataType for [T; N]
where
    T: Element,
{
    type Channel = T;
    const CHANNELS: usize = N;
}

////////////
// Scalar //
////////////

/// A per-channel fill value. Channels beyond the fourth are filled with zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scalar(pub [f64; 4]);

impl Scalar {
    pub const fn new(v0: f64, v1: f64, v2: f64, v3: f64) -> Self {
        Self([v0, v1, v2, v3])
    }

    /// The same value in every channel.
    pub const fn all(v: f64) -> Self {
        Self([v; 4])
    }

    /// Value for channel `c`.
    pub fn channel(&self, c: usize) -> f64 {
        self.0.get(c).copied().unwrap_or(0.0)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self([v, 0.0, 0.0, 0.0])
    }
}
