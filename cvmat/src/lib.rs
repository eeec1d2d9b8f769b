/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! A reference-counted, strided, n-dimensional dense array.
//!
//! # Data Model
//!
//! A [`Mat`] is a small header (extents, byte strides, element type, flags) pointing into a
//! [`Storage`](storage::Storage) block. Blocks are shared between headers and freed, through
//! the allocator that produced them, when the last header lets go. Views such as
//! [`Mat::row`], [`Mat::rect`] or [`Mat::diag`] are `O(1)`: they copy the header, adjust the
//! data offset and extents, and bump the block's reference count.
//!
//! Element types are described at runtime by a [`MatType`] (a [`Depth`] plus a channel
//! count). Typed access goes through [`DataType`], implemented for the primitive depths and
//! for fixed-size arrays of them; [`TypedMat`] pins the type statically.
//!
//! # Allocation
//!
//! Storage comes from a [`MatAllocator`](alloc::MatAllocator): either one attached to the
//! header or the process-wide default from [`config::default_allocator`]. Allocation
//! failure is reported as [`MatError::Allocation`]; nothing in this crate aborts on an
//! out-of-memory condition.
//!
//! # Aliasing
//!
//! Only the reference count is synchronized. Writing through a header while another header
//! over the same bytes is in use is undefined behavior, exactly as for raw pointers. See
//! the notes on [`Mat`].
//!
//! # Example
//!
//! ```
//! use cvmat::{Mat, MatType, Rect};
//!
//! let mut m = Mat::zeros(&[4, 4], MatType::U8C1)?;
//! let mut roi = m.rect(Rect::new(1, 1, 2, 2));
//! roi.set_to(7.0, None)?;
//!
//! assert_eq!(m.row_slice::<u8>(1), &[0, 7, 7, 0]);
//! assert_eq!(m.refcount(), Some(2));
//!
//! m.push_back(&Mat::filled(&[1, 4], MatType::U8C1, 1.0)?)?;
//! assert_eq!(m.rows(), 5);
//! # Ok::<(), cvmat::MatError>(())
//! ```

pub mod alloc;
pub mod config;
pub mod num;
pub mod saturate;
pub mod shape;
pub mod storage;

mod array;
mod error;
mod expr;
mod iter;
mod mat;
mod typed;
mod types;

#[cfg(test)]
mod test_util;

pub use alloc::TryClone;
pub use array::{InputArray, InputOutputArray, OutputArray};
pub use error::{MatError, Result};
pub use expr::{Initializer, MatExpr};
pub use iter::{Lines, LinesMut, MatIter};
pub use mat::Mat;
pub use saturate::SaturatingCast;
pub use shape::{Point, Rect, RoiLocation, Size};
pub use typed::TypedMat;
pub use types::{DataType, Depth, Element, MatType, Scalar};
