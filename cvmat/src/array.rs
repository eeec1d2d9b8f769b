/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Parameter roles for functions that accept arrays.
//!
//! * [`InputArray`] is a read-only view over anything that can act as an array: a [`Mat`],
//!   a [`TypedMat`], or a slice or `Vec` of [`DataType`] values. Slices act as `[len, 1]`
//!   columns.
//! * [`OutputArray`] is a destination that can be (re)created with a requested shape and
//!   type. [`TypedMat`] destinations only accept their own type.
//! * [`InputOutputArray`] is both.

use std::ptr::NonNull;

use crate::{
    error::{MatError, Result},
    mat::{vector_len, Mat},
    typed::TypedMat,
    types::{DataType, Depth, MatType},
};

////////////////
// InputArray //
////////////////

/// A read-only array argument.
#[derive(Debug, Clone, Copy)]
pub enum InputArray<'a> {
    Mat(&'a Mat),
    /// A contiguous run of `len` elements of type `ty`.
    Slice {
        bytes: &'a [u8],
        ty: MatType,
        len: usize,
    },
}

impl<'a> InputArray<'a> {
    /// Extents of the array. Slices are `[len, 1]`.
    pub fn extents(&self) -> Vec<usize> {
        match self {
            Self::Mat(m) => m.extents().to_vec(),
            Self::Slice { len, .. } => vec![*len, 1],
        }
    }

    pub fn mat_type(&self) -> MatType {
        match self {
            Self::Mat(m) => m.mat_type(),
            Self::Slice { ty, .. } => *ty,
        }
    }

    pub fn total(&self) -> usize {
        match self {
            Self::Mat(m) => m.total(),
            Self::Slice { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Mat(m) => m.empty(),
            Self::Slice { len, .. } => *len == 0,
        }
    }

    pub fn is_continuous(&self) -> bool {
        match self {
            Self::Mat(m) => m.is_continuous(),
            Self::Slice { .. } => true,
        }
    }

    /// The wrapped header, if this argument is a [`Mat`] or [`TypedMat`].
    pub fn as_mat(&self) -> Option<&'a Mat> {
        match self {
            Self::Mat(m) => Some(m),
            Self::Slice { .. } => None,
        }
    }

    /// See [`Mat::check_vector`].
    pub fn check_vector(
        &self,
        elem_channels: usize,
        depth: Option<Depth>,
        require_continuous: bool,
    ) -> Option<usize> {
        match self {
            Self::Mat(m) => m.check_vector(elem_channels, depth, require_continuous),
            Self::Slice { ty, len, .. } => {
                if *len == 0 {
                    return None;
                }
                let elem_size = ty.elem_size();
                vector_len(
                    &[*len, 1],
                    &[elem_size, elem_size],
                    *ty,
                    true,
                    elem_channels,
                    depth,
                    require_continuous,
                )
            }
        }
    }

    /// Return a header for this array.
    ///
    /// A [`Mat`] argument is shared without copying. A slice argument is copied into a new
    /// block, since a [`Mat`] cannot borrow.
    pub fn to_mat(&self) -> Result<Mat> {
        match self {
            Self::Mat(m) => Ok(m.share()),
            Self::Slice { .. } => {
                let mut m = Mat::default();
                self.copy_to(&mut m)?;
                Ok(m)
            }
        }
    }

    /// Copy this array into `dst`. See [`Mat::copy_to`].
    pub fn copy_to<O>(&self, dst: &mut O) -> Result<()>
    where
        O: OutputArray + ?Sized,
    {
        match self {
            Self::Mat(m) => m.copy_to(dst),
            Self::Slice { bytes, ty, len } => {
                let Some(ptr) = NonNull::new(bytes.as_ptr().cast_mut()).filter(|_| *len > 0)
                else {
                    dst.release();
                    return Ok(());
                };
                // SAFETY: `bytes` holds `len` dense elements of type `ty` and outlives the
                // header, which is dropped before returning and never written through.
                let src = unsafe { Mat::from_raw_parts(ptr, &[*len, 1], *ty, None) }?;
                src.copy_to(dst)
            }
        }
    }
}

impl<'a> From<&'a Mat> for InputArray<'a> {
    fn from(m: &'a Mat) -> Self {
        Self::Mat(m)
    }
}

impl<'a, T: DataType> From<&'a TypedMat<T>> for InputArray<'a> {
    fn from(m: &'a TypedMat<T>) -> Self {
        Self::Mat(m.as_mat())
    }
}

impl<'a, T: DataType> From<&'a [T]> for InputArray<'a> {
    fn from(data: &'a [T]) -> Self {
        Self::Slice {
            bytes: bytemuck::cast_slice(data),
            ty: T::mat_type(),
            len: data.len(),
        }
    }
}

impl<'a, T: DataType> From<&'a Vec<T>> for InputArray<'a> {
    fn from(data: &'a Vec<T>) -> Self {
        data.as_slice().into()
    }
}

/////////////////
// OutputArray //
/////////////////

/// A destination array.
pub trait OutputArray {
    /// Give the destination the requested shape and type. See [`Mat::create`].
    fn create(&mut self, extents: &[usize], ty: MatType) -> Result<()>;

    /// Drop the destination's data.
    fn release(&mut self);

    /// The underlying header.
    ///
    /// Callers write element data through it but must not change its type.
    fn mat_mut(&mut self) -> &mut Mat;

    /// The only type this destination accepts, if it is fixed.
    fn fixed_type(&self) -> Option<MatType> {
        None
    }
}

impl OutputArray for Mat {
    fn create(&mut self, extents: &[usize], ty: MatType) -> Result<()> {
        Mat::create(self, extents, ty)
    }

    fn release(&mut self) {
        Mat::release(self)
    }

    fn mat_mut(&mut self) -> &mut Mat {
        self
    }
}

impl<T: DataType> OutputArray for TypedMat<T> {
    fn create(&mut self, extents: &[usize], ty: MatType) -> Result<()> {
        if ty != T::mat_type() {
            return Err(MatError::FixedType {
                fixed: T::mat_type(),
                requested: ty,
            });
        }
        self.as_mat_mut().create(extents, ty)
    }

    fn release(&mut self) {
        self.as_mat_mut().release()
    }

    fn mat_mut(&mut self) -> &mut Mat {
        self.as_mat_mut()
    }

    fn fixed_type(&self) -> Option<MatType> {
        Some(T::mat_type())
    }
}

/// An array that is both read and written.
pub trait InputOutputArray: OutputArray {
    fn input(&self) -> InputArray<'_>;
}

impl InputOutputArray for Mat {
    fn input(&self) -> InputArray<'_> {
        InputArray::Mat(self)
    }
}

impl<T: DataType> InputOutputArray for TypedMat<T> {
    fn input(&self) -> InputArray<'_> {
        InputArray::Mat(self.as_mat())
    }
}

///////////
// Tests //
///////////
