/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{
    fmt,
    marker::PhantomData,
    ops::{Deref, Index, IndexMut},
};

use crate::{
    alloc::TryClone,
    error::{MatError, Result},
    iter::MatIter,
    mat::Mat,
    types::DataType,
};

/// A [`Mat`] whose element type is pinned to `T`.
///
/// Dereferences to [`Mat`] for all read-only operations. Element access needs no type
/// annotations, and as an [`OutputArray`](crate::OutputArray) it refuses to be recreated with
/// another type.
pub struct TypedMat<T: DataType> {
    inner: Mat,
    _type: PhantomData<T>,
}

impl<T: DataType> TypedMat<T> {
    /// Allocate a `rows x cols` array. Contents are unspecified.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Self::new_nd(&[rows, cols])
    }

    /// Allocate an array with arbitrary extents. Contents are unspecified.
    pub fn new_nd(extents: &[usize]) -> Result<Self> {
        Ok(Self::wrap(Mat::new(extents, T::mat_type())?))
    }

    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        Ok(Self::wrap(Mat::zeros(&[rows, cols], T::mat_type())?))
    }

    /// Copy `data` into a new `rows x cols` array in row-major order.
    pub fn from_slice(rows: usize, cols: usize, data: &[T]) -> Result<Self> {
        Ok(Self::wrap(Mat::from_shape_slice(&[rows, cols], data)?))
    }

    pub fn as_mat(&self) -> &Mat {
        &self.inner
    }

    /// Mutable access to the header. The type must not be changed through it.
    pub(crate) fn as_mat_mut(&mut self) -> &mut Mat {
        &mut self.inner
    }

    pub fn into_inner(self) -> Mat {
        self.inner
    }

    /// Return an aliasing header. See [`Mat::share`].
    pub fn share(&self) -> Self {
        Self::wrap(self.inner.share())
    }

    pub fn row_slice(&self, i: usize) -> &[T] {
        self.inner.row_slice(i)
    }

    /// Panics if another header shares the data, like [`Mat::row_slice_mut`].
    pub fn row_slice_mut(&mut self, i: usize) -> &mut [T] {
        self.inner.row_slice_mut(i)
    }

    pub fn iter(&self) -> MatIter<'_, T> {
        self.inner.iter()
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> + '_ {
        self.inner.iter_mut()
    }

    fn wrap(inner: Mat) -> Self {
        debug_assert_eq!(inner.mat_type(), T::mat_type());
        Self {
            inner,
            _type: PhantomData,
        }
    }
}

impl<T: DataType> Default for TypedMat<T> {
    fn default() -> Self {
        Self::wrap(Mat::empty_of(T::mat_type()))
    }
}

impl<T: DataType> Deref for TypedMat<T> {
    type Target = Mat;

    fn deref(&self) -> &Mat {
        &self.inner
    }
}

impl<T: DataType> Index<(usize, usize)> for TypedMat<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        self.inner.at(&[row, col])
    }
}

impl<T: DataType> IndexMut<(usize, usize)> for TypedMat<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        self.inner.at_mut(&[row, col])
    }
}

impl<T: DataType> TryFrom<Mat> for TypedMat<T> {
    type Error = MatError;

    /// Fails with [`MatError::TypeMismatch`] unless `mat` has type `T` or holds no data.
    fn try_from(mat: Mat) -> Result<Self> {
        if mat.mat_type() == T::mat_type() {
            return Ok(Self::wrap(mat));
        }
        if mat.data_ptr().is_none() {
            let mut empty = Mat::empty_of(T::mat_type());
            empty.set_allocator(mat.allocator().cloned());
            return Ok(Self::wrap(empty));
        }
        Err(MatError::TypeMismatch {
            expected: T::mat_type(),
            found: mat.mat_type(),
        })
    }
}

impl<T: DataType> TryClone for TypedMat<T> {
    fn try_clone(&self) -> Result<Self> {
        Ok(Self::wrap(self.inner.try_clone()?))
    }
}

impl<T: DataType> fmt::Debug for TypedMat<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedMat").field(&self.inner).finish()
    }
}

///////////
// Tests //
///////////
