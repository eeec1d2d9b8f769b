/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Vector-like growth along axis 0.
//!
//! A header may have more capacity than rows: `datalimit` marks the end of the usable
//! block. Growth writes into that spare capacity when the header is not a submatrix and
//! otherwise moves the rows into a new, larger block.

use super::{copy_data, copy_overlapping, Mat};
use crate::{
    config::defaults::MIN_RESERVE_BYTES,
    error::{MatError, Result},
    shape,
    types::{DataType, Scalar},
};

impl Mat {
    /// Ensure capacity for at least `rows` rows without changing the row count.
    ///
    /// Submatrices are always moved into a new block so that growth cannot write into
    /// their parent.
    pub fn reserve(&mut self, rows: usize) -> Result<()> {
        if !self.is_submatrix() && self.fits(self.data, rows) {
            return Ok(());
        }
        let current = self.size[0];
        if current >= rows {
            return Ok(());
        }

        let ty = self.mat_type();
        let mut extents = self.size.clone();
        extents[0] = rows.max(1);
        let bytes = shape::dense_bytes(&extents, ty.elem_size()).ok_or_else(|| {
            MatError::Overflow {
                extents: extents.clone(),
                elem_size: ty.elem_size(),
            }
        })?;
        if bytes > 0 && bytes < MIN_RESERVE_BYTES {
            extents[0] = (MIN_RESERVE_BYTES + bytes - 1) * extents[0] / bytes;
        }

        if self.is_submatrix() {
            tracing::warn!(rows, "growing a submatrix moves it into a new block");
        }

        let mut grown = Mat::empty_of(ty);
        grown.allocator = self.allocator.clone();
        grown.create(&extents, ty)?;
        if current > 0 {
            let mut part = grown.row_range(0..current);
            copy_data(self, &mut part);
        }
        tracing::debug!(rows = current, capacity = extents[0], "grew array");

        grown.size[0] = current;
        grown.dataend = grown.data + grown.step[0] * current;
        grown.update_continuity();
        *self = grown;
        Ok(())
    }

    /// Change the number of rows. New rows have unspecified contents.
    ///
    /// Shrinking keeps the block. Growing a submatrix moves it into a new block.
    pub fn resize(&mut self, rows: usize) -> Result<()> {
        let current = self.size[0];
        if rows <= current {
            self.pop_back(current - rows);
            return Ok(());
        }
        if self.is_submatrix() || !self.fits(self.data, rows) {
            self.reserve(rows)?;
        }
        self.size[0] = rows;
        self.dataend = self.data + self.step[0] * rows;
        self.update_continuity();
        Ok(())
    }

    /// Change the number of rows, setting new rows to `value`.
    pub fn resize_with(&mut self, rows: usize, value: impl Into<Scalar>) -> Result<()> {
        let current = self.size[0];
        self.resize(rows)?;
        if rows > current {
            self.row_range(current..rows).set_to(value, None)?;
        }
        Ok(())
    }

    /// Append the rows of `rows` to this array.
    ///
    /// `rows` must have the same type and the same extents on every axis but the first.
    /// Appending to a header without data copies `rows` into a new block. Capacity grows
    /// to `max(r + delta, (3r + 1) / 2)` rows when exhausted.
    pub fn push_back(&mut self, rows: &Mat) -> Result<()> {
        let current = self.size[0];
        let delta = rows.size[0];
        if delta == 0 {
            return Ok(());
        }

        if self.data_ptr().is_none() {
            let mut m = Mat::empty_of(rows.mat_type());
            m.allocator = self.allocator.clone();
            rows.copy_to(&mut m)?;
            *self = m;
            return Ok(());
        }

        if rows.size.len() != self.size.len() || rows.size[1..] != self.size[1..] {
            let mut expected = self.size.clone();
            expected[0] = delta;
            return Err(MatError::SizeMismatch {
                expected,
                found: rows.size.clone(),
            });
        }
        if rows.mat_type() != self.mat_type() {
            return Err(MatError::TypeMismatch {
                expected: self.mat_type(),
                found: rows.mat_type(),
            });
        }

        if self.is_submatrix() || !self.fits(self.dataend, delta) {
            self.reserve((current + delta).max((current * 3 + 1) / 2))?;
        }

        self.size[0] += delta;
        self.dataend += self.step[0] * delta;
        self.update_continuity();

        let mut part = self.row_range(current..current + delta);
        copy_overlapping(rows, &mut part)
    }

    /// Append one element to a single-column array.
    ///
    /// A header without data becomes a `[1, 1]` array of `T`.
    pub fn push_element<T: DataType>(&mut self, value: T) -> Result<()> {
        if self.data_ptr().is_some() {
            if self.mat_type() != T::mat_type() {
                return Err(MatError::TypeMismatch {
                    expected: self.mat_type(),
                    found: T::mat_type(),
                });
            }
            if self.dims() != 2 || self.cols() != 1 {
                return Err(MatError::SizeMismatch {
                    expected: vec![1, self.cols()],
                    found: vec![1, 1],
                });
            }

            if !self.is_submatrix() && self.is_continuous() && self.fits(self.dataend, 1) {
                let rows = self.size[0];
                let bytes = bytemuck::bytes_of(&value);
                let dst = self.ptr_slot(rows);
                // SAFETY: `fits` checked that row `rows` lies within the block's capacity.
                // Older shares taken before a `pop_back` may still cover it; as for every
                // write, the caller must not hold borrows of those bytes through them.
                unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len()) };
                self.size[0] += 1;
                self.dataend += self.step[0];
                self.update_continuity();
                return Ok(());
            }
        }

        let single = Mat::from_shape_slice(&[1, 1], std::slice::from_ref(&value))?;
        self.push_back(&single)
    }

    /// Remove the last `rows` rows. Capacity is kept.
    ///
    /// # Panics
    ///
    /// Panics if `rows > self.rows()`.
    pub fn pop_back(&mut self, rows: usize) {
        let current = self.size[0];
        assert!(
            rows <= current,
            "cannot pop {rows} rows from an array with {current}"
        );
        if self.is_submatrix() {
            *self = self.row_range(0..current - rows);
        } else {
            self.size[0] -= rows;
            self.dataend -= rows * self.step[0];
            self.update_continuity();
        }
    }

    /// Return `true` if `rows` rows of this header's stride starting at offset `from` fit in
    /// the usable capacity.
    fn fits(&self, from: usize, rows: usize) -> bool {
        self.step[0]
            .checked_mul(rows)
            .and_then(|bytes| bytes.checked_add(from))
            .is_some_and(|end| end <= self.datalimit)
    }

    /// Pointer to the start of row `row`, which may lie in spare capacity.
    fn ptr_slot(&self, row: usize) -> *mut u8 {
        match self.data_ptr() {
            // SAFETY: Callers check that the row lies within `datalimit`.
            Some(base) => unsafe { base.as_ptr().add(row * self.step[0]) },
            None => std::ptr::null_mut(),
        }
    }
}

///////////
// Tests //
///////////
