/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Raw and typed element access.
//!
//! Typed accessors take a [`DataType`] `T` and check it against the array type at runtime.
//! `T` may describe a whole element (`[f32; 3]` for a `32FC3` array) or a group of
//! channels that evenly divides an element (`f32` for the same array, in which case the
//! last axis is addressed in channels). Any other `T` is a contract violation and panics.
//!
//! Mutable borrows are only handed out by headers that are the sole owner of their data
//! (see [`Mat::is_exclusive`]). Shared data is written with named operations such as
//! [`Mat::set_to`] and [`Mat::assign_from`], or through [`Mat::ptr_mut`].

use std::ptr::NonNull;

use super::Mat;
use crate::{
    error::{MatError, Result},
    types::{DataType, Element},
};

impl Mat {
    /// Pointer to the element at `idx`.
    ///
    /// `idx` may be shorter than `dims()`, in which case the missing trailing indices are
    /// zero (so `ptr(&[i])` is the start of row `i`).
    ///
    /// # Panics
    ///
    /// Panics if the header has no data, `idx` has too many components, or any component
    /// is out of range.
    pub fn ptr(&self, idx: &[usize]) -> *const u8 {
        self.ptr_at(idx).as_ptr()
    }

    /// Mutable pointer to the element at `idx`. See [`Mat::ptr`].
    pub fn ptr_mut(&mut self, idx: &[usize]) -> *mut u8 {
        self.ptr_at(idx).as_ptr()
    }

    /// Reference to the element at the full index `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `T` cannot view this array's elements or `idx` is out of range.
    pub fn at<T: DataType>(&self, idx: &[usize]) -> &T {
        let ptr = self.typed_ptr::<T>(idx);
        // SAFETY: `typed_ptr` returns an in-bounds pointer to a `T`-sized, `T`-aligned
        // location. The element type matches `T`, which is `Pod`.
        unsafe { &*ptr.as_ptr() }
    }

    /// Mutable reference to the element at the full index `idx`. See [`Mat::at`].
    ///
    /// # Panics
    ///
    /// Also panics if another header shares the data.
    pub fn at_mut<T: DataType>(&mut self, idx: &[usize]) -> &mut T {
        self.assert_exclusive("at_mut");
        let ptr = self.typed_ptr::<T>(idx);
        // SAFETY: See `at`. No other header reaches the data and `self` is borrowed
        // mutably.
        unsafe { &mut *ptr.as_ptr() }
    }

    /// Row `i` of a 2-d array.
    ///
    /// # Panics
    ///
    /// Panics if the array is not 2-d, `T` cannot view its elements, or `i` is out of range.
    pub fn row_slice<T: DataType>(&self, i: usize) -> &[T] {
        assert_eq!(self.dims(), 2, "row_slice requires a 2-d array");
        self.line(&[i])
    }

    /// Mutable row `i` of a 2-d array. See [`Mat::row_slice`] and [`Mat::line_mut`].
    pub fn row_slice_mut<T: DataType>(&mut self, i: usize) -> &mut [T] {
        assert_eq!(self.dims(), 2, "row_slice_mut requires a 2-d array");
        self.line_mut(&[i])
    }

    /// The run along the last axis at the leading index `lead`.
    ///
    /// # Panics
    ///
    /// Panics if `lead.len() != dims() - 1`, `T` cannot view the elements, or an index is
    /// out of range.
    pub fn line<T: DataType>(&self, lead: &[usize]) -> &[T] {
        let (ptr, len) = self.line_ptr::<T>(lead);
        // SAFETY: The line lies within the region and is `T`-aligned.
        unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) }
    }

    /// Mutable version of [`Mat::line`].
    ///
    /// # Panics
    ///
    /// Also panics if another header shares the data.
    pub fn line_mut<T: DataType>(&mut self, lead: &[usize]) -> &mut [T] {
        self.assert_exclusive("line_mut");
        let (ptr, len) = self.line_ptr::<T>(lead);
        // SAFETY: See `line`. No other header reaches the data and `self` is borrowed
        // mutably.
        unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), len) }
    }

    /// All elements of a continuous array as one slice.
    ///
    /// # Panics
    ///
    /// Panics if `T` cannot view this array's elements.
    pub fn as_slice<T: DataType>(&self) -> Result<&[T]> {
        let (ptr, len) = self.continuous_span::<T>("as_slice")?;
        // SAFETY: The span covers the array's elements and is `T`-aligned.
        Ok(unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) })
    }

    /// Mutable version of [`Mat::as_slice`].
    ///
    /// Fails with [`MatError::Shared`] if another header shares the data.
    pub fn as_slice_mut<T: DataType>(&mut self) -> Result<&mut [T]> {
        self.check_exclusive("as_slice_mut")?;
        let (ptr, len) = self.continuous_span::<T>("as_slice_mut")?;
        // SAFETY: See `as_slice`. No other header reaches the data and `self` is borrowed
        // mutably.
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), len) })
    }

    /// The raw bytes of a continuous array, whatever its element type.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        let (ptr, len) = self.continuous_bytes("as_bytes")?;
        // SAFETY: The span covers the array's elements.
        Ok(unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len) })
    }

    /// Mutable version of [`Mat::as_bytes`].
    ///
    /// Fails with [`MatError::Shared`] if another header shares the data.
    pub fn as_bytes_mut(&mut self) -> Result<&mut [u8]> {
        self.check_exclusive("as_bytes_mut")?;
        let (ptr, len) = self.continuous_bytes("as_bytes_mut")?;
        // SAFETY: See `as_bytes`. No other header reaches the data and `self` is borrowed
        // mutably.
        Ok(unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), len) })
    }

    //////////////
    // Internal //
    //////////////

    fn check_exclusive(&self, op: &'static str) -> Result<()> {
        if self.is_exclusive() {
            Ok(())
        } else {
            Err(MatError::Shared(op))
        }
    }

    pub(crate) fn assert_exclusive(&self, op: &'static str) {
        assert!(
            self.is_exclusive(),
            "{op} requires the only header of the array's data"
        );
    }

    /// Number of `T` values per element, panicking if `T` cannot view this array.
    pub(crate) fn units_of<T: DataType>(&self) -> usize {
        let ty = self.mat_type();
        let channel_size = std::mem::size_of::<T::Channel>();
        assert!(
            <T::Channel as Element>::DEPTH == ty.depth()
                && ty.channels() % T::CHANNELS == 0
                && std::mem::size_of::<T>() == T::CHANNELS * channel_size,
            "cannot view {ty} elements as {}",
            T::mat_type()
        );
        ty.channels() / T::CHANNELS
    }

    fn ptr_at(&self, idx: &[usize]) -> NonNull<u8> {
        assert!(
            idx.len() <= self.dims(),
            "index has {} components but the array has {} dimensions",
            idx.len(),
            self.dims()
        );
        let Some(base) = self.data_ptr() else {
            panic!("cannot index an array without data");
        };
        let mut offset = 0;
        for (axis, (&i, (&extent, &step))) in idx
            .iter()
            .zip(self.size.iter().zip(&self.step))
            .enumerate()
        {
            assert!(
                i < extent,
                "index {i} is out of bounds for axis {axis} with extent {extent}"
            );
            offset += i * step;
        }
        // SAFETY: Every component is in range, so the offset is within the region.
        unsafe { base.add(offset) }
    }

    fn typed_ptr<T: DataType>(&self, idx: &[usize]) -> NonNull<T> {
        let units = self.units_of::<T>();
        let dims = self.dims();
        assert_eq!(
            idx.len(),
            dims,
            "typed access requires a full index of {dims} components"
        );
        let (lead, last) = (&idx[..dims - 1], idx[dims - 1]);
        let per_line = self.size[dims - 1] * units;
        assert!(
            last < per_line,
            "index {last} is out of bounds for axis {} with extent {per_line}",
            dims - 1
        );
        let line = self.ptr_at(lead);
        // SAFETY: `last` addresses a `T` within the line.
        unsafe { line.add(last * std::mem::size_of::<T>()) }.cast::<T>()
    }

    fn line_ptr<T: DataType>(&self, lead: &[usize]) -> (NonNull<T>, usize) {
        let units = self.units_of::<T>();
        let dims = self.dims();
        assert_eq!(
            lead.len(),
            dims - 1,
            "a line is addressed by {} leading indices",
            dims - 1
        );
        let len = self.size[dims - 1] * units;
        if len == 0 {
            return (NonNull::dangling(), 0);
        }
        (self.ptr_at(lead).cast::<T>(), len)
    }

    fn continuous_bytes(&self, op: &'static str) -> Result<(NonNull<u8>, usize)> {
        if !self.is_continuous() {
            return Err(MatError::NotContinuous(op));
        }
        match self.data_ptr() {
            Some(ptr) => Ok((ptr, self.total() * self.elem_size())),
            None => Ok((NonNull::dangling(), 0)),
        }
    }

    fn continuous_span<T: DataType>(&self, op: &'static str) -> Result<(NonNull<T>, usize)> {
        let units = self.units_of::<T>();
        let (ptr, bytes) = self.continuous_bytes(op)?;
        if bytes == 0 {
            return Ok((NonNull::dangling(), 0));
        }
        Ok((ptr.cast::<T>(), self.total() * units))
    }
}

///////////
// Tests //
///////////
