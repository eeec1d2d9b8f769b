/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Iteration over strided arrays.
//!
//! [`MatIter`] visits every `T` of an array in row-major order, skipping the gaps between
//! lines of a non-continuous array. A continuous array is walked as a single run.
//! [`Lines`] and [`LinesMut`] yield whole lines (runs along the last axis) as slices.

use std::{iter::FusedIterator, marker::PhantomData, ptr::NonNull};

use crate::{mat::Mat, shape::LineLayout, types::DataType};

/////////////
// MatIter //
/////////////

/// Random-access iterator over the elements of a [`Mat`].
///
/// Created by [`Mat::iter`]. Cloning an iterator, or calling [`Mat::iter`] again, gives an
/// independent cursor over the same data.
#[derive(Debug)]
pub struct MatIter<'a, T> {
    base: NonNull<u8>,
    layout: LineLayout,
    /// Number of `T` per line.
    per_line: usize,
    front: usize,
    back: usize,
    _lifetime: PhantomData<&'a [T]>,
}

// SAFETY: The iterator only hands out shared references, like `std::slice::Iter`.
unsafe impl<T: Sync> Send for MatIter<'_, T> {}

// SAFETY: See above.
unsafe impl<T: Sync> Sync for MatIter<'_, T> {}

impl<'a, T: DataType> MatIter<'a, T> {
    fn new(mat: &'a Mat) -> Self {
        let units = mat.units_of::<T>();
        let layout = mat.line_layout(true);
        let per_line = layout.len() * units;
        let back = layout.count() * per_line;
        Self {
            base: mat.data_ptr().unwrap_or(NonNull::dangling()),
            layout,
            per_line,
            front: 0,
            back,
            _lifetime: PhantomData,
        }
    }

    /// Absolute position of the next element returned by [`Iterator::next`].
    pub fn pos(&self) -> usize {
        self.front
    }

    /// Move the front of the iterator to absolute position `pos`.
    ///
    /// Seeking backwards restarts iteration from that point.
    ///
    /// # Panics
    ///
    /// Panics if `pos` lies past the back of the iterator.
    pub fn seek(&mut self, pos: usize) {
        assert!(
            pos <= self.back,
            "cannot seek to {pos}: the iterator ends at {}",
            self.back
        );
        self.front = pos;
    }

    /// The element at absolute position `i`, regardless of the cursor.
    pub fn get(&self, i: usize) -> Option<&'a T> {
        if i >= self.layout.count() * self.per_line {
            return None;
        }
        // SAFETY: `i` is in bounds.
        Some(unsafe { &*self.ptr(i) })
    }

    /// # Safety
    ///
    /// `i` must be less than the number of elements.
    unsafe fn ptr(&self, i: usize) -> *const T {
        let (line, k) = (i / self.per_line, i % self.per_line);
        let offset = self.layout.offset(line) + k * std::mem::size_of::<T>();
        // SAFETY: Inherited from caller. The offset lies within the array's region.
        unsafe { self.base.as_ptr().add(offset).cast::<T>() }
    }
}

impl<T> Clone for MatIter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base,
            layout: self.layout.clone(),
            per_line: self.per_line,
            front: self.front,
            back: self.back,
            _lifetime: PhantomData,
        }
    }
}

impl<'a, T: DataType> Iterator for MatIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let i = self.front;
        self.front += 1;
        // SAFETY: `i < back`, which never exceeds the number of elements.
        Some(unsafe { &*self.ptr(i) })
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T: DataType> DoubleEndedIterator for MatIter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        // SAFETY: `back` was in bounds before the decrement.
        Some(unsafe { &*self.ptr(self.back) })
    }
}

impl<T: DataType> ExactSizeIterator for MatIter<'_, T> {}
impl<T: DataType> FusedIterator for MatIter<'_, T> {}

///////////
// Lines //
///////////

/// Iterator over the lines of a [`Mat`]. Created by [`Mat::lines`].
#[derive(Debug, Clone)]
pub struct Lines<'a, T> {
    base: NonNull<u8>,
    layout: LineLayout,
    per_line: usize,
    front: usize,
    back: usize,
    _lifetime: PhantomData<&'a [T]>,
}

// SAFETY: Shared references only.
unsafe impl<T: Sync> Send for Lines<'_, T> {}

// SAFETY: Shared references only.
unsafe impl<T: Sync> Sync for Lines<'_, T> {}

impl<'a, T: DataType> Lines<'a, T> {
    fn new(mat: &'a Mat) -> Self {
        let units = mat.units_of::<T>();
        let layout = mat.line_layout(false);
        Self {
            base: mat.data_ptr().unwrap_or(NonNull::dangling()),
            per_line: layout.len() * units,
            front: 0,
            back: layout.count(),
            layout,
            _lifetime: PhantomData,
        }
    }

    fn line_ptr(&self, i: usize) -> *mut T {
        // SAFETY: `i` is a valid line, which lies within the region and is `T`-aligned.
        unsafe { self.base.as_ptr().add(self.layout.offset(i)).cast::<T>() }
    }

    fn next_index(&mut self) -> Option<usize> {
        (self.front < self.back).then(|| {
            self.front += 1;
            self.front - 1
        })
    }

    fn next_back_index(&mut self) -> Option<usize> {
        (self.front < self.back).then(|| {
            self.back -= 1;
            self.back
        })
    }
}

impl<'a, T: DataType> Iterator for Lines<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.next_index()?;
        // SAFETY: Line `i` holds `per_line` values of `T`.
        Some(unsafe { std::slice::from_raw_parts(self.line_ptr(i), self.per_line) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T: DataType> DoubleEndedIterator for Lines<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let i = self.next_back_index()?;
        // SAFETY: Line `i` holds `per_line` values of `T`.
        Some(unsafe { std::slice::from_raw_parts(self.line_ptr(i), self.per_line) })
    }
}

impl<T: DataType> ExactSizeIterator for Lines<'_, T> {}
impl<T: DataType> FusedIterator for Lines<'_, T> {}

//////////////
// LinesMut //
//////////////

/// Iterator over mutable lines of a [`Mat`]. Created by [`Mat::lines_mut`].
#[derive(Debug)]
pub struct LinesMut<'a, T> {
    inner: Lines<'a, T>,
    _lifetime: PhantomData<&'a mut [T]>,
}

// SAFETY: Lines are disjoint, like `std::slice::ChunksMut`.
unsafe impl<T: Send> Send for LinesMut<'_, T> {}

// SAFETY: `LinesMut` exposes no shared access to its lines.
unsafe impl<T: Sync> Sync for LinesMut<'_, T> {}

impl<'a, T: DataType> Iterator for LinesMut<'a, T> {
    type Item = &'a mut [T];

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.inner.next_index()?;
        // SAFETY: The iterator was created from an exclusive borrow of the only header
        // of the data, and lines of one header never overlap, so each line is handed out
        // once.
        Some(unsafe { std::slice::from_raw_parts_mut(self.inner.line_ptr(i), self.inner.per_line) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: DataType> DoubleEndedIterator for LinesMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let i = self.inner.next_back_index()?;
        // SAFETY: See `next`.
        Some(unsafe { std::slice::from_raw_parts_mut(self.inner.line_ptr(i), self.inner.per_line) })
    }
}

impl<T: DataType> ExactSizeIterator for LinesMut<'_, T> {}
impl<T: DataType> FusedIterator for LinesMut<'_, T> {}

impl Mat {
    /// Iterate over every `T` in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `T` cannot view this array's elements.
    pub fn iter<T: DataType>(&self) -> MatIter<'_, T> {
        MatIter::new(self)
    }

    /// Iterate mutably over every `T` in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `T` cannot view this array's elements or another header shares the data.
    pub fn iter_mut<T: DataType>(&mut self) -> impl DoubleEndedIterator<Item = &mut T> + '_ {
        self.lines_mut::<T>().flatten()
    }

    /// Iterate over the runs along the last axis.
    pub fn lines<T: DataType>(&self) -> Lines<'_, T> {
        Lines::new(self)
    }

    /// Iterate mutably over the runs along the last axis. Panics like [`Mat::iter_mut`].
    pub fn lines_mut<T: DataType>(&mut self) -> LinesMut<'_, T> {
        self.assert_exclusive("lines_mut");
        LinesMut {
            inner: Lines::new(self),
            _lifetime: PhantomData,
        }
    }
}

///////////
// Tests //
///////////
