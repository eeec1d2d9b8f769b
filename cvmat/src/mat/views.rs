/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! `O(1)` view construction. Every function here returns a header sharing the source's
//! block; no element data is copied.

use std::ops::Range;

use super::{normalize_extents, Mat};
use crate::{
    error::{MatError, Result},
    shape::{self, Point, Rect, RoiLocation, Size},
};

impl Mat {
    /// A `[1, cols, ..]` view of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.rows()`.
    pub fn row(&self, i: usize) -> Mat {
        assert!(i < self.rows(), "row {i} is out of bounds (rows: {})", self.rows());
        self.row_range(i..i + 1)
    }

    /// A `[rows, 1, ..]` view of column `j`.
    ///
    /// # Panics
    ///
    /// Panics if `j >= self.cols()`.
    pub fn col(&self, j: usize) -> Mat {
        assert!(
            j < self.cols(),
            "column {j} is out of bounds (cols: {})",
            self.cols()
        );
        self.col_range(j..j + 1)
    }

    /// A view of the rows in `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is decreasing or extends past `self.rows()`.
    pub fn row_range(&self, range: Range<usize>) -> Mat {
        let mut m = self.share();
        m.narrow(0, range);
        m.update_continuity();
        m
    }

    /// A view of the columns in `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` is decreasing or extends past `self.cols()`.
    pub fn col_range(&self, range: Range<usize>) -> Mat {
        let mut m = self.share();
        m.narrow(1, range);
        m.update_continuity();
        m
    }

    /// An n-d view with one range per axis.
    ///
    /// # Panics
    ///
    /// Panics if `ranges.len() != self.dims()` or any range is out of bounds.
    pub fn roi(&self, ranges: &[Range<usize>]) -> Mat {
        assert_eq!(ranges.len(), self.dims(), "expected one range per dimension");
        let mut m = self.share();
        for (axis, range) in ranges.iter().enumerate() {
            m.narrow(axis, range.clone());
        }
        m.update_continuity();
        m
    }

    /// A view of the rectangle `rect` of a 2-d array.
    ///
    /// # Panics
    ///
    /// Panics if the array is not 2-d or the rectangle does not fit.
    pub fn rect(&self, rect: Rect) -> Mat {
        assert_eq!(self.dims(), 2, "rect views require a 2-d array");
        let rows = rect.y..rect.y.saturating_add(rect.height);
        let cols = rect.x..rect.x.saturating_add(rect.width);
        self.roi(&[rows, cols])
    }

    /// A `[len, 1]` view of diagonal `d` of a 2-d array.
    ///
    /// `d == 0` is the main diagonal, `d > 0` lies above it and `d < 0` below.
    ///
    /// # Panics
    ///
    /// Panics if the array is not 2-d or the diagonal is empty.
    pub fn diag(&self, d: isize) -> Mat {
        assert_eq!(self.dims(), 2, "diag requires a 2-d array");
        let (rows, cols) = (self.rows(), self.cols());
        let esz = self.elem_size();
        let offset = d.unsigned_abs();

        let mut m = self.share();
        let len = if d >= 0 {
            assert!(
                offset < cols && rows > 0,
                "diagonal {d} is out of bounds for a {rows}x{cols} array"
            );
            m.data += esz * offset;
            (cols - offset).min(rows)
        } else {
            assert!(
                offset < rows && cols > 0,
                "diagonal {d} is out of bounds for a {rows}x{cols} array"
            );
            m.data += self.step[0] * offset;
            (rows - offset).min(cols)
        };

        m.size = vec![len, 1];
        m.step = vec![self.step[0] + if len > 1 { esz } else { 0 }, esz];
        m.set_flag(Self::SUBMATRIX_FLAG, rows > 1 || cols > 1);
        m.update_continuity();
        m
    }

    /// Reinterpret the array with a different channel count and/or extents.
    ///
    /// * `channels == 0` keeps the current channel count.
    /// * Empty `extents` keep the rank and leading extents, regrouping only the last axis.
    /// * A `0` in `extents` keeps the source extent of that axis.
    ///
    /// The number of scalars `total() * channels()` must be preserved. Regrouping only the
    /// last axis keeps the existing strides; any other change requires a continuous source.
    pub fn reshape(&self, channels: usize, extents: &[usize]) -> Result<Mat> {
        let ty = self.mat_type();
        let new_ty = if channels == 0 {
            ty
        } else {
            ty.to_channels(channels)?
        };
        let new_cn = new_ty.channels();
        let scalars = self.total() * ty.channels();
        let bad = || MatError::BadReshape {
            from_total: scalars,
            request: format!("{new_cn} channel(s) with extents {extents:?}"),
        };

        let dims = self.dims();
        let last = dims - 1;

        let target = if extents.is_empty() {
            let row_scalars = self.size[last] * ty.channels();
            if row_scalars % new_cn != 0 {
                return Err(bad());
            }
            let mut target = self.size.clone();
            target[last] = row_scalars / new_cn;
            target
        } else {
            let mut target = normalize_extents(extents)?;
            for (i, e) in target.iter_mut().enumerate().take(extents.len()) {
                if *e == 0 {
                    *e = *self.size.get(i).ok_or_else(bad)?;
                }
            }
            let product = target
                .iter()
                .try_fold(new_cn, |acc, &e| acc.checked_mul(e))
                .ok_or_else(bad)?;
            if product != scalars {
                return Err(bad());
            }
            target
        };

        let mut m = self.share();
        m.set_type(new_ty);

        let regroups_last = target.len() == dims && target[..last] == self.size[..last];
        if regroups_last {
            m.size = target;
            m.step[last] = new_ty.elem_size();
        } else {
            if !self.is_continuous() {
                return Err(MatError::NotContinuous("reshape"));
            }
            m.step = shape::dense_steps(&target, new_ty.elem_size()).ok_or_else(bad)?;
            m.size = target;
        }

        m.update_continuity();
        Ok(m)
    }

    /// Locate this 2-d view inside the whole array it was sliced from.
    ///
    /// # Panics
    ///
    /// Panics if the array is not 2-d.
    pub fn locate_roi(&self) -> RoiLocation {
        assert_eq!(self.dims(), 2, "locate_roi requires a 2-d array");
        let (rows, cols) = (self.rows(), self.cols());
        let step = self.step[0];
        let esz = self.elem_size();

        if self.region.base().is_none() || step == 0 {
            return RoiLocation {
                whole: Size::new(cols, rows),
                offset: Point::default(),
            };
        }

        let delta1 = self.data - self.datastart;
        let delta2 = self.dataend - self.datastart;

        let y = delta1 / step;
        let x = (delta1 - step * y) / esz;

        let min_step = (x + cols) * esz;
        let height = (delta2.saturating_sub(min_step) / step + 1).max(y + rows);
        let width = (delta2.saturating_sub(step * (height - 1)) / esz).max(x + cols);

        RoiLocation {
            whole: Size::new(width, height),
            offset: Point::new(x, y),
        }
    }

    /// Move the borders of a 2-d view outward by the given amounts (inward for negative
    /// values), clamped to the whole array it was sliced from.
    ///
    /// # Panics
    ///
    /// Panics if the array is not 2-d or has a zero row stride.
    pub fn adjust_roi(
        &mut self,
        top: isize,
        bottom: isize,
        left: isize,
        right: isize,
    ) -> &mut Self {
        assert!(
            self.dims() == 2 && self.step[0] > 0,
            "adjust_roi requires a 2-d array with a non-zero row stride"
        );
        let location = self.locate_roi();
        let esz = self.elem_size();

        // CAST: all values are bounded by the size of a single allocation.
        let (whole_h, whole_w) = (
            location.whole.height as isize,
            location.whole.width as isize,
        );
        let (y, x) = (location.offset.y as isize, location.offset.x as isize);
        let (rows, cols) = (self.rows() as isize, self.cols() as isize);

        let mut row1 = (y - top).max(0).min(whole_h);
        let mut row2 = (y + rows + bottom).min(whole_h).max(0);
        if row1 > row2 {
            std::mem::swap(&mut row1, &mut row2);
        }
        let mut col1 = (x - left).max(0).min(whole_w);
        let mut col2 = (x + cols + right).min(whole_w).max(0);
        if col1 > col2 {
            std::mem::swap(&mut col1, &mut col2);
        }

        let delta = (row1 - y) * self.step[0] as isize + (col1 - x) * esz as isize;
        self.data = self.data.wrapping_add_signed(delta);
        self.size[0] = (row2 - row1) as usize;
        self.size[1] = (col2 - col1) as usize;

        let partial =
            self.size[0] < location.whole.height || self.size[1] < location.whole.width;
        self.set_flag(Self::SUBMATRIX_FLAG, partial);
        self.update_continuity();
        self
    }

    /// Restrict `axis` to `range`, marking the header as a submatrix if the range is not
    /// the full extent.
    fn narrow(&mut self, axis: usize, range: Range<usize>) {
        let extent = self.size[axis];
        assert!(
            range.start <= range.end && range.end <= extent,
            "range {range:?} is out of bounds for axis {axis} with extent {extent}"
        );
        if range != (0..extent) {
            self.data += range.start * self.step[axis];
            self.size[axis] = range.len();
            self.set_flag(Self::SUBMATRIX_FLAG, true);
        }
    }
}

///////////
// Tests //
///////////
