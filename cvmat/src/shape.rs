/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Geometry types and stride arithmetic.

/// A 2-d extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: usize,
    pub height: usize,
}

impl Size {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

/// A 2-d position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle with its top-left corner at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Where a 2-d view sits inside the array it was sliced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoiLocation {
    /// Extents of the whole parent array.
    pub whole: Size,
    /// Offset of the view's first element inside the parent.
    pub offset: Point,
}

/// Compute row-major dense strides in bytes, returning `None` on overflow.
pub(crate) fn dense_steps(extents: &[usize], elem_size: usize) -> Option<Vec<usize>> {
    let mut steps = vec![0; extents.len()];
    let mut step = elem_size;
    for i in (0..extents.len()).rev() {
        steps[i] = step;
        if i > 0 {
            step = step.checked_mul(extents[i])?;
        }
    }
    Some(steps)
}

/// Total number of bytes spanned by dense `extents`, returning `None` on overflow.
pub(crate) fn dense_bytes(extents: &[usize], elem_size: usize) -> Option<usize> {
    extents
        .iter()
        .try_fold(elem_size, |acc, &e| acc.checked_mul(e))
}

/// Return `true` if a layout has no gaps between consecutive lines.
///
/// Leading axes of extent at most one are ignored, so a single row is always continuous.
pub(crate) fn is_continuous_layout(extents: &[usize], steps: &[usize]) -> bool {
    let dims = extents.len();
    let first = extents.iter().position(|&e| e > 1).unwrap_or(dims);

    let mut j = dims.saturating_sub(1);
    while j > first {
        if steps[j].saturating_mul(extents[j]) < steps[j - 1] {
            break;
        }
        j -= 1;
    }
    j <= first
}

/// Return `true` if `steps` satisfy the stride invariant for `extents`.
pub(crate) fn steps_are_valid(extents: &[usize], steps: &[usize], elem_size: usize) -> bool {
    if extents.len() != steps.len() || steps.last() != Some(&elem_size) {
        return false;
    }
    steps
        .windows(2)
        .zip(&extents[1..])
        .all(|(w, &e)| w[1].checked_mul(e).is_some_and(|inner| w[0] >= inner))
}

/// Byte offsets of the lines of a strided array.
///
/// A line is one run along the last axis. When `collapse` is requested and the layout is
/// continuous, the whole array is treated as a single line.
#[derive(Debug, Clone)]
pub(crate) struct LineLayout {
    lead_extents: Vec<usize>,
    lead_steps: Vec<usize>,
    count: usize,
    /// Elements per line.
    len: usize,
}

impl LineLayout {
    pub(crate) fn new(extents: &[usize], steps: &[usize], collapse: bool) -> Self {
        let total: usize = extents.iter().product();
        if total == 0 {
            return Self {
                lead_extents: Vec::new(),
                lead_steps: Vec::new(),
                count: 0,
                len: 0,
            };
        }

        if collapse && is_continuous_layout(extents, steps) {
            return Self {
                lead_extents: Vec::new(),
                lead_steps: Vec::new(),
                count: 1,
                len: total,
            };
        }

        let n = extents.len();
        let lead_extents = extents[..n - 1].to_vec();
        Self {
            count: lead_extents.iter().product(),
            lead_extents,
            lead_steps: steps[..n - 1].to_vec(),
            len: extents[n - 1],
        }
    }

    /// Number of lines.
    pub(crate) fn count(&self) -> usize {
        self.count
    }

    /// Elements per line.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Byte offset of line `index`, which must be less than `count()`.
    pub(crate) fn offset(&self, mut index: usize) -> usize {
        debug_assert!(index < self.count);
        let mut offset = 0;
        for (&e, &s) in self.lead_extents.iter().zip(&self.lead_steps).rev() {
            offset += (index % e) * s;
            index /= e;
        }
        offset
    }

    pub(crate) fn offsets(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        (0..self.count).map(|i| self.offset(i))
    }
}
