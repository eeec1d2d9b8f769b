/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Allocation, copying and filling.

use std::ptr::NonNull;

use super::{normalize_extents, Mat, Region};
use crate::{
    alloc::TryClone,
    array::OutputArray,
    config::default_allocator,
    error::{MatError, Result},
    saturate::{read_f64, write_f64},
    shape,
    storage::Storage,
    types::{Depth, MatType, Scalar},
};

impl Mat {
    /// Ensure the header has exactly `extents` and type `ty`, allocating only if needed.
    ///
    /// If the header already holds data of this shape and type nothing happens: the block,
    /// data pointer and reference count are preserved. Otherwise the current block is
    /// released and a new continuous block of `total * elem_size` bytes is allocated from
    /// the header's allocator (or the process default). Contents are unspecified.
    ///
    /// A one-element `extents` `[n]` requests an `[n, 1]` column.
    ///
    /// # Errors
    ///
    /// Invalid ranks and overflowing sizes are rejected before anything changes. If the
    /// allocation itself fails, the old block has already been released and the header is
    /// left empty.
    pub fn create(&mut self, extents: &[usize], ty: MatType) -> Result<()> {
        let extents = normalize_extents(extents)?;
        if self.region.base().is_some() && self.mat_type() == ty && self.size == extents {
            return Ok(());
        }

        let elem_size = ty.elem_size();
        let overflow = || MatError::Overflow {
            extents: extents.clone(),
            elem_size,
        };
        let steps = shape::dense_steps(&extents, elem_size).ok_or_else(overflow)?;
        let bytes = shape::dense_bytes(&extents, elem_size)
            .filter(|&b| b <= isize::MAX as usize)
            .ok_or_else(overflow)?;

        if self.is_submatrix() && self.region.base().is_some() {
            tracing::warn!(
                from = ?self.size,
                to = ?extents,
                "reallocating a submatrix detaches it from its parent"
            );
        }

        self.set_type(ty);
        self.release();

        if bytes > 0 {
            let allocator = self.allocator.clone().unwrap_or_else(default_allocator);
            self.region = Region::Owned(Storage::new(bytes, allocator)?);
            tracing::debug!(extents = ?extents, %ty, bytes, "allocated array");
        }

        self.size = extents;
        self.step = steps;
        self.data = 0;
        self.datastart = 0;
        self.dataend = bytes;
        self.datalimit = bytes;
        self.set_flag(Self::SUBMATRIX_FLAG, false);
        self.update_continuity();
        Ok(())
    }

    /// Drop this header's reference to its data and reset all extents to zero.
    ///
    /// The rank and element type are kept. The block is freed if this was the last
    /// reference. External buffers are never freed.
    pub fn release(&mut self) {
        self.region = Region::None;
        self.size.fill(0);
        self.step.fill(0);
        let esz = self.mat_type().elem_size();
        if let Some(last) = self.step.last_mut() {
            *last = esz;
        }
        self.data = 0;
        self.datastart = 0;
        self.dataend = 0;
        self.datalimit = 0;
        self.set_flag(Self::SUBMATRIX_FLAG, false);
        self.update_continuity();
    }

    /// Copy this array into `dst`, resizing `dst` with [`OutputArray::create`] first.
    ///
    /// An empty source releases `dst`. Copying onto the same data is a no-op.
    pub fn copy_to<O>(&self, dst: &mut O) -> Result<()>
    where
        O: OutputArray + ?Sized,
    {
        if self.empty() {
            dst.release();
            return Ok(());
        }
        dst.create(&self.size, self.mat_type())?;
        let dst = dst.mat_mut();
        if dst.data_ptr() == self.data_ptr() {
            return Ok(());
        }
        copy_overlapping(self, dst)
    }

    /// Copy the elements selected by `mask` into `dst`.
    ///
    /// `mask` must be 8-bit with either 1 channel (selecting whole elements) or as many
    /// channels as `self` (selecting individual channels), and have the same extents. If
    /// `dst` gets new storage it is zero-filled before the copy.
    pub fn copy_to_masked<O>(&self, dst: &mut O, mask: &Mat) -> Result<()>
    where
        O: OutputArray + ?Sized,
    {
        self.check_mask(mask)?;
        if self.empty() {
            dst.release();
            return Ok(());
        }

        // Holding the old block keeps its address from being reused by the new one.
        let before = dst.mat_mut().storage().cloned();
        dst.create(&self.size, self.mat_type())?;
        let dst = dst.mat_mut();
        let fresh = match (&before, dst.storage()) {
            (Some(old), Some(new)) => !old.same_block(new),
            (None, Some(_)) => true,
            (_, None) => false,
        };
        drop(before);
        if fresh {
            dst.set_to(0.0, None)?;
        }
        if dst.data_ptr() == self.data_ptr() {
            return Ok(());
        }

        let src_owned;
        let src = if self.shares_region(dst) {
            src_owned = self.try_clone()?;
            &src_owned
        } else {
            self
        };
        let mask_owned;
        let mask = if mask.shares_region(dst) {
            mask_owned = mask.try_clone()?;
            &mask_owned
        } else {
            mask
        };

        let esz = src.elem_size();
        let es1 = src.elem_size1();
        let cn = src.channels();
        let mcn = mask.channels();
        for_each_line(&[src, mask], dst, |lines, out| {
            let (values, selected) = (lines[0], lines[1]);
            for (j, chunk) in out.chunks_exact_mut(esz).enumerate() {
                let value = &values[j * esz..][..esz];
                if mcn == 1 {
                    if selected[j] != 0 {
                        chunk.copy_from_slice(value);
                    }
                } else {
                    for c in 0..cn {
                        if selected[j * cn + c] != 0 {
                            let range = c * es1..(c + 1) * es1;
                            chunk[range.clone()].copy_from_slice(&value[range]);
                        }
                    }
                }
            }
        });
        Ok(())
    }

    /// Return a deep copy in a new continuous block of exactly `total * elem_size` bytes.
    pub fn try_clone(&self) -> Result<Mat> {
        let mut m = Mat::empty_of(self.mat_type());
        self.copy_to(&mut m)?;
        Ok(m)
    }

    /// Copy `src` element-wise into this header's existing data.
    ///
    /// Never reallocates, so writes through a view land in the parent array. Overlapping
    /// source and destination views behave as if `src` were copied out first.
    pub fn assign_from(&mut self, src: &Mat) -> Result<()> {
        if self.mat_type() != src.mat_type() {
            return Err(MatError::TypeMismatch {
                expected: self.mat_type(),
                found: src.mat_type(),
            });
        }
        if self.size != src.size {
            return Err(MatError::SizeMismatch {
                expected: self.size.clone(),
                found: src.size.clone(),
            });
        }
        copy_overlapping(src, self)
    }

    /// Copy this array element-wise into `dst`'s existing data. See [`Mat::assign_from`].
    pub fn copy_into(&self, dst: &mut Mat) -> Result<()> {
        dst.assign_from(self)
    }

    /// Set every element (or every element selected by `mask`) to `value`.
    ///
    /// Channel `c` receives `value.channel(c)`, saturated to the array depth.
    pub fn set_to(&mut self, value: impl Into<Scalar>, mask: Option<&Mat>) -> Result<()> {
        let value = value.into();
        if let Some(mask) = mask {
            self.check_mask(mask)?;
        }
        if self.empty() {
            return Ok(());
        }

        let ty = self.mat_type();
        let esz = ty.elem_size();
        let es1 = ty.elem_size1();
        let cn = ty.channels();
        let mut elem = vec![0u8; esz];
        for (c, chunk) in elem.chunks_exact_mut(es1).enumerate() {
            write_f64(ty.depth(), value.channel(c), chunk);
        }

        let Some(mask) = mask else {
            for_each_line(&[], self, |_, out| {
                for chunk in out.chunks_exact_mut(esz) {
                    chunk.copy_from_slice(&elem);
                }
            });
            return Ok(());
        };

        let mask_owned;
        let mask = if mask.shares_region(self) {
            mask_owned = mask.try_clone()?;
            &mask_owned
        } else {
            mask
        };
        let mcn = mask.channels();
        for_each_line(&[mask], self, |lines, out| {
            let selected = lines[0];
            for (j, chunk) in out.chunks_exact_mut(esz).enumerate() {
                if mcn == 1 {
                    if selected[j] != 0 {
                        chunk.copy_from_slice(&elem);
                    }
                } else {
                    for c in 0..cn {
                        if selected[j * cn + c] != 0 {
                            let range = c * es1..(c + 1) * es1;
                            chunk[range.clone()].copy_from_slice(&elem[range]);
                        }
                    }
                }
            }
        });
        Ok(())
    }

    /// Convert to `depth` (default: `dst`'s fixed depth, else the source depth) computing
    /// `alpha * x + beta` per channel with saturation.
    pub fn convert_to<O>(
        &self,
        dst: &mut O,
        depth: Option<Depth>,
        alpha: f64,
        beta: f64,
    ) -> Result<()>
    where
        O: OutputArray + ?Sized,
    {
        if self.empty() {
            dst.release();
            return Ok(());
        }

        let src_ty = self.mat_type();
        let depth = depth
            .or_else(|| dst.fixed_type().map(MatType::depth))
            .unwrap_or(src_ty.depth());
        let dst_ty = MatType::with_channels(depth, src_ty.channels());
        if dst_ty == src_ty && alpha == 1.0 && beta == 0.0 {
            return self.copy_to(dst);
        }

        dst.create(&self.size, dst_ty)?;
        let dst = dst.mat_mut();

        let src_owned;
        let src = if self.shares_region(dst) {
            src_owned = self.try_clone()?;
            &src_owned
        } else {
            self
        };

        let (sd, s1) = (src_ty.depth(), src_ty.elem_size1());
        let (dd, d1) = (dst_ty.depth(), dst_ty.elem_size1());
        for_each_line(&[src], dst, |lines, out| {
            for (x, y) in lines[0].chunks_exact(s1).zip(out.chunks_exact_mut(d1)) {
                write_f64(dd, read_f64(sd, x) * alpha + beta, y);
            }
        });
        Ok(())
    }

    fn check_mask(&self, mask: &Mat) -> Result<()> {
        let ok = mask.depth() == Depth::U8
            && (mask.channels() == 1 || mask.channels() == self.channels())
            && mask.size == self.size;
        if ok {
            Ok(())
        } else {
            Err(MatError::BadMask {
                channels: self.channels(),
            })
        }
    }
}

impl TryClone for Mat {
    fn try_clone(&self) -> Result<Self> {
        Mat::try_clone(self)
    }
}

/// [`copy_data`], snapshotting `src` first when a line walk could read bytes it already
/// overwrote.
pub(crate) fn copy_overlapping(src: &Mat, dst: &mut Mat) -> Result<()> {
    if src.overlaps(dst) && !(src.is_continuous() && dst.is_continuous()) {
        let snapshot = src.try_clone()?;
        copy_data(&snapshot, dst);
    } else {
        copy_data(src, dst);
    }
    Ok(())
}

/// Copy all elements of `src` into `dst`. Both must have the same extents and element size.
///
/// The two may overlap only if both are continuous, in which case the copy has `memmove`
/// semantics.
pub(crate) fn copy_data(src: &Mat, dst: &mut Mat) {
    debug_assert_eq!(src.size, dst.size);
    debug_assert_eq!(src.elem_size(), dst.elem_size());

    let (Some(s), Some(d)) = (src.data_ptr(), dst.data_ptr()) else {
        return;
    };
    let esz = src.elem_size();

    if src.is_continuous() && dst.is_continuous() {
        // SAFETY: Both headers span `total * esz` bytes from their data pointers.
        unsafe { std::ptr::copy(s.as_ptr(), d.as_ptr(), src.total() * esz) };
        return;
    }

    let (sl, dl) = (src.line_layout(false), dst.line_layout(false));
    let bytes = sl.len() * esz;
    for (so, doff) in sl.offsets().zip(dl.offsets()) {
        // SAFETY: Line offsets stay within each header's extents.
        unsafe { std::ptr::copy(s.as_ptr().add(so), d.as_ptr().add(doff), bytes) };
    }
}

/// Run `f` over corresponding lines of `inputs` and `out`, which share extents.
///
/// Each input line is passed as raw bytes. Inputs must not share memory with `out`.
pub(crate) fn for_each_line<F>(inputs: &[&Mat], out: &mut Mat, mut f: F)
where
    F: FnMut(&[&[u8]], &mut [u8]),
{
    let Some(out_base) = out.data_ptr() else {
        return;
    };
    let collapse = out.is_continuous() && inputs.iter().all(|m| m.is_continuous());
    let out_layout = out.line_layout(collapse);

    let mut layouts = Vec::with_capacity(inputs.len());
    for m in inputs {
        debug_assert_eq!(m.size, out.size);
        match m.data_ptr() {
            Some(base) => layouts.push((base, m.line_layout(collapse), m.elem_size())),
            None => return,
        }
    }

    let out_bytes = out_layout.len() * out.elem_size();
    let mut lines: Vec<&[u8]> = Vec::with_capacity(inputs.len());
    for line in 0..out_layout.count() {
        lines.clear();
        for (base, layout, esz) in &layouts {
            // SAFETY: `line` indexes a line of an input with the same extents, and inputs
            // do not alias `out`.
            lines.push(unsafe { bytes_at(*base, layout.offset(line), layout.len() * esz) });
        }
        // SAFETY: `line` is in bounds and lines of one header never overlap.
        let out_line = unsafe { bytes_at_mut(out_base, out_layout.offset(line), out_bytes) };
        f(&lines, out_line);
    }
}

/// # Safety
///
/// `base + offset .. base + offset + len` must lie within one live region and must not be
/// mutated for the lifetime `'a`.
unsafe fn bytes_at<'a>(base: NonNull<u8>, offset: usize, len: usize) -> &'a [u8] {
    // SAFETY: Inherited from caller.
    unsafe { std::slice::from_raw_parts(base.as_ptr().add(offset), len) }
}

/// # Safety
///
/// `base + offset .. base + offset + len` must lie within one live region and must not be
/// accessed through any other pointer for the lifetime `'a`.
unsafe fn bytes_at_mut<'a>(base: NonNull<u8>, offset: usize, len: usize) -> &'a mut [u8] {
    // SAFETY: Inherited from caller.
    unsafe { std::slice::from_raw_parts_mut(base.as_ptr().add(offset), len) }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        test_util::{init_test_subscriber, AlwaysFails, CountingAllocator, LimitedAllocator},
        Rect,
    };

    fn counting(rows: usize, cols: usize) -> Mat {
        let data: Vec<u8> = (0..(rows * cols) as u8).collect();
        Mat::from_shape_slice(&[rows, cols], &data).unwrap()
    }

    #[test]
    fn create_is_idempotent() {
        let _guard = init_test_subscriber();
        let mut m = Mat::new(&[10, 10], MatType::U8C1).unwrap();
        let ptr = m.data_ptr();
        let alias = m.share();
        assert_eq!(m.refcount(), Some(2));

        m.create(&[10, 10], MatType::U8C1).unwrap();
        assert_eq!(m.data_ptr(), ptr);
        assert_eq!(m.refcount(), Some(2));

        // A different shape detaches from the shared block.
        m.create(&[5, 5], MatType::U8C1).unwrap();
        assert_ne!(m.data_ptr(), ptr);
        assert_eq!(m.refcount(), Some(1));
        assert_eq!(alias.refcount(), Some(1));
    }

    #[test]
    fn create_zero_sized() {
        let mut m = Mat::default();
        m.create(&[0, 3], MatType::F32C1).unwrap();
        assert!(m.empty());
        assert_eq!(m.extents(), &[0, 3]);
        assert_eq!(m.steps(), &[12, 4]);
        assert!(m.data_ptr().is_none());
    }

    #[test]
    fn create_errors() {
        let mut m = Mat::new(&[2, 2], MatType::U8C1).unwrap();
        let ptr = m.data_ptr();

        let err = m.create(&[usize::MAX, 2], MatType::U16C1).unwrap_err();
        assert!(matches!(err, MatError::Overflow { .. }));
        // Validation failures leave the header untouched.
        assert_eq!(m.data_ptr(), ptr);
        assert_eq!(m.extents(), &[2, 2]);

        let err = m.create(&[], MatType::U16C1).unwrap_err();
        assert!(matches!(err, MatError::BadRank(0)));
        assert_eq!(m.data_ptr(), ptr);

        // Allocation failures leave the header empty.
        m.set_allocator(Some(Arc::new(AlwaysFails)));
        let err = m.create(&[3, 3], MatType::U8C1).unwrap_err();
        assert!(matches!(err, MatError::Allocation { bytes: 9, .. }));
        assert!(m.empty());
        assert!(m.data_ptr().is_none());

        let mut m = Mat::with_allocator(Arc::new(LimitedAllocator { max_bytes: 64 }));
        m.create(&[8, 8], MatType::U8C1).unwrap();
        assert!(m.create(&[8, 9], MatType::U8C1).is_err());
    }

    #[test]
    fn release_frees_once() {
        let counter = Arc::new(CountingAllocator::default());
        let mut a = Mat::new_in(&[4, 4], MatType::U8C1, counter.clone()).unwrap();
        let mut b = a.row(0);
        assert_eq!(counter.live(), 1);

        a.release();
        assert!(a.empty());
        assert_eq!(a.extents(), &[0, 0]);
        assert_eq!(a.steps(), &[0, 1]);
        assert_eq!(a.mat_type(), MatType::U8C1);
        assert_eq!(counter.live(), 1);
        assert_eq!(b.refcount(), Some(1));

        b.release();
        assert_eq!(counter.live(), 0);
        b.release();
        assert_eq!(counter.live(), 0);
        assert_eq!(counter.total(), 1);
    }

    #[test]
    fn copies() {
        let m = counting(4, 5);
        let roi = m.rect(crate::Rect::new(1, 1, 3, 2));

        let mut dst = Mat::default();
        roi.copy_to(&mut dst).unwrap();
        assert_eq!(dst.extents(), &[2, 3]);
        assert!(dst.is_continuous());
        assert_eq!(dst.as_slice::<u8>().unwrap(), &[6, 7, 8, 11, 12, 13]);

        // Copying into an existing header of the right shape keeps its block.
        let ptr = dst.data_ptr();
        m.rect(crate::Rect::new(0, 0, 3, 2)).copy_to(&mut dst).unwrap();
        assert_eq!(dst.data_ptr(), ptr);
        assert_eq!(dst.as_slice::<u8>().unwrap(), &[0, 1, 2, 5, 6, 7]);

        // Into a view: lands in the parent.
        let target = Mat::zeros(&[4, 5], MatType::U8C1).unwrap();
        let mut view = target.rect(crate::Rect::new(2, 2, 3, 2));
        roi.copy_to(&mut view).unwrap();
        assert_eq!(target.row_slice::<u8>(2), &[0, 0, 6, 7, 8]);
        assert_eq!(target.row_slice::<u8>(3), &[0, 0, 11, 12, 13]);

        // An empty source releases the destination.
        Mat::default().copy_to(&mut dst).unwrap();
        assert!(dst.empty());
    }

    #[test]
    fn clone_is_deep_and_continuous() {
        let m = counting(4, 5);
        let roi = m.col_range(1..3);
        let mut c = roi.try_clone().unwrap();
        assert!(c.is_continuous());
        assert_eq!(c.refcount(), Some(1));
        assert_eq!(c.storage().unwrap().capacity(), 8);

        *c.at_mut::<u8>(&[0, 0]) = 99;
        assert_eq!(*roi.at::<u8>(&[0, 0]), 1);
        assert_eq!(*c.at::<u8>(&[1, 1]), 7);

        let c = TryClone::try_clone(&Mat::default()).unwrap();
        assert!(c.empty());
    }

    #[test]
    fn masked_copy() {
        let src = counting(2, 3);
        let mask = Mat::from_shape_slice(&[2, 3], &[1u8, 0, 1, 0, 0, 255]).unwrap();

        let mut dst = Mat::default();
        src.copy_to_masked(&mut dst, &mask).unwrap();
        assert_eq!(dst.as_slice::<u8>().unwrap(), &[0, 0, 2, 0, 0, 5]);

        // Existing storage is not cleared.
        let mut dst = Mat::filled(&[2, 3], MatType::U8C1, 9.0).unwrap();
        src.copy_to_masked(&mut dst, &mask).unwrap();
        assert_eq!(dst.as_slice::<u8>().unwrap(), &[0, 9, 2, 9, 9, 5]);

        // Per-channel masks.
        let src = Mat::from_shape_slice(&[1, 2], &[[1u8, 2], [3, 4]]).unwrap();
        let mask = Mat::from_shape_slice(&[1, 2], &[[0u8, 1], [1, 0]]).unwrap();
        let mut dst = Mat::default();
        src.copy_to_masked(&mut dst, &mask).unwrap();
        assert_eq!(dst.as_slice::<[u8; 2]>().unwrap(), &[[0, 2], [3, 0]]);

        let bad = Mat::new(&[2, 2], MatType::U8C1).unwrap();
        assert!(matches!(
            src.copy_to_masked(&mut dst, &bad),
            Err(MatError::BadMask { channels: 2 })
        ));
    }

    #[test]
    fn masked_copy_into_reallocated_destination() {
        let src = counting(2, 3);
        let mask = Mat::from_shape_slice(&[2, 3], &[0u8, 1, 0, 1, 0, 0]).unwrap();

        // Wrong shape: the destination gets a new block, cleared outside the mask.
        let mut dst = Mat::filled(&[3, 2], MatType::U8C1, 9.0).unwrap();
        let old = dst.storage().cloned();
        src.copy_to_masked(&mut dst, &mask).unwrap();
        assert!(!old.unwrap().same_block(dst.storage().unwrap()));
        assert_eq!(dst.as_slice::<u8>().unwrap(), &[0, 1, 0, 3, 0, 0]);

        // Matching shape over a shared block: written in place, nothing cleared.
        let parent = Mat::filled(&[2, 3], MatType::U8C1, 7.0).unwrap();
        let mut alias = parent.share();
        src.copy_to_masked(&mut alias, &mask).unwrap();
        assert_eq!(parent.as_slice::<u8>().unwrap(), &[7, 1, 7, 3, 7, 7]);
    }

    fn tens_and_ones() -> Mat {
        let data: Vec<u8> = (0..4u8)
            .flat_map(|r| (0..4u8).map(move |c| 10 * r + c))
            .collect();
        Mat::from_shape_slice(&[4, 4], &data).unwrap()
    }

    #[test]
    fn overlapping_views() {
        let expected = [[0u8, 1, 2], [10, 11, 12], [20, 21, 22]];

        // Destination after the source.
        let m = tens_and_ones();
        let src = m.rect(Rect::new(0, 0, 3, 3));
        let mut dst = m.rect(Rect::new(1, 1, 3, 3));
        src.copy_to(&mut dst).unwrap();
        assert_eq!(dst.data_ptr(), m.rect(Rect::new(1, 1, 3, 3)).data_ptr());
        for (r, row) in expected.iter().enumerate() {
            assert_eq!(&m.row_slice::<u8>(r + 1)[1..], row);
        }

        let m = tens_and_ones();
        let src = m.rect(Rect::new(0, 0, 3, 3));
        m.rect(Rect::new(1, 1, 3, 3)).assign_from(&src).unwrap();
        for (r, row) in expected.iter().enumerate() {
            assert_eq!(&m.row_slice::<u8>(r + 1)[1..], row);
        }

        // Destination before the source.
        let m = tens_and_ones();
        m.rect(Rect::new(1, 1, 3, 3))
            .copy_into(&mut m.rect(Rect::new(0, 0, 3, 3)))
            .unwrap();
        assert_eq!(m.row_slice::<u8>(0), &[11, 12, 13, 3]);
        assert_eq!(m.row_slice::<u8>(1), &[21, 22, 23, 13]);
        assert_eq!(m.row_slice::<u8>(2), &[31, 32, 33, 23]);
        assert_eq!(m.row_slice::<u8>(3), &[30, 31, 32, 33]);

        // Overlapping continuous runs are a plain memmove.
        let m = tens_and_ones();
        m.row_range(0..2).copy_into(&mut m.row_range(1..3)).unwrap();
        assert_eq!(m.row_slice::<u8>(1), &[0, 1, 2, 3]);
        assert_eq!(m.row_slice::<u8>(2), &[10, 11, 12, 13]);
    }

    #[test]
    fn explicit_assignment() {
        let m = counting(3, 4);
        let mut r0 = m.row(0);
        r0.assign_from(&m.row(2)).unwrap();
        assert_eq!(m.row_slice::<u8>(0), &[8, 9, 10, 11]);

        m.row(1).copy_into(&mut m.row(2)).unwrap();
        assert_eq!(m.row_slice::<u8>(2), &[4, 5, 6, 7]);

        let err = r0.assign_from(&m.col(0)).unwrap_err();
        assert!(matches!(err, MatError::SizeMismatch { .. }));
        let other = Mat::new(&[1, 4], MatType::S8C1).unwrap();
        assert!(matches!(
            r0.assign_from(&other),
            Err(MatError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn fill() {
        let m = counting(3, 4);
        let mut roi = m.rect(crate::Rect::new(1, 1, 2, 2));
        roi.set_to(300.0, None).unwrap();
        assert_eq!(m.row_slice::<u8>(1), &[4, 255, 255, 7]);
        assert_eq!(m.row_slice::<u8>(0), &[0, 1, 2, 3]);

        let mut m = Mat::zeros(&[2, 2], MatType::S16C1).unwrap();
        let mask = Mat::from_shape_slice(&[2, 2], &[0u8, 1, 1, 0]).unwrap();
        m.set_to(-2.5, Some(&mask)).unwrap();
        assert_eq!(m.as_slice::<i16>().unwrap(), &[0, -2, -2, 0]);

        let bad = Mat::new(&[2, 2], MatType::F32C1).unwrap();
        assert!(m.set_to(0.0, Some(&bad)).is_err());
    }

    #[test]
    fn conversion() {
        let m = Mat::from_slice(&[-1.5f32, 0.5, 2.5, 300.0]).unwrap();

        let mut dst = Mat::default();
        m.convert_to(&mut dst, Some(Depth::U8), 1.0, 0.0).unwrap();
        assert_eq!(dst.mat_type(), MatType::U8C1);
        assert_eq!(dst.as_slice::<u8>().unwrap(), &[0, 0, 2, 255]);

        m.convert_to(&mut dst, Some(Depth::F64), 2.0, 1.0).unwrap();
        assert_eq!(dst.as_slice::<f64>().unwrap(), &[-2.0, 2.0, 6.0, 601.0]);

        // In place on a non-continuous view.
        let base = counting(3, 4);
        let mut view = base.col_range(1..3);
        let alias = view.share();
        alias.convert_to(&mut view, None, 2.0, 0.0).unwrap();
        assert_eq!(base.row_slice::<u8>(1), &[4, 10, 12, 7]);

        // Identity conversions are plain copies.
        let mut copy = Mat::default();
        m.convert_to(&mut copy, None, 1.0, 0.0).unwrap();
        assert_eq!(copy.as_slice::<f32>().unwrap(), m.as_slice::<f32>().unwrap());
    }
}
