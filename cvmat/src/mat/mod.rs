/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! The array header.
//!
//! A [`Mat`] describes an n-dimensional strided view: extents, byte strides, element
//! type and flags, plus an offset into a memory region. The region is either a shared
//! [`Storage`] block or a caller-owned external buffer.
//!
//! # Aliasing
//!
//! Many headers may view the same block. Creating a view with [`Mat::share`], [`Mat::row`]
//! or any other view constructor is `O(1)` and only touches the block's reference count,
//! which is atomic. Element data is **not** synchronized: writing through one header while
//! another header that views the same bytes is being read or written is undefined
//! behavior. This holds across threads and also within one thread while a slice obtained
//! from one header (for example through [`Mat::as_slice`]) is alive.
//!
//! Mutable borrows such as [`Mat::as_slice_mut`] are only available from a header that is
//! the sole owner of its block ([`Mat::is_exclusive`]), so they can never alias a borrow
//! taken through another header.

mod access;
mod growth;
mod mutate;
mod views;

use std::{fmt, ptr::NonNull};

use crate::{
    alloc::SharedAllocator,
    config::defaults::MAX_DIMS,
    error::{MatError, Result},
    shape::{self, LineLayout},
    storage::Storage,
    types::{DataType, Depth, MatType, Scalar, TYPE_MASK},
};

pub(crate) use mutate::{copy_data, copy_overlapping, for_each_line};

/// The memory a header points into.
#[derive(Debug, Clone)]
pub(crate) enum Region {
    None,
    Owned(Storage),
    External(NonNull<u8>),
}

impl Region {
    fn base(&self) -> Option<NonNull<u8>> {
        match self {
            Self::None => None,
            Self::Owned(storage) => Some(storage.as_ptr()),
            Self::External(ptr) => Some(*ptr),
        }
    }
}

/// An n-dimensional, strided, reference-counted dense array header.
///
/// Every header has rank of at least 2; a vector is an `[n, 1]` column. Strides are in
/// bytes and satisfy `steps[i] >= steps[i + 1] * extents[i + 1]` with the last stride equal
/// to the element size.
///
/// `Mat` deliberately does not implement [`Clone`]. Use [`Mat::share`] for an aliasing
/// header or [`Mat::try_clone`] for a deep copy.
pub struct Mat {
    flags: u32,
    size: Vec<usize>,
    step: Vec<usize>,
    region: Region,
    /// Offset of element `(0, .., 0)` from the region base.
    data: usize,
    /// Start of the whole array this header was sliced from.
    datastart: usize,
    /// End of the whole array this header was sliced from.
    dataend: usize,
    /// End of usable capacity.
    datalimit: usize,
    allocator: Option<SharedAllocator>,
}

// SAFETY: The region is either a `Storage` (itself `Send + Sync`) or an external buffer
// whose thread-safety is part of the `from_raw_parts` contract. Concurrent access to the
// element data is the caller's responsibility, as documented at the module level.
unsafe impl Send for Mat {}

// SAFETY: See above. Shared references only hand out read access.
unsafe impl Sync for Mat {}

impl Mat {
    /// Identifying bits present in every header's flags.
    pub const MAGIC_VAL: u32 = 0x42FF_0000;
    /// Set when the array has no gaps between its lines.
    pub const CONTINUOUS_FLAG: u32 = 1 << 14;
    /// Set when the header views part of a larger array.
    pub const SUBMATRIX_FLAG: u32 = 1 << 15;

    //////////////////
    // Construction //
    //////////////////

    /// An empty `[0, 0]` header of type `ty`. Does not allocate.
    pub fn empty_of(ty: MatType) -> Self {
        let mut this = Self {
            flags: Self::MAGIC_VAL,
            size: vec![0, 0],
            step: vec![0, ty.elem_size()],
            region: Region::None,
            data: 0,
            datastart: 0,
            dataend: 0,
            datalimit: 0,
            allocator: None,
        };
        this.set_type(ty);
        this.update_continuity();
        this
    }

    /// An empty header that will allocate from `allocator` instead of the process default.
    pub fn with_allocator(allocator: SharedAllocator) -> Self {
        let mut this = Self::default();
        this.allocator = Some(allocator);
        this
    }

    /// Allocate a continuous array. Contents are unspecified.
    pub fn new(extents: &[usize], ty: MatType) -> Result<Self> {
        let mut this = Self::empty_of(ty);
        this.create(extents, ty)?;
        Ok(this)
    }

    /// Allocate a continuous `rows x cols` array. Contents are unspecified.
    pub fn new_2d(rows: usize, cols: usize, ty: MatType) -> Result<Self> {
        Self::new(&[rows, cols], ty)
    }

    /// Allocate a continuous array from `allocator`. Contents are unspecified.
    pub fn new_in(extents: &[usize], ty: MatType, allocator: SharedAllocator) -> Result<Self> {
        let mut this = Self::with_allocator(allocator);
        this.create(extents, ty)?;
        Ok(this)
    }

    /// Allocate an array with every element set to `value`.
    pub fn filled(extents: &[usize], ty: MatType, value: impl Into<Scalar>) -> Result<Self> {
        let mut this = Self::new(extents, ty)?;
        this.set_to(value, None)?;
        Ok(this)
    }

    pub fn zeros(extents: &[usize], ty: MatType) -> Result<Self> {
        Self::filled(extents, ty, Scalar::all(0.0))
    }

    /// Channel 0 of every element is set to one, the other channels to zero.
    pub fn ones(extents: &[usize], ty: MatType) -> Result<Self> {
        Self::filled(extents, ty, 1.0)
    }

    /// A 2-d array with ones in channel 0 of the main diagonal and zeros elsewhere.
    pub fn eye(rows: usize, cols: usize, ty: MatType) -> Result<Self> {
        let this = Self::zeros(&[rows, cols], ty)?;
        if rows > 0 && cols > 0 {
            this.diag(0).set_to(1.0, None)?;
        }
        Ok(this)
    }

    /// Copy `data` into a new `[len, 1]` column.
    pub fn from_slice<T: DataType>(data: &[T]) -> Result<Self> {
        Self::from_shape_slice(&[data.len(), 1], data)
    }

    /// Copy `data` into a new array with the given extents, in row-major order.
    pub fn from_shape_slice<T: DataType>(extents: &[usize], data: &[T]) -> Result<Self> {
        let mut this = Self::new(extents, T::mat_type())?;
        if this.total() != data.len() {
            return Err(MatError::SizeMismatch {
                expected: this.size.clone(),
                found: vec![data.len()],
            });
        }
        this.as_bytes_mut()?.copy_from_slice(bytemuck::cast_slice(data));
        Ok(this)
    }

    /// Wrap a caller-owned buffer without taking ownership.
    ///
    /// When `steps` is `None` the buffer is assumed dense. The returned header, and every
    /// view derived from it, never frees the buffer and cannot grow it in place.
    ///
    /// # Safety
    ///
    /// * `ptr` must be valid for reads of `steps[0] * extents[0]` bytes (dense: the product
    ///   of all extents times the element size) for as long as any header derived from the
    ///   returned one is alive, and valid for writes if any such header is written through.
    /// * The usual aliasing rules apply: the buffer must not be accessed through other
    ///   means while a header derived from it reads or writes it.
    pub unsafe fn from_raw_parts(
        ptr: NonNull<u8>,
        extents: &[usize],
        ty: MatType,
        steps: Option<&[usize]>,
    ) -> Result<Self> {
        let extents = normalize_extents(extents)?;
        let elem_size = ty.elem_size();
        let overflow = || MatError::Overflow {
            extents: extents.clone(),
            elem_size,
        };

        let steps = match steps {
            None => shape::dense_steps(&extents, elem_size).ok_or_else(overflow)?,
            Some(steps) => {
                if !shape::steps_are_valid(&extents, steps, elem_size)
                    || steps.iter().any(|s| s % ty.elem_size1() != 0)
                {
                    return Err(MatError::BadStep {
                        steps: steps.to_vec(),
                        extents: extents.clone(),
                        elem_size,
                    });
                }
                steps.to_vec()
            }
        };

        let align = ty.elem_size1();
        if (ptr.as_ptr() as usize) % align != 0 {
            return Err(MatError::Misaligned { align });
        }

        let span = steps[0].checked_mul(extents[0]).ok_or_else(overflow)?;
        let mut this = Self::empty_of(ty);
        this.size = extents;
        this.step = steps;
        this.region = Region::External(ptr);
        this.dataend = span;
        this.datalimit = span;
        this.update_continuity();
        Ok(this)
    }

    /// Return an aliasing header over the same data, incrementing the block's reference
    /// count.
    pub fn share(&self) -> Self {
        Self {
            flags: self.flags,
            size: self.size.clone(),
            step: self.step.clone(),
            region: self.region.clone(),
            data: self.data,
            datastart: self.datastart,
            dataend: self.dataend,
            datalimit: self.datalimit,
            allocator: self.allocator.clone(),
        }
    }

    /////////////
    // Queries //
    /////////////

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn mat_type(&self) -> MatType {
        // Only `set_type` writes the type bits, always from a valid `MatType`.
        MatType::from_code((self.flags & TYPE_MASK) as i32).unwrap_or_default()
    }

    /// The packed `(depth, channels)` type code.
    pub fn type_code(&self) -> i32 {
        self.mat_type().code()
    }

    pub fn depth(&self) -> Depth {
        self.mat_type().depth()
    }

    pub fn channels(&self) -> usize {
        self.mat_type().channels()
    }

    /// Bytes per element (all channels).
    pub fn elem_size(&self) -> usize {
        self.mat_type().elem_size()
    }

    /// Bytes per channel.
    pub fn elem_size1(&self) -> usize {
        self.mat_type().elem_size1()
    }

    pub fn dims(&self) -> usize {
        self.size.len()
    }

    pub fn rows(&self) -> usize {
        self.size[0]
    }

    pub fn cols(&self) -> usize {
        self.size[1]
    }

    pub fn extents(&self) -> &[usize] {
        &self.size
    }

    /// Byte strides per axis.
    pub fn steps(&self) -> &[usize] {
        &self.step
    }

    /// Stride of axis `i` in channels rather than bytes.
    pub fn step1(&self, i: usize) -> usize {
        self.step[i] / self.elem_size1()
    }

    /// Number of elements.
    pub fn total(&self) -> usize {
        self.size.iter().product()
    }

    /// Return `true` if the header has no elements or no data.
    pub fn empty(&self) -> bool {
        self.total() == 0 || self.region.base().is_none()
    }

    pub fn is_continuous(&self) -> bool {
        self.flags & Self::CONTINUOUS_FLAG != 0
    }

    pub fn is_submatrix(&self) -> bool {
        self.flags & Self::SUBMATRIX_FLAG != 0
    }

    /// Address of element `(0, .., 0)`, if the header has data.
    pub fn data_ptr(&self) -> Option<NonNull<u8>> {
        self.region.base().map(|base| {
            // SAFETY: `data` is at most `dataend`, which lies within the region.
            unsafe { base.add(self.data) }
        })
    }

    /// The storage block this header shares, or `None` for empty and external headers.
    pub fn storage(&self) -> Option<&Storage> {
        match &self.region {
            Region::Owned(storage) => Some(storage),
            Region::None | Region::External(_) => None,
        }
    }

    /// Number of headers sharing this header's block, if it has one.
    pub fn refcount(&self) -> Option<usize> {
        self.storage().map(Storage::refcount)
    }

    /// Return `true` if no other header can reach this header's data.
    ///
    /// Holds for headers without data and for the last header of a block. External buffers
    /// are never exclusive since [`Mat::share`] aliases them without counting.
    pub fn is_exclusive(&self) -> bool {
        match &self.region {
            Region::None => true,
            Region::Owned(storage) => storage.refcount() == 1,
            Region::External(_) => false,
        }
    }

    /// The allocator attached to this header, if any.
    pub fn allocator(&self) -> Option<&SharedAllocator> {
        self.allocator.as_ref()
    }

    /// Attach an allocator for future allocations, or detach with `None` to fall back to
    /// the process default. Existing data is unaffected.
    pub fn set_allocator(&mut self, allocator: Option<SharedAllocator>) {
        self.allocator = allocator;
    }

    /// Return the number of `elem_channels`-wide elements if this array is a vector of
    /// them, or `None` if the layout is incompatible.
    ///
    /// A vector is a 2-d array with one extent equal to 1 and `elem_channels` channels, a
    /// single-channel 2-d array with `elem_channels` columns, or a single-channel 3-d
    /// array of shape `[1, n, elem_channels]` or `[n, 1, elem_channels]`. Headers without
    /// data are never vectors.
    pub fn check_vector(
        &self,
        elem_channels: usize,
        depth: Option<Depth>,
        require_continuous: bool,
    ) -> Option<usize> {
        self.region.base()?;
        vector_len(
            &self.size,
            &self.step,
            self.mat_type(),
            self.is_continuous(),
            elem_channels,
            depth,
            require_continuous,
        )
    }

    //////////////
    // Internal //
    //////////////

    fn set_type(&mut self, ty: MatType) {
        // CAST: type codes are non-negative and bounded by `TYPE_MASK`.
        self.flags = (self.flags & !TYPE_MASK) | ty.code() as u32;
    }

    fn set_flag(&mut self, flag: u32, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    pub(crate) fn update_continuity(&mut self) {
        let continuous = shape::is_continuous_layout(&self.size, &self.step);
        self.set_flag(Self::CONTINUOUS_FLAG, continuous);
    }

    /// Return `true` if both headers point into the same memory region.
    pub(crate) fn shares_region(&self, other: &Mat) -> bool {
        match (self.region.base(), other.region.base()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Return `true` if the bytes spanned by the two headers intersect.
    pub(crate) fn overlaps(&self, other: &Mat) -> bool {
        if !self.shares_region(other) {
            return false;
        }
        match (self.byte_span(), other.byte_span()) {
            (Some(a), Some(b)) => a.start < b.end && b.start < a.end,
            _ => false,
        }
    }

    /// Addresses from the first element to one past the last.
    fn byte_span(&self) -> Option<std::ops::Range<usize>> {
        if self.total() == 0 {
            return None;
        }
        let start = self.data_ptr()?.as_ptr() as usize;
        let last: usize = self
            .size
            .iter()
            .zip(&self.step)
            .map(|(&extent, &step)| (extent - 1) * step)
            .sum();
        Some(start..start + last + self.elem_size())
    }

    pub(crate) fn line_layout(&self, collapse: bool) -> LineLayout {
        LineLayout::new(&self.size, &self.step, collapse)
    }
}

impl Default for Mat {
    fn default() -> Self {
        Self::empty_of(MatType::U8C1)
    }
}

impl fmt::Debug for Mat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mat")
            .field("type", &self.mat_type())
            .field("extents", &self.size)
            .field("steps", &self.step)
            .field("continuous", &self.is_continuous())
            .field("submatrix", &self.is_submatrix())
            .field("refcount", &self.refcount())
            .finish()
    }
}

/// Validate a requested rank, turning `[n]` into `[n, 1]`.
pub(crate) fn normalize_extents(extents: &[usize]) -> Result<Vec<usize>> {
    match extents.len() {
        0 => Err(MatError::BadRank(0)),
        1 => Ok(vec![extents[0], 1]),
        n if n > MAX_DIMS => Err(MatError::BadRank(n)),
        _ => Ok(extents.to_vec()),
    }
}

pub(crate) fn vector_len(
    extents: &[usize],
    steps: &[usize],
    ty: MatType,
    continuous: bool,
    elem_channels: usize,
    depth: Option<Depth>,
    require_continuous: bool,
) -> Option<usize> {
    if elem_channels == 0
        || depth.is_some_and(|d| d != ty.depth())
        || (require_continuous && !continuous)
    {
        return None;
    }

    let cn = ty.channels();
    let is_vector = match *extents {
        [rows, cols] => {
            ((rows == 1 || cols == 1) && cn == elem_channels) || (cols == elem_channels && cn == 1)
        }
        [d0, d1, d2] => {
            cn == 1
                && d2 == elem_channels
                && (d0 == 1 || d1 == 1)
                && (continuous || steps[1] == steps[2] * d2)
        }
        _ => false,
    };

    is_vector.then(|| extents.iter().product::<usize>() * cn / elem_channels)
}

///////////
// Tests //
///////////
