/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::{fmt::Debug, ptr::NonNull, sync::Arc};

use thiserror::Error;

/// Indicate that an allocation error has occurred.
///
/// This type is limited in what it can contain because additional context
/// inevitably requires more memory allocation, which is what we're trying to avoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown allocation error")]
pub struct AllocatorError;

/// A memory allocator producing the raw buffers behind [`crate::storage::Storage`] blocks.
///
/// # Safety
///
/// Implementations must ensure that if `allocate` succeeds, the returned slice has a length
/// of at least `layout.size()` bytes and an alignment of at least `layout.align()`. If this
/// cannot be satisfied, then an error **must** be returned.
pub unsafe trait AllocatorCore {
    /// Allocate space for at least `layout.size()` bytes aligned to at least
    /// `layout.align()`. Returns an error if the requested size or alignment is not
    /// possible with this allocator.
    fn allocate(&self, layout: std::alloc::Layout) -> Result<NonNull<[u8]>, AllocatorError>;

    /// Deallocation companion to `allocate`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that
    ///
    /// 1. `ptr` is "currently allocated" from the allocator.
    ///    See: <https://doc.rust-lang.org/std/alloc/trait.Allocator.html#currently-allocated-memory>
    /// 2. `ptr` has the same base pointer as the slice-pointer returned from [`Self::allocate`].
    /// 3. `layout` is the same layout that was passed to [`Self::allocate`] for this pointer.
    unsafe fn deallocate(&self, ptr: NonNull<[u8]>, layout: std::alloc::Layout);
}

/// An [`AllocatorCore`] that can live behind a [`SharedAllocator`].
///
/// Users should implement [`AllocatorCore`] (plus `Debug`, `Send` and `Sync`) and rely on
/// the blanket implementation.
pub trait MatAllocator: AllocatorCore + Debug + Send + Sync {}

impl<T> MatAllocator for T where T: AllocatorCore + Debug + Send + Sync {}

/// A reference-counted, type-erased allocator handle.
///
/// Every storage block keeps a clone of the handle that produced it, so a block is always
/// returned to the allocator it came from even if the process-wide default changes.
pub type SharedAllocator = Arc<dyn MatAllocator>;
