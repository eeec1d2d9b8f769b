/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Reference-counted byte buffers.
//!
//! A [`Storage`] is a handle to one heap block. Cloning a handle increments the block's
//! atomic reference count and dropping a handle decrements it. The block is returned to
//! the allocator that produced it exactly once, when the last handle is dropped.

use std::{alloc::Layout, ptr::NonNull, sync::Arc};

use crate::{
    alloc::SharedAllocator,
    error::{MatError, Result},
};

/// Minimum base alignment requested for every block.
///
/// Custom allocators must honor this so that any element type can be viewed in place.
pub const BLOCK_ALIGN: usize = std::mem::align_of::<f64>();

struct StorageBlock {
    ptr: NonNull<u8>,
    layout: Layout,
    allocator: SharedAllocator,
}

// SAFETY: The block is a plain byte buffer owned by this struct. Synchronizing access to
// its contents is the responsibility of the headers viewing it.
unsafe impl Send for StorageBlock {}

// SAFETY: See above. Shared access only exposes the pointer and metadata.
unsafe impl Sync for StorageBlock {}

impl Drop for StorageBlock {
    fn drop(&mut self) {
        tracing::trace!(bytes = self.layout.size(), "freeing storage block");
        let slice = NonNull::slice_from_raw_parts(self.ptr, self.layout.size());
        // SAFETY: `ptr` was returned by `allocator.allocate(layout)` in `Storage::new` and
        // `drop` runs exactly once.
        unsafe { self.allocator.deallocate(slice, self.layout) }
    }
}

/// A shared handle to a zero-initialized heap block.
#[derive(Clone)]
pub struct Storage {
    block: Arc<StorageBlock>,
}

impl Storage {
    /// Allocate a block of `bytes` bytes from `allocator`.
    ///
    /// The block is zero-filled. Callers must not rely on this: array contents after
    /// allocation are unspecified.
    pub fn new(bytes: usize, allocator: SharedAllocator) -> Result<Self> {
        let layout = Layout::from_size_align(bytes.max(1), BLOCK_ALIGN).map_err(|_| {
            MatError::Overflow {
                extents: vec![bytes],
                elem_size: 1,
            }
        })?;

        let ptr = allocator
            .allocate(layout)
            .map_err(|source| MatError::Allocation { bytes, source })?;
        let ptr = ptr.cast::<u8>();

        // SAFETY: A successful allocation is valid for writes of `layout.size()` bytes.
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, layout.size()) };

        tracing::trace!(bytes, allocator = ?allocator, "allocated storage block");
        Ok(Self {
            block: Arc::new(StorageBlock {
                ptr,
                layout,
                allocator,
            }),
        })
    }

    /// Base address of the block.
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.block.ptr
    }

    /// Number of usable bytes.
    pub fn capacity(&self) -> usize {
        self.block.layout.size()
    }

    /// Number of live handles to this block.
    pub fn refcount(&self) -> usize {
        Arc::strong_count(&self.block)
    }

    /// The allocator the block will be returned to.
    pub fn allocator(&self) -> &SharedAllocator {
        &self.block.allocator
    }

    /// Return `true` if both handles refer to the same block.
    pub fn same_block(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.block, &other.block)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("ptr", &self.block.ptr)
            .field("capacity", &self.capacity())
            .field("refcount", &self.refcount())
            .finish()
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_util::{AlwaysFails, CountingAllocator};

    #[test]
    fn refcount_tracks_handles() {
        let counter = Arc::new(CountingAllocator::default());
        let storage = Storage::new(100, counter.clone()).unwrap();
        assert_eq!(storage.refcount(), 1);
        assert_eq!(storage.capacity(), 100);
        assert_eq!(counter.live(), 1);

        let other = storage.clone();
        assert_eq!(storage.refcount(), 2);
        assert!(storage.same_block(&other));
        assert_eq!(storage.as_ptr(), other.as_ptr());

        drop(storage);
        assert_eq!(other.refcount(), 1);
        assert_eq!(counter.live(), 1);

        drop(other);
        assert_eq!(counter.live(), 0);
        assert_eq!(counter.total(), 1);
    }

    #[test]
    fn blocks_are_zeroed_and_aligned() {
        let storage = Storage::new(37, crate::config::system_allocator()).unwrap();
        assert_eq!(storage.as_ptr().as_ptr() as usize % 64, 0);
        // SAFETY: The block is valid for `capacity()` bytes and nothing else aliases it.
        let bytes =
            unsafe { std::slice::from_raw_parts(storage.as_ptr().as_ptr(), storage.capacity()) };
        assert!(bytes.iter().all(|b| *b == 0));
    }

    #[test]
    fn allocation_failure() {
        let err = Storage::new(16, Arc::new(AlwaysFails)).unwrap_err();
        assert!(matches!(err, MatError::Allocation { bytes: 16, .. }));
    }
}
