/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Pluggable allocation strategies for array storage.
//!
//! Storage blocks never call the Rust allocator directly. They go through an
//! [`AllocatorCore`] implementation held in a [`SharedAllocator`], which is either the
//! allocator attached to a header with [`crate::Mat::set_allocator`] or the process-wide
//! default from [`crate::config::default_allocator`].

use std::{alloc::Layout, ptr::NonNull};

mod aligned;
mod traits;

pub use aligned::AlignedAllocator;
pub use traits::{AllocatorCore, AllocatorError, MatAllocator, SharedAllocator};

/// A handle to Rust's global allocator. This type does not support allocations of size 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalAllocator;

// SAFETY: This is a simple wrapper around Rust's built-in allocation and deallocation
// methods. Zero sized layouts are rejected.
//
// The returned slice from `allocate` always has the exact size and alignment as `layout`.
unsafe impl AllocatorCore for GlobalAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocatorError> {
        if layout.size() == 0 {
            return Err(AllocatorError);
        }

        // SAFETY: `layout` has a non-zero size.
        let ptr = unsafe { std::alloc::alloc(layout) };
        let ptr = std::ptr::slice_from_raw_parts_mut(ptr, layout.size());
        NonNull::new(ptr).ok_or(AllocatorError)
    }

    unsafe fn deallocate(&self, ptr: NonNull<[u8]>, layout: Layout) {
        // SAFETY: The caller has the responsibility to ensure that `ptr` and `layout`
        // came from a previous allocation.
        unsafe { std::alloc::dealloc(ptr.as_ptr().cast::<u8>(), layout) }
    }
}

///////////////
// Try Clone //
///////////////

/// A trait like [`Clone`] that allows graceful allocation failure.
pub trait TryClone: Sized {
    /// Returns a deep copy of the value.
    fn try_clone(&self) -> crate::Result<Self>;
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;

    fn test_alloc<T>() {
        let alloc = GlobalAllocator;

        let layout = Layout::new::<T>();
        let ptr = alloc.allocate(layout).unwrap();

        assert_eq!(ptr.len(), layout.size());
        assert_eq!(ptr.len(), std::mem::size_of::<T>());
        assert_eq!((ptr.as_ptr().cast::<u8>() as usize) % layout.align(), 0);

        // SAFETY: `ptr` was obtained from this allocator with the specified `layout`.
        unsafe { alloc.deallocate(ptr, layout) };
    }

    #[test]
    fn test_global_allocator() {
        assert!(GlobalAllocator.allocate(Layout::new::<()>()).is_err());

        test_alloc::<u8>();
        test_alloc::<[u8; 3]>();
        test_alloc::<u16>();
        test_alloc::<[i16; 3]>();
        test_alloc::<f32>();
        test_alloc::<[f32; 4]>();
        test_alloc::<f64>();
        test_alloc::<[f64; 2]>();
    }

    #[test]
    fn shared_allocator_is_object_safe() {
        let shared: SharedAllocator = std::sync::Arc::new(GlobalAllocator);
        let layout = Layout::from_size_align(32, 8).unwrap();
        let ptr = shared.allocate(layout).unwrap();
        assert_eq!(ptr.len(), 32);
        // SAFETY: `ptr` was obtained from `shared` with `layout`.
        unsafe { shared.deallocate(ptr, layout) };
        assert!(format!("{:?}", shared).contains("GlobalAllocator"));
    }
}
