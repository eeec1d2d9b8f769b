/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::ptr::NonNull;

use super::{AllocatorCore, AllocatorError, GlobalAllocator};
use crate::num::PowerOfTwo;

/// An [`AllocatorCore`] that allocates memory aligned to at least a specified alignment.
///
/// This is the system default for array storage: a predictable base alignment lets every
/// element type be viewed in place and keeps rows friendly to vectorized consumers.
#[derive(Debug, Clone, Copy)]
pub struct AlignedAllocator {
    /// This represents a power of 2.
    alignment: u8,
}

impl AlignedAllocator {
    /// Construct a new allocator that uses the given alignment.
    #[inline]
    pub const fn new(alignment: PowerOfTwo) -> Self {
        Self {
            // CAST: `trailing_zeros` returns as most 63 (because we've removed 0), so
            // the conversion is always lossless.
            alignment: alignment.raw().trailing_zeros() as u8,
        }
    }

    #[inline]
    pub const fn alignment(&self) -> usize {
        1usize << (self.alignment as usize)
    }
}

// SAFETY: We are making the alignment potentially stricter before forwarding to the
// `GlobalAllocator`.
unsafe impl AllocatorCore for AlignedAllocator {
    #[inline]
    fn allocate(&self, layout: std::alloc::Layout) -> Result<NonNull<[u8]>, AllocatorError> {
        // Bump up the alignment.
        let layout = layout
            .align_to(self.alignment())
            .map_err(|_| AllocatorError)?;
        GlobalAllocator.allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<[u8]>, layout: std::alloc::Layout) {
        // Lint: The given `layout` **should** be the same as that passed to `allocate`,
        // which must have succeeded for the pointer to be valid in the first place.
        #[allow(clippy::expect_used)]
        let layout = layout
            .align_to(self.alignment())
            .expect("invalid layout provided");
        // SAFETY: `ptr` was produced by `GlobalAllocator` with exactly this layout.
        unsafe { GlobalAllocator.deallocate(ptr, layout) }
    }
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_allocator() {
        let powers_of_two = [1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096];
        for power in powers_of_two {
            let alloc = AlignedAllocator::new(PowerOfTwo::new(power).unwrap());
            assert_eq!(alloc.alignment(), power);

            // Deallocate even if an assertion below fails.
            struct Guard<'a> {
                ptr: NonNull<[u8]>,
                layout: std::alloc::Layout,
                allocator: &'a AlignedAllocator,
            }

            impl Drop for Guard<'_> {
                fn drop(&mut self) {
                    // SAFETY: The guard is built right after a successful allocation with
                    // this allocator and layout.
                    unsafe { self.allocator.deallocate(self.ptr, self.layout) }
                }
            }

            // Small requests with a weak base alignment still come back over-aligned.
            for bytes in [1, 3, 17, 100] {
                let layout = std::alloc::Layout::from_size_align(bytes, 1).unwrap();
                let ptr = alloc.allocate(layout).unwrap();
                let _guard = Guard {
                    ptr,
                    layout,
                    allocator: &alloc,
                };

                assert!(ptr.len() >= bytes);
                assert_eq!(
                    (ptr.cast::<u8>().as_ptr() as usize) % power,
                    0,
                    "ptr {:?} is not aligned to {}",
                    ptr,
                    power
                );
            }
        }
    }
}
