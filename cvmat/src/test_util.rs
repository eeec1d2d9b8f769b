/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Allocators and logging helpers shared by the unit tests.

use std::{
    alloc::Layout,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

use crate::alloc::{AllocatorCore, AllocatorError, GlobalAllocator};

/// Install a thread-local subscriber that writes through the test harness.
pub(crate) fn init_test_subscriber() -> tracing::subscriber::DefaultGuard {
    let fmt_layer = fmt::layer().with_target(true).with_test_writer();

    let filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .set_default()
}

/// An allocator that always fails.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AlwaysFails;

// SAFETY: `allocate` never succeeds.
unsafe impl AllocatorCore for AlwaysFails {
    fn allocate(&self, _layout: Layout) -> Result<NonNull<[u8]>, AllocatorError> {
        Err(AllocatorError)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<[u8]>, _layout: Layout) {}
}

/// An allocator that refuses requests larger than `max_bytes`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LimitedAllocator {
    pub(crate) max_bytes: usize,
}

// SAFETY: Forwards to `GlobalAllocator`.
unsafe impl AllocatorCore for LimitedAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocatorError> {
        if layout.size() > self.max_bytes {
            Err(AllocatorError)
        } else {
            GlobalAllocator.allocate(layout)
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<[u8]>, layout: Layout) {
        // SAFETY: Inherited from caller.
        unsafe { GlobalAllocator.deallocate(ptr, layout) }
    }
}

/// An allocator that counts live and total allocations.
#[derive(Debug, Default)]
pub(crate) struct CountingAllocator {
    live: AtomicUsize,
    total: AtomicUsize,
}

impl CountingAllocator {
    /// Number of blocks allocated and not yet freed.
    pub(crate) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Number of successful allocations.
    pub(crate) fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

// SAFETY: Forwards to `GlobalAllocator`.
unsafe impl AllocatorCore for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocatorError> {
        let ptr = GlobalAllocator.allocate(layout)?;
        self.live.fetch_add(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<[u8]>, layout: Layout) {
        let previous = self.live.fetch_sub(1, Ordering::SeqCst);
        assert_ne!(previous, 0, "block freed more than once");
        // SAFETY: Inherited from caller.
        unsafe { GlobalAllocator.deallocate(ptr, layout) }
    }
}
