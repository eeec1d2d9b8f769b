/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

#![allow(dead_code)]

use std::{
    alloc::Layout,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use cvmat::{
    alloc::{AllocatorCore, AllocatorError, GlobalAllocator},
    Mat, MatType,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

pub fn init_test_subscriber() -> tracing::subscriber::DefaultGuard {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer())
        .set_default()
}

/// Counts live blocks so tests can check that every block is freed exactly once.
#[derive(Debug, Default)]
pub struct CountingAllocator {
    live: AtomicUsize,
    total: AtomicUsize,
}

impl CountingAllocator {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
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

/// A `rows x cols` single-channel `i32` array filled with seeded random values.
pub fn random_i32(rng: &mut StdRng, rows: usize, cols: usize) -> Mat {
    let data: Vec<i32> = (0..rows * cols).map(|_| rng.random()).collect();
    let m = Mat::from_shape_slice(&[rows, cols], &data).unwrap();
    assert_eq!(m.mat_type(), MatType::S32C1);
    m
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed_cafe)
}
