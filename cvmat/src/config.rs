/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Library constants and the process-wide default allocator.
//!
//! Headers without an attached allocator obtain storage from [`default_allocator`]. The
//! initial default is [`system_allocator`]. Replacing the default only affects future
//! allocations: existing blocks are always returned to the allocator that produced them.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::alloc::{AlignedAllocator, SharedAllocator};

pub mod defaults {
    use crate::num::PowerOfTwo;

    /// Base alignment of every block produced by the system allocator.
    pub const ALIGNMENT: PowerOfTwo = match PowerOfTwo::new(64) {
        Ok(v) => v,
        Err(_) => panic!("64 is a power of two"),
    };

    /// Growth operations never allocate blocks smaller than this.
    pub const MIN_RESERVE_BYTES: usize = 64;

    /// Maximum array rank.
    pub const MAX_DIMS: usize = 32;

    /// Maximum channels per element.
    pub const MAX_CHANNELS: usize = 512;
}

static SYSTEM: LazyLock<SharedAllocator> =
    LazyLock::new(|| Arc::new(AlignedAllocator::new(defaults::ALIGNMENT)));

static DEFAULT: LazyLock<RwLock<SharedAllocator>> =
    LazyLock::new(|| RwLock::new(system_allocator()));

/// The built-in allocator: the global heap with [`defaults::ALIGNMENT`] alignment.
///
/// Every call returns a handle to the same instance.
pub fn system_allocator() -> SharedAllocator {
    SYSTEM.clone()
}

/// The allocator used by headers that have none attached.
pub fn default_allocator() -> SharedAllocator {
    DEFAULT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the process-wide default allocator, returning the previous one.
pub fn set_default_allocator(allocator: SharedAllocator) -> SharedAllocator {
    let mut guard = DEFAULT.write().unwrap_or_else(PoisonError::into_inner);
    tracing::debug!(new = ?allocator, "replacing default allocator");
    std::mem::replace(&mut *guard, allocator)
}

/// Restore [`system_allocator`] as the default, returning the previous one.
pub fn reset_default_allocator() -> SharedAllocator {
    set_default_allocator(system_allocator())
}
