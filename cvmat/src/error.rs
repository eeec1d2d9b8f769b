/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use thiserror::Error;

use crate::{alloc::AllocatorError, types::MatType};

/// Recoverable failures of structural array operations.
///
/// Contract violations (out-of-range indices, typed access with the wrong element type)
/// are not represented here. They panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum MatError {
    #[error("failed to allocate {bytes} bytes")]
    Allocation {
        bytes: usize,
        #[source]
        source: AllocatorError,
    },
    #[error("extents {extents:?} with element size {elem_size} overflow the address space")]
    Overflow {
        extents: Vec<usize>,
        elem_size: usize,
    },
    #[error("rank {0} is not supported, expected 1 to 32 dimensions")]
    BadRank(usize),
    #[error("channel count {0} is not supported, expected 1 to 512")]
    BadChannels(usize),
    #[error("invalid type code {0}")]
    BadTypeCode(i32),
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: MatType, found: MatType },
    #[error("size mismatch: expected {expected:?}, found {found:?}")]
    SizeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("operation \"{0}\" requires a continuous array")]
    NotContinuous(&'static str),
    #[error("operation \"{0}\" requires the only header of the array's data")]
    Shared(&'static str),
    #[error("cannot reshape {from_total} scalars into {request}")]
    BadReshape { from_total: usize, request: String },
    #[error("mask must be 8-bit with 1 or {channels} channels and matching extents")]
    BadMask { channels: usize },
    #[error("steps {steps:?} are incompatible with extents {extents:?} and element size {elem_size}")]
    BadStep {
        steps: Vec<usize>,
        extents: Vec<usize>,
        elem_size: usize,
    },
    #[error("pointer is not aligned to {align} bytes")]
    Misaligned { align: usize },
    #[error("output is fixed to {fixed} and cannot hold {requested}")]
    FixedType { fixed: MatType, requested: MatType },
}

pub type Result<T> = std::result::Result<T, MatError>;
