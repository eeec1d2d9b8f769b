/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Deferred array expressions.
//!
//! A [`MatExpr`] records an operation and its operands without computing anything. The
//! result type and extents are known up front; element data is produced only by
//! [`MatExpr::materialize`] or [`MatExpr::assign_to`].
//!
//! ```
//! use cvmat::{Mat, MatExpr, MatType};
//!
//! let a = Mat::from_shape_slice(&[2, 3], &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0])?;
//! let expr = a.t() * 2.0 + MatExpr::ones(&[3, 2], MatType::F32C1);
//! assert_eq!(expr.extents(), vec![3, 2]);
//!
//! let m = expr.materialize()?;
//! assert_eq!(m.row_slice::<f32>(0), &[3.0, 9.0]);
//! # Ok::<(), cvmat::MatError>(())
//! ```

use std::ops::{Add, Mul, Sub};

use crate::{
    array::OutputArray,
    error::{MatError, Result},
    mat::{for_each_line, Mat},
    saturate::{read_f64, write_f64},
    types::MatType,
};

/// Arrays that can be produced without an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initializer {
    Zeros,
    /// Channel 0 set to one.
    Ones,
    /// Ones on the main diagonal of a 2-d array.
    Eye,
}

/// A deferred array computation.
#[derive(Debug)]
pub struct MatExpr {
    node: Node,
}

#[derive(Debug)]
enum Node {
    Mat(Mat),
    Init {
        kind: Initializer,
        extents: Vec<usize>,
        ty: MatType,
    },
    Transpose(Box<MatExpr>),
    /// `alpha * a + beta * b + gamma`, per channel, saturated to the type of `a`.
    AddWeighted {
        a: Box<MatExpr>,
        alpha: f64,
        b: Option<(Box<MatExpr>, f64)>,
        gamma: f64,
    },
}

impl MatExpr {
    pub fn zeros(extents: &[usize], ty: MatType) -> Self {
        Self::init(Initializer::Zeros, extents.to_vec(), ty)
    }

    pub fn ones(extents: &[usize], ty: MatType) -> Self {
        Self::init(Initializer::Ones, extents.to_vec(), ty)
    }

    pub fn eye(rows: usize, cols: usize, ty: MatType) -> Self {
        Self::init(Initializer::Eye, vec![rows, cols], ty)
    }

    fn init(kind: Initializer, extents: Vec<usize>, ty: MatType) -> Self {
        Self {
            node: Node::Init { kind, extents, ty },
        }
    }

    /// Transpose a 2-d expression. Transposing twice cancels out.
    pub fn t(self) -> Self {
        match self.node {
            Node::Transpose(inner) => *inner,
            node => Self {
                node: Node::Transpose(Box::new(Self { node })),
            },
        }
    }

    /// Multiply every channel by `s`.
    pub fn scale(self, s: f64) -> Self {
        match self.node {
            Node::AddWeighted { a, alpha, b, gamma } => Self {
                node: Node::AddWeighted {
                    a,
                    alpha: alpha * s,
                    b: b.map(|(b, beta)| (b, beta * s)),
                    gamma: gamma * s,
                },
            },
            node => Self::weighted(Self { node }, s, None, 0.0),
        }
    }

    /// Element-wise sum with `other`, which must have the same extents and type.
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: MatExpr) -> Self {
        self.combine(other, 1.0)
    }

    /// Element-wise difference with `other`, which must have the same extents and type.
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: MatExpr) -> Self {
        self.combine(other, -1.0)
    }

    /// Add `gamma` to every channel.
    pub fn offset(self, g: f64) -> Self {
        match self.node {
            Node::AddWeighted { a, alpha, b, gamma } => Self {
                node: Node::AddWeighted {
                    a,
                    alpha,
                    b,
                    gamma: gamma + g,
                },
            },
            node => Self::weighted(Self { node }, 1.0, None, g),
        }
    }

    fn combine(self, other: MatExpr, beta: f64) -> Self {
        match self.node {
            Node::AddWeighted {
                a,
                alpha,
                b: None,
                gamma,
            } => Self::weighted(*a, alpha, Some((other, beta)), gamma),
            node => Self::weighted(Self { node }, 1.0, Some((other, beta)), 0.0),
        }
    }

    fn weighted(a: MatExpr, alpha: f64, b: Option<(MatExpr, f64)>, gamma: f64) -> Self {
        Self {
            node: Node::AddWeighted {
                a: Box::new(a),
                alpha,
                b: b.map(|(b, beta)| (Box::new(b), beta)),
                gamma,
            },
        }
    }

    /// Type of the result.
    pub fn mat_type(&self) -> MatType {
        match &self.node {
            Node::Mat(m) => m.mat_type(),
            Node::Init { ty, .. } => *ty,
            Node::Transpose(inner) => inner.mat_type(),
            Node::AddWeighted { a, .. } => a.mat_type(),
        }
    }

    /// Extents of the result.
    pub fn extents(&self) -> Vec<usize> {
        match &self.node {
            Node::Mat(m) => m.extents().to_vec(),
            Node::Init { extents, .. } => extents.clone(),
            Node::Transpose(inner) => {
                let mut extents = inner.extents();
                if extents.len() == 2 {
                    extents.swap(0, 1);
                }
                extents
            }
            Node::AddWeighted { a, .. } => a.extents(),
        }
    }

    /// Evaluate the expression into a new header.
    ///
    /// A bare operand evaluates to a shared header over the same data.
    pub fn materialize(&self) -> Result<Mat> {
        match &self.node {
            Node::Mat(m) => Ok(m.share()),
            Node::Init { kind, extents, ty } => match kind {
                Initializer::Zeros => Mat::zeros(extents, *ty),
                Initializer::Ones => Mat::ones(extents, *ty),
                Initializer::Eye => match extents[..] {
                    [rows, cols] => Mat::eye(rows, cols, *ty),
                    _ => Err(MatError::BadRank(extents.len())),
                },
            },
            Node::Transpose(inner) => transpose(&inner.materialize()?),
            Node::AddWeighted { a, alpha, b, gamma } => {
                let a = a.materialize()?;
                let b = match b {
                    Some((b, beta)) => Some((b.materialize()?, *beta)),
                    None => None,
                };
                add_weighted(&a, *alpha, b.as_ref().map(|(b, beta)| (b, *beta)), *gamma)
            }
        }
    }

    /// Evaluate the expression into `dst`.
    ///
    /// A destination with a fixed type receives the result converted to that depth.
    pub fn assign_to<O>(&self, dst: &mut O) -> Result<()>
    where
        O: OutputArray + ?Sized,
    {
        let m = self.materialize()?;
        match dst.fixed_type() {
            Some(fixed) if fixed.depth() != m.depth() => {
                m.convert_to(dst, Some(fixed.depth()), 1.0, 0.0)
            }
            _ => m.copy_to(dst),
        }
    }
}

impl From<Mat> for MatExpr {
    fn from(m: Mat) -> Self {
        Self { node: Node::Mat(m) }
    }
}

impl Mat {
    /// A deferred transpose of this 2-d array.
    pub fn t(&self) -> MatExpr {
        MatExpr::from(self.share()).t()
    }
}

impl Add for MatExpr {
    type Output = MatExpr;

    fn add(self, rhs: MatExpr) -> MatExpr {
        MatExpr::add(self, rhs)
    }
}

impl Sub for MatExpr {
    type Output = MatExpr;

    fn sub(self, rhs: MatExpr) -> MatExpr {
        MatExpr::sub(self, rhs)
    }
}

impl Add<f64> for MatExpr {
    type Output = MatExpr;

    fn add(self, rhs: f64) -> MatExpr {
        self.offset(rhs)
    }
}

impl Mul<f64> for MatExpr {
    type Output = MatExpr;

    fn mul(self, rhs: f64) -> MatExpr {
        self.scale(rhs)
    }
}

fn transpose(src: &Mat) -> Result<Mat> {
    let [rows, cols] = src.extents()[..] else {
        return Err(MatError::BadRank(src.dims()));
    };
    let mut dst = Mat::new(&[cols, rows], src.mat_type())?;
    if dst.empty() {
        return Ok(dst);
    }
    let esz = src.elem_size();
    for i in 0..rows {
        for j in 0..cols {
            let from = src.ptr(&[i, j]);
            let to = dst.ptr_mut(&[j, i]);
            // SAFETY: Both pointers address one in-bounds element of `esz` bytes, and
            // `dst` is a fresh block.
            unsafe { std::ptr::copy_nonoverlapping(from, to, esz) };
        }
    }
    Ok(dst)
}

fn add_weighted(a: &Mat, alpha: f64, b: Option<(&Mat, f64)>, gamma: f64) -> Result<Mat> {
    if let Some((b, _)) = b {
        if b.mat_type() != a.mat_type() {
            return Err(MatError::TypeMismatch {
                expected: a.mat_type(),
                found: b.mat_type(),
            });
        }
        if b.extents() != a.extents() {
            return Err(MatError::SizeMismatch {
                expected: a.extents().to_vec(),
                found: b.extents().to_vec(),
            });
        }
    }
    if b.is_none() && alpha == 1.0 && gamma == 0.0 {
        return Ok(a.share());
    }

    let ty = a.mat_type();
    let (depth, es1) = (ty.depth(), ty.elem_size1());
    let mut dst = Mat::new(a.extents(), ty)?;
    match b {
        None => for_each_line(&[a], &mut dst, |lines, out| {
            for (x, y) in lines[0].chunks_exact(es1).zip(out.chunks_exact_mut(es1)) {
                write_f64(depth, alpha * read_f64(depth, x) + gamma, y);
            }
        }),
        Some((b, beta)) => for_each_line(&[a, b], &mut dst, |lines, out| {
            let xs = lines[0].chunks_exact(es1).zip(lines[1].chunks_exact(es1));
            for ((x, z), y) in xs.zip(out.chunks_exact_mut(es1)) {
                let v = alpha * read_f64(depth, x) + beta * read_f64(depth, z) + gamma;
                write_f64(depth, v, y);
            }
        }),
    }
    Ok(dst)
}

///////////
// Tests //
///////////
