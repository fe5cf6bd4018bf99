//! Dense square matrix multiplication kernels.
//!
//! Every strategy computes `C[i][j] = sum_k A[i][k] * B[k][j]` and writes every
//! element of C, so C does not need to be zeroed by the caller. They differ only
//! in loop order, tiling and instruction selection:
//!
//! | Strategy | Loop nest | Inner update |
//! |---|---|---|
//! | `Naive` | i, j, k | scalar sum, one store per element |
//! | `Vectorized` | i, j (16), k | broadcast A, load B, FMA into one register |
//! | `Blocked` | ii, kk, jj, i, k, j (16) | load C, FMA, store C per k |
//! | `TwoLevel` | coarse ijk, fine ijk, i, j (32), k | two registers across the k run, prefetch |
//! | `RowPointer` | same as `TwoLevel` | k unrolled by two, four FMAs per step |
//! | `ParallelTwoLevel` | `TwoLevel` per coarse row band | rayon |
//!
//! The vectorized kernels are generic over [`SimdVec`] and instantiated inside
//! a `#[target_feature]` entry point per backend, so the intrinsics inline
//! into the loops.

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::matrix::Storage;
use crate::simd::utils::MATRIX_ALIGNMENT;
use crate::simd::{scalar, Backend, SimdVec};

mod blocked;
pub mod config;
mod naive;
mod parallel;
mod row_pointer;
mod two_level;
mod vectorized;

pub use config::{KernelConfig, Strategy};

/// A validated kernel, ready to multiply matrices of its configured dimension.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    config: KernelConfig,
    backend: Backend,
}

impl Kernel {
    /// Validates `config` and resolves the vector backend.
    ///
    /// # Errors
    ///
    /// See [`KernelConfig::validate`].
    pub fn new(config: KernelConfig) -> Result<Self> {
        config.validate()?;

        let backend = match config.strategy {
            Strategy::Naive => Backend::Scalar,
            _ => config.backend.unwrap_or_else(Backend::detect),
        };

        debug!(?config, %backend, "kernel configured");
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    /// The vector backend the kernel runs on (`Scalar` for the naive strategy).
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Computes `c = a * b`, overwriting every element of `c`.
    ///
    /// Operands may use different storage backends.
    ///
    /// # Errors
    ///
    /// * [`Error::DimensionMismatch`] if any operand is not `dim x dim`.
    /// * [`Error::RowLength`] if a [`Storage`] implementation hands out rows
    ///   that are not `dim` values long.
    /// * [`Error::Misaligned`] if a strategy using aligned vector access gets
    ///   an operand row that does not start on a 64-byte boundary.
    ///
    /// `c` is untouched when an error is returned.
    #[instrument(level = "debug", skip_all, fields(strategy = %self.config.strategy, dim = self.config.dim))]
    pub fn multiply<A, B, C>(&self, a: &A, b: &B, c: &mut C) -> Result<()>
    where
        A: Storage + ?Sized,
        B: Storage + ?Sized,
        C: Storage + ?Sized,
    {
        self.check_operand("A", a)?;
        self.check_operand("B", b)?;
        self.check_operand("C", &*c)?;

        let mut c_rows = c.rows_mut();
        check_row_set("C", &c_rows, self.config.dim)?;

        match self.config.strategy {
            Strategy::ParallelTwoLevel => {
                parallel::multiply(self.backend, &self.config, a, b, &mut c_rows)
            }
            _ => dispatch(self.backend, &self.config, a, b, &mut c_rows, 0),
        }

        Ok(())
    }

    fn check_operand<S: Storage + ?Sized>(&self, operand: &'static str, m: &S) -> Result<()> {
        if m.dim() != self.config.dim {
            return Err(Error::DimensionMismatch {
                operand,
                expected: self.config.dim,
                actual: m.dim(),
            });
        }

        for i in 0..m.dim() {
            let row = m.row(i);
            // SAFETY: `i < dim`.
            let ptr = unsafe { m.row_ptr(i) };
            if row.len() != m.dim() || ptr != row.as_ptr() {
                return Err(Error::RowLength {
                    operand,
                    row: i,
                    expected: m.dim(),
                    actual: row.len(),
                });
            }
        }

        if self.config.strategy.needs_alignment() {
            if let Some(row) = m.first_misaligned_row(MATRIX_ALIGNMENT) {
                return Err(Error::Misaligned {
                    operand,
                    row,
                    alignment: MATRIX_ALIGNMENT,
                });
            }
        }

        Ok(())
    }
}

/// Checks the mutable row views of an operand before any kernel writes through them.
fn check_row_set(operand: &'static str, rows: &[&mut [f32]], dim: usize) -> Result<()> {
    // A missing row reads as empty; a surplus row should not exist at all.
    let bad = (0..dim.max(rows.len()))
        .find(|&i| i >= dim || rows.get(i).map_or(true, |r| r.len() != dim));

    match bad {
        Some(row) => Err(Error::RowLength {
            operand,
            row,
            expected: if row < dim { dim } else { 0 },
            actual: rows.get(row).map_or(0, |r| r.len()),
        }),
        None => Ok(()),
    }
}

/// Computes `c = a * b` with the default parameters of `strategy`, sized to `a`.
///
/// ```
/// use tilemm::{multiply, FlatMatrix, Storage, Strategy};
///
/// let a = FlatMatrix::filled(64, 1.0).unwrap();
/// let b = FlatMatrix::filled(64, 1.0).unwrap();
/// let mut c = FlatMatrix::zeros(64).unwrap();
///
/// multiply(Strategy::TwoLevel, &a, &b, &mut c).unwrap();
/// assert!(c.to_vec().iter().all(|&x| x == 64.0));
/// ```
pub fn multiply<A, B, C>(strategy: Strategy, a: &A, b: &B, c: &mut C) -> Result<()>
where
    A: Storage + ?Sized,
    B: Storage + ?Sized,
    C: Storage + ?Sized,
{
    let config = KernelConfig::for_strategy(strategy).with_dim(a.dim());
    Kernel::new(config)?.multiply(a, b, c)
}

/// Runs the kernel of `config.strategy` over the C rows `row0..row0 + c.len()`.
///
/// `ParallelTwoLevel` bands are run with the sequential two-level kernel.
fn dispatch<A, B>(
    backend: Backend,
    config: &KernelConfig,
    a: &A,
    b: &B,
    c: &mut [&mut [f32]],
    row0: usize,
) where
    A: Storage + ?Sized,
    B: Storage + ?Sized,
{
    // SAFETY: `Kernel::new` only accepts backends the CPU supports, and
    // `Kernel::multiply` has checked dimensions and alignment.
    match backend {
        #[cfg(all(avx512, target_arch = "x86_64"))]
        Backend::Avx512 => unsafe { run_avx512(config, a, b, c, row0) },
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        Backend::Avx2 => unsafe { run_avx2(config, a, b, c, row0) },
        _ => unsafe { run::<scalar::F32x16, A, B>(config, a, b, c, row0) },
    }
}

#[cfg(all(avx512, target_arch = "x86_64"))]
#[target_feature(enable = "avx512f")]
unsafe fn run_avx512<A, B>(config: &KernelConfig, a: &A, b: &B, c: &mut [&mut [f32]], row0: usize)
where
    A: Storage + ?Sized,
    B: Storage + ?Sized,
{
    use crate::simd::avx512::f32x16::F32x16;
    unsafe { run::<F32x16, A, B>(config, a, b, c, row0) }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[target_feature(enable = "avx2,fma")]
unsafe fn run_avx2<A, B>(config: &KernelConfig, a: &A, b: &B, c: &mut [&mut [f32]], row0: usize)
where
    A: Storage + ?Sized,
    B: Storage + ?Sized,
{
    use crate::simd::avx2::f32x8x2::F32x8x2;
    unsafe { run::<F32x8x2, A, B>(config, a, b, c, row0) }
}

#[inline(always)]
unsafe fn run<V, A, B>(config: &KernelConfig, a: &A, b: &B, c: &mut [&mut [f32]], row0: usize)
where
    V: SimdVec,
    A: Storage + ?Sized,
    B: Storage + ?Sized,
{
    unsafe {
        match config.strategy {
            Strategy::Naive => naive::multiply(a, b, c, row0),
            Strategy::Vectorized => vectorized::multiply::<V, A, B>(a, b, c, row0),
            Strategy::Blocked => blocked::multiply::<V, A, B>(a, b, c, row0, config.block),
            Strategy::TwoLevel | Strategy::ParallelTwoLevel => {
                two_level::multiply::<V, A, B>(a, b, c, row0, config)
            }
            Strategy::RowPointer => row_pointer::multiply::<V, A, B>(a, b, c, row0, config),
        }
    }
}
