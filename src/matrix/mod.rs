//! Square, dense `f32` matrices.
//!
//! Two storage backends share one abstraction, [`Storage`]:
//!
//! - [`FlatMatrix`]: a single contiguous row-major buffer.
//! - [`RowMatrix`]: an array of independently allocated rows.
//!
//! Every row of either backend starts on a 64-byte boundary (for the flat
//! backend this holds whenever the dimension is a multiple of 16), so the
//! kernels can use aligned vector loads. The kernels are written once against
//! `Storage` and accept any mix of backends.

use rand::Rng;

use crate::error::Result;
use crate::simd::utils::{is_aligned_to, MATRIX_ALIGNMENT};

pub mod flat;
pub mod rows;

pub use flat::FlatMatrix;
pub use rows::RowMatrix;

/// Which storage backend to allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StorageKind {
    /// One contiguous buffer.
    #[default]
    Flat,
    /// One allocation per row, addressed through an array of rows.
    Rows,
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKind::Flat => f.write_str("flat"),
            StorageKind::Rows => f.write_str("rows"),
        }
    }
}

/// A square `dim x dim` matrix of `f32` values addressed by rows.
///
/// # Safety
///
/// The vector kernels read and write through raw row pointers, so an
/// implementation must uphold, for as long as it is not mutated:
///
/// * `row(i)` and `row_mut(i)` are exactly `dim()` values long for every
///   `i < dim()`, and `row_ptr(i) == row(i).as_ptr()`.
/// * `rows_mut()` returns `dim()` disjoint rows, row `i` covering the same
///   values as `row_mut(i)`.
/// * `dim()` does not change between calls.
///
/// [`Kernel::multiply`](crate::Kernel::multiply) still rejects row lengths
/// that disagree with `dim()`, but cannot detect every violation.
pub unsafe trait Storage: Send + Sync {
    /// Allocates a zero-filled `dim x dim` matrix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if any buffer
    /// cannot be obtained; nothing is leaked in that case.
    fn zeros(dim: usize) -> Result<Self>
    where
        Self: Sized;

    /// Number of rows (and columns).
    fn dim(&self) -> usize;

    /// Row `i` as a slice of `dim` values.
    ///
    /// # Panics
    ///
    /// Panics if `i >= dim`.
    fn row(&self, i: usize) -> &[f32];

    /// Row `i` as a mutable slice of `dim` values.
    ///
    /// # Panics
    ///
    /// Panics if `i >= dim`.
    fn row_mut(&mut self, i: usize) -> &mut [f32];

    /// Pointer to the first element of row `i`.
    ///
    /// # Safety
    ///
    /// `i` must be less than `dim`. Only checked in debug builds.
    unsafe fn row_ptr(&self, i: usize) -> *const f32;

    /// Every row as a disjoint mutable slice, in order.
    fn rows_mut(&mut self) -> Vec<&mut [f32]>;

    /// Which backend this is.
    fn kind(&self) -> StorageKind;

    /// Returns the first row that does not start on `align` bytes, if any.
    fn first_misaligned_row(&self, align: usize) -> Option<usize> {
        (0..self.dim()).find(|&i| !is_aligned_to(self.row(i).as_ptr(), align))
    }

    /// Whether every row is aligned for 512-bit vector loads.
    fn is_aligned(&self) -> bool {
        self.first_misaligned_row(MATRIX_ALIGNMENT).is_none()
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> f32 {
        self.row(i)[j]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f32) {
        self.row_mut(i)[j] = value;
    }

    /// Sets every element to `value`.
    fn fill(&mut self, value: f32) {
        for row in self.rows_mut() {
            row.fill(value);
        }
    }

    /// Row-major copy of the whole matrix.
    fn to_vec(&self) -> Vec<f32> {
        let n = self.dim();
        let mut out = Vec::with_capacity(n * n);
        for i in 0..n {
            out.extend_from_slice(self.row(i));
        }
        out
    }

    /// A matrix with every element equal to `value`.
    fn filled(dim: usize, value: f32) -> Result<Self>
    where
        Self: Sized,
    {
        let mut m = Self::zeros(dim)?;
        m.fill(value);
        Ok(m)
    }

    /// The `dim x dim` identity matrix.
    fn identity(dim: usize) -> Result<Self>
    where
        Self: Sized,
    {
        let mut m = Self::zeros(dim)?;
        for i in 0..dim {
            m.set(i, i, 1.0);
        }
        Ok(m)
    }

    /// A matrix whose element `(i, j)` is `f(i, j)`.
    fn from_fn<F>(dim: usize, mut f: F) -> Result<Self>
    where
        Self: Sized,
        F: FnMut(usize, usize) -> f32,
    {
        let mut m = Self::zeros(dim)?;
        for (i, row) in m.rows_mut().into_iter().enumerate() {
            for (j, x) in row.iter_mut().enumerate() {
                *x = f(i, j);
            }
        }
        Ok(m)
    }

    /// A matrix filled with uniform values in `[0, 10)`, the benchmark input range.
    fn random<R: Rng>(dim: usize, rng: &mut R) -> Result<Self>
    where
        Self: Sized,
    {
        Self::from_fn(dim, |_, _| rng.random_range(0.0..10.0))
    }

    /// Copies any other storage into this backend.
    fn from_storage<S: Storage + ?Sized>(other: &S) -> Result<Self>
    where
        Self: Sized,
    {
        let mut m = Self::zeros(other.dim())?;
        for (i, row) in m.rows_mut().into_iter().enumerate() {
            row.copy_from_slice(other.row(i));
        }
        Ok(m)
    }
}

/// Largest absolute element-wise difference between two matrices of equal dimension.
///
/// # Panics
///
/// Panics if the dimensions differ.
pub fn max_abs_diff<A: Storage + ?Sized, B: Storage + ?Sized>(a: &A, b: &B) -> f32 {
    assert_eq!(a.dim(), b.dim(), "matrices must have the same dimension");

    (0..a.dim())
        .flat_map(|i| a.row(i).iter().zip(b.row(i)).map(|(x, y)| (x - y).abs()))
        .fold(0.0, f32::max)
}
