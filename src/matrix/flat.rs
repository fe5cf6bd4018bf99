use std::fmt;

use crate::error::Result;
use crate::matrix::{Storage, StorageKind};
use crate::simd::utils::AlignedVec;

/// Row-major matrix backed by one 64-byte aligned allocation.
#[derive(Clone)]
pub struct FlatMatrix {
    dim: usize,
    data: AlignedVec,
}

impl FlatMatrix {
    /// The whole matrix as one row-major slice.
    #[inline(always)]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

// SAFETY: every row is a `dim`-long window of an owned allocation and
// `row_ptr` points at the same window as `row`.
unsafe impl Storage for FlatMatrix {
    fn zeros(dim: usize) -> Result<Self> {
        let len = dim.checked_mul(dim).unwrap_or(usize::MAX);
        let data = AlignedVec::zeroed_matrix(len)?;

        Ok(Self { dim, data })
    }

    #[inline(always)]
    fn dim(&self) -> usize {
        self.dim
    }

    #[inline(always)]
    fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    #[inline(always)]
    fn row_mut(&mut self, i: usize) -> &mut [f32] {
        let n = self.dim;
        &mut self.data[i * n..(i + 1) * n]
    }

    #[inline(always)]
    unsafe fn row_ptr(&self, i: usize) -> *const f32 {
        debug_assert!(i < self.dim, "row {i} out of bounds for dimension {}", self.dim);

        unsafe { self.data.as_ptr().add(i * self.dim) }
    }

    fn rows_mut(&mut self) -> Vec<&mut [f32]> {
        if self.dim == 0 {
            return Vec::new();
        }
        self.data.chunks_exact_mut(self.dim).collect()
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Flat
    }

    fn to_vec(&self) -> Vec<f32> {
        self.data.to_vec()
    }
}

impl PartialEq for FlatMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.dim == other.dim && self.as_slice() == other.as_slice()
    }
}

impl fmt::Debug for FlatMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatMatrix")
            .field("dim", &self.dim)
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_contiguous() {
        let m = FlatMatrix::from_fn(4, |i, j| (i * 4 + j) as f32).unwrap();

        assert_eq!(m.row(2), &[8.0, 9.0, 10.0, 11.0]);
        assert_eq!(unsafe { m.row_ptr(1) }, m.as_slice()[4..].as_ptr());
    }

    #[test]
    fn test_rows_mut_covers_every_row() {
        let mut m = FlatMatrix::zeros(3).unwrap();
        for (i, row) in m.rows_mut().into_iter().enumerate() {
            row.fill(i as f32);
        }
        assert_eq!(m.to_vec(), vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    #[should_panic]
    fn test_row_out_of_bounds_panics() {
        let m = FlatMatrix::zeros(4).unwrap();
        let _ = m.row(4);
    }

    #[test]
    fn test_dimension_overflow_is_error() {
        assert!(FlatMatrix::zeros(usize::MAX).is_err());
    }
}
