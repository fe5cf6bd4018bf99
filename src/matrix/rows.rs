use std::fmt;

use crate::error::Result;
use crate::matrix::{Storage, StorageKind};
use crate::simd::utils::AlignedVec;

/// Matrix stored as an array of independently allocated, 64-byte aligned rows.
///
/// Consecutive rows are not adjacent in memory; every access to a new row goes
/// through the row array.
#[derive(Clone)]
pub struct RowMatrix {
    dim: usize,
    rows: Vec<AlignedVec>,
}

// SAFETY: every row is a `dim`-long window of an owned allocation and
// `row_ptr` points at the same window as `row`.
unsafe impl Storage for RowMatrix {
    fn zeros(dim: usize) -> Result<Self> {
        // Rows allocated before a failure are released when `rows` is dropped.
        let rows = (0..dim)
            .map(|_| AlignedVec::zeroed_matrix(dim))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { dim, rows })
    }

    #[inline(always)]
    fn dim(&self) -> usize {
        self.dim
    }

    #[inline(always)]
    fn row(&self, i: usize) -> &[f32] {
        &self.rows[i]
    }

    #[inline(always)]
    fn row_mut(&mut self, i: usize) -> &mut [f32] {
        &mut self.rows[i]
    }

    #[inline(always)]
    unsafe fn row_ptr(&self, i: usize) -> *const f32 {
        debug_assert!(i < self.dim, "row {i} out of bounds for dimension {}", self.dim);

        unsafe { self.rows.get_unchecked(i).as_ptr() }
    }

    fn rows_mut(&mut self) -> Vec<&mut [f32]> {
        self.rows.iter_mut().map(|row| &mut row[..]).collect()
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Rows
    }
}

impl PartialEq for RowMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.dim == other.dim && self.rows.iter().zip(&other.rows).all(|(a, b)| a[..] == b[..])
    }
}

impl fmt::Debug for RowMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowMatrix")
            .field("dim", &self.dim)
            .field("rows", &self.rows.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::utils::{is_aligned_to, MATRIX_ALIGNMENT};

    #[test]
    fn test_every_row_is_aligned_for_any_dim() {
        for dim in [1, 3, 17, 33] {
            let m = RowMatrix::zeros(dim).unwrap();
            for i in 0..dim {
                assert_eq!(m.row(i).len(), dim);
                assert!(is_aligned_to(m.row(i).as_ptr(), MATRIX_ALIGNMENT));
            }
        }
    }

    #[test]
    fn test_set_get_and_equality() {
        let mut a = RowMatrix::zeros(4).unwrap();
        let mut b = RowMatrix::zeros(4).unwrap();
        a.set(2, 3, 7.0);
        assert_ne!(a, b);
        b.set(2, 3, 7.0);
        assert_eq!(a, b);
        assert_eq!(a.get(2, 3), 7.0);
    }

    #[test]
    fn test_row_ptr_matches_row() {
        let m = RowMatrix::identity(8).unwrap();
        for i in 0..8 {
            assert_eq!(unsafe { m.row_ptr(i) }, m.row(i).as_ptr());
        }
    }
}
