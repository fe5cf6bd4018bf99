use crate::matrix::Storage;
use crate::simd::SimdVec;

/// Unblocked vector kernel.
///
/// For every row i and every 16-wide column tile `j..j + 16` of C, one
/// accumulator runs over the full reduction: `A[i][k]` is broadcast and
/// multiplied with the tile `B[k][j..j + 16]`. The tile is stored once at the
/// end. Loads and stores are unaligned.
///
/// # Safety
///
/// The dimension is a multiple of `V::LANES`; all operands are `n x n`; the
/// CPU supports `V`.
#[inline(always)]
pub(super) unsafe fn multiply<V, A, B>(a: &A, b: &B, c: &mut [&mut [f32]], row0: usize)
where
    V: SimdVec,
    A: Storage + ?Sized,
    B: Storage + ?Sized,
{
    let n = a.dim();
    debug_assert_eq!(n % V::LANES, 0);

    for (r, c_row) in c.iter_mut().enumerate() {
        debug_assert_eq!(c_row.len(), n);

        let a_row = a.row(row0 + r);
        let c_ptr = c_row.as_mut_ptr();

        for j in (0..n).step_by(V::LANES) {
            unsafe {
                let mut acc = V::zero();
                for (k, &a_ik) in a_row.iter().enumerate() {
                    let b_kj = V::load_unaligned(b.row_ptr(k).add(j));
                    acc = acc.fmadd(V::splat(a_ik), b_kj);
                }
                acc.store_unaligned(c_ptr.add(j));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{FlatMatrix, RowMatrix};
    use crate::simd::scalar::F32x16;

    #[test]
    fn test_matches_naive_on_scalar_backend() {
        let a = FlatMatrix::from_fn(32, |i, j| ((i * 7 + j * 3) % 11) as f32).unwrap();
        let b = RowMatrix::from_fn(32, |i, j| ((i + 2 * j) % 5) as f32 - 2.0).unwrap();

        let mut expected = FlatMatrix::zeros(32).unwrap();
        super::super::naive::multiply(&a, &b, &mut expected.rows_mut(), 0);

        let mut c = FlatMatrix::zeros(32).unwrap();
        unsafe { multiply::<F32x16, _, _>(&a, &b, &mut c.rows_mut(), 0) };

        // Small integers: every partial sum is exact, so the orders agree bit for bit.
        assert_eq!(c, expected);
    }
}
