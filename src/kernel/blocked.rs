use std::cmp::min;

use crate::matrix::Storage;
use crate::simd::SimdVec;

/// Single-level cache blocking.
///
/// The iteration space is cut into `block`-sized cubes, visited in `ii, kk, jj`
/// order and clipped to the matrix edge. Inside a cube, `A[i][k]` is broadcast
/// once per `(i, k)` and every 16-wide slice of `C[i]` is loaded, updated with
/// `B[k]` and stored again, so C is not held in registers across k.
///
/// The C rows are zeroed first.
///
/// # Safety
///
/// The dimension and `block` are multiples of `V::LANES`; every row of every
/// operand is 64-byte aligned; the CPU supports `V`.
#[inline(always)]
pub(super) unsafe fn multiply<V, A, B>(
    a: &A,
    b: &B,
    c: &mut [&mut [f32]],
    row0: usize,
    block: usize,
) where
    V: SimdVec,
    A: Storage + ?Sized,
    B: Storage + ?Sized,
{
    let n = a.dim();
    let row_end = row0 + c.len();
    debug_assert_eq!(n % V::LANES, 0);
    debug_assert_eq!(block % V::LANES, 0);

    for row in c.iter_mut() {
        row.fill(0.0);
    }

    for ii in (row0..row_end).step_by(block) {
        let i_end = min(ii + block, row_end);

        for kk in (0..n).step_by(block) {
            let k_end = min(kk + block, n);

            for jj in (0..n).step_by(block) {
                let j_end = min(jj + block, n);

                for i in ii..i_end {
                    let a_row = a.row(i);
                    let c_ptr = c[i - row0].as_mut_ptr();

                    for k in kk..k_end {
                        unsafe {
                            let a_ik = V::splat(a_row[k]);
                            let b_row = b.row_ptr(k);

                            for j in (jj..j_end).step_by(V::LANES) {
                                let c_ij = V::load_aligned(c_ptr.add(j));
                                let b_kj = V::load_aligned(b_row.add(j));
                                c_ij.fmadd(a_ik, b_kj).store_aligned(c_ptr.add(j));
                            }
                        }
                    }
                }
            }
        }
    }
}
