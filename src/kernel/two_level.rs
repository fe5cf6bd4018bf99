use std::cmp::min;
use std::ops::Range;

use crate::kernel::KernelConfig;
use crate::matrix::Storage;
use crate::simd::SimdVec;

/// One fine (L1-sized) block of the iteration space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Tile {
    pub i: Range<usize>,
    pub j: Range<usize>,
    pub k: Range<usize>,
}

/// Visits the fine blocks of rows `rows` in coarse-then-fine `i, j, k` order.
///
/// Coarse blocks start at `rows.start` along i and at 0 along j and k; both
/// levels are clipped to the matrix edge, so `n` needs not be a multiple of
/// either block size.
#[inline(always)]
pub(super) fn for_each_tile<F>(n: usize, rows: Range<usize>, coarse: usize, fine: usize, mut f: F)
where
    F: FnMut(Tile),
{
    for l2_i in (rows.start..rows.end).step_by(coarse) {
        let l2_i_end = min(l2_i + coarse, rows.end);

        for l2_j in (0..n).step_by(coarse) {
            let l2_j_end = min(l2_j + coarse, n);

            for l2_k in (0..n).step_by(coarse) {
                let l2_k_end = min(l2_k + coarse, n);

                for l1_i in (l2_i..l2_i_end).step_by(fine) {
                    for l1_j in (l2_j..l2_j_end).step_by(fine) {
                        for l1_k in (l2_k..l2_k_end).step_by(fine) {
                            f(Tile {
                                i: l1_i..min(l1_i + fine, l2_i_end),
                                j: l1_j..min(l1_j + fine, l2_j_end),
                                k: l1_k..min(l1_k + fine, l2_k_end),
                            });
                        }
                    }
                }
            }
        }
    }
}

/// Two-level blocking with register accumulation and software prefetch.
///
/// Within a fine block, each row i of C is processed 32 columns at a time: the
/// two 16-wide accumulators are loaded from C once, updated with two FMAs per k
/// over the block's whole k range, and stored once. A trailing 16-column strip
/// uses a single accumulator.
///
/// With a prefetch distance `d`, `A[i][k + d]`, `B[k + d][j]` and
/// `B[k + d][j + 16]` are prefetched while `k + d` is still inside the fine
/// block's k range.
///
/// The C rows are zeroed first.
///
/// # Safety
///
/// The dimension and the block sizes are multiples of `V::LANES`; every row of
/// every operand is 64-byte aligned; the CPU supports `V`.
#[inline(always)]
pub(super) unsafe fn multiply<V, A, B>(
    a: &A,
    b: &B,
    c: &mut [&mut [f32]],
    row0: usize,
    config: &KernelConfig,
) where
    V: SimdVec,
    A: Storage + ?Sized,
    B: Storage + ?Sized,
{
    let n = a.dim();
    let lanes = V::LANES;
    let rows = row0..row0 + c.len();
    debug_assert_eq!(n % lanes, 0);

    for row in c.iter_mut() {
        row.fill(0.0);
    }

    for_each_tile(n, rows, config.coarse_block, config.fine_block, |tile| {
        let Tile { i: i_range, j: j_range, k: k_range } = tile;

        for i in i_range {
            unsafe {
                let a_row = a.row_ptr(i);
                let c_ptr = c[i - row0].as_mut_ptr();

                let mut j = j_range.start;
                while j + 2 * lanes <= j_range.end {
                    let mut c0 = V::load_aligned(c_ptr.add(j));
                    let mut c1 = V::load_aligned(c_ptr.add(j + lanes));

                    for k in k_range.clone() {
                        if let Some(d) = config.prefetch_distance {
                            if k + d < k_range.end {
                                V::prefetch(a_row.add(k + d));
                                V::prefetch(b.row_ptr(k + d).add(j));
                                V::prefetch(b.row_ptr(k + d).add(j + lanes));
                            }
                        }

                        let a_ik = V::splat(*a_row.add(k));
                        let b_row = b.row_ptr(k);
                        c0 = c0.fmadd(a_ik, V::load_aligned(b_row.add(j)));
                        c1 = c1.fmadd(a_ik, V::load_aligned(b_row.add(j + lanes)));
                    }

                    c0.store_aligned(c_ptr.add(j));
                    c1.store_aligned(c_ptr.add(j + lanes));
                    j += 2 * lanes;
                }

                if j < j_range.end {
                    let mut c0 = V::load_aligned(c_ptr.add(j));
                    for k in k_range.clone() {
                        let a_ik = V::splat(*a_row.add(k));
                        c0 = c0.fmadd(a_ik, V::load_aligned(b.row_ptr(k).add(j)));
                    }
                    c0.store_aligned(c_ptr.add(j));
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Strategy;
    use crate::matrix::{max_abs_diff, FlatMatrix, RowMatrix};
    use crate::simd::scalar::F32x16;

    fn collect_tiles(n: usize, rows: Range<usize>, coarse: usize, fine: usize) -> Vec<Tile> {
        let mut tiles = Vec::new();
        for_each_tile(n, rows, coarse, fine, |t| tiles.push(t));
        tiles
    }

    #[test]
    fn test_tiles_cover_iteration_space_once() {
        let n = 96;
        let mut hits = vec![0u32; n * n * n];

        for tile in collect_tiles(n, 0..n, 64, 32) {
            for i in tile.i.clone() {
                for j in tile.j.clone() {
                    for k in tile.k.clone() {
                        hits[(i * n + j) * n + k] += 1;
                    }
                }
            }
        }

        assert!(hits.iter().all(|&h| h == 1));
    }

    #[test]
    fn test_single_tile_when_matrix_fits_fine_block() {
        let tiles = collect_tiles(64, 0..64, 512, 64);
        assert_eq!(
            tiles,
            vec![Tile {
                i: 0..64,
                j: 0..64,
                k: 0..64
            }]
        );
    }

    #[test]
    fn test_tiles_respect_row_band() {
        let tiles = collect_tiles(64, 32..48, 32, 16);
        assert!(tiles.iter().all(|t| t.i.start >= 32 && t.i.end <= 48));
        assert_eq!(tiles.len(), 4 * 4);
    }

    #[test]
    fn test_trailing_16_column_strip() {
        // Fine block 48: every j range ends with a 16-wide strip after one 32-wide step.
        let config = KernelConfig::for_strategy(Strategy::TwoLevel)
            .with_dim(96)
            .with_blocks(96, 48)
            .with_prefetch(Some(8));
        let a = RowMatrix::from_fn(96, |i, j| ((3 * i + j) % 4) as f32).unwrap();
        let b = FlatMatrix::from_fn(96, |i, j| ((i + 5 * j) % 3) as f32 - 1.0).unwrap();

        let mut expected = FlatMatrix::zeros(96).unwrap();
        super::super::naive::multiply(&a, &b, &mut expected.rows_mut(), 0);

        let mut c = FlatMatrix::filled(96, 9.0).unwrap();
        unsafe { multiply::<F32x16, _, _>(&a, &b, &mut c.rows_mut(), 0, &config) };

        assert_eq!(max_abs_diff(&c, &expected), 0.0);
    }
}
