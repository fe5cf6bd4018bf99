use crate::kernel::two_level::{for_each_tile, Tile};
use crate::kernel::KernelConfig;
use crate::matrix::Storage;
use crate::simd::SimdVec;

/// Two-level blocking with the k loop unrolled by two.
///
/// Same tiles and 32-column register pairs as the two-level kernel, but rows
/// `k` and `k + 1` of B are consumed per step: two broadcasts of A feed four
/// FMAs. The row base pointers of A and B are taken once per row, which suits
/// [`RowMatrix`] operands.
///
/// Prefetching only happens when a distance is configured (off by default).
///
/// # Safety
///
/// As for the two-level kernel.
///
/// [`RowMatrix`]: crate::RowMatrix
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
    debug_assert_eq!(n % V::LANES, 0);

    for row in c.iter_mut() {
        row.fill(0.0);
    }

    let rows = row0..row0 + c.len();
    for_each_tile(n, rows, config.coarse_block, config.fine_block, |tile| unsafe {
        multiply_tile::<V, A, B>(a, b, c, row0, tile, config.prefetch_distance)
    });
}

/// Accumulates one fine tile into C.
///
/// Validated block sizes make every k range even; an odd range (reachable only
/// by calling this directly) ends with one single-row step.
///
/// # Safety
///
/// As for [`multiply`]; `tile.j` bounds are multiples of `V::LANES`.
#[inline(always)]
unsafe fn multiply_tile<V, A, B>(
    a: &A,
    b: &B,
    c: &mut [&mut [f32]],
    row0: usize,
    tile: Tile,
    prefetch_distance: Option<usize>,
) where
    V: SimdVec,
    A: Storage + ?Sized,
    B: Storage + ?Sized,
{
    let lanes = V::LANES;
    let Tile { i: i_range, j: j_range, k: k_range } = tile;
    let k_end = k_range.end;

    for i in i_range {
        unsafe {
            let a_row = a.row_ptr(i);
            let c_ptr = c[i - row0].as_mut_ptr();

            let mut j = j_range.start;
            while j + 2 * lanes <= j_range.end {
                let mut c0 = V::load_aligned(c_ptr.add(j));
                let mut c1 = V::load_aligned(c_ptr.add(j + lanes));

                let mut k = k_range.start;
                while k + 1 < k_end {
                    if let Some(d) = prefetch_distance {
                        if k + d < k_end {
                            V::prefetch(a_row.add(k + d));
                            V::prefetch(b.row_ptr(k + d).add(j));
                            V::prefetch(b.row_ptr(k + d).add(j + lanes));
                        }
                    }

                    let b0 = b.row_ptr(k);
                    let b1 = b.row_ptr(k + 1);
                    let a0 = V::splat(*a_row.add(k));
                    let a1 = V::splat(*a_row.add(k + 1));

                    c0 = c0.fmadd(a0, V::load_aligned(b0.add(j)));
                    c1 = c1.fmadd(a0, V::load_aligned(b0.add(j + lanes)));
                    c0 = c0.fmadd(a1, V::load_aligned(b1.add(j)));
                    c1 = c1.fmadd(a1, V::load_aligned(b1.add(j + lanes)));
                    k += 2;
                }

                if k < k_end {
                    let b0 = b.row_ptr(k);
                    let a0 = V::splat(*a_row.add(k));
                    c0 = c0.fmadd(a0, V::load_aligned(b0.add(j)));
                    c1 = c1.fmadd(a0, V::load_aligned(b0.add(j + lanes)));
                }

                c0.store_aligned(c_ptr.add(j));
                c1.store_aligned(c_ptr.add(j + lanes));
                j += 2 * lanes;
            }

            if j < j_range.end {
                let mut c0 = V::load_aligned(c_ptr.add(j));

                let mut k = k_range.start;
                while k + 1 < k_end {
                    let a0 = V::splat(*a_row.add(k));
                    let a1 = V::splat(*a_row.add(k + 1));
                    c0 = c0.fmadd(a0, V::load_aligned(b.row_ptr(k).add(j)));
                    c0 = c0.fmadd(a1, V::load_aligned(b.row_ptr(k + 1).add(j)));
                    k += 2;
                }
                if k < k_end {
                    let a0 = V::splat(*a_row.add(k));
                    c0 = c0.fmadd(a0, V::load_aligned(b.row_ptr(k).add(j)));
                }

                c0.store_aligned(c_ptr.add(j));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Strategy;
    use crate::matrix::{max_abs_diff, FlatMatrix, RowMatrix};
    use crate::simd::scalar::F32x16;

    fn check(dim: usize, coarse: usize, fine: usize, prefetch: Option<usize>) {
        let config = KernelConfig::for_strategy(Strategy::RowPointer)
            .with_dim(dim)
            .with_blocks(coarse, fine)
            .with_prefetch(prefetch);
        let a = RowMatrix::from_fn(dim, |i, j| ((i + 2 * j) % 5) as f32).unwrap();
        let b = RowMatrix::from_fn(dim, |i, j| ((7 * i + j) % 3) as f32).unwrap();

        let mut expected = RowMatrix::zeros(dim).unwrap();
        super::super::naive::multiply(&a, &b, &mut expected.rows_mut(), 0);

        let mut c = RowMatrix::filled(dim, f32::NAN).unwrap();
        unsafe { multiply::<F32x16, _, _>(&a, &b, &mut c.rows_mut(), 0, &config) };

        assert_eq!(max_abs_diff(&c, &expected), 0.0, "dim {dim} fine {fine}");
    }

    #[test]
    fn test_even_k_ranges() {
        check(64, 64, 32, None);
    }

    #[test]
    fn test_last_k_pair_is_consumed() {
        // Only k = 15 contributes: it is the second row of the final unrolled pair.
        let config = KernelConfig::for_strategy(Strategy::RowPointer).with_dim(16);
        let a = FlatMatrix::from_fn(16, |_, j| if j == 15 { 2.0 } else { 0.0 }).unwrap();
        let b = FlatMatrix::from_fn(16, |i, j| if i == 15 { j as f32 } else { 0.0 }).unwrap();
        let mut c = FlatMatrix::zeros(16).unwrap();

        unsafe { multiply::<F32x16, _, _>(&a, &b, &mut c.rows_mut(), 0, &config) };

        for i in 0..16 {
            for j in 0..16 {
                assert_eq!(c.get(i, j), 2.0 * j as f32);
            }
        }
    }

    #[test]
    fn test_odd_k_ranges_use_cleanup_step() {
        // 0..17 and 17..48 are both odd; together they cover the whole reduction.
        let a = FlatMatrix::from_fn(48, |i, j| ((i + 3 * j) % 4) as f32).unwrap();
        let b = FlatMatrix::from_fn(48, |i, j| ((5 * i + j) % 3) as f32 - 1.0).unwrap();

        let mut expected = FlatMatrix::zeros(48).unwrap();
        super::super::naive::multiply(&a, &b, &mut expected.rows_mut(), 0);

        let mut c = FlatMatrix::zeros(48).unwrap();
        let mut rows = c.rows_mut();
        for k in [0..17, 17..48] {
            let tile = Tile { i: 0..48, j: 0..48, k };
            unsafe { multiply_tile::<F32x16, _, _>(&a, &b, &mut rows, 0, tile, Some(3)) };
        }
        drop(rows);

        assert_eq!(max_abs_diff(&c, &expected), 0.0);
    }

    #[test]
    fn test_tail_strip_and_prefetch() {
        check(96, 96, 48, Some(4));
    }
}
