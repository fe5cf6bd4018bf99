use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};
use tracing::trace;

use crate::kernel::KernelConfig;
use crate::matrix::Storage;
use crate::simd::Backend;

/// Splits the rows of C into bands of `coarse_block` rows and runs the
/// sequential two-level kernel on each band in parallel.
///
/// Bands are disjoint, so each task writes its own rows of C while sharing A
/// and B read-only. Runs on the current rayon pool.
pub(super) fn multiply<A, B>(
    backend: Backend,
    config: &KernelConfig,
    a: &A,
    b: &B,
    c: &mut [&mut [f32]],
) where
    A: Storage + ?Sized,
    B: Storage + ?Sized,
{
    let band_rows = config.coarse_block;

    c.par_chunks_mut(band_rows)
        .enumerate()
        .for_each(|(band, rows)| {
            trace!(band, rows = rows.len(), "two-level band");
            super::dispatch(backend, config, a, b, rows, band * band_rows);
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Strategy;
    use crate::matrix::{max_abs_diff, FlatMatrix, RowMatrix};

    #[test]
    fn test_bands_match_sequential_two_level() {
        let config = KernelConfig::for_strategy(Strategy::ParallelTwoLevel)
            .with_dim(96)
            .with_blocks(32, 16)
            .with_backend(Backend::Scalar);
        let sequential = KernelConfig {
            strategy: Strategy::TwoLevel,
            ..config
        };

        let a = FlatMatrix::from_fn(96, |i, j| ((i * 3 + j) % 7) as f32).unwrap();
        let b = RowMatrix::from_fn(96, |i, j| ((i + j * 5) % 4) as f32).unwrap();

        let mut expected = FlatMatrix::zeros(96).unwrap();
        super::super::dispatch(Backend::Scalar, &sequential, &a, &b, &mut expected.rows_mut(), 0);

        let mut c = FlatMatrix::filled(96, -3.0).unwrap();
        multiply(Backend::Scalar, &config, &a, &b, &mut c.rows_mut());

        assert_eq!(max_abs_diff(&c, &expected), 0.0);
    }

    #[test]
    fn test_fewer_rows_than_one_band() {
        let config = KernelConfig::for_strategy(Strategy::ParallelTwoLevel)
            .with_dim(32)
            .with_backend(Backend::Scalar);
        let a = RowMatrix::identity(32).unwrap();
        let b = RowMatrix::from_fn(32, |i, j| (i * 32 + j) as f32).unwrap();
        let mut c = RowMatrix::zeros(32).unwrap();

        multiply(Backend::Scalar, &config, &a, &b, &mut c.rows_mut());

        assert_eq!(c, b);
    }
}
