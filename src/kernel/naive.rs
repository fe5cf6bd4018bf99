use crate::matrix::Storage;

/// Scalar `i, j, k` triple loop.
///
/// Each element of C is accumulated in a local and stored once. B is walked
/// down a column for every element, which is what the other strategies improve on.
/// Works for any dimension.
#[allow(clippy::needless_range_loop)]
pub(super) fn multiply<A, B>(a: &A, b: &B, c: &mut [&mut [f32]], row0: usize)
where
    A: Storage + ?Sized,
    B: Storage + ?Sized,
{
    let n = a.dim();

    for (r, c_row) in c.iter_mut().enumerate() {
        let a_row = a.row(row0 + r);

        for j in 0..n {
            let mut sum = 0.0f32;
            for k in 0..n {
                sum += a_row[k] * b.row(k)[j];
            }
            c_row[j] = sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::FlatMatrix;

    #[test]
    fn test_2x2() {
        let a = FlatMatrix::from_fn(2, |i, j| [[1.0, 2.0], [3.0, 4.0]][i][j]).unwrap();
        let b = FlatMatrix::from_fn(2, |i, j| [[5.0, 6.0], [7.0, 8.0]][i][j]).unwrap();
        let mut c = FlatMatrix::filled(2, f32::NAN).unwrap();

        multiply(&a, &b, &mut c.rows_mut(), 0);

        assert_eq!(c.to_vec(), vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_row_band_offset() {
        let a = FlatMatrix::from_fn(3, |i, j| (i * 3 + j) as f32).unwrap();
        let b = FlatMatrix::identity(3).unwrap();
        let mut c = FlatMatrix::zeros(3).unwrap();

        // Only the last row is computed.
        let mut rows = c.rows_mut();
        multiply(&a, &b, &mut rows[2..], 2);

        assert_eq!(c.to_vec(), vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 6.0, 7.0, 8.0]);
    }
}
