use std::fmt;

use crate::error::{validation_error, Result};
use crate::simd::{Backend, VECTOR_WIDTH};

/// The optimization technique used to compute `C = A * B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Strategy {
    /// Triple loop `i, j, k` with a scalar running sum.
    Naive,
    /// 16-wide column tiles of C held in one accumulator across the whole k run.
    Vectorized,
    /// Cubic cache blocks; C is loaded, updated and stored for every k.
    Blocked,
    /// Coarse (L2) and fine (L1) blocks, two register accumulators, software prefetch.
    TwoLevel,
    /// Two-level blocking with the k loop unrolled by two.
    RowPointer,
    /// [`Strategy::TwoLevel`] over coarse row bands of C on the rayon pool.
    #[value(name = "parallel")]
    ParallelTwoLevel,
}

impl Strategy {
    /// Every strategy, in the order they are benchmarked.
    pub const ALL: [Strategy; 6] = [
        Strategy::Naive,
        Strategy::Vectorized,
        Strategy::Blocked,
        Strategy::TwoLevel,
        Strategy::RowPointer,
        Strategy::ParallelTwoLevel,
    ];

    /// Whether the strategy uses the vector backend (and so needs `dim % 16 == 0`).
    pub fn is_vectorized(self) -> bool {
        self != Strategy::Naive
    }

    /// Whether the strategy uses aligned loads and stores on every operand.
    pub fn needs_alignment(self) -> bool {
        !matches!(self, Strategy::Naive | Strategy::Vectorized)
    }

    /// Whether the strategy tiles with a coarse and a fine block.
    pub fn is_two_level(self) -> bool {
        matches!(
            self,
            Strategy::TwoLevel | Strategy::RowPointer | Strategy::ParallelTwoLevel
        )
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Naive => "naive",
            Strategy::Vectorized => "vectorized",
            Strategy::Blocked => "blocked",
            Strategy::TwoLevel => "two-level",
            Strategy::RowPointer => "row-pointer",
            Strategy::ParallelTwoLevel => "parallel",
        };
        f.write_str(name)
    }
}

/// Dimension and tiling parameters of one kernel.
///
/// Built with [`KernelConfig::for_strategy`] and adjusted with the `with_*`
/// setters; checked once by [`KernelConfig::validate`] (called from
/// [`Kernel::new`](crate::Kernel::new)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    pub strategy: Strategy,
    /// Matrix dimension N.
    pub dim: usize,
    /// Cube edge of [`Strategy::Blocked`].
    pub block: usize,
    /// Coarse (L2-sized) block edge of the two-level strategies.
    pub coarse_block: usize,
    /// Fine (L1-sized) block edge of the two-level strategies.
    pub fine_block: usize,
    /// How many k steps ahead to prefetch A and B; `None` disables prefetching.
    pub prefetch_distance: Option<usize>,
    /// Forced vector backend; `None` picks [`Backend::detect`].
    pub backend: Option<Backend>,
}

impl KernelConfig {
    /// Default parameters for `strategy`, matching the reference benchmark programs.
    pub fn for_strategy(strategy: Strategy) -> Self {
        let base = Self {
            strategy,
            dim: 4096,
            block: 64,
            coarse_block: 512,
            fine_block: 64,
            prefetch_distance: None,
            backend: None,
        };

        match strategy {
            Strategy::Naive => Self { dim: 1024, ..base },
            Strategy::Vectorized | Strategy::Blocked => base,
            Strategy::TwoLevel | Strategy::ParallelTwoLevel => Self {
                prefetch_distance: Some(128),
                ..base
            },
            Strategy::RowPointer => Self {
                coarse_block: 256,
                ..base
            },
        }
    }

    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    pub fn with_block(mut self, block: usize) -> Self {
        self.block = block;
        self
    }

    pub fn with_blocks(mut self, coarse_block: usize, fine_block: usize) -> Self {
        self.coarse_block = coarse_block;
        self.fine_block = fine_block;
        self
    }

    pub fn with_prefetch(mut self, prefetch_distance: Option<usize>) -> Self {
        self.prefetch_distance = prefetch_distance;
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Checks every precondition the selected kernel relies on.
    ///
    /// # Errors
    ///
    /// * [`Error::Validation`](crate::Error::Validation) for a zero dimension, a
    ///   dimension that is not a multiple of the vector width (vectorized
    ///   strategies), or block sizes that are zero, not multiples of the vector
    ///   width, or (two-level) a coarse block that is not a multiple of the fine one.
    /// * [`Error::UnsupportedBackend`](crate::Error::UnsupportedBackend) if a
    ///   forced backend cannot run here.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(validation_error("matrix dimension must be positive"));
        }

        if self.strategy.is_vectorized() && self.dim % VECTOR_WIDTH != 0 {
            return Err(validation_error(format!(
                "{} kernel requires a dimension that is a multiple of {VECTOR_WIDTH}, got {}",
                self.strategy, self.dim
            )));
        }

        if self.strategy == Strategy::Blocked {
            check_block("block", self.block)?;
        }

        if self.strategy.is_two_level() {
            check_block("fine block", self.fine_block)?;
            check_block("coarse block", self.coarse_block)?;

            if self.coarse_block % self.fine_block != 0 {
                return Err(validation_error(format!(
                    "coarse block {} must be a multiple of fine block {}",
                    self.coarse_block, self.fine_block
                )));
            }
        }

        if let Some(backend) = self.backend {
            backend.ensure_supported()?;
        }

        Ok(())
    }

    /// Floating-point operations of one multiplication: `2 * N^3`.
    pub fn flops(&self) -> f64 {
        2.0 * (self.dim as f64).powi(3)
    }
}

fn check_block(name: &str, size: usize) -> Result<()> {
    if size == 0 || size % VECTOR_WIDTH != 0 {
        return Err(validation_error(format!(
            "{name} size must be a positive multiple of {VECTOR_WIDTH}, got {size}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_defaults_validate() {
        for strategy in Strategy::ALL {
            KernelConfig::for_strategy(strategy).validate().unwrap();
        }
    }

    #[test]
    fn test_reference_defaults() {
        assert_eq!(KernelConfig::for_strategy(Strategy::Naive).dim, 1024);

        let two_level = KernelConfig::for_strategy(Strategy::TwoLevel);
        assert_eq!((two_level.dim, two_level.coarse_block, two_level.fine_block), (4096, 512, 64));
        assert_eq!(two_level.prefetch_distance, Some(128));

        let row_pointer = KernelConfig::for_strategy(Strategy::RowPointer);
        assert_eq!((row_pointer.coarse_block, row_pointer.fine_block), (256, 64));
        assert_eq!(row_pointer.prefetch_distance, None);

        assert_eq!(KernelConfig::for_strategy(Strategy::Blocked).block, 64);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let err = KernelConfig::for_strategy(Strategy::Naive)
            .with_dim(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_naive_accepts_any_dimension() {
        KernelConfig::for_strategy(Strategy::Naive)
            .with_dim(7)
            .validate()
            .unwrap();
    }

    #[test]
    fn test_vector_width_multiple_required() {
        for strategy in Strategy::ALL.into_iter().filter(|s| s.is_vectorized()) {
            let err = KernelConfig::for_strategy(strategy)
                .with_dim(40)
                .validate()
                .unwrap_err();
            assert!(err.to_string().contains("multiple of 16"), "{strategy}: {err}");
        }
    }

    #[test]
    fn test_bad_block_sizes_rejected() {
        let blocked = KernelConfig::for_strategy(Strategy::Blocked).with_dim(64);
        assert!(blocked.with_block(0).validate().is_err());
        assert!(blocked.with_block(24).validate().is_err());
        assert!(blocked.with_block(48).validate().is_ok());

        let two_level = KernelConfig::for_strategy(Strategy::TwoLevel).with_dim(64);
        assert!(two_level.with_blocks(128, 0).validate().is_err());
        assert!(two_level.with_blocks(96, 64).validate().is_err());
        assert!(two_level.with_blocks(192, 64).validate().is_ok());
    }

    #[test]
    fn test_blocks_ignored_by_other_strategies() {
        KernelConfig::for_strategy(Strategy::Vectorized)
            .with_dim(32)
            .with_block(0)
            .with_blocks(0, 0)
            .validate()
            .unwrap();
    }

    #[test]
    fn test_flops() {
        let config = KernelConfig::for_strategy(Strategy::Naive).with_dim(10);
        assert_eq!(config.flops(), 2000.0);
    }

    #[test]
    fn test_strategy_display() {
        let names: Vec<String> = Strategy::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            ["naive", "vectorized", "blocked", "two-level", "row-pointer", "parallel"]
        );
    }
}
