//! One-shot timing harness: fill A and B with seeded random values, time a
//! single multiplication, report GFLOPS.

use std::fmt;
use std::time::Instant;

use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use crate::error::Result;
use crate::kernel::{Kernel, KernelConfig, Strategy};
use crate::matrix::{FlatMatrix, RowMatrix, Storage, StorageKind};
use crate::simd::Backend;

/// What to run: a kernel configuration, the storage layout of all three
/// operands and the RNG seed (`None` draws a fresh one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    pub kernel: KernelConfig,
    pub layout: StorageKind,
    pub seed: Option<u64>,
}

impl BenchConfig {
    /// The default kernel of `strategy` on flat storage with a random seed.
    pub fn new(strategy: Strategy) -> Self {
        Self {
            kernel: KernelConfig::for_strategy(strategy),
            layout: StorageKind::default(),
            seed: None,
        }
    }
}

/// Result of one timed multiplication.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub kernel: KernelConfig,
    /// Backend the kernel actually ran on.
    pub backend: Backend,
    pub layout: StorageKind,
    pub seed: u64,
    pub elapsed_secs: f64,
    pub gflops: f64,
    /// `C[0][0]`, printed so the product is observably used.
    pub sample: f32,
}

/// Billions of floating-point operations per second for one `n x n`
/// multiplication (`2 * n^3` operations) taking `seconds`.
pub fn gflops(n: usize, seconds: f64) -> f64 {
    let n = n as f64;
    (2.0 * n * n * n / seconds) / 1e9
}

/// Allocates and fills the operands, then times exactly one multiplication.
///
/// # Errors
///
/// Configuration errors from [`Kernel::new`] and allocation errors are
/// returned before anything is timed.
pub fn run(config: &BenchConfig) -> Result<BenchReport> {
    let kernel = Kernel::new(config.kernel)?;

    match config.layout {
        StorageKind::Flat => run_with::<FlatMatrix>(&kernel, config),
        StorageKind::Rows => run_with::<RowMatrix>(&kernel, config),
    }
}

fn run_with<S: Storage>(kernel: &Kernel, config: &BenchConfig) -> Result<BenchReport> {
    let dim = kernel.config().dim;
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    info!(strategy = %kernel.strategy(), dim, layout = %config.layout, seed, "allocating operands");
    let a = S::random(dim, &mut rng)?;
    let b = S::random(dim, &mut rng)?;
    let mut c = S::zeros(dim)?;

    info!(strategy = %kernel.strategy(), backend = %kernel.backend(), "multiplying");
    let start = Instant::now();
    kernel.multiply(&a, &b, &mut c)?;
    let elapsed_secs = start.elapsed().as_secs_f64();

    let report = BenchReport {
        kernel: *kernel.config(),
        backend: kernel.backend(),
        layout: config.layout,
        seed,
        elapsed_secs,
        gflops: gflops(dim, elapsed_secs),
        sample: c.get(0, 0),
    };
    info!(elapsed_secs, gflops = report.gflops, "done");

    Ok(report)
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let k = &self.kernel;

        writeln!(f, "strategy: {} ({}, {} layout)", k.strategy, self.backend, self.layout)?;
        writeln!(f, "matrix dimension: {} x {}", k.dim, k.dim)?;
        if k.strategy == Strategy::Blocked {
            writeln!(f, "block size: {} x {}", k.block, k.block)?;
        }
        if k.strategy.is_two_level() {
            writeln!(f, "L1 block size: {}", k.fine_block)?;
            writeln!(f, "L2 block size: {}", k.coarse_block)?;
            if let Some(d) = k.prefetch_distance {
                writeln!(f, "prefetch distance: {d}")?;
            }
        }
        writeln!(f, "elapsed: {:.4} s", self.elapsed_secs)?;
        writeln!(f, "performance: {:.2} GFLOPS", self.gflops)?;
        write!(f, "sample: C[0][0] = {:.6}", self.sample)
    }
}
