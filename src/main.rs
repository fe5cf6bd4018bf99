use clap::{Parser, ValueEnum};
use eyre::Result;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{prelude::*, EnvFilter};

use tilemm::bench::{self, BenchConfig};
use tilemm::{Backend, KernelConfig, StorageKind, Strategy};

/// Which strategies to benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Selection {
    Naive,
    Vectorized,
    Blocked,
    TwoLevel,
    RowPointer,
    Parallel,
    All,
}

impl Selection {
    fn strategies(self) -> Vec<Strategy> {
        match self {
            Selection::Naive => vec![Strategy::Naive],
            Selection::Vectorized => vec![Strategy::Vectorized],
            Selection::Blocked => vec![Strategy::Blocked],
            Selection::TwoLevel => vec![Strategy::TwoLevel],
            Selection::RowPointer => vec![Strategy::RowPointer],
            Selection::Parallel => vec![Strategy::ParallelTwoLevel],
            Selection::All => Strategy::ALL.to_vec(),
        }
    }
}

/// Times one square f32 matrix multiplication per selected strategy.
///
/// Options left out keep each strategy's own defaults.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Opt {
    #[arg(value_enum, default_value = "all", help = "strategy to run")]
    strategy: Selection,
    #[arg(short, long, help = "matrix dimension N")]
    size: Option<usize>,
    #[arg(long, help = "cube edge of the blocked strategy")]
    block: Option<usize>,
    #[arg(long, help = "coarse (L2) block edge of the two-level strategies")]
    coarse: Option<usize>,
    #[arg(long, help = "fine (L1) block edge of the two-level strategies")]
    fine: Option<usize>,
    #[arg(long, help = "prefetch distance in k steps, 0 disables prefetching")]
    prefetch: Option<usize>,
    #[arg(long, value_enum, default_value_t = StorageKind::Flat, help = "storage layout of A, B and C")]
    layout: StorageKind,
    #[arg(long, value_enum, help = "force a vector backend instead of detecting one")]
    backend: Option<Backend>,
    #[arg(long, help = "seed for the random operands")]
    seed: Option<u64>,
    #[arg(short, long, help = "worker threads of the parallel strategy")]
    threads: Option<usize>,
}

impl Opt {
    fn bench_config(&self, strategy: Strategy) -> BenchConfig {
        let mut kernel = KernelConfig::for_strategy(strategy);
        if let Some(size) = self.size {
            kernel = kernel.with_dim(size);
        }
        if let Some(block) = self.block {
            kernel = kernel.with_block(block);
        }
        let coarse = self.coarse.unwrap_or(kernel.coarse_block);
        let fine = self.fine.unwrap_or(kernel.fine_block);
        kernel = kernel.with_blocks(coarse, fine);
        if let Some(distance) = self.prefetch {
            kernel = kernel.with_prefetch((distance > 0).then_some(distance));
        }
        if let Some(backend) = self.backend {
            kernel = kernel.with_backend(backend);
        }

        BenchConfig {
            kernel,
            layout: self.layout,
            seed: self.seed,
        }
    }

    fn run(&self) -> Result<()> {
        let configs: Vec<BenchConfig> = self
            .strategy
            .strategies()
            .into_iter()
            .map(|s| self.bench_config(s))
            .collect();

        // Validate everything up front so a bad option fails before any timing.
        for config in &configs {
            config.kernel.validate()?;
        }

        for config in &configs {
            let report = bench::run(config)?;
            println!("{report}\n");
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()?;

    let opt = Opt::parse();
    info!(?opt, detected = %Backend::detect(), "starting");

    match opt.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?;
            pool.install(|| opt.run())
        }
        None => opt.run(),
    }
}
