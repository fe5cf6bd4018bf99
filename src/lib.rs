//! Cache-blocked single-precision square matrix multiplication.
//!
//! A family of kernels computing `C = A * B` for `N x N` `f32` matrices, from a
//! naive triple loop up to two-level tiling with register accumulation,
//! software prefetch and a rayon-parallel variant. The vector kernels run on
//! AVX-512, AVX2 or a portable scalar backend, picked at runtime.
//!
//! ```
//! use tilemm::{Kernel, KernelConfig, RowMatrix, Storage, Strategy};
//!
//! let config = KernelConfig::for_strategy(Strategy::Blocked).with_dim(32);
//! let kernel = Kernel::new(config).unwrap();
//!
//! let a = RowMatrix::filled(32, 1.0).unwrap();
//! let b = RowMatrix::identity(32).unwrap();
//! let mut c = RowMatrix::zeros(32).unwrap();
//! kernel.multiply(&a, &b, &mut c).unwrap();
//!
//! assert_eq!(c, a);
//! ```

pub mod bench;
pub mod error;
pub mod kernel;
pub mod matrix;
pub mod simd;

pub use error::{Error, Result};
pub use kernel::{multiply, Kernel, KernelConfig, Strategy};
pub use matrix::{FlatMatrix, RowMatrix, Storage, StorageKind};
pub use simd::Backend;
