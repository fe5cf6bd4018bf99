//! Vector-operation backends.
//!
//! The kernels only ever talk to [`SimdVec`]; this module decides which
//! implementation runs. Detection happens once per process and is cached.

use std::fmt;
use std::sync::OnceLock;

use crate::error::{Error, Result};

#[cfg(all(avx512, target_arch = "x86_64"))]
pub mod avx512;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod avx2;

pub mod scalar;
pub mod traits;
pub mod utils;

pub use traits::SimdVec;

/// Width of every vector backend, in `f32` lanes.
pub const VECTOR_WIDTH: usize = 16;

/// Instruction set used to run the vectorized kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum Backend {
    /// Portable 16-lane arrays, no intrinsics.
    Scalar,
    /// Two 256-bit AVX2 registers with FMA3.
    Avx2,
    /// One 512-bit AVX-512F register.
    Avx512,
}

static DETECTED: OnceLock<Backend> = OnceLock::new();

impl Backend {
    /// Returns the fastest backend supported by this CPU and toolchain.
    pub fn detect() -> Backend {
        *DETECTED.get_or_init(|| {
            let backend = [Backend::Avx512, Backend::Avx2]
                .into_iter()
                .find(|b| b.is_supported())
                .unwrap_or(Backend::Scalar);

            tracing::debug!(%backend, "detected vector backend");
            backend
        })
    }

    /// Whether this backend can run here.
    pub fn is_supported(self) -> bool {
        match self {
            Backend::Scalar => true,
            Backend::Avx2 => avx2_supported(),
            Backend::Avx512 => avx512_supported(),
        }
    }

    /// Returns `Ok(self)` if the backend can run here.
    pub fn ensure_supported(self) -> Result<Backend> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(Error::UnsupportedBackend {
                backend: self.to_string(),
            })
        }
    }

    /// Every backend supported on this machine, slowest first.
    pub fn available() -> Vec<Backend> {
        [Backend::Scalar, Backend::Avx2, Backend::Avx512]
            .into_iter()
            .filter(|b| b.is_supported())
            .collect()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Scalar => "scalar",
            Backend::Avx2 => "avx2",
            Backend::Avx512 => "avx512",
        };
        f.write_str(name)
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn avx2_supported() -> bool {
    is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn avx2_supported() -> bool {
    false
}

#[cfg(all(avx512, target_arch = "x86_64"))]
fn avx512_supported() -> bool {
    is_x86_feature_detected!("avx512f")
}

#[cfg(not(all(avx512, target_arch = "x86_64")))]
fn avx512_supported() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_always_available() {
        assert!(Backend::Scalar.is_supported());
        assert_eq!(Backend::available()[0], Backend::Scalar);
    }

    #[test]
    fn test_detect_is_supported_and_best() {
        let detected = Backend::detect();
        assert!(detected.is_supported());
        assert_eq!(Some(&detected), Backend::available().last());
    }

    #[test]
    fn test_ensure_supported() {
        for backend in [Backend::Scalar, Backend::Avx2, Backend::Avx512] {
            match backend.ensure_supported() {
                Ok(b) => assert_eq!(b, backend),
                Err(e) => {
                    assert!(!backend.is_supported());
                    assert!(e.to_string().contains(&backend.to_string()));
                }
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Backend::Avx512.to_string(), "avx512");
        assert_eq!(Backend::Avx2.to_string(), "avx2");
        assert_eq!(Backend::Scalar.to_string(), "scalar");
    }
}
