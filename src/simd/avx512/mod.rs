//! AVX-512 backend: one `__m512` register per 16-lane vector.
//!
//! # Conditional Compilation
//!
//! This module is only compiled when `build.rs` finds a toolchain with the
//! AVX-512 intrinsics (`cfg(avx512)`). Whether the running CPU supports
//! `avx512f` is checked at runtime by [`Backend::detect`](crate::simd::Backend::detect).

pub mod f32x16;
