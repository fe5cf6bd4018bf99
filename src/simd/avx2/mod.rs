//! AVX2 + FMA backend for CPUs without AVX-512.
//!
//! AVX2 is available on most Intel processors since Haswell (2013) and AMD
//! processors since Excavator (2015). The 16-lane vector type is emulated with
//! two 256-bit registers so the kernels keep a single tile geometry.

pub mod f32x8x2;
