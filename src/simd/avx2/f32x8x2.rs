//! AVX2 16-lane f32 vector made of two 256-bit halves.
//!
//! Keeps the 16-lane (64-byte) granularity of the kernels on CPUs without
//! AVX-512: every operation is issued twice, once per `__m256` half, and the
//! multiply-add uses the FMA3 extension.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::simd::traits::SimdVec;

/// Number of f32 elements in one `__m256` half.
pub(crate) const HALF_LANE_COUNT: usize = 8;

/// Number of f32 elements in the pair.
pub const LANE_COUNT: usize = 2 * HALF_LANE_COUNT;

/// A pair of AVX2 vectors holding 16 packed f32 values.
#[derive(Copy, Clone, Debug)]
pub struct F32x8x2 {
    lo: __m256,
    hi: __m256,
}

impl SimdVec for F32x8x2 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn zero() -> Self {
        unsafe {
            Self {
                lo: _mm256_setzero_ps(),
                hi: _mm256_setzero_ps(),
            }
        }
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        unsafe {
            let v = _mm256_set1_ps(value);
            Self { lo: v, hi: v }
        }
    }

    #[inline(always)]
    unsafe fn load_aligned(ptr: *const f32) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        debug_assert!(
            (ptr as usize) % 32 == 0,
            "Aligned load from unaligned pointer {ptr:p}"
        );

        unsafe {
            Self {
                lo: _mm256_load_ps(ptr),
                hi: _mm256_load_ps(ptr.add(HALF_LANE_COUNT)),
            }
        }
    }

    #[inline(always)]
    unsafe fn load_unaligned(ptr: *const f32) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        unsafe {
            Self {
                lo: _mm256_loadu_ps(ptr),
                hi: _mm256_loadu_ps(ptr.add(HALF_LANE_COUNT)),
            }
        }
    }

    #[inline(always)]
    unsafe fn store_aligned(self, ptr: *mut f32) {
        debug_assert!(
            (ptr as usize) % 32 == 0,
            "Aligned store to unaligned pointer {ptr:p}"
        );

        unsafe {
            _mm256_store_ps(ptr, self.lo);
            _mm256_store_ps(ptr.add(HALF_LANE_COUNT), self.hi);
        }
    }

    #[inline(always)]
    unsafe fn store_unaligned(self, ptr: *mut f32) {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        unsafe {
            _mm256_storeu_ps(ptr, self.lo);
            _mm256_storeu_ps(ptr.add(HALF_LANE_COUNT), self.hi);
        }
    }

    #[inline(always)]
    unsafe fn fmadd(self, a: Self, b: Self) -> Self {
        unsafe {
            Self {
                lo: _mm256_fmadd_ps(a.lo, b.lo, self.lo),
                hi: _mm256_fmadd_ps(a.hi, b.hi, self.hi),
            }
        }
    }

    #[inline(always)]
    unsafe fn prefetch(ptr: *const f32) {
        unsafe { _mm_prefetch::<_MM_HINT_T0>(ptr as *const i8) }
    }
}
