use std::arch::x86_64::*;

use crate::simd::traits::SimdVec;
use crate::simd::utils::is_aligned_to;

/// Alignment `_mm512_load_ps` / `_mm512_store_ps` require, in bytes.
pub const AVX512_ALIGNMENT: usize = 64;

/// The number of f32 lanes in an AVX-512 vector.
pub const LANE_COUNT: usize = 16;

/// A 16-lane, 32-bit floating-point SIMD vector using AVX-512F intrinsics.
///
/// Only ever constructed inside functions compiled with
/// `#[target_feature(enable = "avx512f")]` after a runtime feature check.
#[derive(Copy, Clone, Debug)]
#[repr(transparent)]
pub struct F32x16 {
    elements: __m512,
}

impl F32x16 {
    /// Checks if the pointer is aligned for `_mm512_load_ps` / `_mm512_store_ps`.
    #[inline(always)]
    pub fn is_aligned(ptr: *const f32) -> bool {
        is_aligned_to(ptr, AVX512_ALIGNMENT)
    }
}

impl SimdVec for F32x16 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn zero() -> Self {
        Self {
            elements: unsafe { _mm512_setzero_ps() },
        }
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        Self {
            // SAFETY: AVX-512F is checked by the caller before entering the kernel.
            elements: unsafe { _mm512_set1_ps(value) },
        }
    }

    #[inline(always)]
    unsafe fn load_aligned(ptr: *const f32) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        debug_assert!(Self::is_aligned(ptr), "Aligned load from unaligned pointer {ptr:p}");

        Self {
            elements: unsafe { _mm512_load_ps(ptr) },
        }
    }

    #[inline(always)]
    unsafe fn load_unaligned(ptr: *const f32) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        Self {
            elements: unsafe { _mm512_loadu_ps(ptr) },
        }
    }

    #[inline(always)]
    unsafe fn store_aligned(self, ptr: *mut f32) {
        debug_assert!(Self::is_aligned(ptr), "Aligned store to unaligned pointer {ptr:p}");

        unsafe { _mm512_store_ps(ptr, self.elements) }
    }

    #[inline(always)]
    unsafe fn store_unaligned(self, ptr: *mut f32) {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        unsafe { _mm512_storeu_ps(ptr, self.elements) }
    }

    #[inline(always)]
    unsafe fn fmadd(self, a: Self, b: Self) -> Self {
        Self {
            elements: unsafe { _mm512_fmadd_ps(a.elements, b.elements, self.elements) },
        }
    }

    #[inline(always)]
    unsafe fn prefetch(ptr: *const f32) {
        unsafe { _mm_prefetch::<_MM_HINT_T0>(ptr as *const i8) }
    }
}
