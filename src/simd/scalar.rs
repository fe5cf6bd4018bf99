//! Portable 16-lane fallback used when no x86 vector extension is available.
//!
//! The multiply-add is unfused (`acc + a * b`), so results may differ from the
//! FMA backends in the last bit.

use crate::simd::traits::SimdVec;

/// Number of f32 lanes, matching the 512-bit hardware backends.
pub const LANE_COUNT: usize = 16;

/// A 16-lane vector stored as a plain array.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(C, align(64))]
pub struct F32x16 {
    elements: [f32; LANE_COUNT],
}

impl F32x16 {
    /// Returns the lanes as an array.
    #[inline(always)]
    pub fn to_array(self) -> [f32; LANE_COUNT] {
        self.elements
    }
}

impl SimdVec for F32x16 {
    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn zero() -> Self {
        Self {
            elements: [0.0; LANE_COUNT],
        }
    }

    #[inline(always)]
    unsafe fn splat(value: f32) -> Self {
        Self {
            elements: [value; LANE_COUNT],
        }
    }

    #[inline(always)]
    unsafe fn load_aligned(ptr: *const f32) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        debug_assert!(
            (ptr as usize) % 64 == 0,
            "Aligned load from unaligned pointer {ptr:p}"
        );

        unsafe { Self::load_unaligned(ptr) }
    }

    #[inline(always)]
    unsafe fn load_unaligned(ptr: *const f32) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        Self {
            elements: unsafe { std::ptr::read_unaligned(ptr as *const [f32; LANE_COUNT]) },
        }
    }

    #[inline(always)]
    unsafe fn store_aligned(self, ptr: *mut f32) {
        debug_assert!(
            (ptr as usize) % 64 == 0,
            "Aligned store to unaligned pointer {ptr:p}"
        );

        unsafe { self.store_unaligned(ptr) }
    }

    #[inline(always)]
    unsafe fn store_unaligned(self, ptr: *mut f32) {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        unsafe { std::ptr::write_unaligned(ptr as *mut [f32; LANE_COUNT], self.elements) }
    }

    #[inline(always)]
    unsafe fn fmadd(self, a: Self, b: Self) -> Self {
        let mut elements = self.elements;
        for ((acc, &x), &y) in elements.iter_mut().zip(&a.elements).zip(&b.elements) {
            *acc += x * y;
        }
        Self { elements }
    }

    #[inline(always)]
    unsafe fn prefetch(_ptr: *const f32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splat_and_fmadd() {
        unsafe {
            let acc = F32x16::splat(1.0);
            let a = F32x16::splat(2.0);
            let b = F32x16::splat(3.0);
            assert_eq!(acc.fmadd(a, b).to_array(), [7.0; LANE_COUNT]);
        }
    }

    #[test]
    fn test_load_store_unaligned() {
        let src: Vec<f32> = (0..LANE_COUNT as u32 + 1).map(|x| x as f32).collect();
        let mut dst = vec![0.0f32; LANE_COUNT + 1];

        unsafe {
            let v = F32x16::load_unaligned(src.as_ptr().add(1));
            v.store_unaligned(dst.as_mut_ptr().add(1));
        }

        assert_eq!(dst[0], 0.0);
        assert_eq!(&dst[1..], &src[1..]);
    }

    #[test]
    fn test_zero() {
        assert_eq!(unsafe { F32x16::zero() }.to_array(), [0.0; LANE_COUNT]);
    }
}
