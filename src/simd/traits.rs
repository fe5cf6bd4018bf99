/// The vector operations the matrix kernels are written against.
///
/// A `SimdVec` always holds [`SimdVec::LANES`] `f32` values (16 for every
/// backend in this crate, so one vector covers 64 bytes: one cache line and
/// one aligned row segment). Kernels are generic over this trait and are
/// instantiated once per backend inside a `#[target_feature]` entry point, so
/// every method is `#[inline(always)]` in the implementations.
pub trait SimdVec: Copy {
    /// Number of `f32` lanes.
    const LANES: usize;

    /// Returns a vector with every lane set to `0.0`.
    ///
    /// # Safety
    ///
    /// The CPU must support the backend's instruction set.
    unsafe fn zero() -> Self;

    /// Returns a vector with every lane set to `value`.
    ///
    /// # Safety
    ///
    /// The CPU must support the backend's instruction set.
    unsafe fn splat(value: f32) -> Self;

    /// Loads `LANES` values from a 64-byte aligned pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be 64-byte aligned and valid for reading `LANES` values.
    unsafe fn load_aligned(ptr: *const f32) -> Self;

    /// Loads `LANES` values from any address.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reading `LANES` values.
    unsafe fn load_unaligned(ptr: *const f32) -> Self;

    /// Stores all lanes to a 64-byte aligned pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be 64-byte aligned and valid for writing `LANES` values.
    unsafe fn store_aligned(self, ptr: *mut f32);

    /// Stores all lanes to any address.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writing `LANES` values.
    unsafe fn store_unaligned(self, ptr: *mut f32);

    /// Returns `a * b + self` lane by lane.
    ///
    /// # Safety
    ///
    /// The CPU must support the backend's instruction set.
    unsafe fn fmadd(self, a: Self, b: Self) -> Self;

    /// Hints the cache hierarchy that the line holding `ptr` will be read soon.
    ///
    /// Prefetching never faults, so `ptr` may point anywhere; backends without
    /// a prefetch instruction do nothing.
    ///
    /// # Safety
    ///
    /// The CPU must support the backend's instruction set.
    unsafe fn prefetch(ptr: *const f32);
}
