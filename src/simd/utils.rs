use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::error::{allocation_error, layout_error, Result};

/// Byte alignment of every matrix row: one cache line and one 512-bit vector.
pub const MATRIX_ALIGNMENT: usize = 64;

/// Owned, zero-initialized `f32` buffer whose first element sits on a chosen
/// byte boundary.
///
/// Unlike a `Vec<f32>` built with `Vec::from_raw_parts` over an over-aligned
/// allocation, the buffer remembers its [`Layout`] and frees the memory with
/// it on drop.
pub struct AlignedVec {
    ptr: NonNull<f32>,
    len: usize,
    layout: Layout,
}

// SAFETY: `AlignedVec` uniquely owns its allocation, like `Vec<f32>`.
unsafe impl Send for AlignedVec {}
unsafe impl Sync for AlignedVec {}

impl AlignedVec {
    /// Allocates `len` zeroed `f32` values aligned to `align` bytes.
    ///
    /// # Errors
    ///
    /// * [`Error::Layout`](crate::Error::Layout) if `align` is not a power of
    ///   two or the byte size overflows.
    /// * [`Error::Allocation`](crate::Error::Allocation) if the allocator
    ///   returns null.
    pub fn zeroed(len: usize, align: usize) -> Result<Self> {
        let size_bytes = len
            .checked_mul(std::mem::size_of::<f32>())
            .ok_or_else(|| layout_error(usize::MAX, align, format!("{len} f32 values overflow usize")))?;

        let layout = Layout::from_size_align(size_bytes, align)
            .map_err(|e| layout_error(size_bytes, align, e.to_string()))?;

        if len == 0 {
            // Zero-sized allocations are not allowed; a dangling, aligned pointer is enough.
            let dangling = align as *mut f32;
            return Ok(Self {
                // SAFETY: `align` is a non-zero power of two (checked by `Layout`).
                ptr: unsafe { NonNull::new_unchecked(dangling) },
                len,
                layout,
            });
        }

        // SAFETY: `layout` has a non-zero size.
        let ptr = unsafe { alloc_zeroed(layout) as *mut f32 };

        match NonNull::new(ptr) {
            Some(ptr) => Ok(Self { ptr, len, layout }),
            None => Err(allocation_error(size_bytes, align, "allocator returned null")),
        }
    }

    /// Allocates `len` zeroed values aligned to [`MATRIX_ALIGNMENT`].
    pub fn zeroed_matrix(len: usize) -> Result<Self> {
        Self::zeroed(len, MATRIX_ALIGNMENT)
    }

    /// Alignment in bytes the buffer was allocated with.
    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }
}

impl Deref for AlignedVec {
    type Target = [f32];

    #[inline(always)]
    fn deref(&self) -> &[f32] {
        // SAFETY: `ptr` is valid for `len` initialized (zeroed) values for the lifetime of `self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedVec {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut [f32] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AlignedVec {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: the pointer was obtained from `alloc_zeroed` with `self.layout`.
            unsafe { dealloc(self.ptr.as_ptr() as *mut u8, self.layout) };
        }
    }
}

impl Clone for AlignedVec {
    fn clone(&self) -> Self {
        let mut copy = Self::zeroed(self.len, self.alignment())
            .unwrap_or_else(|_| std::alloc::handle_alloc_error(self.layout));
        copy.copy_from_slice(self);
        copy
    }
}

impl fmt::Debug for AlignedVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedVec")
            .field("len", &self.len)
            .field("alignment", &self.alignment())
            .finish()
    }
}

/// Returns `true` if `ptr` sits on an `align`-byte boundary.
#[inline(always)]
pub fn is_aligned_to(ptr: *const f32, align: usize) -> bool {
    (ptr as usize) % align == 0
}
