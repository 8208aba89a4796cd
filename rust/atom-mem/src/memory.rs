//! `Memory`: a non-owning descriptor of a contiguous byte region.
//!
//! A `Memory` records where a region starts, how many bytes it spans and how many
//! logical elements it holds. It never owns or frees the bytes it describes.
//!
//! Views handed out by [`Arena`](crate::Arena) carry the lifetime of the shared
//! borrow of the arena they were carved from. Resetting or dropping the arena
//! needs exclusive access, so the borrow checker rejects any use of a view past
//! either point.

use std::marker::PhantomData;
use std::ops::Range;

/// Describes `size` bytes starting at `start`, holding `count` elements.
///
/// `count` is caller-defined metadata: byte allocations report `1`, typed array
/// allocations report the number of elements.
///
/// Invariant for well-formed views: `start` is non-null whenever `size > 0`
/// (see [`Memory::is_valid`]). Views produced by an arena always satisfy it;
/// views built with [`Memory::new`] are the caller's responsibility.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memory<'a> {
    start: *mut u8,
    size: usize,
    count: usize,
    _region: PhantomData<&'a [u8]>,
}

impl<'a> Memory<'a> {
    /// Builds a view from raw parts. No validation is performed.
    #[inline]
    pub const fn new(start: *mut u8, size: usize, count: usize) -> Memory<'a> {
        Memory {
            start,
            size,
            count,
            _region: PhantomData,
        }
    }

    /// A zero-length view with a null start and no elements.
    #[inline]
    pub const fn empty() -> Memory<'a> {
        Memory::new(std::ptr::null_mut(), 0, 0)
    }

    /// Address of the first byte.
    #[inline]
    pub fn start(&self) -> *mut u8 {
        self.start
    }

    /// Length of the region in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of logical elements in the region.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns a copy of this view with a different element count.
    #[inline]
    pub fn with_count(self, count: usize) -> Memory<'a> {
        Memory { count, ..self }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// `true` if the start address is non-null or the view is zero-length.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.start.is_null() || self.size == 0
    }

    /// One-past-the-end address.
    #[inline]
    pub fn end(&self) -> *mut u8 {
        self.start.wrapping_add(self.size)
    }

    /// The half-open address range `[start, start + size)`.
    #[inline]
    pub fn address_range(&self) -> Range<usize> {
        let start = self.start as usize;
        start..start.wrapping_add(self.size)
    }

    /// `true` if `addr` lies inside `[start, start + size)`.
    #[inline]
    pub fn contains_addr(&self, addr: *const u8) -> bool {
        self.address_range().contains(&(addr as usize))
    }

    /// `true` if both views are non-empty and share at least one byte.
    pub fn overlaps(&self, other: &Memory<'_>) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let a = self.address_range();
        let b = other.address_range();
        a.start < b.end && b.start < a.end
    }

    /// `true` if the start address is a multiple of `alignment`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `alignment` is not a power of two.
    #[inline]
    pub fn is_aligned(&self, alignment: usize) -> bool {
        crate::align::is_aligned_ptr(self.start, alignment)
    }

    /// Borrows the described bytes.
    ///
    /// # Safety
    ///
    /// The view must be valid, describe initialized memory that is live for `'a`,
    /// and no mutable reference to any of its bytes may exist for the duration of
    /// the returned borrow.
    #[inline]
    pub unsafe fn as_bytes(&self) -> &'a [u8] {
        if self.size == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.start, self.size) }
    }

    /// Mutably borrows the described bytes.
    ///
    /// # Safety
    ///
    /// Same as [`Memory::as_bytes`], and additionally no other reference to any of
    /// the bytes (including one obtained from a copy of this view) may exist for
    /// the duration of the returned borrow.
    #[allow(clippy::mut_from_ref)]
    #[inline]
    pub unsafe fn as_bytes_mut(&self) -> &'a mut [u8] {
        if self.size == 0 {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(self.start, self.size) }
    }

    /// Reinterprets the described bytes as a slice of `T`.
    ///
    /// # Safety
    ///
    /// Same as [`Memory::as_bytes`].
    ///
    /// # Panics
    ///
    /// Panics if the start is not aligned for `T` or `size` is not a multiple of
    /// `size_of::<T>()`.
    #[inline]
    pub unsafe fn as_slice<T>(&self) -> &'a [T]
    where
        T: bytemuck::AnyBitPattern,
    {
        bytemuck::cast_slice(unsafe { self.as_bytes() })
    }

    /// Mutable counterpart of [`Memory::as_slice`].
    ///
    /// # Safety
    ///
    /// Same as [`Memory::as_bytes_mut`].
    #[allow(clippy::mut_from_ref)]
    #[inline]
    pub unsafe fn as_mut_slice<T>(&self) -> &'a mut [T]
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        bytemuck::cast_slice_mut(unsafe { self.as_bytes_mut() })
    }
}

impl Default for Memory<'_> {
    fn default() -> Self {
        Memory::empty()
    }
}

impl std::fmt::Debug for Memory<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("start", &self.start)
            .field("size", &self.size)
            .field("count", &self.count)
            .finish()
    }
}
