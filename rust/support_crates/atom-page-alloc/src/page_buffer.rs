//! Owned, page-aligned byte buffer backed by an anonymous memory mapping.
//!
//! # Safety
//!
//! `PageBuffer` is `Send` and `Sync`: it exclusively owns its mapping and releases
//! it on drop. Callers that hand out raw pointers from [`PageBuffer::ptr`] are
//! responsible for synchronizing access to the bytes behind them.

use std::ptr::NonNull;
use std::sync::OnceLock;

use crate::mmap;

/// Page granularity of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// The system's standard page size (typically 4 KiB).
    Regular,
    /// Huge pages (typically 2 MiB); availability depends on host configuration.
    Large,
}

/// A zero-initialized memory block made of whole pages.
pub struct PageBuffer {
    ptr: NonNull<u8>,
    /// Requested length in bytes.
    len: usize,
    /// Mapped length, a multiple of the page size and at least one page.
    capacity: usize,
    kind: PageKind,
}

impl PageBuffer {
    /// Page size in bytes for the given kind.
    pub fn page_size(kind: PageKind) -> usize {
        mmap::page_size(kind)
    }

    /// The system's standard page size.
    pub fn regular_page_size() -> usize {
        mmap::page_size(PageKind::Regular)
    }

    /// The system's huge page size.
    pub fn large_page_size() -> usize {
        mmap::page_size(PageKind::Large)
    }

    /// Maps `size` bytes with the requested page kind.
    ///
    /// The mapping is rounded up to whole pages; a zero `size` still maps one page
    /// so that the base pointer is always valid and aligned.
    ///
    /// # Errors
    ///
    /// Returns the OS error when the mapping cannot be created, and for
    /// `PageKind::Large` when huge pages are unavailable.
    pub fn allocate(size: usize, kind: PageKind) -> std::io::Result<PageBuffer> {
        if kind == PageKind::Large {
            check_and_enable_large_page_support()?;
        }
        let (ptr, capacity) = mmap::map(size, kind)?;
        debug_assert!((ptr.as_ptr() as usize).is_multiple_of(mmap::page_size(kind)));
        Ok(PageBuffer {
            ptr,
            len: size,
            capacity,
            kind,
        })
    }

    /// Maps `size` bytes using regular pages.
    pub fn allocate_regular(size: usize) -> std::io::Result<PageBuffer> {
        Self::allocate(size, PageKind::Regular)
    }

    /// Maps `size` bytes using huge pages.
    pub fn allocate_large_pages(size: usize) -> std::io::Result<PageBuffer> {
        Self::allocate(size, PageKind::Large)
    }

    /// Tries huge pages first and falls back to regular pages.
    pub fn allocate_with_fallback(size: usize) -> std::io::Result<PageBuffer> {
        match Self::allocate_large_pages(size) {
            Ok(buf) => Ok(buf),
            Err(e) => {
                log::debug!("large pages unavailable for {size} bytes ({e}), using regular pages");
                Self::allocate_regular(size)
            }
        }
    }

    /// Requested length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mapped length in bytes; always at least `len()` and at least one page.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Base address of the mapping. Never null.
    ///
    /// The pointer is valid for reads and writes of `capacity()` bytes until the
    /// buffer is dropped.
    #[inline]
    pub fn ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn kind(&self) -> PageKind {
        self.kind
    }

    #[inline]
    pub fn uses_large_pages(&self) -> bool {
        self.kind == PageKind::Large
    }

    /// Alignment of the base address, i.e. the page size of the mapping.
    #[inline]
    pub fn alignment(&self) -> usize {
        mmap::page_size(self.kind)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Reinterprets the first `len()` bytes as a slice of `T`.
    ///
    /// # Panics
    ///
    /// Panics if `len()` is not a multiple of `size_of::<T>()`.
    #[inline]
    pub fn as_slice<T>(&self) -> &[T]
    where
        T: bytemuck::AnyBitPattern,
    {
        bytemuck::cast_slice(self.as_bytes())
    }

    /// Mutable counterpart of [`PageBuffer::as_slice`].
    #[inline]
    pub fn as_mut_slice<T>(&mut self) -> &mut [T]
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        bytemuck::cast_slice_mut(self.as_bytes_mut())
    }
}

impl std::ops::Deref for PageBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl std::ops::DerefMut for PageBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_bytes_mut()
    }
}

impl Drop for PageBuffer {
    fn drop(&mut self) {
        if let Err(e) = unsafe { mmap::unmap(self.ptr, self.capacity, self.kind) } {
            log::warn!(
                "failed to release {} byte {:?} page mapping: {e}",
                self.capacity,
                self.kind
            );
        }
    }
}

// SAFETY: the mapping is exclusively owned and released exactly once on drop.
unsafe impl Send for PageBuffer {}

// SAFETY: shared access only exposes `&[u8]`; writes require `&mut self` or raw
// pointers whose synchronization is the caller's responsibility.
unsafe impl Sync for PageBuffer {}

impl std::fmt::Debug for PageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Checks once per process whether huge pages can be mapped.
///
/// The outcome of the first probe is cached; later calls return a copy of it.
pub fn check_and_enable_large_page_support() -> std::io::Result<()> {
    static RESULT: OnceLock<std::io::Result<()>> = OnceLock::new();
    match RESULT.get_or_init(probe_large_pages) {
        Ok(()) => Ok(()),
        Err(e) => Err(std::io::Error::new(e.kind(), e.to_string())),
    }
}

fn probe_large_pages() -> std::io::Result<()> {
    let probe = || -> std::io::Result<()> {
        let (ptr, capacity) = mmap::map(1, PageKind::Large)?;
        unsafe { mmap::unmap(ptr, capacity, PageKind::Large) }
    };
    if probe().is_err() {
        mmap::try_enable_large_pages()?;
        probe()
    } else {
        Ok(())
    }
}
