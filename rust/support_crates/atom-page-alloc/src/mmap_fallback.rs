//! Page mapping emulated with page-aligned global allocations.

use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::ptr::NonNull;

use crate::page_buffer::PageKind;

/// Allocates at least `size` bytes (minimum one page), zero-filled and aligned
/// to the page size of `kind`.
pub fn map(size: usize, kind: PageKind) -> std::io::Result<(NonNull<u8>, usize)> {
    let layout = page_layout(size.max(1), kind)?;
    let ptr = unsafe { alloc_zeroed(layout) };
    NonNull::new(ptr)
        .map(|ptr| (ptr, layout.size()))
        .ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::OutOfMemory, "failed to allocate pages")
        })
}

/// Releases memory obtained from [`map`].
///
/// # Safety
///
/// `ptr` and `capacity` must be exactly what a previous [`map`] call with the
/// same `kind` returned, and the block must not have been released already.
pub unsafe fn unmap(ptr: NonNull<u8>, capacity: usize, kind: PageKind) -> std::io::Result<()> {
    let layout = page_layout(capacity, kind)?;
    unsafe {
        dealloc(ptr.as_ptr(), layout);
    }
    Ok(())
}

pub fn try_enable_large_pages() -> std::io::Result<()> {
    Ok(())
}

/// Emulated page size for the given kind.
pub fn page_size(kind: PageKind) -> usize {
    match kind {
        PageKind::Regular => 4 * 1024,
        PageKind::Large => 2 * 1024 * 1024,
    }
}

fn page_layout(size: usize, kind: PageKind) -> std::io::Result<Layout> {
    let page = page_size(kind);
    let capacity = size
        .checked_next_multiple_of(page)
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::OutOfMemory, "size overflow"))?;
    Layout::from_size_align(capacity, page)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid layout"))
}
