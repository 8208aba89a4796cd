//! Anonymous private mappings via `mmap(2)`.

use std::ptr::NonNull;
use std::sync::OnceLock;

use crate::page_buffer::PageKind;

/// Maps at least `size` bytes (minimum one page) of zero-filled, read-write memory.
///
/// Returns the base pointer and the mapped capacity, which is `size` rounded up
/// to a multiple of the page size of `kind`.
///
/// `PageKind::Large` maps with `MAP_HUGETLB` and only succeeds when huge pages
/// are configured on the host, e.g. through `/proc/sys/vm/nr_hugepages` or
/// `/proc/sys/vm/nr_overcommit_hugepages`.
pub fn map(size: usize, kind: PageKind) -> std::io::Result<(NonNull<u8>, usize)> {
    let capacity = round_to_pages(size, kind)?;
    let mut flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
    if kind == PageKind::Large {
        flags |= libc::MAP_HUGETLB;
    }
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            capacity,
            libc::PROT_READ | libc::PROT_WRITE,
            flags,
            -1,
            0,
        )
    };
    if ptr == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    NonNull::new(ptr as *mut u8)
        .map(|ptr| (ptr, capacity))
        .ok_or_else(|| std::io::Error::other("mmap returned a null mapping"))
}

/// Releases a mapping created by [`map`].
///
/// # Safety
///
/// `ptr` and `capacity` must be exactly what a previous [`map`] call returned,
/// the mapping must not have been released already, and no reference into it
/// may outlive this call.
pub unsafe fn unmap(ptr: NonNull<u8>, capacity: usize, _kind: PageKind) -> std::io::Result<()> {
    let res = unsafe { libc::munmap(ptr.as_ptr() as *mut libc::c_void, capacity) };
    if res < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Huge page support is configured administratively on Linux; there is nothing
/// the process can switch on by itself.
pub fn try_enable_large_pages() -> std::io::Result<()> {
    Ok(())
}

/// Page size in bytes for the given kind, cached after the first query.
pub fn page_size(kind: PageKind) -> usize {
    match kind {
        PageKind::Regular => regular_page_size(),
        PageKind::Large => large_page_size(),
    }
}

fn regular_page_size() -> usize {
    static SIZE: OnceLock<usize> = OnceLock::new();
    *SIZE.get_or_init(|| read_page_size().unwrap_or(4 * 1024))
}

fn large_page_size() -> usize {
    static SIZE: OnceLock<usize> = OnceLock::new();
    *SIZE.get_or_init(|| read_large_page_size().unwrap_or(2 * 1024 * 1024))
}

fn round_to_pages(size: usize, kind: PageKind) -> std::io::Result<usize> {
    let page = page_size(kind);
    debug_assert!(page.is_power_of_two());
    size.max(1)
        .checked_next_multiple_of(page)
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::OutOfMemory, "size overflow"))
}

fn read_page_size() -> std::io::Result<usize> {
    let res = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if res <= 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(res as usize)
}

/// Parses the `Hugepagesize:     2048 kB` line of `/proc/meminfo`.
fn read_large_page_size() -> std::io::Result<usize> {
    let meminfo = std::fs::read_to_string("/proc/meminfo")?;
    meminfo
        .lines()
        .find_map(|line| line.strip_prefix("Hugepagesize:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse::<usize>().ok())
        .map(|kb| kb * 1024)
        .ok_or_else(|| std::io::Error::other("Hugepagesize not found in /proc/meminfo"))
}
