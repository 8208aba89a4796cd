//! Exclusively owned, zero-initialized backing storage for an arena.

use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::ptr::NonNull;

use atom_page_alloc::PageBuffer;

use crate::error::Error;
use crate::options::{ArenaOptions, Backing};
use crate::{Result, verify_arg};

/// Base address of a zero-capacity heap block.
const DANGLING_BASE: usize = 1 << (usize::BITS - 1);

/// A block from the global allocator with a fixed base alignment.
///
/// A zero-capacity block performs no allocation; its base is a dangling,
/// non-null pointer at the highest power of two, so it satisfies every alignment.
#[derive(Debug)]
pub(crate) struct HeapBuffer {
    ptr: NonNull<u8>,
    capacity: usize,
    alignment: usize,
}

impl HeapBuffer {
    pub fn allocate(capacity: usize, alignment: usize) -> Result<HeapBuffer> {
        verify_arg!(alignment, alignment.is_power_of_two());
        if capacity == 0 {
            let base = std::ptr::without_provenance_mut(DANGLING_BASE);
            // SAFETY: the address is non-zero.
            let ptr = unsafe { NonNull::new_unchecked(base) };
            return Ok(HeapBuffer {
                ptr,
                capacity,
                alignment,
            });
        }

        let layout = Layout::from_size_align(capacity, alignment)
            .map_err(|_| Error::allocation_failure(capacity, None))?;
        let ptr = NonNull::new(unsafe { alloc_zeroed(layout) })
            .ok_or_else(|| Error::allocation_failure(capacity, None))?;
        Ok(HeapBuffer {
            ptr,
            capacity,
            alignment,
        })
    }

    #[inline]
    pub fn ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }
}

impl Drop for HeapBuffer {
    fn drop(&mut self) {
        if self.capacity != 0 {
            unsafe {
                dealloc(
                    self.ptr.as_ptr(),
                    Layout::from_size_align_unchecked(self.capacity, self.alignment),
                );
            }
        }
    }
}

// SAFETY: the block is exclusively owned and freed exactly once on drop.
unsafe impl Send for HeapBuffer {}

/// The arena's backing storage, chosen by [`Backing`].
pub(crate) enum ArenaBuffer {
    Heap(HeapBuffer),
    Pages(PageBuffer),
}

impl ArenaBuffer {
    /// Obtains at least `options.capacity()` zero-filled bytes.
    pub fn allocate(options: &ArenaOptions) -> Result<ArenaBuffer> {
        let capacity = options.capacity();
        match options.backing() {
            Backing::Heap => {
                HeapBuffer::allocate(capacity, options.base_alignment()).map(ArenaBuffer::Heap)
            }
            Backing::Pages { large_pages } => {
                let pages = if large_pages {
                    PageBuffer::allocate_with_fallback(capacity)
                } else {
                    PageBuffer::allocate_regular(capacity)
                };
                pages
                    .map(ArenaBuffer::Pages)
                    .map_err(|e| Error::allocation_failure(capacity, Some(e)))
            }
        }
    }

    /// Base address, valid for reads and writes of the requested capacity.
    #[inline]
    pub fn ptr(&self) -> *mut u8 {
        match self {
            ArenaBuffer::Heap(heap) => heap.ptr(),
            ArenaBuffer::Pages(pages) => pages.ptr(),
        }
    }

    /// Alignment guaranteed for the base address.
    #[inline]
    pub fn alignment(&self) -> usize {
        match self {
            ArenaBuffer::Heap(heap) => heap.alignment(),
            ArenaBuffer::Pages(pages) => pages.alignment(),
        }
    }

    pub fn backing(&self) -> Backing {
        match self {
            ArenaBuffer::Heap(_) => Backing::Heap,
            ArenaBuffer::Pages(pages) => Backing::Pages {
                large_pages: pages.uses_large_pages(),
            },
        }
    }
}
