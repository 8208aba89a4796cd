//! Fixed-capacity bump allocator.
//!
//! An [`Arena`] owns one contiguous, zero-initialized buffer and carves
//! non-overlapping regions out of it by advancing a single cursor. Individual
//! regions are never freed; [`Arena::reset`] reclaims all of them at once.
//!
//! Allocation works through `&self` and every returned view or slice borrows the
//! arena. `reset` and drop take the arena exclusively, so no allocation can be
//! used after either:
//!
//! ```compile_fail
//! let mut arena = atom_mem::Arena::new(64).unwrap();
//! let bytes = arena.alloc_bytes(8, 1).unwrap();
//! arena.reset();
//! bytes[0] = 1;
//! ```
//!
//! The cursor is a `Cell`, so an arena can be moved to another thread but not
//! shared between threads:
//!
//! ```compile_fail
//! fn assert_sync<T: Sync>() {}
//! assert_sync::<atom_mem::Arena>();
//! ```

use std::cell::Cell;

use crate::buffer::ArenaBuffer;
use crate::error::Error;
use crate::memory::Memory;
use crate::options::{ArenaOptions, Backing};
use crate::{Result, align, verify_arg};

/// A fixed-capacity buffer that hands out regions by bumping a cursor.
pub struct Arena {
    buffer: ArenaBuffer,
    capacity: usize,
    /// Allocation cursor, `0 <= offset <= capacity`.
    offset: Cell<usize>,
    scrub_on_reset: bool,
}

impl Arena {
    /// Creates an arena of `capacity` bytes backed by the global allocator.
    ///
    /// A zero capacity is allowed; such an arena performs no system allocation and
    /// can only satisfy zero-sized requests.
    ///
    /// # Errors
    ///
    /// `AllocationFailure` if the buffer cannot be obtained.
    pub fn new(capacity: usize) -> Result<Arena> {
        Arena::with_options(ArenaOptions::new(capacity))
    }

    /// Creates an arena as described by `options`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for invalid options, `AllocationFailure` if the buffer
    /// cannot be obtained.
    pub fn with_options(options: ArenaOptions) -> Result<Arena> {
        options.validate()?;
        let buffer = ArenaBuffer::allocate(&options)?;
        log::debug!(
            "arena created: capacity={} backing={:?} base_alignment={}",
            options.capacity(),
            buffer.backing(),
            buffer.alignment()
        );
        Ok(Arena {
            buffer,
            capacity: options.capacity(),
            offset: Cell::new(0),
            scrub_on_reset: options.scrub_on_reset(),
        })
    }

    /// Reserves `size` bytes aligned to `alignment` and returns a view of them.
    ///
    /// The returned view has `count == 1`. Previously returned regions are never
    /// moved. A zero `size` yields an empty view at the aligned cursor; the cursor
    /// only moves by the alignment padding.
    ///
    /// Padding is computed on the absolute address, so the returned start is
    /// always a multiple of `alignment`. For alignments up to
    /// [`Arena::base_alignment`] this places the region at
    /// `align_up(bytes_used(), alignment)`. Larger alignments may need more
    /// padding than that, depending on where the buffer landed: an arena of 16
    /// bytes can fail `allocate(8, 4096)` even though 16 bytes remain.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `alignment` is not a power of two.
    /// - `OutOfMemory` if the aligned request does not fit in the remaining
    ///   capacity.
    ///
    /// The arena is left unchanged on error.
    pub fn allocate(&self, size: usize, alignment: usize) -> Result<Memory<'_>> {
        let start = self.bump(size, alignment)?;
        Ok(Memory::new(start, size, 1))
    }

    /// Reserves room for `count` values of `T` and returns a view with that
    /// element count.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the byte size overflows `usize`, otherwise as
    /// [`Arena::allocate`].
    pub fn allocate_array<T>(&self, count: usize) -> Result<Memory<'_>> {
        let size = array_size::<T>(count)?;
        let start = self.bump(size, std::mem::align_of::<T>())?;
        Ok(Memory::new(start, size, count))
    }

    /// Reserves `size` bytes aligned to `alignment` and borrows them mutably.
    ///
    /// The bytes hold whatever was written there before the last reset (zeros
    /// for a fresh arena).
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_bytes(&self, size: usize, alignment: usize) -> Result<&mut [u8]> {
        let start = self.bump(size, alignment)?;
        // SAFETY: `bump` returned a fresh, in-bounds, non-null region that no other
        // live borrow covers, and the backing buffer is always initialized.
        Ok(unsafe { std::slice::from_raw_parts_mut(start, size) })
    }

    /// Reserves room for `count` values of `T` and borrows them mutably.
    ///
    /// The contents are stale bytes from before the last reset reinterpreted as
    /// `T`; use [`Arena::alloc_slice_zeroed`] for zeroed values.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice<T>(&self, count: usize) -> Result<&mut [T]>
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        let size = array_size::<T>(count)?;
        let start = self.bump(size, std::mem::align_of::<T>())?;
        // SAFETY: as in `alloc_bytes`; `start` is aligned for `T`, and any bit
        // pattern is a valid `T`.
        Ok(unsafe { std::slice::from_raw_parts_mut(start as *mut T, count) })
    }

    /// Like [`Arena::alloc_slice`], with every value zeroed.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_zeroed<T>(&self, count: usize) -> Result<&mut [T]>
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        let slice = self.alloc_slice::<T>(count)?;
        bytemuck::fill_zeroes(slice);
        Ok(slice)
    }

    /// Copies `src` into the arena.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_copy<T>(&self, src: &[T]) -> Result<&mut [T]>
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        let slice = self.alloc_slice::<T>(src.len())?;
        slice.copy_from_slice(src);
        Ok(slice)
    }

    /// Moves `value` into the arena.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_value<T>(&self, value: T) -> Result<&mut T>
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        let slice = self.alloc_slice::<T>(1)?;
        slice[0] = value;
        Ok(&mut slice[0])
    }

    /// Makes the whole capacity available again.
    ///
    /// The buffer is neither freed nor, unless configured with
    /// [`ArenaOptions::with_scrub_on_reset`], cleared.
    pub fn reset(&mut self) {
        let used = self.offset.get();
        if self.scrub_on_reset && used != 0 {
            // SAFETY: `[0, used)` lies inside the buffer and `&mut self` rules out
            // any live borrow of it.
            unsafe { self.buffer.ptr().write_bytes(0, used) };
        }
        self.offset.set(0);
        log::trace!("arena reset: reclaimed {used} of {} bytes", self.capacity);
    }

    #[inline]
    pub fn bytes_used(&self) -> usize {
        self.offset.get()
    }

    #[inline]
    pub fn bytes_remaining(&self) -> usize {
        self.capacity - self.offset.get()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offset.get() == 0
    }

    /// Alignment of the buffer's base address.
    #[inline]
    pub fn base_alignment(&self) -> usize {
        self.buffer.alignment()
    }

    /// The backing actually in use; a `Pages { large_pages: true }` request that
    /// fell back to regular pages reports `large_pages: false`.
    pub fn backing(&self) -> Backing {
        self.buffer.backing()
    }

    /// `true` if `memory` lies entirely inside this arena's buffer.
    pub fn contains(&self, memory: &Memory<'_>) -> bool {
        let base = self.buffer.ptr() as usize;
        let range = memory.address_range();
        range.start >= base && range.start <= range.end && range.end <= base + self.capacity
    }

    /// Borrows the bytes allocated since the last reset.
    pub fn used_bytes(&mut self) -> &[u8] {
        // SAFETY: `[0, offset)` is in bounds and initialized; `&mut self` rules out
        // any outstanding mutable borrow.
        unsafe { std::slice::from_raw_parts(self.buffer.ptr(), self.offset.get()) }
    }

    /// Advances the cursor past an aligned region of `size` bytes and returns its
    /// start address. Leaves the cursor untouched on error.
    fn bump(&self, size: usize, alignment: usize) -> Result<*mut u8> {
        verify_arg!(alignment, alignment.is_power_of_two());

        let base = self.buffer.ptr() as usize;
        let offset = self.offset.get();
        // Align the absolute address so the result honours `alignment` even when
        // it exceeds the base alignment.
        let start = base
            .checked_add(offset)
            .and_then(|addr| align::checked_align_up(addr, alignment))
            .map(|addr| addr - base);
        let end = start
            .and_then(|start| start.checked_add(size))
            .filter(|&end| end <= self.capacity);

        match (start, end) {
            (Some(start), Some(end)) => {
                self.offset.set(end);
                // SAFETY: `start <= end <= capacity`, so the pointer stays within
                // (or one past the end of) the buffer.
                Ok(unsafe { self.buffer.ptr().add(start) })
            }
            _ => Err(Error::out_of_memory(size, alignment, self.bytes_remaining())),
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        log::debug!(
            "arena released: capacity={} in_use={}",
            self.capacity,
            self.offset.get()
        );
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("offset", &self.offset.get())
            .field("backing", &self.backing())
            .field("base_alignment", &self.base_alignment())
            .finish_non_exhaustive()
    }
}

fn array_size<T>(count: usize) -> Result<usize> {
    std::mem::size_of::<T>()
        .checked_mul(count)
        .ok_or_else(|| Error::invalid_arg("count", "size_of::<T>() * count overflows usize"))
}
