//! Construction-time configuration for [`Arena`].

use std::alloc::Layout;

use crate::error::Error;
use crate::{Arena, Result, verify_arg};

/// Where the arena's backing buffer comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Backing {
    /// A block from the global allocator, aligned to
    /// [`ArenaOptions::base_alignment`].
    #[default]
    Heap,
    /// An anonymous page mapping. With `large_pages` the arena tries huge pages
    /// first and falls back to regular pages when they are unavailable.
    Pages { large_pages: bool },
}

/// Builder for an [`Arena`].
///
/// ```
/// use atom_mem::{ArenaOptions, Backing};
///
/// let arena = ArenaOptions::new(4096)
///     .with_backing(Backing::Pages { large_pages: false })
///     .with_scrub_on_reset(true)
///     .build()
///     .unwrap();
/// assert_eq!(arena.capacity(), 4096);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaOptions {
    capacity: usize,
    backing: Backing,
    base_alignment: usize,
    scrub_on_reset: bool,
}

impl ArenaOptions {
    /// Default alignment of a heap backing buffer.
    pub const DEFAULT_BASE_ALIGNMENT: usize = 64;

    /// Options for an arena of `capacity` bytes with heap backing.
    pub fn new(capacity: usize) -> ArenaOptions {
        ArenaOptions {
            capacity,
            backing: Backing::Heap,
            base_alignment: Self::DEFAULT_BASE_ALIGNMENT,
            scrub_on_reset: false,
        }
    }

    pub fn with_backing(mut self, backing: Backing) -> ArenaOptions {
        self.backing = backing;
        self
    }

    /// Alignment of the heap block's base address. Must be a power of two.
    ///
    /// Requests aligned to at most this value are placed exactly at
    /// `align_up(offset, alignment)`. Ignored for page backing, whose base is
    /// always page-aligned.
    pub fn with_base_alignment(mut self, base_alignment: usize) -> ArenaOptions {
        self.base_alignment = base_alignment;
        self
    }

    /// Zero-fill the used part of the buffer on every reset.
    ///
    /// This makes `reset` proportional to the bytes in use instead of constant.
    pub fn with_scrub_on_reset(mut self, scrub: bool) -> ArenaOptions {
        self.scrub_on_reset = scrub;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn backing(&self) -> Backing {
        self.backing
    }

    pub fn base_alignment(&self) -> usize {
        self.base_alignment
    }

    pub fn scrub_on_reset(&self) -> bool {
        self.scrub_on_reset
    }

    /// Checks the options without allocating anything.
    ///
    /// A heap `base_alignment` is rejected when it alone makes the block
    /// unrepresentable; a capacity too large for any layout is left to fail as
    /// `AllocationFailure`.
    pub fn validate(&self) -> Result<()> {
        let base_alignment = self.base_alignment;
        verify_arg!(base_alignment, base_alignment.is_power_of_two());
        if self.backing == Backing::Heap
            && Layout::from_size_align(self.capacity, 1).is_ok()
            && Layout::from_size_align(self.capacity, base_alignment).is_err()
        {
            return Err(Error::invalid_arg(
                "base_alignment",
                "too large for the requested capacity",
            ));
        }
        Ok(())
    }

    /// Allocates the backing buffer and returns the arena.
    pub fn build(self) -> Result<Arena> {
        Arena::with_options(self)
    }
}
