//! Page-granular memory blocks obtained directly from the operating system.
//!
//! [`PageBuffer`](page_buffer::PageBuffer) owns one mapped region and unmaps it on drop.
//! Regions are always zero-filled when handed out and aligned to the page size
//! they were mapped with.

pub mod page_buffer;

#[cfg_attr(target_os = "linux", path = "mmap_linux.rs")]
#[cfg_attr(not(target_os = "linux"), path = "mmap_fallback.rs")]
pub mod mmap;

pub use page_buffer::{PageBuffer, PageKind};

#[cfg(test)]
mod tests;
