//! Arena (bump) allocation over a single owned buffer.
//!
//! - [`Arena`] owns a fixed-capacity, zero-initialized buffer and hands out
//!   non-overlapping, aligned regions in constant time. [`Arena::reset`] reclaims
//!   every region at once.
//! - [`Memory`] is the non-owning descriptor of a region (start, size, element
//!   count) returned by [`Arena::allocate`].
//!
//! ```
//! use atom_mem::Arena;
//!
//! let mut arena = Arena::new(64).unwrap();
//! let a = arena.allocate(10, 1).unwrap();
//! let b = arena.allocate(10, 1).unwrap();
//! assert!(!a.overlaps(&b));
//! assert_eq!(arena.bytes_used(), 20);
//!
//! assert!(arena.allocate(50, 1).unwrap_err().is_out_of_memory());
//! assert_eq!(arena.bytes_used(), 20);
//!
//! arena.reset();
//! assert_eq!(arena.allocate(64, 1).unwrap().size(), 64);
//! ```
//!
//! The arena performs no internal locking. It is `Send` but not `Sync`: use one
//! arena per thread, or guard a shared one with a lock.

pub mod align;
pub mod arena;
mod buffer;
pub mod error;
pub mod memory;
pub mod options;
pub mod result;

pub use arena::Arena;
pub use error::{Error, ErrorKind};
pub use memory::Memory;
pub use options::{ArenaOptions, Backing};
pub use result::Result;
