//! Fixed-capacity power-of-two buddy allocation over a single owned arena.
//!
//! One contiguous buffer is reserved at construction and carved into
//! power-of-two blocks on demand. Blocks are split on allocation and
//! merged with their buddies on release; the buffer is never resized and
//! individual blocks are never returned to the system allocator.
//!
//! # Architecture
//!
//! ```text
//! Arena<T>
//! ├── BlockBuffer (Vec<u64>, power-of-two bytes, zero-initialised)
//! │   └── [BlockHeader | payload][BlockHeader | payload] ...
//! ├── free_head → largest free block
//! │   └── circular, address-ordered free list threaded through headers
//! └── Counters (allocations, splits, merges, exhaustions)
//! ```
//!
//! # Example
//!
//! ```rust
//! use buddy_arena::{Arena, ArenaError};
//!
//! let mut arena = Arena::<u32>::new(5000);
//! assert_eq!(arena.capacity(), 8192);
//!
//! let a = arena.allocate(3)?;
//! arena.get_mut(&a).copy_from_slice(&[42, 37, 24]);
//! assert_eq!(arena.get(&a), &[42, 37, 24]);
//!
//! arena.deallocate(a);
//! assert!(arena.is_pristine());
//! # Ok::<(), ArenaError>(())
//! ```
//!
//! # Safety
//!
//! Block headers live inside the buffer and are accessed through
//! `bytemuck` casts, so the crate contains no `unsafe`. Elements must be
//! [`bytemuck::Pod`], non-zero-sized, and at most 8-byte aligned.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
mod free_list;
pub mod handle;
pub mod header;
pub mod stats;

// Public re-exports for the primary API surface.
pub use arena::{Arena, FreeBlock};
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use free_list::MAX_ELEMENT_ALIGN;
pub use handle::Allocation;
pub use header::HEADER_SIZE;
pub use stats::ArenaStats;
