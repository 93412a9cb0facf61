//! Allocation handles.
//!
//! An [`Allocation`] is what [`Arena::allocate`](crate::Arena::allocate)
//! hands out in place of a raw pointer: the byte offset of the payload
//! inside the arena plus the element count that was requested.

use std::fmt;

use crate::header::HEADER_SIZE;

/// Location of a live allocation within an arena.
///
/// Handles are plain values. They stay meaningful only between the
/// `allocate` that produced them and the matching `deallocate`, and only
/// for the arena that produced them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Allocation {
    /// Byte offset of the payload (just past the block header).
    pub(crate) offset: u32,
    /// Number of elements requested.
    pub(crate) len: u32,
}

impl Allocation {
    pub(crate) fn new(block_offset: u32, len: u32) -> Self {
        Self {
            offset: block_offset + HEADER_SIZE as u32,
            len,
        }
    }

    /// Byte offset of the payload from the start of the arena.
    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    /// Byte offset of the block header that precedes the payload.
    pub fn block_offset(&self) -> usize {
        self.offset as usize - HEADER_SIZE
    }

    /// Number of elements requested.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether zero elements were requested.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Allocation(off={}, len={})", self.offset, self.len)
    }
}
