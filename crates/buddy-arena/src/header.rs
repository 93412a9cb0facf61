//! In-place block headers (boundary tags).
//!
//! Every block, free or allocated, begins with a [`BlockHeader`]. The
//! header is stored inside the arena buffer itself, so the payload handed
//! to callers starts exactly [`HEADER_SIZE`] bytes after the block start.

use bytemuck::{Pod, Zeroable};

/// Tag value marking a free block.
pub const TAG_FREE: u32 = 0xB0B5_DEAD;

/// Tag value marking an allocated block.
pub const TAG_ALLOCATED: u32 = 0xDEAD_BEEF;

/// Size of a block header in bytes.
pub const HEADER_SIZE: usize = std::mem::size_of::<BlockHeader>();

/// Metadata prefix of every block.
///
/// All offsets are byte offsets from the start of the arena. `next` and
/// `prev` are only meaningful while the block is free.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct BlockHeader {
    /// [`TAG_FREE`] or [`TAG_ALLOCATED`]; anything else is corruption.
    pub tag: u32,
    /// Total block size in bytes, header included. Always a power of two.
    pub size: u32,
    /// Next free block in the circular free list.
    pub next: u32,
    /// Previous free block in the circular free list.
    pub prev: u32,
}

/// Decoded allocation state of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
    /// On the free list.
    Free,
    /// Handed out to a caller.
    Allocated,
}

impl BlockHeader {
    /// A free-block header with the given links.
    pub fn free(size: u32, next: u32, prev: u32) -> Self {
        Self {
            tag: TAG_FREE,
            size,
            next,
            prev,
        }
    }

    /// Decode the tag. `None` means the header is corrupt or was absorbed
    /// by a merge.
    pub fn state(&self) -> Option<BlockState> {
        match self.tag {
            TAG_FREE => Some(BlockState::Free),
            TAG_ALLOCATED => Some(BlockState::Allocated),
            _ => None,
        }
    }

    /// Whether the tag marks this block free.
    pub fn is_free(&self) -> bool {
        self.tag == TAG_FREE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_sixteen_bytes() {
        assert_eq!(HEADER_SIZE, 16);
        assert_eq!(std::mem::align_of::<BlockHeader>(), 4);
    }

    #[test]
    fn tags_decode() {
        let mut h = BlockHeader::free(64, 0, 0);
        assert_eq!(h.state(), Some(BlockState::Free));
        assert!(h.is_free());
        h.tag = TAG_ALLOCATED;
        assert_eq!(h.state(), Some(BlockState::Allocated));
        assert!(!h.is_free());
    }

    #[test]
    fn zeroed_header_is_not_a_block() {
        assert_eq!(BlockHeader::zeroed().state(), None);
        assert_eq!(BlockHeader { tag: 7, ..BlockHeader::default() }.state(), None);
    }

    #[test]
    fn header_bytes_are_native_u32_fields() {
        let h = BlockHeader::free(1024, 32, 64);
        let bytes = bytemuck::bytes_of(&h);
        assert_eq!(&bytes[4..8], &1024u32.to_ne_bytes());
        assert_eq!(&bytes[8..12], &32u32.to_ne_bytes());
    }
}
