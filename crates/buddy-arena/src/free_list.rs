//! Arena byte storage and the intrusive circular free list.
//!
//! [`BlockBuffer`] owns the arena's bytes. Block headers live inside those
//! bytes and are read and written through `bytemuck` casts, so the crate
//! needs no `unsafe`. Free blocks are threaded into a circular doubly-linked
//! list through the `next`/`prev` fields of their headers.

use crate::header::{BlockHeader, HEADER_SIZE};

/// Alignment guaranteed for every payload handed out by the arena.
///
/// The buffer is backed by `u64` words, and every block offset is a
/// multiple of the block size (at least [`HEADER_SIZE`]), so payloads sit
/// at `8`-aligned addresses.
pub const MAX_ELEMENT_ALIGN: usize = std::mem::align_of::<u64>();

/// Owned, zero-initialised backing storage for one arena.
pub(crate) struct BlockBuffer {
    words: Vec<u64>,
}

impl BlockBuffer {
    /// Allocate `len_bytes` of zeroed storage. `len_bytes` is a power of two
    /// no smaller than [`HEADER_SIZE`].
    pub(crate) fn zeroed(len_bytes: usize) -> Self {
        Self {
            words: vec![0; len_bytes / std::mem::size_of::<u64>()],
        }
    }

    pub(crate) fn len_bytes(&self) -> usize {
        self.words.len() * std::mem::size_of::<u64>()
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.words)
    }

    /// Copy of the header at `offset`.
    pub(crate) fn header(&self, offset: u32) -> BlockHeader {
        let start = offset as usize;
        *bytemuck::from_bytes(&self.bytes()[start..start + HEADER_SIZE])
    }

    /// Mutable view of the header at `offset`.
    pub(crate) fn header_mut(&mut self, offset: u32) -> &mut BlockHeader {
        let start = offset as usize;
        bytemuck::from_bytes_mut(&mut self.bytes_mut()[start..start + HEADER_SIZE])
    }

    /// Block size recorded at `offset`.
    pub(crate) fn size(&self, offset: u32) -> u32 {
        self.header(offset).size
    }

    /// Make `offset` the only node of a one-element circular list.
    pub(crate) fn link_alone(&mut self, offset: u32) {
        let h = self.header_mut(offset);
        h.next = offset;
        h.prev = offset;
    }

    /// Insert `offset` immediately after `anchor`.
    pub(crate) fn link_after(&mut self, anchor: u32, offset: u32) {
        let next = self.header(anchor).next;
        {
            let h = self.header_mut(offset);
            h.prev = anchor;
            h.next = next;
        }
        self.header_mut(anchor).next = offset;
        self.header_mut(next).prev = offset;
    }

    /// Insert `offset` immediately before `anchor`.
    pub(crate) fn link_before(&mut self, anchor: u32, offset: u32) {
        let prev = self.header(anchor).prev;
        self.link_after(prev, offset);
    }

    /// Splice `offset` out of its list.
    ///
    /// Returns a node still in the list, or `None` if `offset` was the
    /// only one.
    pub(crate) fn unlink(&mut self, offset: u32) -> Option<u32> {
        let h = self.header(offset);
        if h.next == offset {
            return None;
        }
        self.header_mut(h.prev).next = h.next;
        self.header_mut(h.next).prev = h.prev;
        Some(h.next)
    }

    /// Walk the circular list once, starting at `anchor`.
    pub(crate) fn iter(&self, anchor: Option<u32>) -> FreeListIter<'_> {
        FreeListIter {
            buffer: self,
            start: anchor.unwrap_or(0),
            current: anchor,
            // No list can hold more nodes than there are header-sized slots.
            budget: self.len_bytes() / HEADER_SIZE,
        }
    }
}

/// Iterator over the offsets of a circular free list.
///
/// Visits each node at most once and always terminates, even if the
/// links have been corrupted.
pub(crate) struct FreeListIter<'a> {
    buffer: &'a BlockBuffer,
    start: u32,
    current: Option<u32>,
    budget: usize,
}

impl Iterator for FreeListIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let offset = self.current?;
        if self.budget == 0 {
            self.current = None;
            return None;
        }
        self.budget -= 1;
        let next = self.buffer.header(offset).next;
        self.current = (next != self.start).then_some(next);
        Some(offset)
    }
}
