//! The buddy arena: allocation, splitting, release, and coalescing.
//!
//! The arena is one power-of-two byte buffer carved into power-of-two
//! blocks. Every block starts with a [`BlockHeader`]; free blocks are
//! threaded into a circular, address-ordered doubly-linked list whose
//! anchor (`free_head`) is always a largest free block.
//!
//! # Allocation
//!
//! 1. `required = next_power_of_two(count * size_of::<T>() + HEADER_SIZE)`.
//! 2. Fail fast if the anchor is smaller than `required`.
//! 3. One pass around the free list picks the smallest block that fits
//!    (first in list order on ties).
//! 4. While the block is more than twice `required`, halve it and keep
//!    splitting the upper half. The lower halves stay on the free list.
//! 5. Unlink the final block, tag it allocated, return its payload.
//!
//! # Release
//!
//! The freed block is inserted before the next free block by address
//! (wrapping at the arena end), then merged with its buddy for as long as
//! the buddy is free, of equal size, and adjacent in the list. Merging
//! works in both directions, so freeing everything always restores the
//! single whole-arena block.

use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use tracing::{debug, trace};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::free_list::{BlockBuffer, MAX_ELEMENT_ALIGN};
use crate::handle::Allocation;
use crate::header::{BlockHeader, BlockState, HEADER_SIZE, TAG_ALLOCATED, TAG_FREE};
use crate::stats::{ArenaStats, Counters};

/// A block currently on the free list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeBlock {
    /// Byte offset of the block header.
    pub offset: usize,
    /// Block size in bytes, header included.
    pub size: usize,
}

/// Fixed-capacity buddy allocator for elements of type `T`.
///
/// Owns a single zero-initialised buffer for its whole lifetime. Storage
/// is handed out as [`Allocation`] handles and resolved to `&[T]` /
/// `&mut [T]` through [`Arena::get`] and [`Arena::get_mut`].
///
/// Not synchronised: share across threads only behind a lock.
pub struct Arena<T> {
    blocks: BlockBuffer,
    /// A largest free block, or `None` when everything is allocated.
    free_head: Option<u32>,
    counters: Counters,
    _element: PhantomData<T>,
}

impl<T: Pod> Arena<T> {
    const LAYOUT_CHECK: () = assert!(
        size_of::<T>() > 0 && align_of::<T>() <= MAX_ELEMENT_ALIGN,
        "arena elements must be non-zero-sized and at most 8-byte aligned"
    );

    /// Create an arena sized for `requested_elements` elements.
    ///
    /// Capacity is `max(1024, next_power_of_two(requested_elements))`
    /// element slots.
    ///
    /// The count is a `u32` because block headers store sizes and links as
    /// 32-bit offsets, which caps an arena at 2^31 bytes. [`allocate`]
    /// takes a `usize` so any caller length can be asked for; counts the
    /// arena cannot hold come back as [`ArenaError::CapacityExhausted`].
    ///
    /// [`allocate`]: Self::allocate
    ///
    /// # Panics
    ///
    /// Panics if the resulting arena would exceed
    /// [`ArenaConfig::MAX_CAPACITY_BYTES`].
    pub fn new(requested_elements: u32) -> Self {
        match Self::with_config(ArenaConfig::new(requested_elements)) {
            Ok(arena) => arena,
            Err(e) => panic!("{e}"),
        }
    }

    /// Create an arena from an explicit configuration.
    pub fn with_config(config: ArenaConfig) -> Result<Self, ArenaError> {
        let () = Self::LAYOUT_CHECK;
        let capacity_bytes = config.validate(size_of::<T>())?;
        let mut blocks = BlockBuffer::zeroed(capacity_bytes);
        // validate() caps the size at 2^31, which fits the header field.
        *blocks.header_mut(0) = BlockHeader::free(capacity_bytes as u32, 0, 0);
        debug!(
            capacity_bytes,
            element_size = size_of::<T>(),
            "buddy arena created"
        );
        Ok(Self {
            blocks,
            free_head: Some(0),
            counters: Counters::default(),
            _element: PhantomData,
        })
    }

    /// Total capacity in elements.
    pub fn capacity(&self) -> usize {
        self.capacity_bytes() / size_of::<T>()
    }

    /// Total capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.blocks.len_bytes()
    }

    /// Largest element count a single request can get from an empty arena.
    ///
    /// Smaller than [`capacity`](Self::capacity) because every block
    /// carries a header.
    pub fn max_request(&self) -> usize {
        (self.capacity_bytes() - HEADER_SIZE) / size_of::<T>()
    }

    /// Reserve storage for `count` elements.
    ///
    /// Returns [`ArenaError::CapacityExhausted`] if no free block is large
    /// enough. A failed call leaves the arena untouched.
    pub fn allocate(&mut self, count: usize) -> Result<Allocation, ArenaError> {
        let needed = count
            .checked_mul(size_of::<T>())
            .and_then(|bytes| bytes.checked_add(HEADER_SIZE))
            .unwrap_or(usize::MAX);
        let required = needed.checked_next_power_of_two().unwrap_or(usize::MAX);

        let head = match self.free_head {
            Some(head) if required <= self.blocks.size(head) as usize => head,
            _ => return Err(self.exhausted(needed)),
        };
        // Bounded by the anchor's size, so it fits the header field.
        let required = required as u32;

        // The anchor itself qualifies, so the search cannot come back empty.
        let chosen = self.best_fit(head, required).unwrap_or(head);

        let mut block = chosen;
        while self.blocks.size(block) / 2 > required {
            let half = self.blocks.size(block) / 2;
            let upper = block + half;
            self.blocks.header_mut(block).size = half;
            *self.blocks.header_mut(upper) = BlockHeader::free(half, upper, upper);
            self.blocks.link_after(block, upper);
            self.counters.splits += 1;
            trace!(block, upper, half, "split block");
            block = upper;
        }

        let survivor = self.blocks.unlink(block);
        self.blocks.header_mut(block).tag = TAG_ALLOCATED;
        if chosen == head {
            self.free_head = survivor.and_then(|s| self.largest_free_from(s));
        }

        self.counters.allocations += 1;
        trace!(block, size = self.blocks.size(block), count, "allocated block");
        // needed <= 2^31, so count does too.
        Ok(Allocation::new(block, count as u32))
    }

    /// Return storage obtained from [`allocate`](Self::allocate).
    ///
    /// # Panics
    ///
    /// Panics if `allocation` is not a live allocation of this arena
    /// (already released, or from another arena).
    pub fn deallocate(&mut self, allocation: Allocation) {
        let Some(block) = self.live_block(&allocation) else {
            panic!("release of {allocation}, which is not a live allocation of this arena");
        };
        self.blocks.header_mut(block).tag = TAG_FREE;
        self.counters.deallocations += 1;
        trace!(block, size = self.blocks.size(block), "released block");

        if self.free_head.is_none() {
            self.blocks.link_alone(block);
            self.free_head = Some(block);
            return;
        }

        let successor = self.next_free_by_address(block);
        self.blocks.link_before(successor, block);
        let merged = self.coalesce(block);

        let merged_size = self.blocks.size(merged);
        if self
            .free_head
            .map_or(true, |head| merged_size > self.blocks.size(head))
        {
            self.free_head = Some(merged);
        }
    }

    /// Typed view of an allocation's storage.
    ///
    /// # Panics
    ///
    /// Panics if `allocation` is not a live allocation of this arena.
    pub fn get(&self, allocation: &Allocation) -> &[T] {
        let range = self.payload_range(allocation);
        bytemuck::cast_slice(&self.blocks.bytes()[range])
    }

    /// Mutable typed view of an allocation's storage.
    ///
    /// # Panics
    ///
    /// Panics if `allocation` is not a live allocation of this arena.
    pub fn get_mut(&mut self, allocation: &Allocation) -> &mut [T] {
        let range = self.payload_range(allocation);
        bytemuck::cast_slice_mut(&mut self.blocks.bytes_mut()[range])
    }

    /// Size in bytes of the block backing `allocation`, header included.
    ///
    /// # Panics
    ///
    /// Panics if `allocation` is not a live allocation of this arena.
    pub fn block_size(&self, allocation: &Allocation) -> usize {
        let block = self.checked_block(allocation);
        self.blocks.size(block) as usize
    }

    /// Free blocks in list order, starting at the largest-block anchor.
    pub fn free_blocks(&self) -> impl Iterator<Item = FreeBlock> + '_ {
        self.blocks.iter(self.free_head).map(|offset| FreeBlock {
            offset: offset as usize,
            size: self.blocks.size(offset) as usize,
        })
    }

    /// Number of blocks on the free list.
    pub fn free_block_count(&self) -> usize {
        self.blocks.iter(self.free_head).count()
    }

    /// Size of the largest free block in bytes (0 if nothing is free).
    pub fn largest_free_block(&self) -> usize {
        self.free_head
            .map_or(0, |head| self.blocks.size(head) as usize)
    }

    /// Whether the arena is one free block spanning the whole buffer.
    pub fn is_pristine(&self) -> bool {
        self.free_head == Some(0) && self.largest_free_block() == self.capacity_bytes()
    }

    /// Occupancy snapshot plus cumulative counters.
    pub fn stats(&self) -> ArenaStats {
        let mut free_bytes = 0;
        let mut free_blocks = 0;
        for block in self.free_blocks() {
            free_bytes += block.size;
            free_blocks += 1;
        }
        ArenaStats {
            capacity_bytes: self.capacity_bytes(),
            free_bytes,
            allocated_bytes: self.capacity_bytes() - free_bytes,
            free_blocks,
            largest_free_block: self.largest_free_block(),
            allocations: self.counters.allocations,
            deallocations: self.counters.deallocations,
            splits: self.counters.splits,
            merges: self.counters.merges,
            exhaustions: self.counters.exhaustions,
        }
    }

    /// Verify the block tiling and free-list structure.
    ///
    /// Checks that blocks tile the arena with power-of-two, self-aligned
    /// sizes and valid tags; that the free list is a consistent,
    /// address-ordered ring holding exactly the free blocks; that no two
    /// free buddies were left unmerged; and that the anchor is a largest
    /// free block.
    pub fn check_invariants(&self) -> Result<(), String> {
        let capacity = self.capacity_bytes();

        let mut offset = 0usize;
        let mut free_by_address = 0usize;
        while offset < capacity {
            let header = self.blocks.header(offset as u32);
            let size = header.size as usize;
            if header.state().is_none() {
                return Err(format!("block {offset} has corrupt tag {:#x}", header.tag));
            }
            if !size.is_power_of_two() || size < HEADER_SIZE {
                return Err(format!("block {offset} has invalid size {size}"));
            }
            if offset % size != 0 {
                return Err(format!("block {offset} is not aligned to its size {size}"));
            }
            if header.is_free() {
                free_by_address += 1;
                let buddy = offset ^ size;
                if size < capacity {
                    let other = self.blocks.header(buddy as u32);
                    if other.is_free() && other.size == header.size {
                        return Err(format!("free buddies {offset} and {buddy} were not merged"));
                    }
                }
            }
            offset += size;
        }
        if offset != capacity {
            return Err(format!("blocks cover {offset} bytes of {capacity}"));
        }

        let mut listed = 0usize;
        let mut wraps = 0usize;
        let mut largest = 0usize;
        for block in self.blocks.iter(self.free_head) {
            let header = self.blocks.header(block);
            if header.state() != Some(BlockState::Free) {
                return Err(format!("listed block {block} is not free"));
            }
            if self.blocks.header(header.next).prev != block
                || self.blocks.header(header.prev).next != block
            {
                return Err(format!("links around block {block} are inconsistent"));
            }
            if header.next <= block {
                wraps += 1;
            }
            largest = largest.max(header.size as usize);
            listed += 1;
        }
        if listed != free_by_address {
            return Err(format!(
                "free list holds {listed} blocks but {free_by_address} are free"
            ));
        }
        if listed > 0 && wraps != 1 {
            return Err("free list is not address-ordered".into());
        }
        if self.largest_free_block() != largest {
            return Err(format!(
                "anchor size {} is not the largest free size {largest}",
                self.largest_free_block()
            ));
        }
        Ok(())
    }

    fn exhausted(&mut self, needed: usize) -> ArenaError {
        self.counters.exhaustions += 1;
        let largest_free = self.largest_free_block();
        debug!(
            requested = needed,
            largest_free,
            "allocation rejected: capacity exhausted"
        );
        ArenaError::CapacityExhausted {
            requested: needed,
            largest_free,
        }
    }

    /// Smallest free block of at least `required` bytes, first in list
    /// order on ties. One pass around the ring.
    fn best_fit(&self, head: u32, required: u32) -> Option<u32> {
        self.blocks
            .iter(Some(head))
            .filter(|&block| self.blocks.size(block) >= required)
            .reduce(|best, block| {
                if self.blocks.size(block) < self.blocks.size(best) {
                    block
                } else {
                    best
                }
            })
    }

    fn largest_free_from(&self, start: u32) -> Option<u32> {
        self.blocks.iter(Some(start)).reduce(|best, block| {
            if self.blocks.size(block) > self.blocks.size(best) {
                block
            } else {
                best
            }
        })
    }

    /// First free block after `block` in address order, wrapping at the
    /// arena end. The free list must be non-empty and not contain `block`.
    fn next_free_by_address(&self, block: u32) -> u32 {
        let capacity = self.capacity_bytes();
        let mut cursor = block;
        loop {
            cursor += self.blocks.size(cursor);
            if cursor as usize >= capacity {
                cursor = 0;
            }
            if cursor == block || self.blocks.header(cursor).is_free() {
                debug_assert_ne!(cursor, block, "free list was empty");
                return cursor;
            }
        }
    }

    /// Merge `block` with free buddies until none qualifies. Returns the
    /// offset of the resulting block.
    fn coalesce(&mut self, mut block: u32) -> u32 {
        let capacity = self.capacity_bytes();
        loop {
            let header = self.blocks.header(block);
            if header.size as usize >= capacity {
                return block;
            }
            let buddy = block ^ header.size;
            let neighbour = if buddy < block { header.prev } else { header.next };
            if neighbour != buddy {
                return block;
            }
            let other = self.blocks.header(buddy);
            if !other.is_free() || other.size != header.size {
                return block;
            }
            let (lower, upper) = if buddy < block {
                (buddy, block)
            } else {
                (block, buddy)
            };
            self.merge(lower, upper);
            block = lower;
        }
    }

    fn merge(&mut self, lower: u32, upper: u32) {
        self.blocks.unlink(upper);
        let size = self.blocks.size(lower) * 2;
        self.blocks.header_mut(lower).size = size;
        *self.blocks.header_mut(upper) = BlockHeader::zeroed();
        if self.free_head == Some(upper) {
            self.free_head = Some(lower);
        }
        self.counters.merges += 1;
        trace!(lower, upper, size, "merged buddies");
    }

    /// Header offset of the block `allocation` names, if that block is
    /// allocated and large enough for the payload.
    fn live_block(&self, allocation: &Allocation) -> Option<u32> {
        let block = allocation
            .offset
            .checked_sub(HEADER_SIZE as u32)
            .filter(|&b| (b as usize) < self.capacity_bytes() && b as usize % HEADER_SIZE == 0)?;
        let header = self.blocks.header(block);
        let fits = allocation
            .len()
            .checked_mul(size_of::<T>())
            .and_then(|bytes| bytes.checked_add(HEADER_SIZE))
            .is_some_and(|bytes| bytes <= header.size as usize);
        (header.state() == Some(BlockState::Allocated) && fits).then_some(block)
    }

    fn checked_block(&self, allocation: &Allocation) -> u32 {
        match self.live_block(allocation) {
            Some(block) => block,
            None => panic!(
                "access through {allocation}, which is not a live allocation of this arena"
            ),
        }
    }

    fn payload_range(&self, allocation: &Allocation) -> Range<usize> {
        self.checked_block(allocation);
        let start = allocation.offset();
        start..start + allocation.len() * size_of::<T>()
    }
}

impl<T: Pod> Default for Arena<T> {
    fn default() -> Self {
        Self::new(ArenaConfig::DEFAULT_REQUESTED_ELEMENTS)
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity_bytes", &self.blocks.len_bytes())
            .field("free_head", &self.free_head)
            .finish_non_exhaustive()
    }
}
