//! Occupancy and activity statistics for an arena.

/// Point-in-time view of an arena's occupancy plus cumulative counters.
///
/// Sizes are in bytes and include block headers. Produced by
/// [`Arena::stats`](crate::Arena::stats).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArenaStats {
    /// Total arena size in bytes.
    pub capacity_bytes: usize,
    /// Bytes held by free blocks.
    pub free_bytes: usize,
    /// Bytes held by allocated blocks.
    pub allocated_bytes: usize,
    /// Number of blocks on the free list.
    pub free_blocks: usize,
    /// Size of the largest free block (0 if none).
    pub largest_free_block: usize,
    /// Cumulative successful `allocate` calls.
    pub allocations: u64,
    /// Cumulative `deallocate` calls.
    pub deallocations: u64,
    /// Cumulative block halvings performed by `allocate`.
    pub splits: u64,
    /// Cumulative buddy merges performed by `deallocate`.
    pub merges: u64,
    /// Cumulative `allocate` calls rejected for lack of space.
    pub exhaustions: u64,
}

impl ArenaStats {
    /// Share of free memory unusable for a request as large as the free
    /// total: `1 - largest_free_block / free_bytes`.
    ///
    /// 0.0 when nothing is free or all free memory is one block.
    pub fn fragmentation(&self) -> f64 {
        if self.free_bytes == 0 {
            return 0.0;
        }
        1.0 - self.largest_free_block as f64 / self.free_bytes as f64
    }
}

/// Running totals kept by the arena between `stats()` calls.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Counters {
    pub(crate) allocations: u64,
    pub(crate) deallocations: u64,
    pub(crate) splits: u64,
    pub(crate) merges: u64,
    pub(crate) exhaustions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let s = ArenaStats::default();
        assert_eq!(s.capacity_bytes, 0);
        assert_eq!(s.free_bytes, 0);
        assert_eq!(s.allocations, 0);
        assert_eq!(s.exhaustions, 0);
        assert_eq!(s.fragmentation(), 0.0);
    }

    #[test]
    fn single_free_block_is_unfragmented() {
        let s = ArenaStats {
            free_bytes: 1024,
            largest_free_block: 1024,
            ..ArenaStats::default()
        };
        assert_eq!(s.fragmentation(), 0.0);
    }

    #[test]
    fn split_free_space_reports_fragmentation() {
        let s = ArenaStats {
            free_bytes: 1024,
            largest_free_block: 256,
            ..ArenaStats::default()
        };
        assert!((s.fragmentation() - 0.75).abs() < f64::EPSILON);
    }
}
