//! Workload profiles and drivers for benchmarking `buddy-arena`.
//!
//! - [`request_sizes`]: deterministic element counts derived from a seed
//! - [`churn`]: allocate a batch, release it in a chosen order
//! - [`interleaved`]: keep a sliding window of live allocations

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use buddy_arena::{Allocation, Arena, ArenaError};

/// Order in which [`churn`] releases its batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseOrder {
    /// Most recent allocation first.
    Lifo,
    /// Oldest allocation first.
    Fifo,
}

/// Generate `n` deterministic request sizes in `1..=max_count`.
pub fn request_sizes(n: usize, max_count: usize, seed: u64) -> Vec<usize> {
    (0..n as u64)
        .map(|i| {
            let h = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(i.wrapping_mul(1442695040888963407));
            // High bits of the LCG step are the well-mixed ones.
            ((h >> 33) % max_count as u64) as usize + 1
        })
        .collect()
}

/// Allocate every size in `sizes`, then release them all in `order`.
///
/// Returns how many requests were satisfied. Requests that do not fit are
/// skipped.
pub fn churn(arena: &mut Arena<u32>, sizes: &[usize], order: ReleaseOrder) -> usize {
    let mut live: Vec<Allocation> = sizes
        .iter()
        .filter_map(|&n| arena.allocate(n).ok())
        .collect();
    let satisfied = live.len();
    if order == ReleaseOrder::Lifo {
        live.reverse();
    }
    for a in live {
        arena.deallocate(a);
    }
    satisfied
}

/// Keep at most `window` allocations live, releasing the oldest before
/// each new request. Everything is released at the end.
pub fn interleaved(
    arena: &mut Arena<u32>,
    sizes: &[usize],
    window: usize,
) -> Result<(), ArenaError> {
    let mut live = std::collections::VecDeque::with_capacity(window);
    for &n in sizes {
        if live.len() == window {
            if let Some(oldest) = live.pop_front() {
                arena.deallocate(oldest);
            }
        }
        live.push_back(arena.allocate(n)?);
    }
    for a in live {
        arena.deallocate(a);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_sizes_deterministic() {
        let a = request_sizes(100, 64, 42);
        let b = request_sizes(100, 64, 42);
        assert_eq!(a, b);
        assert_ne!(a, request_sizes(100, 64, 43));
    }

    #[test]
    fn request_sizes_in_range() {
        let sizes = request_sizes(1000, 16, 7);
        assert_eq!(sizes.len(), 1000);
        assert!(sizes.iter().all(|&n| (1..=16).contains(&n)));
    }

    #[test]
    fn churn_leaves_arena_pristine() {
        for order in [ReleaseOrder::Lifo, ReleaseOrder::Fifo] {
            let mut arena = Arena::<u32>::new(1 << 14);
            let sizes = request_sizes(64, 32, 1);
            assert_eq!(churn(&mut arena, &sizes, order), 64);
            assert!(arena.is_pristine(), "{order:?}");
        }
    }

    #[test]
    fn interleaved_window_fits_and_cleans_up() {
        let mut arena = Arena::<u32>::new(1 << 14);
        let sizes = request_sizes(500, 64, 9);
        interleaved(&mut arena, &sizes, 16).unwrap();
        assert!(arena.is_pristine());
        assert_eq!(arena.stats().allocations, 500);
    }

    #[test]
    fn interleaved_surfaces_exhaustion() {
        let mut arena = Arena::<u32>::default();
        let sizes = vec![500; 8];
        assert!(matches!(
            interleaved(&mut arena, &sizes, 8),
            Err(ArenaError::CapacityExhausted { .. })
        ));
    }
}
