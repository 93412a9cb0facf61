//! Quickstart: size an arena, store a few integers, and release them.
//!
//! Run with: `cargo run -p buddy-bench --example quickstart`

use buddy_arena::{Arena, ArenaError};

fn main() -> Result<(), ArenaError> {
    // 5000 requested ints -> 8192 slots (next power of two).
    let mut arena = Arena::<i32>::new(5000);
    println!(
        "arena: {} elements, {} bytes",
        arena.capacity(),
        arena.capacity_bytes()
    );

    let arr = arena.allocate(3)?;
    arena.get_mut(&arr).copy_from_slice(&[42, 37, 24]);
    println!("{arr} -> {:?}", arena.get(&arr));

    let single = arena.allocate(1)?;
    arena.get_mut(&single)[0] = 29;
    println!("{single} -> {:?}", arena.get(&single));

    let stats = arena.stats();
    println!(
        "free blocks: {}, largest free: {} bytes, fragmentation: {:.2}",
        stats.free_blocks,
        stats.largest_free_block,
        stats.fragmentation()
    );

    // Too large for any free block: reported, not silently null.
    match arena.allocate(arena.capacity()) {
        Ok(_) => unreachable!("a whole-capacity request cannot fit beside its header"),
        Err(e) => println!("expected failure: {e}"),
    }

    arena.deallocate(arr);
    arena.deallocate(single);
    println!(
        "after release: {} free block(s), pristine = {}",
        arena.free_block_count(),
        arena.is_pristine()
    );
    Ok(())
}
