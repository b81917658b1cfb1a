//! Basic usage of the block allocator:
//!
//! * Constructing values into allocated cells.
//! * Freeing in arbitrary order.
//! * Reuse of freed cells without slab growth.

use slab_alloc::BlockAllocator;

fn main() {
    let mut blocks = BlockAllocator::<String>::builder().slab_capacity(4).build();

    let mut cells = Vec::new();
    for index in 0..10 {
        let cell = blocks.alloc().expect("out of memory");
        // SAFETY: Each cell is fresh storage for exactly one String.
        unsafe {
            cell.as_ptr().write(format!("block #{index}"));
        }
        cells.push(cell);
    }

    println!(
        "Allocator holds {} values across {} slabs",
        blocks.len(),
        blocks.slab_count()
    );

    // Retire every other value - order does not matter here.
    for cell in cells.iter().step_by(2) {
        // SAFETY: Each cell came from this allocator, holds an initialized
        // value and is not used again.
        unsafe {
            blocks.destroy(*cell);
        }
    }

    println!("After destroying half: {} values live", blocks.len());

    // New allocations are served from the freed cells; no slab is added.
    for index in 0..5 {
        let cell = blocks.alloc().expect("out of memory");
        // SAFETY: Each cell is fresh storage for exactly one String.
        unsafe {
            cell.as_ptr().write(format!("recycled #{index}"));
        }
        cells.push(cell);
    }

    println!(
        "After recycling: {} values across {} slabs",
        blocks.len(),
        blocks.slab_count()
    );

    // Bulk teardown: destroy the remaining values, then release the slabs.
    for cell in cells.iter().skip(1).step_by(2).take(5) {
        // SAFETY: As above.
        unsafe {
            blocks.destroy(*cell);
        }
    }
    for cell in cells.iter().skip(10) {
        // SAFETY: As above.
        unsafe {
            blocks.destroy(*cell);
        }
    }

    blocks.clear();
    println!("After clear: {} slabs owned", blocks.slab_count());
}
