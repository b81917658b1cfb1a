//! Basic usage of the stack allocator:
//!
//! * Creating a pool and an allocator on top of it.
//! * Constructing values into allocated cells.
//! * Popping in LIFO order.
//! * Bulk teardown and trimming the pool.

use std::rc::Rc;

use slab_alloc::{SlabPool, StackAllocator};

fn main() {
    let pool = SlabPool::<String>::builder().slab_capacity(4).build_shared();
    let mut stack = StackAllocator::builder().pool(Rc::clone(&pool)).build();

    // Push six values; the fifth allocation crosses into a second slab.
    let mut cells = Vec::new();
    for index in 0..6 {
        let cell = stack.alloc().expect("out of memory");
        // SAFETY: Each cell is fresh storage for exactly one String.
        unsafe {
            cell.as_ptr().write(format!("value #{index}"));
        }
        cells.push(cell);
    }

    println!(
        "Stack holds {} values across {} slabs",
        stack.len(),
        stack.slab_count()
    );

    // Pop the top two values in LIFO order. The caller destroys each value
    // first; pop() itself only retires the storage.
    for cell in cells.drain(4..).rev() {
        // SAFETY: The cell was initialized above and is not used again.
        unsafe {
            cell.as_ptr().drop_in_place();
        }
        stack.pop();
    }

    println!(
        "After popping two, the pool already caches {} slab(s)",
        pool.borrow().cached_slab_count()
    );

    // Tear down the remaining four values in one go.
    // SAFETY: Every live cell was initialized above.
    unsafe {
        stack.delete_mem();
    }

    println!(
        "After delete_mem the pool caches {} slab(s)",
        pool.borrow().cached_slab_count()
    );

    // Return the cached slabs to the operating system.
    pool.borrow_mut().trim_to(0);
    println!(
        "After trim_to(0) the pool caches {} slab(s)",
        pool.borrow().cached_slab_count()
    );
}
