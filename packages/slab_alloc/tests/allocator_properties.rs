//! End-to-end exercises of the allocator family through its public API:
//! pool recycling and trimming, stack growth and shrinkage across slab
//! boundaries, bulk teardown, and block-allocator reuse under out-of-order
//! frees.

use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use slab_alloc::{BlockAllocator, SlabPool, StackAllocator};

/// Counts destructor invocations via a shared counter.
struct Tracked {
    id: usize,
    drops: Rc<Cell<usize>>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

fn write_tracked(cell: NonNull<Tracked>, id: usize, drops: &Rc<Cell<usize>>) {
    // SAFETY: Every call site passes a cell freshly returned by `alloc`,
    // which is valid storage for exactly one Tracked.
    unsafe {
        cell.as_ptr().write(Tracked {
            id,
            drops: Rc::clone(drops),
        });
    }
}

#[test]
fn pool_lifecycle_with_trim() {
    let pool = SlabPool::<u64>::builder().slab_capacity(4).build_shared();
    let mut stack = StackAllocator::builder().pool(Rc::clone(&pool)).build();

    // Push enough values to spread across four slabs, then tear down.
    for value in 0..16 {
        let cell = stack.alloc().expect("out of memory");
        // SAFETY: The cell is fresh storage for one u64.
        unsafe {
            cell.as_ptr().write(value);
        }
    }
    assert_eq!(stack.slab_count(), 4);

    stack.release_mem();
    assert_eq!(pool.borrow().cached_slab_count(), 4);

    // Trim the cache down; the survivors keep serving allocations.
    pool.borrow_mut().trim_to(1);
    assert_eq!(pool.borrow().cached_slab_count(), 1);

    for _ in 0..8 {
        _ = stack.alloc().expect("out of memory");
    }
    assert_eq!(stack.slab_count(), 2);
    assert_eq!(pool.borrow().cached_slab_count(), 0);
}

#[test]
fn cross_slab_growth_uses_exactly_two_slabs() {
    let capacity = 4;
    let pool = SlabPool::<u32>::builder()
        .slab_capacity(capacity)
        .build_shared();
    let mut stack = StackAllocator::builder().pool(Rc::clone(&pool)).build();

    let first = stack.alloc().expect("out of memory");
    for _ in 1..capacity {
        _ = stack.alloc().expect("out of memory");
    }

    let overflow = stack.alloc().expect("out of memory");

    assert_eq!(stack.slab_count(), 2);
    assert_eq!(stack.len(), capacity + 1);

    // The overflow cell lives in the second slab, well away from the
    // contiguous run of the first.
    let first_addr = first.as_ptr() as usize;
    let overflow_addr = overflow.as_ptr() as usize;
    let first_slab_bytes = capacity * size_of::<u32>();
    assert!(
        overflow_addr < first_addr || overflow_addr >= first_addr + first_slab_bytes,
        "overflow cell must not lie within the first slab's storage"
    );
}

#[test]
fn five_allocations_one_pop_then_bulk_teardown() {
    let drops = Rc::new(Cell::new(0));
    let pool = SlabPool::<Tracked>::builder().slab_capacity(4).build_shared();
    let mut stack = StackAllocator::builder().pool(Rc::clone(&pool)).build();

    // Five allocations; the fifth forces a second slab.
    let mut cells = Vec::new();
    for id in 1..=5 {
        let cell = stack.alloc().expect("out of memory");
        write_tracked(cell, id, &drops);
        cells.push(cell);
    }
    assert_eq!(stack.slab_count(), 2);

    // Destroy the top value by hand, then pop its cell. The emptied second
    // slab must go straight back to the pool.
    // SAFETY: The cell holds the initialized value written above and is not
    // used again.
    unsafe {
        cells[4].as_ptr().drop_in_place();
    }
    stack.pop();

    assert_eq!(drops.get(), 1);
    assert_eq!(stack.len(), 4);
    assert_eq!(stack.slab_count(), 1);
    assert_eq!(pool.borrow().cached_slab_count(), 1);

    // Bulk teardown destroys the four remaining values exactly once each
    // and hands the last slab back too.
    // SAFETY: Every live cell was initialized above.
    unsafe {
        stack.delete_mem();
    }

    assert_eq!(drops.get(), 5);
    assert!(stack.is_empty());
    assert_eq!(stack.slab_count(), 0);
    assert_eq!(pool.borrow().cached_slab_count(), 2);
}

#[test]
fn delete_mem_visits_values_in_allocation_order() {
    // Destruction order is observable; pin it to allocation order.
    struct Ordered {
        id: usize,
        log: Rc<Cell<Vec<usize>>>,
    }

    impl Drop for Ordered {
        fn drop(&mut self) {
            let mut log = self.log.take();
            log.push(self.id);
            self.log.set(log);
        }
    }

    let log = Rc::new(Cell::new(Vec::new()));
    let pool = SlabPool::<Ordered>::builder().slab_capacity(2).build_shared();
    let mut stack = StackAllocator::builder().pool(pool).build();

    for id in 0..5 {
        let cell = stack.alloc().expect("out of memory");
        // SAFETY: The cell is fresh storage for one Ordered.
        unsafe {
            cell.as_ptr().write(Ordered {
                id,
                log: Rc::clone(&log),
            });
        }
    }

    // SAFETY: Every live cell was initialized above.
    unsafe {
        stack.delete_mem();
    }

    assert_eq!(log.take(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn block_allocator_reuse_after_permuted_frees() {
    let slab_capacity = 4;
    let count: usize = 10;
    let mut blocks = BlockAllocator::<u64>::builder()
        .slab_capacity(slab_capacity)
        .build();

    let cells: Vec<_> = (0..count)
        .map(|_| blocks.alloc().expect("out of memory"))
        .collect();

    let expected_slabs = count.div_ceil(slab_capacity);
    assert_eq!(blocks.slab_count(), expected_slabs);

    // Free everything in an order no simple stack or queue would produce.
    for index in [3, 8, 0, 5, 9, 1, 7, 2, 6, 4] {
        // SAFETY: Each cell came from this allocator and is freed once.
        unsafe {
            blocks.free(cells[index]);
        }
    }
    assert!(blocks.is_empty());

    // The same number of allocations must be satisfied entirely from the
    // free list, with no further slab growth.
    for _ in 0..count {
        _ = blocks.alloc().expect("out of memory");
    }
    assert_eq!(blocks.slab_count(), expected_slabs);
}

#[test]
fn stack_and_block_values_do_not_interfere() {
    let drops = Rc::new(Cell::new(0));
    let pool = SlabPool::<Tracked>::builder().slab_capacity(4).build_shared();
    let mut stack = StackAllocator::builder().pool(pool).build();
    let mut blocks = BlockAllocator::<Tracked>::builder().slab_capacity(4).build();

    let stacked = stack.alloc().expect("out of memory");
    write_tracked(stacked, 1, &drops);

    let blocked = blocks.alloc().expect("out of memory");
    write_tracked(blocked, 2, &drops);

    // SAFETY: The cell came from `blocks`, holds an initialized value and is
    // not used again.
    unsafe {
        blocks.destroy(blocked);
    }
    assert_eq!(drops.get(), 1);

    // SAFETY: The stack value was initialized above.
    unsafe {
        assert_eq!((*stacked.as_ptr()).id, 1);
    }

    // SAFETY: Every live stack cell was initialized above.
    unsafe {
        stack.delete_mem();
    }
    assert_eq!(drops.get(), 2);
}
