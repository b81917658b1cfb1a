//! Slab-backed typed allocators for workloads that create and discard many
//! same-type values in predictable patterns.
//!
//! General-purpose heap allocation pays for its generality on every call.
//! When values of one type come and go in a stack discipline, or in a
//! fixed-size churn with no ordering at all, that cost can be amortized by
//! carving the values out of recycled slabs: contiguous blocks of `T`-sized
//! cells that keep same-type data packed together and go back to a warm
//! cache instead of the operating system.
//!
//! This crate provides three cooperating pieces:
//!
//! * [`SlabPool`] - a recycling cache of whole slabs, shared by the stack
//!   allocators that borrow storage from it, with explicit
//!   [`trim_to()`][SlabPool::trim_to] control over when memory actually
//!   returns to the operating system.
//! * [`StackAllocator`] - bump allocation with strict last-in-first-out
//!   deallocation across a chain of pool-borrowed slabs.
//! * [`BlockAllocator`] - fixed-size allocation with no ordering
//!   constraints, served from an intrusive free list threaded through the
//!   allocator's own slabs.
//!
//! # Key characteristics
//!
//! - **Caller-driven lifetimes**: `alloc` returns uninitialized storage and
//!   the caller constructs the value in place; destruction happens value by
//!   value at the call boundary or in bulk via
//!   [`delete_mem()`][StackAllocator::delete_mem] /
//!   [`destroy()`][BlockAllocator::destroy].
//! - **Returned allocation failure**: an exhausted system allocator surfaces
//!   as an [`AllocError`], never a panic or an internal retry.
//! - **Cache-friendly storage**: slab storage starts on a cache line
//!   boundary and pools reuse the most recently returned slab first.
//! - **Configurable teardown strictness**: a [`DropPolicy`] can turn
//!   silently leaked values into loud panics.
//! - **Single-threaded by design**: no locks, no atomics; wrap instances in
//!   your own synchronization if you need to cross threads.
//!
//! # Examples
//!
//! Stack-disciplined allocation:
//!
//! ```
//! use slab_alloc::{SlabPool, StackAllocator};
//!
//! let pool = SlabPool::<u64>::builder().slab_capacity(4).build_shared();
//! let mut stack = StackAllocator::builder().pool(pool).build();
//!
//! let mut cells = Vec::new();
//! for value in 0..6 {
//!     let cell = stack.alloc().expect("out of memory");
//!     // SAFETY: Each cell is fresh storage for one u64.
//!     unsafe {
//!         cell.as_ptr().write(value);
//!     }
//!     cells.push(cell);
//! }
//!
//! // SAFETY: The cell was initialized above.
//! unsafe {
//!     assert_eq!(cells[5].as_ptr().read(), 5);
//! }
//!
//! // u64 needs no destructor, so the cells can be popped as-is.
//! for _ in 0..6 {
//!     stack.pop();
//! }
//! assert!(stack.is_empty());
//! ```
//!
//! Order-independent allocation:
//!
//! ```
//! use slab_alloc::BlockAllocator;
//!
//! let mut blocks = BlockAllocator::<String>::builder().slab_capacity(8).build();
//!
//! let first = blocks.alloc().expect("out of memory");
//! let second = blocks.alloc().expect("out of memory");
//! // SAFETY: Each cell is fresh storage for one String.
//! unsafe {
//!     first.as_ptr().write(String::from("first"));
//! }
//! // SAFETY: As above.
//! unsafe {
//!     second.as_ptr().write(String::from("second"));
//! }
//!
//! // Cells can be retired in any order.
//! // SAFETY: Each cell came from this allocator, holds an initialized
//! // value and is not used again.
//! unsafe {
//!     blocks.destroy(first);
//! }
//! // SAFETY: As above.
//! unsafe {
//!     blocks.destroy(second);
//! }
//! assert!(blocks.is_empty());
//! ```

mod block_allocator;
mod builder;
mod drop_policy;
mod error;
mod slab;
mod slab_pool;
mod stack_allocator;

pub use block_allocator::BlockAllocator;
pub use builder::*;
pub use drop_policy::*;
pub use error::*;
pub use slab_pool::{SharedSlabPool, SlabPool};
pub use stack_allocator::StackAllocator;
pub(crate) use slab::*;
