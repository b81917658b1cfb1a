use std::any::type_name;
use std::mem::ManuallyDrop;
use std::num::NonZero;
use std::ptr::NonNull;
use std::thread;

use crate::{AllocError, BlockAllocatorBuilder, DropPolicy, Slab};

/// One cell of a block allocator's slab: either the caller's value or, while
/// vacant, a link to the next vacant cell.
///
/// The two occupants share storage, which is what makes `free()` O(1): the
/// freed cell's own bytes become the free-list node, so no side table is
/// needed and cells from different slabs interleave freely on one list.
#[repr(C)]
union Chunk<T> {
    /// Link to the next vacant chunk while this cell is on the free list.
    next: Option<NonNull<Chunk<T>>>,

    /// The caller's value while the cell is live. Only ever accessed through
    /// pointers cast to `T`; the field exists to give the union the size and
    /// alignment of `T`.
    #[allow(
        dead_code,
        reason = "gives the union the size and alignment of T; values are accessed via cast pointers"
    )]
    value: ManuallyDrop<T>,
}

/// A fixed-size allocator of `T`-sized cells with no ordering constraints.
///
/// Unlike [`StackAllocator`][1], cells may be freed in any order: every
/// vacant cell sits on a single intrusive free list threaded through the
/// cells themselves, spanning all of the allocator's slabs. Allocation pops
/// the list head; freeing pushes onto it; both are O(1).
///
/// The allocator owns its slabs outright and allocates them straight from
/// the system allocator - slab-level recycling through a [`SlabPool`][2]
/// buys nothing here, because cells, not whole slabs, are what gets reused.
///
/// [`alloc()`][3] returns uninitialized storage and the caller constructs
/// the value in place. Teardown is caller-driven: [`free()`][4] retires a
/// cell without running a destructor, [`destroy()`][5] drops the value
/// first, and [`clear()`][6] releases every slab in bulk without touching
/// outstanding cells.
///
/// # Examples
///
/// ```
/// use slab_alloc::BlockAllocator;
///
/// let mut blocks = BlockAllocator::<String>::builder()
///     .slab_capacity(16)
///     .build();
///
/// let cell = blocks.alloc().expect("out of memory");
/// // SAFETY: The cell is fresh storage reserved for exactly one String.
/// unsafe {
///     cell.as_ptr().write(String::from("hello"));
/// }
///
/// // SAFETY: The cell came from `alloc` above and holds an initialized
/// // value that nothing else references.
/// unsafe {
///     blocks.destroy(cell);
/// }
/// assert!(blocks.is_empty());
/// ```
///
/// [1]: crate::StackAllocator
/// [2]: crate::SlabPool
/// [3]: Self::alloc
/// [4]: Self::free
/// [5]: Self::destroy
/// [6]: Self::clear
#[derive(Debug)]
pub struct BlockAllocator<T> {
    /// Slabs owned directly by this allocator. Order carries no meaning;
    /// the vector exists purely to own the storage.
    slabs: Vec<Slab<Chunk<T>>>,

    /// Head of the free list threaded through vacant cells across all slabs.
    first_open: Option<NonNull<Chunk<T>>>,

    /// Cell count of every slab this allocator creates.
    slab_capacity: NonZero<usize>,

    /// Number of cells currently handed out to the caller.
    len: usize,

    /// What to do if the allocator is dropped while live cells remain.
    drop_policy: DropPolicy,
}

impl<T> BlockAllocator<T> {
    /// Creates a builder for configuring a new allocator.
    ///
    /// # Examples
    ///
    /// ```
    /// use slab_alloc::BlockAllocator;
    ///
    /// let blocks = BlockAllocator::<u64>::builder().slab_capacity(32).build();
    /// ```
    #[must_use]
    pub fn builder() -> BlockAllocatorBuilder<T> {
        BlockAllocatorBuilder::new()
    }

    #[must_use]
    pub(crate) fn new_inner(slab_capacity: NonZero<usize>, drop_policy: DropPolicy) -> Self {
        Self {
            slabs: Vec::new(),
            first_open: None,
            slab_capacity,
            len: 0,
            drop_policy,
        }
    }

    /// The number of cells currently handed out and not yet freed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no cells are currently handed out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of slabs this allocator currently owns.
    #[must_use]
    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    /// Reserves a cell and returns a pointer to it.
    ///
    /// The cell is uninitialized; the caller is expected to construct a `T`
    /// in place before the cell is ever read. A new slab is allocated from
    /// the system allocator only when the free list is empty - that is the
    /// only failure path.
    pub fn alloc(&mut self) -> Result<NonNull<T>, AllocError> {
        let Some(chunk) = self.first_open else {
            return self.grow();
        };

        // SAFETY: The chunk was threaded onto the free list by this
        // allocator and has not been handed out since, so it is valid
        // storage that we own exclusively.
        let chunk_ref = unsafe { chunk.as_ref() };

        // SAFETY: Every chunk on the free list holds the `next` occupant.
        self.first_open = unsafe { chunk_ref.next };

        self.len = self
            .len
            .checked_add(1)
            .expect("live cell count cannot exceed the address space");

        Ok(chunk.cast::<T>())
    }

    /// Allocates one new slab, threads all but one of its cells onto the
    /// free list and returns the remaining cell.
    fn grow(&mut self) -> Result<NonNull<T>, AllocError> {
        let slab = Slab::<Chunk<T>>::new(self.slab_capacity)?;

        // Link the cells in address order, the last one pointing at the old
        // list head. Cell 0 skips the list and goes straight to the caller.
        let mut next = self.first_open;
        for index in (1..slab.capacity().get()).rev() {
            let chunk = slab.cell(index);

            // SAFETY: The cell is uninitialized storage this allocator owns
            // exclusively; writing the link occupant claims it for the list.
            unsafe {
                chunk.as_ptr().write(Chunk { next });
            }

            next = Some(chunk);
        }
        self.first_open = next;

        let cell = slab.cell(0).cast::<T>();
        self.slabs.push(slab);

        self.len = self
            .len
            .checked_add(1)
            .expect("live cell count cannot exceed the address space");

        Ok(cell)
    }

    /// Retires a cell back onto the free list without running a destructor.
    ///
    /// Use this when the value was never constructed, or was already torn
    /// down by hand; use [`destroy()`][Self::destroy] otherwise.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`alloc()`][Self::alloc] on this
    /// same instance, must not have been freed or destroyed since, and must
    /// not be used again after this call.
    pub unsafe fn free(&mut self, ptr: NonNull<T>) {
        let chunk = ptr.cast::<Chunk<T>>();

        // SAFETY: Per the caller contract the cell belongs to this allocator
        // and is no longer in use, so its storage is ours to relink.
        unsafe {
            chunk.as_ptr().write(Chunk {
                next: self.first_open,
            });
        }

        self.first_open = Some(chunk);

        self.len = self
            .len
            .checked_sub(1)
            .expect("caller contract requires every free to pair with a prior alloc");
    }

    /// Drops the value at `ptr`, then retires the cell as
    /// [`free()`][Self::free] does.
    ///
    /// This is the only block-allocator operation that is aware of `T`'s
    /// destructor.
    ///
    /// # Safety
    ///
    /// All of the [`free()`][Self::free] requirements, and additionally the
    /// cell must hold an initialized `T` that nothing else references.
    pub unsafe fn destroy(&mut self, ptr: NonNull<T>) {
        // SAFETY: The caller guarantees the cell holds an initialized value
        // that is not referenced elsewhere.
        unsafe {
            ptr.drop_in_place();
        }

        // SAFETY: Forwarding the caller's own contract.
        unsafe {
            self.free(ptr);
        }
    }

    /// Releases every owned slab back to the system allocator without
    /// running any destructor.
    ///
    /// Outstanding cells become dangling and their values are leaked; this
    /// is for bulk teardown when the caller knows no live values remain (or
    /// accepts leaking them). The allocator is reset to the same empty state
    /// it was built in.
    pub fn clear(&mut self) {
        self.slabs.clear();
        self.first_open = None;
        self.len = 0;
    }
}

impl<T> Drop for BlockAllocator<T> {
    fn drop(&mut self) {
        let had_live_cells = !self.is_empty();

        self.clear();

        // The check comes after the storage is freed, so the memory is
        // accounted for even when we are about to panic. If we are already
        // panicking, panicking again would only obscure the original.
        if self.drop_policy == DropPolicy::MustNotHoldItems && !thread::panicking() {
            assert!(
                !had_live_cells,
                "dropped a non-empty BlockAllocator of {} with a policy that says it must be empty when dropped",
                type_name::<T>()
            );
        }
    }
}

// SAFETY: The allocator owns all of its chunk storage exclusively and its
// raw pointers never alias anything outside that storage, so it can move
// between threads whenever T itself can.
unsafe impl<T: Send> Send for BlockAllocator<T> {}
