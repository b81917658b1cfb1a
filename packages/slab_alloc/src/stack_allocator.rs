use std::any::type_name;
use std::ptr::NonNull;
use std::thread;

use crate::{AllocError, DropPolicy, SharedSlabPool, Slab, StackAllocatorBuilder};

/// A LIFO allocator of `T`-sized cells over a chain of pool-borrowed slabs.
///
/// Allocation is a bump within the current slab; when the slab is exhausted
/// the allocator borrows another one from its [`SlabPool`][1]. Deallocation
/// is strictly last-in-first-out via [`pop()`][2], and the moment the top
/// slab holds no more live cells it goes straight back to the pool, so an
/// allocator never retains more than one partially used slab.
///
/// The allocator hands out raw cells: [`alloc()`][3] returns uninitialized
/// storage and the caller constructs the value in place. Destruction is the
/// caller's job too - either value by value before each `pop()`, or in bulk
/// through [`delete_mem()`][4]. [`release_mem()`][5] gives every slab back
/// without running any destructor, for callers who know no live values
/// remain (or accept leaking them).
///
/// No slab is acquired until the first `alloc()`, so building allocators
/// that may end up unused costs nothing.
///
/// # Thread safety
///
/// The allocator shares its pool through an [`Rc`][std::rc::Rc] handle and
/// is therefore neither [`Send`] nor [`Sync`]; wrap the whole arrangement in
/// your own synchronization if you need it elsewhere.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
///
/// use slab_alloc::{SlabPool, StackAllocator};
///
/// let pool = SlabPool::<String>::builder().slab_capacity(8).build_shared();
/// let mut stack = StackAllocator::builder().pool(Rc::clone(&pool)).build();
///
/// let cell = stack.alloc().expect("out of memory");
/// // SAFETY: The cell is fresh storage reserved for exactly one String.
/// unsafe {
///     cell.as_ptr().write(String::from("hello"));
/// }
///
/// // SAFETY: The cell was initialized above and is not read again.
/// unsafe {
///     cell.as_ptr().drop_in_place();
/// }
/// stack.pop();
///
/// assert!(stack.is_empty());
/// ```
///
/// [1]: crate::SlabPool
/// [2]: Self::pop
/// [3]: Self::alloc
/// [4]: Self::delete_mem
/// [5]: Self::release_mem
#[derive(Debug)]
pub struct StackAllocator<T> {
    /// The pool slabs are borrowed from and returned to. Shared with other
    /// allocators; the pool outlives us because we hold it alive.
    pool: SharedSlabPool<T>,

    /// The slab chain in allocation order. Every slab except the last is
    /// fully live; the last holds `live_in_top` live cells.
    slabs: Vec<Slab<T>>,

    /// Number of live cells in the top slab. Zero only while no slab is
    /// held, or while a single fully-popped slab is kept for reuse.
    live_in_top: usize,

    /// What to do if the allocator is dropped while live cells remain.
    drop_policy: DropPolicy,
}

impl<T> StackAllocator<T> {
    /// Creates a builder for configuring a new allocator.
    ///
    /// The pool is mandatory; see [`StackAllocatorBuilder::pool`].
    #[must_use]
    pub fn builder() -> StackAllocatorBuilder<T> {
        StackAllocatorBuilder::new()
    }

    #[must_use]
    pub(crate) fn new_inner(pool: SharedSlabPool<T>, drop_policy: DropPolicy) -> Self {
        Self {
            pool,
            slabs: Vec::new(),
            live_in_top: 0,
            drop_policy,
        }
    }

    /// The number of live cells currently on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        let full_slabs = self.slabs.len().saturating_sub(1);
        let cells_per_slab = self
            .slabs
            .first()
            .map_or(0, |slab| slab.capacity().get());

        full_slabs
            .checked_mul(cells_per_slab)
            .and_then(|full_cells| full_cells.checked_add(self.live_in_top))
            .expect("live cell count cannot exceed the address space")
    }

    /// Whether the stack holds no live cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of slabs currently held by this allocator (as opposed to
    /// cached in the pool).
    #[must_use]
    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    /// Reserves the next cell on the stack and returns a pointer to it.
    ///
    /// The cell is uninitialized; the caller is expected to construct a `T`
    /// in place before the cell is ever read or popped. When the current
    /// slab is exhausted (or none is held yet) a slab is acquired from the
    /// pool, which falls through to the system allocator when its cache is
    /// empty - that is the only failure path.
    ///
    /// # Examples
    ///
    /// ```
    /// use slab_alloc::{SlabPool, StackAllocator};
    ///
    /// let pool = SlabPool::<u64>::builder().slab_capacity(4).build_shared();
    /// let mut stack = StackAllocator::builder().pool(pool).build();
    ///
    /// let cell = stack.alloc().expect("out of memory");
    /// // SAFETY: The cell is fresh storage for one u64.
    /// unsafe {
    ///     cell.as_ptr().write(7);
    /// }
    /// assert_eq!(stack.len(), 1);
    /// ```
    pub fn alloc(&mut self) -> Result<NonNull<T>, AllocError> {
        #[cfg(debug_assertions)]
        self.integrity_check();

        let top_is_full = self
            .slabs
            .last()
            .is_none_or(|top| self.live_in_top == top.capacity().get());

        if top_is_full {
            let slab = self.pool.borrow_mut().get_slab()?;
            self.slabs.push(slab);
            self.live_in_top = 0;
        }

        let top = self.slabs.last().expect("a slab was ensured above");
        let cell = top.cell(self.live_in_top);

        self.live_in_top = self
            .live_in_top
            .checked_add(1)
            .expect("bounded by slab capacity, checked above");

        Ok(cell)
    }

    /// Removes the top cell from the stack.
    ///
    /// The caller must already have dropped the value in that cell (or never
    /// constructed one). `pop()` itself runs no destructor; it only retires
    /// the storage. When the pop empties a slab that is not the only one
    /// held, that slab is returned to the pool immediately and the cursor
    /// moves to the last cell of the slab below.
    ///
    /// # Panics
    ///
    /// Panics if the stack holds no live cells - popping more than was
    /// allocated is a caller bug, surfaced here rather than corrupting the
    /// chain.
    pub fn pop(&mut self) {
        #[cfg(debug_assertions)]
        self.integrity_check();

        assert!(
            self.live_in_top > 0,
            "popped a StackAllocator of {} that holds no live cells",
            type_name::<T>()
        );

        self.live_in_top = self
            .live_in_top
            .checked_sub(1)
            .expect("guarded by the assert above");

        if self.live_in_top == 0 && self.slabs.len() > 1 {
            let spent = self.slabs.pop().expect("guarded by the length check above");
            self.pool.borrow_mut().return_slab(spent);

            let top = self
                .slabs
                .last()
                .expect("at least one slab remains after popping one of two or more");
            self.live_in_top = top.capacity().get();
        }
    }

    /// Returns every slab to the pool without running any destructor.
    ///
    /// Live values, if any remain, are leaked. The allocator is reset to the
    /// same empty state it was built in, ready to allocate again. Use this
    /// when all values have already been torn down by hand, or when leaking
    /// them is acceptable.
    pub fn release_mem(&mut self) {
        let mut pool = self.pool.borrow_mut();
        for slab in self.slabs.drain(..) {
            pool.return_slab(slab);
        }

        self.live_in_top = 0;
    }

    /// Drops every live value on the stack, then returns every slab to the
    /// pool.
    ///
    /// Values are dropped in allocation order, slab by slab, stopping at the
    /// cursor in the final partially-filled slab - cells beyond it were
    /// never constructed and are not touched. Afterwards the allocator is
    /// indistinguishable from a freshly built one.
    ///
    /// This is the only stack-allocator operation that is aware of `T`'s
    /// destructor.
    ///
    /// # Safety
    ///
    /// Every live cell (as counted by [`len()`][Self::len]) must hold an
    /// initialized `T`: the caller must have constructed a value in every
    /// cell returned by [`alloc()`][Self::alloc] that has not been popped.
    pub unsafe fn delete_mem(&mut self) {
        if let Some((top, full)) = self.slabs.split_last() {
            for slab in full {
                for index in 0..slab.capacity().get() {
                    // SAFETY: Every cell of a non-top slab is live, and the
                    // caller guarantees live cells are initialized.
                    unsafe {
                        slab.cell(index).drop_in_place();
                    }
                }
            }

            for index in 0..self.live_in_top {
                // SAFETY: Cells below the cursor are live, and the caller
                // guarantees live cells are initialized.
                unsafe {
                    top.cell(index).drop_in_place();
                }
            }
        }

        self.release_mem();
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    fn integrity_check(&self) {
        match self.slabs.last() {
            None => {
                assert!(
                    self.live_in_top == 0,
                    "cursor at {} with no slab held in StackAllocator of {}",
                    self.live_in_top,
                    type_name::<T>()
                );
            }
            Some(top) => {
                assert!(
                    self.live_in_top <= top.capacity().get(),
                    "cursor at {} overruns the top slab of {} cells in StackAllocator of {}",
                    self.live_in_top,
                    top.capacity(),
                    type_name::<T>()
                );

                assert!(
                    self.live_in_top > 0 || self.slabs.len() == 1,
                    "an emptied top slab was retained alongside others in StackAllocator of {}",
                    type_name::<T>()
                );
            }
        }
    }
}

impl<T> Drop for StackAllocator<T> {
    fn drop(&mut self) {
        let had_live_cells = !self.is_empty();

        // Storage goes back to the pool either way; destructors are the
        // caller's responsibility, per the release_mem() contract.
        self.release_mem();

        // The check comes after the slabs are back in the pool, so the
        // memory is accounted for even when we are about to panic. If we are
        // already panicking, panicking again would only obscure the original.
        if self.drop_policy == DropPolicy::MustNotHoldItems && !thread::panicking() {
            assert!(
                !had_live_cells,
                "dropped a non-empty StackAllocator of {} with a policy that says it must be empty when dropped",
                type_name::<T>()
            );
        }
    }
}
