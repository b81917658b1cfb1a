use std::cell::RefCell;
use std::num::NonZero;
use std::rc::Rc;

use crate::{AllocError, Slab, SlabPoolBuilder};

/// Handle to a [`SlabPool`] shared between the allocators it backs.
///
/// The pool is single-threaded by design; `RefCell` enforces the
/// one-operation-at-a-time contract at runtime and `Rc` keeps the pool alive
/// for as long as any allocator still references it.
pub type SharedSlabPool<T> = Rc<RefCell<SlabPool<T>>>;

/// A recycling cache of whole slabs, shared by the stack allocators that
/// borrow storage from it.
///
/// The pool exists to amortize system allocation: a slab returned by a
/// shrinking allocator stays cached here and is handed back out on the next
/// growth instead of a fresh allocation. The most recently returned slab is
/// reused first, since it is the most likely to still be warm in cache.
///
/// The pool never constructs or destructs values; it only moves raw storage
/// around. It also never gives memory back to the operating system on its
/// own - that only happens when a caller decides to [`trim_to()`][1] the
/// cache, which is intended to be invoked in batches at quiet points rather
/// than per allocation.
///
/// # Examples
///
/// ```
/// use slab_alloc::SlabPool;
///
/// let mut pool = SlabPool::<String>::builder().slab_capacity(16).build();
///
/// assert_eq!(pool.slab_capacity().get(), 16);
/// assert_eq!(pool.cached_slab_count(), 0);
///
/// // Nothing is cached yet, so this is a no-op.
/// pool.trim_to(0);
/// ```
///
/// [1]: Self::trim_to
#[derive(Debug)]
pub struct SlabPool<T> {
    /// Idle slabs. The most recently returned slab sits at the end and is
    /// the first to be reused.
    free: Vec<Slab<T>>,

    /// Cell count of every slab this pool creates.
    slab_capacity: NonZero<usize>,
}

impl<T> SlabPool<T> {
    /// Creates a builder for configuring a new pool.
    ///
    /// # Examples
    ///
    /// ```
    /// use slab_alloc::SlabPool;
    ///
    /// let pool = SlabPool::<u64>::builder().slab_capacity(32).build();
    /// ```
    #[must_use]
    pub fn builder() -> SlabPoolBuilder<T> {
        SlabPoolBuilder::new()
    }

    #[must_use]
    pub(crate) fn new_inner(slab_capacity: NonZero<usize>) -> Self {
        Self {
            free: Vec::new(),
            slab_capacity,
        }
    }

    /// The number of cells in every slab served by this pool.
    #[must_use]
    pub fn slab_capacity(&self) -> NonZero<usize> {
        self.slab_capacity
    }

    /// The number of idle slabs currently cached.
    #[must_use]
    pub fn cached_slab_count(&self) -> usize {
        self.free.len()
    }

    /// Wraps the pool in the [`SharedSlabPool`] handle that stack allocators
    /// are built from.
    #[must_use]
    pub fn into_shared(self) -> SharedSlabPool<T> {
        Rc::new(RefCell::new(self))
    }

    /// Frees cached slabs back to the system allocator until at most `keep`
    /// remain.
    ///
    /// The `keep` most recently returned slabs survive, so what stays cached
    /// is what is most likely to be reused warm. `trim_to(0)` empties the
    /// cache entirely; a `keep` at or above the cached count is a no-op.
    /// Slabs currently lent out to allocators are not the pool's to free and
    /// are unaffected.
    ///
    /// This operation cannot fail.
    pub fn trim_to(&mut self, keep: usize) {
        if keep >= self.free.len() {
            return;
        }

        let excess = self
            .free
            .len()
            .checked_sub(keep)
            .expect("guarded by the early return above");

        // The oldest slabs sit at the front; evicting them keeps recency.
        self.free.drain(..excess);
    }

    /// Hands out a slab: the most recently returned one if any is cached,
    /// otherwise a fresh slab from the system allocator.
    pub(crate) fn get_slab(&mut self) -> Result<Slab<T>, AllocError> {
        self.free
            .pop()
            .map_or_else(|| Slab::new(self.slab_capacity), Ok)
    }

    /// Accepts a slab back into the cache.
    pub(crate) fn return_slab(&mut self, slab: Slab<T>) {
        debug_assert!(
            slab.capacity() == self.slab_capacity,
            "returned slab holds {} cells but this pool serves slabs of {} cells",
            slab.capacity(),
            self.slab_capacity
        );

        self.free.push(slab);
    }
}
