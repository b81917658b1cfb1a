use std::marker::PhantomData;
use std::num::NonZero;

use new_zealand::nz;

use crate::{BlockAllocator, DropPolicy, SharedSlabPool, SlabPool, StackAllocator};

/// Slab capacity used when a builder is not told otherwise, in cells.
///
/// Large enough that slab churn is rare for typical small values, small
/// enough that a mostly-idle allocator does not sit on much memory.
const DEFAULT_SLAB_CAPACITY: NonZero<usize> = nz!(128);

/// Coerces a caller-supplied cell count into a usable slab capacity.
///
/// A request for zero cells is treated as a request for one - a zero-cell
/// slab cannot satisfy any allocation and would only wedge the allocators.
fn coerce_slab_capacity(cells: usize) -> NonZero<usize> {
    NonZero::new(cells).unwrap_or(nz!(1))
}

/// Builder for creating an instance of [`SlabPool`].
///
/// All settings are optional; [`build()`][Self::build] with no configuration
/// yields a pool of 128-cell slabs.
///
/// # Examples
///
/// ```
/// use slab_alloc::SlabPool;
///
/// let pool = SlabPool::<u32>::builder().slab_capacity(64).build();
/// assert_eq!(pool.slab_capacity().get(), 64);
/// ```
#[derive(Debug)]
#[must_use]
pub struct SlabPoolBuilder<T> {
    slab_capacity: NonZero<usize>,

    _item: PhantomData<T>,
}

impl<T> SlabPoolBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            slab_capacity: DEFAULT_SLAB_CAPACITY,
            _item: PhantomData,
        }
    }

    /// Sets the number of cells in every slab the pool serves.
    ///
    /// A request for 0 is coerced to 1.
    #[inline]
    pub fn slab_capacity(mut self, cells: usize) -> Self {
        self.slab_capacity = coerce_slab_capacity(cells);
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[must_use]
    pub fn build(self) -> SlabPool<T> {
        assert!(size_of::<T>() > 0, "SlabPool must have non-zero item size");

        SlabPool::new_inner(self.slab_capacity)
    }

    /// Builds the pool and wraps it in the [`SharedSlabPool`] handle that
    /// stack allocators are built from.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[must_use]
    pub fn build_shared(self) -> SharedSlabPool<T> {
        self.build().into_shared()
    }
}

/// Builder for creating an instance of [`StackAllocator`].
///
/// The pool is mandatory, the drop policy optional.
///
/// # Examples
///
/// ```
/// use slab_alloc::{DropPolicy, SlabPool, StackAllocator};
///
/// let pool = SlabPool::<String>::builder().build_shared();
/// let stack = StackAllocator::builder()
///     .pool(pool)
///     .drop_policy(DropPolicy::MustNotHoldItems)
///     .build();
/// ```
#[derive(Debug)]
#[must_use]
pub struct StackAllocatorBuilder<T> {
    pool: Option<SharedSlabPool<T>>,
    drop_policy: DropPolicy,
}

impl<T> StackAllocatorBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            pool: None,
            drop_policy: DropPolicy::default(),
        }
    }

    /// Sets the pool the allocator borrows slabs from.
    ///
    /// Several allocators may share one pool; clone the handle for each.
    #[inline]
    pub fn pool(mut self, pool: SharedSlabPool<T>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Sets the [drop policy][DropPolicy] for the allocator. This governs
    /// how to treat remaining live cells when the allocator is dropped.
    #[inline]
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the stack allocator with the specified configuration.
    ///
    /// No slab is acquired yet; the first allocation does that.
    ///
    /// # Panics
    ///
    /// Panics if no pool has been set using [`pool()`][Self::pool].
    #[must_use]
    pub fn build(self) -> StackAllocator<T> {
        let pool = self
            .pool
            .expect("a pool must be set using .pool() before calling .build()");

        StackAllocator::new_inner(pool, self.drop_policy)
    }
}

/// Builder for creating an instance of [`BlockAllocator`].
///
/// All settings are optional; [`build()`][Self::build] with no configuration
/// yields an allocator of 128-cell slabs that leaks remaining values on drop.
///
/// # Examples
///
/// ```
/// use slab_alloc::BlockAllocator;
///
/// let blocks = BlockAllocator::<u32>::builder().slab_capacity(64).build();
/// ```
#[derive(Debug)]
#[must_use]
pub struct BlockAllocatorBuilder<T> {
    slab_capacity: NonZero<usize>,
    drop_policy: DropPolicy,

    _item: PhantomData<T>,
}

impl<T> BlockAllocatorBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            slab_capacity: DEFAULT_SLAB_CAPACITY,
            drop_policy: DropPolicy::default(),
            _item: PhantomData,
        }
    }

    /// Sets the number of cells in every slab the allocator creates.
    ///
    /// A request for 0 is coerced to 1.
    #[inline]
    pub fn slab_capacity(mut self, cells: usize) -> Self {
        self.slab_capacity = coerce_slab_capacity(cells);
        self
    }

    /// Sets the [drop policy][DropPolicy] for the allocator. This governs
    /// how to treat remaining live cells when the allocator is dropped.
    #[inline]
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the block allocator with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    #[must_use]
    pub fn build(self) -> BlockAllocator<T> {
        assert!(
            size_of::<T>() > 0,
            "BlockAllocator must have non-zero item size"
        );

        BlockAllocator::new_inner(self.slab_capacity, self.drop_policy)
    }
}
