/// Determines allocator behavior when the allocator is dropped while live
/// cells remain.
///
/// The allocators in this crate never run destructors implicitly: dropping a
/// [`StackAllocator`][1] or [`BlockAllocator`][2] releases its storage the
/// same way [`release_mem()`][3] and [`clear()`][4] do, without touching any
/// values still constructed in it. By default that means remaining values are
/// leaked. The policy exists for callers who need teardown paths to prove
/// that every value was destroyed first.
///
/// # Examples
///
/// ```
/// use slab_alloc::{BlockAllocator, DropPolicy};
///
/// // The drop policy is set at construction time.
/// let allocator = BlockAllocator::<u32>::builder()
///     .drop_policy(DropPolicy::MustNotHoldItems)
///     .build();
/// ```
///
/// [1]: crate::StackAllocator
/// [2]: crate::BlockAllocator
/// [3]: crate::StackAllocator::release_mem
/// [4]: crate::BlockAllocator::clear
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The allocator releases its storage without running destructors on any
    /// remaining live cells, leaking those values. This is the default.
    #[default]
    MayLeakItems,

    /// The allocator will panic if live cells remain when it is dropped.
    ///
    /// This may be valuable if there are external requirements before the
    /// values can be discarded. For example, it may be known that the values
    /// hold resources whose cleanup is observable, so silently leaking them
    /// would be a bug worth surfacing loudly.
    MustNotHoldItems,
}
