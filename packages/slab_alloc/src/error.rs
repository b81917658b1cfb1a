use std::alloc::Layout;

use thiserror::Error;

/// The system allocator could not provide memory for a new slab.
///
/// This is the only failure mode in this crate. It is returned by the
/// `alloc` operations of the allocators when growing requires a fresh slab
/// and the underlying allocation comes back empty-handed. Nothing here
/// retries or recovers; the caller decides whether to abort, shrink demand
/// or try again later.
///
/// Freeing paths ([`SlabPool::trim_to`][1], [`StackAllocator::pop`][2],
/// [`BlockAllocator::clear`][3] and friends) never fail.
///
/// [1]: crate::SlabPool::trim_to
/// [2]: crate::StackAllocator::pop
/// [3]: crate::BlockAllocator::clear
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error(
    "system allocator could not provide a slab of {} bytes (alignment {})",
    .layout.size(),
    .layout.align()
)]
pub struct AllocError {
    layout: Layout,
}

impl AllocError {
    #[must_use]
    pub(crate) fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// The layout of the slab request that the system allocator rejected.
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_request() {
        let layout = Layout::from_size_align(4096, 64).unwrap();
        let error = AllocError::new(layout);

        let message = error.to_string();
        assert!(message.contains("4096"));
        assert!(message.contains("64"));
    }

    #[test]
    fn preserves_layout() {
        let layout = Layout::new::<u64>();
        let error = AllocError::new(layout);

        assert_eq!(error.layout(), layout);
    }
}
