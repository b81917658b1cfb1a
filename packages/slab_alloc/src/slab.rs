use std::alloc::{Layout, alloc, dealloc};
use std::fmt;
use std::mem::MaybeUninit;
use std::num::NonZero;
use std::ptr::NonNull;

use crate::AllocError;

/// Alignment of every slab's storage region, in bytes.
///
/// Starting each slab on a cache line boundary keeps same-type values packed
/// into one slab from false-sharing with neighboring heap allocations and
/// plays nicely with the prefetcher when values are visited in order.
pub(crate) const SLAB_ALIGN: usize = 64;

/// A fixed-capacity heap block of raw storage for `capacity` values of `T`.
///
/// The storage is uninitialized: the slab itself never constructs or drops a
/// `T`, it only carries the cells. Whoever holds the `Slab` value owns the
/// storage exclusively, so handing a slab from a pool to an allocator (or
/// back) is a plain move and the previous owner cannot retain an alias to it.
///
/// Dropping a slab returns its storage to the system allocator, again without
/// touching any cell contents.
pub(crate) struct Slab<T> {
    storage: NonNull<MaybeUninit<T>>,
    capacity: NonZero<usize>,
}

impl<T> Slab<T> {
    /// Allocates a fresh slab of `capacity` cells from the system allocator.
    ///
    /// This is the only fallible operation in the crate: an exhausted system
    /// allocator surfaces as an [`AllocError`] for the caller to propagate.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized.
    pub(crate) fn new(capacity: NonZero<usize>) -> Result<Self, AllocError> {
        assert!(size_of::<T>() > 0, "Slab must have non-zero item size");

        let layout = Self::layout(capacity);

        // SAFETY: The layout has non-zero size (at least one cell of a
        // non-zero-sized T, guarded by the assert above).
        let ptr = unsafe { alloc(layout) };

        let Some(storage) = NonNull::new(ptr.cast::<MaybeUninit<T>>()) else {
            return Err(AllocError::new(layout));
        };

        Ok(Self { storage, capacity })
    }

    /// Layout of the whole storage region: `capacity` cells of `T`, padded so
    /// the region starts on a cache line boundary.
    #[must_use]
    fn layout(capacity: NonZero<usize>) -> Layout {
        Layout::array::<MaybeUninit<T>>(capacity.get())
            .expect("slab layout must fit in the address space for any realistic capacity")
            .align_to(SLAB_ALIGN)
            .expect("cache line size is a valid power-of-two alignment")
            .pad_to_align()
    }

    /// The number of cells in this slab.
    #[must_use]
    pub(crate) fn capacity(&self) -> NonZero<usize> {
        self.capacity
    }

    /// Returns a pointer to the cell at `index`.
    ///
    /// The cell may or may not hold an initialized value - the slab does not
    /// know and does not care; tracking that is the owner's job.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[must_use]
    pub(crate) fn cell(&self, index: usize) -> NonNull<T> {
        assert!(
            index < self.capacity.get(),
            "cell {index} out of bounds in slab of {} cells",
            self.capacity
        );

        // SAFETY: Guarded by the bounds check above; the storage region holds
        // `capacity` cells.
        unsafe { self.storage.add(index) }.cast::<T>()
    }
}

impl<T> Drop for Slab<T> {
    fn drop(&mut self) {
        // SAFETY: The layout matches the allocation made in `new()`.
        unsafe {
            dealloc(self.storage.as_ptr().cast(), Self::layout(self.capacity));
        }
    }
}

// A manual impl so `Slab<T>: Debug` does not require `T: Debug` - the cells
// are raw storage, there are no values to show.
impl<T> fmt::Debug for Slab<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slab")
            .field("storage", &self.storage)
            .field("capacity", &self.capacity)
            .finish()
    }
}

// SAFETY: The slab is plain owned storage addressed via a raw pointer;
// nothing about it is tied to a particular thread, so it can move between
// threads whenever T itself can.
unsafe impl<T: Send> Send for Slab<T> {}
