//! Single-writer double-buffered publication.

use core::cell::UnsafeCell;
use portable_atomic::{AtomicU8, Ordering};

/// A two-slot publication cell for trivially copyable values.
///
/// The writer fills the slot not currently selected, then publishes it by
/// flipping the index with release ordering; readers acquire the index and
/// copy the selected slot out. A reader therefore observes either the
/// previous fully-written value or the new fully-written value, never a mix.
///
/// # Contract
///
/// Exactly one execution context may call [`publish`](Latch::publish); any
/// number may call [`load`](Latch::load). A reader that is preempted for
/// longer than two write intervals could in principle observe a slot being
/// rewritten; the interval between bus frames (hundreds of microseconds) is
/// orders of magnitude above the copy time, which is the same argument a
/// seqlock drops its retry loop for.
pub struct Latch<T> {
    slots: [UnsafeCell<T>; 2],
    index: AtomicU8,
}

// Readers copy out of a slot the single writer is not touching.
unsafe impl<T: Copy + Send> Sync for Latch<T> {}

impl<T: Copy> Latch<T> {
    #[must_use]
    pub const fn new(initial: T) -> Self {
        Self {
            slots: [UnsafeCell::new(initial), UnsafeCell::new(initial)],
            index: AtomicU8::new(0),
        }
    }

    /// Publish a new value. Single-writer only.
    pub fn publish(&self, value: T) {
        let current = self.index.load(Ordering::Relaxed);
        let next = current ^ 1;
        // SAFETY: the slot at `next` is not selected, so no reader starts a
        // copy from it, and the single-writer contract rules out concurrent
        // writes.
        unsafe {
            *self.slots[next as usize].get() = value;
        }
        self.index.store(next, Ordering::Release);
    }

    /// Copy out the most recently published value.
    #[must_use]
    pub fn load(&self) -> T {
        let current = self.index.load(Ordering::Acquire);
        // SAFETY: the writer only mutates the unselected slot.
        unsafe { *self.slots[current as usize].get() }
    }
}

/// Scratch state owned by a single execution context.
///
/// Used for the decode shadows the receive paths accumulate into before
/// publishing through a [`Latch`]. Not a synchronization primitive: only the
/// owning context may touch the contents.
pub(crate) struct ShadowCell<T>(UnsafeCell<T>);

unsafe impl<T: Send> Sync for ShadowCell<T> {}

impl<T> ShadowCell<T> {
    pub const fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    /// # Safety
    ///
    /// The caller must be the cell's single owning context, and must not let
    /// the returned reference escape that context.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_mut(&self) -> &mut T {
        &mut *self.0.get()
    }
}
