//! `Gc<T>`, the non-moving heap pointer handed out by the collector.

use crate::heap::{GcBox, HEAP};
use crate::trace::{Finalize, Trace};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::ptr::NonNull;

/// A garbage-collected pointer to a `T` living on the current thread's heap.
///
/// Cloning increments the thing's root count; dropping the last clone lets
/// the next collection reclaim it (assuming nothing else still traces to
/// it). `Gc<T>` is not `Send`/`Sync`: a `ratjs` runtime is single-threaded
/// cooperative and values from one runtime must never cross into another
/// (spec §5).
pub struct Gc<T: Trace + 'static> {
    ptr: NonNull<GcBox<T>>,
}

impl<T: Trace + 'static> Gc<T> {
    pub fn new(value: T) -> Self {
        let ptr = HEAP.with(|heap| heap.alloc(value));
        Self { ptr }
    }

    fn inner(&self) -> &GcBox<T> {
        // SAFETY: `ptr` is always a live allocation on this thread's heap;
        // the box is only freed by `Heap::collect` when unrooted, and this
        // handle itself is a root for as long as it exists.
        unsafe { self.ptr.as_ref() }
    }

    /// Returns `true` if `self` and `other` point at the same heap slot.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        std::ptr::eq(this.ptr.as_ptr(), other.ptr.as_ptr())
    }

    pub(crate) fn raw_ptr(&self) -> NonNull<GcBox<T>> {
        self.ptr
    }

    /// Rebuilds a `Gc<T>` from a raw box pointer whose root count has
    /// already been incremented by the caller (used by `Weak::upgrade`).
    ///
    /// # Safety
    /// `ptr` must point to a live, rooted `GcBox<T>` on this thread's heap.
    pub(crate) unsafe fn from_raw(ptr: NonNull<GcBox<T>>) -> Self {
        Self { ptr }
    }
}

impl<T: Trace + 'static> Deref for Gc<T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.inner().data()
    }
}

impl<T: Trace + 'static> Clone for Gc<T> {
    fn clone(&self) -> Self {
        self.inner().root();
        Self { ptr: self.ptr }
    }
}

impl<T: Trace + 'static> Drop for Gc<T> {
    fn drop(&mut self) {
        self.inner().unroot();
    }
}

impl<T: Trace + fmt::Debug + 'static> fmt::Debug for Gc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: Trace + PartialEq + 'static> PartialEq for Gc<T> {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}
impl<T: Trace + Eq + 'static> Eq for Gc<T> {}

impl<T: Trace + Hash + 'static> Hash for Gc<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }
}

impl<T: Trace + 'static> Finalize for Gc<T> {}

// SAFETY: `trace` marks the pointee via the mark stack; `root`/`unroot`
// adjust the pointee's root count, matching what `Clone`/`Drop` already do
// for the handle itself (so a `Gc<T>` nested inside a traced struct is
// counted once per logical owner, not once per scan).
unsafe impl<T: Trace + 'static> Trace for Gc<T> {
    unsafe fn trace(&self, stack: &mut crate::heap::MarkStack) {
        // `stack.push` marks the pointee and enqueues it; the heap's
        // collection loop pops it back off and traces its own fields in
        // turn, so we must not recurse here (that would duplicate work
        // and defeat the explicit-mark-stack design of spec §4.4).
        let erased: NonNull<GcBox<dyn Trace>> = self.ptr;
        stack.push(erased);
    }

    unsafe fn root(&self) {
        self.inner().root();
    }

    unsafe fn unroot(&self) {
        self.inner().unroot();
    }
}
