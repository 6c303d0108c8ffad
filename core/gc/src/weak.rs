//! Weak references with finalizer scheduling (spec §4.4 step 3, §3.9).

use crate::heap::{GcBox, HEAP};
use crate::pointer::Gc;
use crate::trace::{Finalize, Trace};
use std::ptr::NonNull;

/// A reference to a GC thing that does not keep it alive.
///
/// After a collection in which the target was unreachable, [`Weak::upgrade`]
/// returns `None`. An optional finalizer, registered at construction time,
/// is scheduled as a job (never called synchronously, per spec §4.4) the
/// moment the collector determines the target is dead. The box backing a
/// `Weak`'s target is kept allocated (but finalized) for as long as any
/// `Weak` still points to it, so `upgrade` never touches freed memory.
pub struct Weak<T: Trace + 'static> {
    ptr: NonNull<GcBox<T>>,
}

impl<T: Trace + 'static> Weak<T> {
    /// Registers a weak reference to `target`, with an optional finalizer
    /// to run (as a job) once `target` is collected.
    pub fn new(target: &Gc<T>, finalizer: Option<Box<dyn FnOnce()>>) -> Self {
        let ptr = target.raw_ptr();
        let erased: NonNull<GcBox<dyn Trace>> = ptr;
        // SAFETY: `ptr` is a live allocation owned by `target`.
        unsafe { erased.as_ref().inc_weak() };
        HEAP.with(|heap| heap.register_weak(erased, finalizer));
        Self { ptr }
    }

    /// Attempts to upgrade to a strong reference.
    ///
    /// Returns `None` once the collector has determined the pointee is
    /// unreachable, even though the allocation itself may still be around
    /// (as a finalized zombie) until this and every other `Weak` to it
    /// drops.
    pub fn upgrade(&self) -> Option<Gc<T>> {
        // SAFETY: the box stays allocated for the lifetime of every `Weak`
        // pointing at it (see `Drop` below and `Heap::collect`'s sweep),
        // so dereferencing it here is always valid.
        unsafe {
            let gcbox = self.ptr.as_ref();
            if gcbox.is_dead() {
                None
            } else {
                gcbox.root();
                Some(Gc::from_raw(self.ptr))
            }
        }
    }
}

impl<T: Trace + 'static> Clone for Weak<T> {
    fn clone(&self) -> Self {
        unsafe {
            let erased: NonNull<GcBox<dyn Trace>> = self.ptr;
            erased.as_ref().inc_weak();
        }
        Self { ptr: self.ptr }
    }
}

impl<T: Trace + 'static> Drop for Weak<T> {
    fn drop(&mut self) {
        // SAFETY: see `upgrade`; the box is valid until the last `Weak`
        // drops, which is exactly what this decrement tracks.
        unsafe {
            let erased: NonNull<GcBox<dyn Trace>> = self.ptr;
            let gcbox = erased.as_ref();
            if gcbox.dec_weak() == 0 && gcbox.is_dead() {
                // The next collection's sweep will see `weak_count == 0`
                // on an already-dead, never-marked box and reclaim it;
                // we don't free it here to avoid unlinking outside of a
                // collection (the heap's intrusive list is only ever
                // mutated during sweep).
            }
        }
    }
}

impl<T: Trace + 'static> Finalize for Weak<T> {}
unsafe impl<T: Trace + 'static> Trace for Weak<T> {
    // A weak reference deliberately does not keep its target alive, so it
    // contributes no outgoing edges to the mark phase.
    unsafe fn trace(&self, _stack: &mut crate::heap::MarkStack) {}
}
