//! `GcCell<T>`: interior mutability for GC-managed data.
//!
//! Mirrors `boa`'s `Gc<GcCell<Object>>` pattern (`boa/src/object/gcobject.rs`):
//! objects, environments, and other heap things that need to be mutated
//! through a shared `Gc<T>` handle wrap their data in a `GcCell`, borrowed
//! the same way `std::cell::RefCell` is borrowed.

use crate::heap::MarkStack;
use crate::trace::{Finalize, Trace};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;

pub struct GcCell<T>(RefCell<T>);

/// A wrapper type for an immutably borrowed `T`.
pub type GcCellRef<'a, T> = Ref<'a, T>;
/// A wrapper type for a mutably borrowed `T`.
pub type GcCellRefMut<'a, T> = RefMut<'a, T>;

impl<T> GcCell<T> {
    pub fn new(value: T) -> Self {
        Self(RefCell::new(value))
    }

    #[track_caller]
    pub fn borrow(&self) -> GcCellRef<'_, T> {
        self.0.borrow()
    }

    #[track_caller]
    pub fn borrow_mut(&self) -> GcCellRefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn try_borrow(&self) -> Result<GcCellRef<'_, T>, std::cell::BorrowError> {
        self.0.try_borrow()
    }

    pub fn try_borrow_mut(&self) -> Result<GcCellRefMut<'_, T>, std::cell::BorrowMutError> {
        self.0.try_borrow_mut()
    }

    pub fn into_inner(self) -> T {
        self.0.into_inner()
    }
}

impl<T: fmt::Debug> fmt::Debug for GcCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(v) => f.debug_tuple("GcCell").field(&*v).finish(),
            Err(_) => f.write_str("GcCell(<borrowed>)"),
        }
    }
}

impl<T: Default> Default for GcCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Trace> Finalize for GcCell<T> {
    fn finalize(&self) {
        self.0.borrow().finalize();
    }
}

// SAFETY: tracing/rooting/unrooting forwards to the inner value through an
// immutable borrow; the collector never traces during an active mutable
// borrow (mutation only happens inside ordinary, non-GC-reentrant engine
// calls, never from a finalizer mid-collection).
unsafe impl<T: Trace> Trace for GcCell<T> {
    unsafe fn trace(&self, stack: &mut MarkStack) {
        self.0.borrow().trace(stack);
    }
    unsafe fn root(&self) {
        self.0.borrow().root();
    }
    unsafe fn unroot(&self) {
        self.0.borrow().unroot();
    }
}
