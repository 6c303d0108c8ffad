//! Mark-sweep garbage collector for the RatJavaScript execution core.
//!
//! This is the GC heap described in spec §3.2 and §4.4: every GC thing
//! starts life as a [`Gc<T>`]-owned allocation; tracing is driven by an
//! explicit [`MarkStack`] rather than recursion, so a pathologically deep
//! object graph degrades to a conservative root re-scan instead of
//! overflowing the native stack.

mod cell;
mod heap;
mod pointer;
mod trace;
mod weak;

pub use cell::{GcCell, GcCellRef, GcCellRefMut};
pub use heap::{force_collect, set_gc_enabled, set_gc_threshold, GcTester, MarkStack};
pub use pointer::Gc;
pub use trace::{Finalize, Trace};
pub use weak::Weak;

pub use ratjs_macros::{Finalize, Trace};
