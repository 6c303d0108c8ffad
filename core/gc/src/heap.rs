//! The mark-sweep heap (spec §4.4).
//!
//! Each runtime owns one heap. It is kept thread-local rather than threaded
//! through every call because `Gc<T>`'s `Clone`/`Drop` impls need to reach it
//! without a runtime handle in scope; the engine-level `Runtime` (see
//! `ratjs_engine::runtime`) still takes an explicit handle for everything
//! that isn't raw pointer bookkeeping, per the teacher's "every entry point
//! takes an explicit runtime handle" convention. A `ratjs` runtime is single-
//! threaded cooperative (spec §5), so one heap per thread is exactly one heap
//! per runtime in practice.

use crate::trace::Trace;
use std::cell::{Cell, RefCell};
use std::ptr::NonNull;

pub(crate) struct GcBoxHeader {
    /// Number of roots external to the GC heap (Rust-side `Gc<T>` handles
    /// and the runtime's value stack) keeping this thing alive.
    roots: Cell<u32>,
    marked: Cell<bool>,
    /// Outstanding `Weak<T>` handles. A box with `weak_count > 0` is kept
    /// allocated (but finalized) past the collection that frees it, so
    /// `Weak::upgrade` never dereferences freed memory; the allocation is
    /// reclaimed once its last `Weak` drops.
    weak_count: Cell<u32>,
    dead: Cell<bool>,
    next: Cell<Option<NonNull<GcBox<dyn Trace>>>>,
}

impl GcBoxHeader {
    fn new(next: Option<NonNull<GcBox<dyn Trace>>>) -> Self {
        Self {
            roots: Cell::new(1),
            marked: Cell::new(false),
            weak_count: Cell::new(0),
            dead: Cell::new(false),
            next: Cell::new(next),
        }
    }
}

#[repr(C)]
pub(crate) struct GcBox<T: Trace + ?Sized + 'static> {
    header: GcBoxHeader,
    data: T,
}

impl<T: Trace> GcBox<T> {
    pub(crate) fn data(&self) -> &T {
        &self.data
    }
}

impl<T: Trace + ?Sized> GcBox<T> {
    pub(crate) fn is_rooted(&self) -> bool {
        self.header.roots.get() > 0
    }

    pub(crate) fn root(&self) {
        self.header.roots.set(self.header.roots.get() + 1);
    }

    pub(crate) fn unroot(&self) {
        self.header.roots.set(self.header.roots.get() - 1);
    }

    fn is_marked(&self) -> bool {
        self.header.marked.get()
    }

    fn set_marked(&self, marked: bool) {
        self.header.marked.set(marked);
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.header.dead.get()
    }

    pub(crate) fn inc_weak(&self) {
        self.header.weak_count.set(self.header.weak_count.get() + 1);
    }

    pub(crate) fn dec_weak(&self) -> u32 {
        let n = self.header.weak_count.get() - 1;
        self.header.weak_count.set(n);
        n
    }
}

/// The explicit mark stack driving the trace (spec §4.4 step 2).
///
/// When the stack grows past [`Heap::MARK_STACK_LIMIT`] it stops accepting
/// new entries and flags `stack_full`; the collector then falls back to a
/// conservative re-scan of the roots instead of losing reachability.
pub struct MarkStack {
    entries: Vec<NonNull<GcBox<dyn Trace>>>,
    stack_full: bool,
}

impl MarkStack {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            stack_full: false,
        }
    }

    /// Pushes a GC thing onto the mark stack if it is unmarked.
    ///
    /// # Safety
    /// `ptr` must point to a live `GcBox` allocated by this heap.
    pub unsafe fn push(&mut self, ptr: NonNull<GcBox<dyn Trace>>) {
        let gcbox = ptr.as_ref();
        if gcbox.is_marked() {
            return;
        }
        gcbox.set_marked(true);
        if self.entries.len() >= Heap::MARK_STACK_LIMIT {
            self.stack_full = true;
            return;
        }
        self.entries.push(ptr);
    }
}

/// A registry entry for a weak reference with an optional finalizer job.
struct WeakEntry {
    target: NonNull<GcBox<dyn Trace>>,
    finalizer: Option<Box<dyn FnOnce()>>,
}

pub struct Heap {
    head: Cell<Option<NonNull<GcBox<dyn Trace>>>>,
    bytes_allocated: Cell<usize>,
    threshold: Cell<usize>,
    running: Cell<bool>,
    enabled: Cell<bool>,
    collections: Cell<usize>,
    weak_registry: RefCell<Vec<WeakEntry>>,
    /// Jobs scheduled as a consequence of a weak target dying (spec §4.4
    /// step 3: "no synchronous call; enqueued as a job"). Drained by the
    /// engine's job queue, not by the heap itself.
    pending_finalizer_jobs: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Heap {
    /// Default soft allocation threshold before a collection is attempted.
    const DEFAULT_THRESHOLD: usize = 1 << 20; // 1 MiB
    /// Mark stack depth before falling back to a conservative root re-scan.
    const MARK_STACK_LIMIT: usize = 4096;

    const fn new() -> Self {
        Self {
            head: Cell::new(None),
            bytes_allocated: Cell::new(0),
            threshold: Cell::new(Self::DEFAULT_THRESHOLD),
            running: Cell::new(false),
            enabled: Cell::new(true),
            collections: Cell::new(0),
            weak_registry: RefCell::new(Vec::new()),
            pending_finalizer_jobs: RefCell::new(Vec::new()),
        }
    }

    pub fn set_threshold(&self, bytes: usize) {
        self.threshold.set(bytes);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    pub fn collections(&self) -> usize {
        self.collections.get()
    }

    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated.get()
    }

    /// Allocates `value` on the heap and returns the owning box.
    ///
    /// Runs a collection first if the soft threshold has been exceeded and
    /// collection is both enabled and not already in progress (the
    /// reentrant guard from spec §4.4: "prevents nested collection from
    /// user finalizers").
    pub(crate) fn alloc<T: Trace + 'static>(&self, value: T) -> NonNull<GcBox<T>> {
        let size = std::mem::size_of::<GcBox<T>>();
        if self.enabled.get() && !self.running.get() && self.bytes_allocated.get() + size > self.threshold.get()
        {
            // SAFETY: called with no live unrooted borrow across the collection.
            unsafe { self.collect() };
        }

        let gcbox = Box::new(GcBox {
            header: GcBoxHeader::new(self.head.get()),
            data: value,
        });
        let ptr = NonNull::new(Box::into_raw(gcbox)).expect("Box::into_raw is never null");
        self.bytes_allocated.set(self.bytes_allocated.get() + size);

        // SAFETY: `ptr` was just allocated and is fully initialized; the
        // unsized coercion to `GcBox<dyn Trace>` only changes the pointer's
        // vtable metadata.
        let erased: NonNull<GcBox<dyn Trace>> = ptr;
        self.head.set(Some(erased));

        // Any `Gc<U>` field nested inside `value` was rooted when it was
        // first constructed (as a plain Rust local). It has just become
        // owned by this new allocation instead, so it's only reachable
        // from here on by tracing through `ptr` - cancel the root it no
        // longer needs. This is what lets mark-sweep reclaim cycles: a
        // `Gc` embedded in another `Gc`'s data contributes zero external
        // roots once unrooted here, same as `boa_gc`/`rust-gc`.
        unsafe { ptr.as_ref().data().unroot() };

        ptr
    }

    pub(crate) fn register_weak(&self, target: NonNull<GcBox<dyn Trace>>, finalizer: Option<Box<dyn FnOnce()>>) {
        self.weak_registry.borrow_mut().push(WeakEntry { target, finalizer });
    }

    /// Drains finalizer jobs scheduled by the most recent collection.
    ///
    /// The engine's job queue (spec §4.8) calls this once per pump turn so
    /// finalizers run as ordinary jobs, never mid-collection.
    pub fn drain_finalizer_jobs(&self) -> Vec<Box<dyn FnOnce()>> {
        std::mem::take(&mut *self.pending_finalizer_jobs.borrow_mut())
    }

    /// Runs one full mark-sweep collection (spec §4.4).
    ///
    /// # Safety
    /// Must not be called while any `Trace::trace` impl on the heap is
    /// mid-borrow in a way that would alias with sweeping (i.e. not from
    /// inside a partially-initialized object's constructor).
    pub unsafe fn collect(&self) {
        if self.running.get() {
            return;
        }
        self.running.set(true);

        let mut stack = MarkStack::new();

        // Step 1 & 2: roots + mark. Every rooted GcBox is a root; callers
        // root engine-level roots (context stack, realms, interned
        // strings/symbols, job queue, value-stack slots) by keeping a
        // `Gc<T>` handle alive, which increments `roots` on construction.
        let mut cursor = self.head.get();
        while let Some(ptr) = cursor {
            let gcbox = ptr.as_ref();
            if gcbox.is_rooted() {
                stack.push(ptr);
            }
            cursor = gcbox.header.next.get();
        }

        loop {
            while let Some(ptr) = stack.entries.pop() {
                ptr.as_ref().data.trace(&mut stack);
            }
            if stack.stack_full {
                // Conservative restart: re-scan every root once more; any
                // thing already marked is a no-op push.
                stack.stack_full = false;
                let mut cursor = self.head.get();
                while let Some(ptr) = cursor {
                    let gcbox = ptr.as_ref();
                    if gcbox.is_rooted() {
                        stack.push(ptr);
                    }
                    cursor = gcbox.header.next.get();
                }
                if stack.entries.is_empty() {
                    break;
                }
            } else {
                break;
            }
        }

        // Step 3: weak refs & finalizers. A dying target is flagged `dead`
        // here; its entry is dropped from the registry once the finalizer
        // job has been scheduled. The box itself is reclaimed in step 4,
        // immediately if nothing still holds a `Weak` to it, or kept as a
        // finalized zombie (still linked, never marked again) until its
        // last `Weak` goes away.
        {
            let mut registry = self.weak_registry.borrow_mut();
            let mut jobs = self.pending_finalizer_jobs.borrow_mut();
            registry.retain_mut(|entry| {
                let target = entry.target.as_ref();
                let alive = target.is_marked();
                if !alive && !target.is_dead() {
                    target.header.dead.set(true);
                    if let Some(finalizer) = entry.finalizer.take() {
                        jobs.push(finalizer);
                    }
                }
                alive
            });
        }

        // Step 4: sweep.
        let mut cursor = self.head.get();
        let mut prev: Option<NonNull<GcBox<dyn Trace>>> = None;
        let mut freed = 0usize;
        while let Some(ptr) = cursor {
            let gcbox = ptr.as_ref();
            let next = gcbox.header.next.get();
            if gcbox.is_marked() {
                gcbox.set_marked(false);
                prev = Some(ptr);
            } else if gcbox.header.weak_count.get() > 0 {
                // Still weakly reachable: finalize (if not done already by
                // step 3) but leave it linked as a zombie.
                if !gcbox.is_dead() {
                    gcbox.header.dead.set(true);
                    gcbox.data.finalize();
                }
                prev = Some(ptr);
            } else {
                if let Some(prev_ptr) = prev {
                    prev_ptr.as_ref().header.next.set(next);
                } else {
                    self.head.set(next);
                }
                if !gcbox.is_dead() {
                    gcbox.data.finalize();
                }
                freed += std::mem::size_of_val(gcbox);
                drop(Box::from_raw(ptr.as_ptr()));
            }
            cursor = next;
        }
        self.bytes_allocated.set(self.bytes_allocated.get().saturating_sub(freed));
        self.collections.set(self.collections.get() + 1);
        self.running.set(false);
        tracing::debug!(freed, collections = self.collections.get(), "gc: collection complete");
    }
}

thread_local! {
    pub(crate) static HEAP: Heap = const { Heap::new() };
}

/// Forces an immediate collection on the current thread's heap.
///
/// Mirrors `boa_gc::force_collect`, used by tests and by hosts that want a
/// deterministic collection point (e.g. before measuring memory use).
pub fn force_collect() {
    HEAP.with(|heap| unsafe { heap.collect() });
}

/// Enables or disables automatic threshold-triggered collection.
pub fn set_gc_enabled(enabled: bool) {
    HEAP.with(|heap| heap.set_enabled(enabled));
}

/// Sets the soft byte threshold that triggers a collection on allocation.
pub fn set_gc_threshold(bytes: usize) {
    HEAP.with(|heap| heap.set_threshold(bytes));
}

/// Test/diagnostic helpers mirroring `boa_gc`'s `GcTester`.
pub struct GcTester;

impl GcTester {
    pub fn assert_collections(expected: usize) {
        HEAP.with(|heap| assert_eq!(heap.collections(), expected));
    }

    pub fn assert_empty_gc() {
        HEAP.with(|heap| assert_eq!(heap.bytes_allocated(), 0));
    }

    pub fn assert_youth_bytes_allocated() {
        HEAP.with(|heap| assert!(heap.bytes_allocated() > 0));
    }
}
