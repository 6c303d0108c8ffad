//! Runtime configuration and construction (SPEC_FULL.md §0 "Configuration").
//!
//! Mirrors `ContextBuilder`'s fluent shape (grounded on the later-generation
//! Boa `ContextBuilder`, referenced from `boa_engine::context`): a plain
//! `Default`-derived options struct plus a builder that turns it into a
//! [`Context`] wrapping one freshly-created realm.

use crate::object::{JsObject, ObjectKind};
use crate::context::Context;

/// Tunable knobs for a freshly-built [`Context`] (§4.4's GC soft threshold,
/// §3.1's segmented value stack, and the mark-stack depth the spec's
/// stack-full conservative restart checks against).
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Bytes of live allocation between automatic collections
    /// (`ratjs_gc::set_gc_threshold`, §4.4 "soft threshold each N bytes").
    pub gc_threshold_bytes: usize,
    /// Depth of the mark stack before a collection falls back to the
    /// conservative restart-from-roots pass (§4.4). Currently stored but
    /// inert: `ratjs_gc::Heap::MARK_STACK_LIMIT` is a private constant with
    /// no public setter, so this field has nothing to wire into yet (see
    /// DESIGN.md).
    pub mark_stack_limit: usize,
    /// Number of value-stack slots to preallocate (§3.1).
    pub initial_value_stack_capacity: usize,
    /// Whether the GC runs automatically at all, versus only on an explicit
    /// `force_collect` call (`ratjs_gc::set_gc_enabled`).
    pub gc_enabled: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        RuntimeOptions {
            gc_threshold_bytes: 8 * 1024 * 1024,
            mark_stack_limit: 4096,
            initial_value_stack_capacity: 1024,
            gc_enabled: true,
        }
    }
}

/// Builds a [`Context`] around one fresh realm, applying [`RuntimeOptions`]
/// to the process-wide GC knobs before handing the runtime back.
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    options: RuntimeOptions,
}

impl Runtime {
    pub fn new() -> Self {
        Runtime::default()
    }

    pub fn with_options(options: RuntimeOptions) -> Self {
        Runtime { options }
    }

    pub fn gc_threshold_bytes(mut self, bytes: usize) -> Self {
        self.options.gc_threshold_bytes = bytes;
        self
    }

    pub fn mark_stack_limit(mut self, limit: usize) -> Self {
        self.options.mark_stack_limit = limit;
        self
    }

    pub fn initial_value_stack_capacity(mut self, capacity: usize) -> Self {
        self.options.initial_value_stack_capacity = capacity;
        self
    }

    pub fn gc_enabled(mut self, enabled: bool) -> Self {
        self.options.gc_enabled = enabled;
        self
    }

    /// Applies the GC options and constructs a `Context` around a fresh
    /// global object. The global object's prototype and intrinsics are left
    /// for the built-in library surface to install (out of scope here).
    pub fn build(self) -> Context {
        ratjs_gc::set_gc_enabled(self.options.gc_enabled);
        ratjs_gc::set_gc_threshold(self.options.gc_threshold_bytes);
        tracing::debug!(
            gc_threshold_bytes = self.options.gc_threshold_bytes,
            initial_value_stack_capacity = self.options.initial_value_stack_capacity,
            "building runtime"
        );
        let global_object = JsObject::new(ObjectKind::Ordinary, None);
        Context::new(global_object, self.options.initial_value_stack_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_build_a_context_with_no_pending_jobs() {
        let mut ctx = Runtime::new().build();
        assert_eq!(ctx.pending_jobs(), 0);
        ctx.run_jobs();
    }

    #[test]
    fn builder_methods_compose_fluently() {
        let runtime = Runtime::new()
            .gc_threshold_bytes(1024)
            .mark_stack_limit(256)
            .initial_value_stack_capacity(8)
            .gc_enabled(false);
        let ctx = runtime.build();
        assert_eq!(ctx.pending_jobs(), 0);
    }
}
