use std::cell::Cell;

use ratjs_interner::Sym;

const UNRESOLVED: u16 = 0xffff;

/// A compiled binding reference's fast-path resolution slot (§4.2, §9
/// "binding cache"): how many outer-chain hops the last resolution took and
/// the binding's index in the target environment's insertion-ordered table,
/// so a repeat lookup from the same reference skips name hashing and
/// chain-walking entirely. `0xffff` in either field means "never resolved",
/// matching `rjs_decl_env.c`'s sentinel rather than `Option<u16>` — the
/// sentinel has to survive sitting inert inside a cloned, never-executed
/// [`BindingReference`] the same as a resolved one does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingCache {
    hops: Cell<u16>,
    index: Cell<u16>,
}

impl BindingCache {
    pub fn new() -> Self {
        BindingCache {
            hops: Cell::new(UNRESOLVED),
            index: Cell::new(UNRESOLVED),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.hops.get() != UNRESOLVED
    }

    pub fn get(&self) -> Option<(u16, u16)> {
        self.is_resolved().then(|| (self.hops.get(), self.index.get()))
    }

    pub fn set(&self, hops: u16, index: u16) {
        self.hops.set(hops);
        self.index.set(index);
    }

    /// Invalidates this one slot. Called on every cache entry whose
    /// recorded `hops` is `>=` the depth at which `direct eval` spliced a
    /// new declarative environment into the chain — not a blanket
    /// clear-everything, following `rjs_decl_env.c` + `rjs_eval_opt.c` (see
    /// DESIGN.md's resolution of this as an Open Question).
    pub fn invalidate(&self) {
        self.hops.set(UNRESOLVED);
        self.index.set(UNRESOLVED);
    }
}

impl Default for BindingCache {
    fn default() -> Self {
        BindingCache::new()
    }
}

bitflags::bitflags! {
    /// Flags attached to a [`BindingDeclaration`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BindingFlags: u8 {
        /// `const`-declared; assignment after initialization is a runtime error.
        const CONST = 0b0000_0001;
        /// Declared in strict-mode code.
        const STRICT = 0b0000_0010;
        /// A `var`-style (function-scoped) binding rather than a lexical one.
        const VAR = 0b0000_0100;
    }
}

/// A single declared binding, grouped by the compiler into the script's
/// lexical or var-scoped declaration table (§6.1).
#[derive(Debug, Clone, PartialEq)]
pub struct BindingDeclaration {
    pub name: Sym,
    pub flags: BindingFlags,
}

impl BindingDeclaration {
    pub fn new(name: Sym, flags: BindingFlags) -> Self {
        Self { name, flags }
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(BindingFlags::CONST)
    }

    pub fn is_var(&self) -> bool {
        self.flags.contains(BindingFlags::VAR)
    }

    pub fn is_strict(&self) -> bool {
        self.flags.contains(BindingFlags::STRICT)
    }
}

/// A reference to a declared binding from within the bytecode, indexed by
/// instruction operand rather than looked up by name at run time. Carries
/// its own [`BindingCache`] slot so the environment chain walk this
/// reference triggers at run time only has to happen once per call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingReference {
    pub name: Sym,
    pub cache: BindingCache,
}

impl BindingReference {
    pub fn new(name: Sym) -> Self {
        Self { name, cache: BindingCache::new() }
    }
}
