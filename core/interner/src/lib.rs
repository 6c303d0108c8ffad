//! String interning for identifiers and property keys.
//!
//! Every identifier, property key, and literal string that flows through
//! the execution core is interned once and thereafter referred to by a
//! small `Copy` handle ([`Sym`]) instead of a heap-allocated string. This
//! keeps environment-record binding tables, property key comparisons, and
//! the builtin wiring tables (§4.3) cheap to hash and compare — comparisons
//! become integer equality instead of byte-for-byte string comparison.
//!
//! A fixed table of well-known strings (common property keys like
//! `length`, `prototype`, `message`, and the well-known symbol names used
//! by the object protocol) is interned eagerly so that builtin wiring code
//! can refer to them as compile-time constants rather than re-interning a
//! string literal on every lookup.

use std::num::NonZeroU32;

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

/// A handle to an interned string. Cheap to copy, compare, and hash;
/// resolves back to its text only through the [`Interner`] that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sym(NonZeroU32);

impl Sym {
    fn from_index(index: usize) -> Self {
        // Indices are 0-based internally; Sym is 1-based so NonZeroU32 can
        // represent every valid index without a separate niche.
        Sym(NonZeroU32::new((index as u32) + 1).expect("index + 1 is never zero"))
    }

    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Static table of strings interned eagerly at [`Interner::new`], in a
/// fixed order so their [`Sym`] values can be named as constants below.
/// Mirrors the property-key/well-known-symbol names the object protocol
/// (§4.3) and the builtin wiring tables (§4.10) refer to unconditionally.
static WELL_KNOWN: phf::OrderedSet<&'static str> = phf::phf_ordered_set! {
    "length",
    "name",
    "prototype",
    "constructor",
    "message",
    "stack",
    "cause",
    "toString",
    "valueOf",
    "next",
    "done",
    "value",
    "writable",
    "enumerable",
    "configurable",
    "get",
    "set",
    "then",
    "Symbol(Symbol.iterator)",
    "Symbol(Symbol.asyncIterator)",
    "Symbol(Symbol.hasInstance)",
    "Symbol(Symbol.toPrimitive)",
    "Symbol(Symbol.toStringTag)",
    "Symbol(Symbol.unscopables)",
};

macro_rules! well_known_syms {
    ($($konst:ident => $text:expr),+ $(,)?) => {
        impl Sym {
            $(
                pub const $konst: Sym = Sym(match NonZeroU32::new(
                    (well_known_index($text) as u32) + 1
                ) {
                    Some(n) => n,
                    None => panic!("well-known index overflowed u32"),
                });
            )+
        }
    };
}

const fn well_known_index(text: &'static str) -> usize {
    // `phf::OrderedSet` iteration order matches insertion order, but it has
    // no const lookup; the table above is small and stable, so the index
    // is hand-kept in sync with the declaration order instead of computed.
    match text.as_bytes() {
        b"length" => 0,
        b"name" => 1,
        b"prototype" => 2,
        b"constructor" => 3,
        b"message" => 4,
        b"stack" => 5,
        b"cause" => 6,
        b"toString" => 7,
        b"valueOf" => 8,
        b"next" => 9,
        b"done" => 10,
        b"value" => 11,
        b"writable" => 12,
        b"enumerable" => 13,
        b"configurable" => 14,
        b"get" => 15,
        b"set" => 16,
        b"then" => 17,
        b"Symbol(Symbol.iterator)" => 18,
        b"Symbol(Symbol.asyncIterator)" => 19,
        b"Symbol(Symbol.hasInstance)" => 20,
        b"Symbol(Symbol.toPrimitive)" => 21,
        b"Symbol(Symbol.toStringTag)" => 22,
        b"Symbol(Symbol.unscopables)" => 23,
        _ => panic!("not a well-known string"),
    }
}

well_known_syms! {
    LENGTH => "length",
    NAME => "name",
    PROTOTYPE => "prototype",
    CONSTRUCTOR => "constructor",
    MESSAGE => "message",
    STACK => "stack",
    CAUSE => "cause",
    TO_STRING => "toString",
    VALUE_OF => "valueOf",
    NEXT => "next",
    DONE => "done",
    VALUE => "value",
    WRITABLE => "writable",
    ENUMERABLE => "enumerable",
    CONFIGURABLE => "configurable",
    GET => "get",
    SET => "set",
    THEN => "then",
    ITERATOR => "Symbol(Symbol.iterator)",
    ASYNC_ITERATOR => "Symbol(Symbol.asyncIterator)",
    HAS_INSTANCE => "Symbol(Symbol.hasInstance)",
    TO_PRIMITIVE => "Symbol(Symbol.toPrimitive)",
    TO_STRING_TAG => "Symbol(Symbol.toStringTag)",
    UNSCOPABLES => "Symbol(Symbol.unscopables)",
}

/// A deduplicating string table. Interning the same text twice returns the
/// same [`Sym`]; resolving a `Sym` is an O(1) index into the backing set.
#[derive(Debug, Clone, PartialEq)]
pub struct Interner {
    strings: IndexSet<Box<str>, FxBuildHasher>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Creates an interner with the well-known string table pre-populated,
    /// so [`Sym::LENGTH`] and friends resolve correctly without the caller
    /// interning anything first.
    pub fn new() -> Self {
        let mut strings = IndexSet::with_hasher(FxBuildHasher::default());
        for s in WELL_KNOWN.iter() {
            strings.insert((*s).into());
        }
        Interner { strings }
    }

    /// Interns `text`, returning its `Sym`. A second call with the same
    /// text returns the same `Sym` without allocating.
    pub fn get_or_intern(&mut self, text: &str) -> Sym {
        if let Some(index) = self.strings.get_index_of(text) {
            return Sym::from_index(index);
        }
        let (index, _inserted) = self.strings.insert_full(text.into());
        Sym::from_index(index)
    }

    /// Resolves a `Sym` back to the text it was interned from.
    ///
    /// # Panics
    /// Panics if `sym` was produced by a different `Interner`.
    pub fn resolve(&self, sym: Sym) -> &str {
        self.strings
            .get_index(sym.index())
            .expect("Sym resolved against a foreign Interner")
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_syms_resolve_to_their_text() {
        let interner = Interner::new();
        assert_eq!(interner.resolve(Sym::LENGTH), "length");
        assert_eq!(interner.resolve(Sym::TO_STRING_TAG), "Symbol(Symbol.toStringTag)");
    }

    #[test]
    fn interning_the_same_text_twice_returns_the_same_sym() {
        let mut interner = Interner::new();
        let a = interner.get_or_intern("customProp");
        let b = interner.get_or_intern("customProp");
        assert_eq!(a, b);
        assert_eq!(interner.resolve(a), "customProp");
    }

    #[test]
    fn interning_distinct_text_returns_distinct_syms() {
        let mut interner = Interner::new();
        let a = interner.get_or_intern("foo");
        let b = interner.get_or_intern("bar");
        assert_ne!(a, b);
    }
}
