//! A realm (§3.7): the set of intrinsics, the global object, and the
//! global environment a script executes against. A runtime hosts multiple
//! realms simultaneously (iframes, `vm.Context`-style sandboxes); cross-
//! realm construction walks back through the target's own realm to fetch
//! intrinsics like `%Array%` rather than using whichever realm is merely
//! "current" (`rjs_object_object_inc.c`'s `SpeciesConstructor` pattern).

use rustc_hash::FxHashMap;

use crate::environment::Environment;
use crate::object::JsObject;
use crate::value::JsSymbol;
use crate::value::JsString;

/// The well-known symbols (§4.1's `Symbol.toPrimitive` et al.), allocated
/// once and shared by every realm a `Context` hosts — a script can observe
/// `Symbol.iterator === Symbol.iterator` across realms, so these can't be
/// re-minted per realm.
#[derive(Debug, Clone)]
pub struct WellKnownSymbols {
    pub to_primitive: JsSymbol,
    pub iterator: JsSymbol,
    pub async_iterator: JsSymbol,
    pub has_instance: JsSymbol,
    pub is_concat_spreadable: JsSymbol,
    pub species: JsSymbol,
    pub to_string_tag: JsSymbol,
    pub unscopables: JsSymbol,
    pub match_: JsSymbol,
    pub replace: JsSymbol,
    pub search: JsSymbol,
    pub split: JsSymbol,
}

impl WellKnownSymbols {
    /// Mints the twelve well-known symbols, assigning them the first
    /// twelve slots of the runtime's symbol-id counter; `next_id` is handed
    /// back so the caller's counter resumes after them.
    pub fn new(next_id: &mut u64) -> Self {
        let mut sym = |name: &'static str| {
            let id = *next_id;
            *next_id += 1;
            JsSymbol::new(Some(JsString::from(name)), id)
        };
        WellKnownSymbols {
            to_primitive: sym("Symbol.toPrimitive"),
            iterator: sym("Symbol.iterator"),
            async_iterator: sym("Symbol.asyncIterator"),
            has_instance: sym("Symbol.hasInstance"),
            is_concat_spreadable: sym("Symbol.isConcatSpreadable"),
            species: sym("Symbol.species"),
            to_string_tag: sym("Symbol.toStringTag"),
            unscopables: sym("Symbol.unscopables"),
            match_: sym("Symbol.match"),
            replace: sym("Symbol.replace"),
            search: sym("Symbol.search"),
            split: sym("Symbol.split"),
        }
    }
}

/// Realm Record (§3.7). Intrinsics are a flat name table rather than the
/// ~150 individually-typed fields `boa`'s `StandardConstructors`/
/// `Intrinsics` carry, since the built-in library surface itself (what
/// populates this table) is out of scope here — the table exists so
/// whatever host populates it has one place to do so.
#[derive(Debug)]
pub struct Realm {
    pub global_object: JsObject,
    pub global_env: Environment,
    intrinsics: FxHashMap<&'static str, JsObject>,
}

impl Realm {
    /// Creates a realm around a fresh global object with no intrinsics
    /// registered yet (`%Object.prototype%`, `%Array%`, ... are populated
    /// by the built-in library surface, out of scope here).
    pub fn new(global_object: JsObject) -> Self {
        let global_env = Environment::new_global(global_object.clone());
        Realm {
            global_object,
            global_env,
            intrinsics: FxHashMap::default(),
        }
    }

    pub fn set_intrinsic(&mut self, name: &'static str, value: JsObject) {
        self.intrinsics.insert(name, value);
    }

    /// Looks up an intrinsic by name (e.g. `"Array"`, `"Object.prototype"`,
    /// `"TypeError"`). Used for cross-realm construction (`%Array%` of the
    /// realm a constructor actually belongs to, not whichever realm issued
    /// the `new` expression).
    pub fn intrinsic(&self, name: &str) -> Option<JsObject> {
        self.intrinsics.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    #[test]
    fn an_unregistered_intrinsic_is_absent() {
        let realm = Realm::new(JsObject::new(ObjectKind::Ordinary, None));
        assert!(realm.intrinsic("Array").is_none());
    }

    #[test]
    fn a_registered_intrinsic_round_trips_by_name() {
        let mut realm = Realm::new(JsObject::new(ObjectKind::Ordinary, None));
        let array_prototype = JsObject::new(ObjectKind::Ordinary, None);
        realm.set_intrinsic("Array.prototype", array_prototype.clone());
        assert_eq!(realm.intrinsic("Array.prototype"), Some(array_prototype));
    }

    #[test]
    fn well_known_symbols_are_pairwise_distinct() {
        let mut next_id = 0;
        let symbols = WellKnownSymbols::new(&mut next_id);
        assert_ne!(symbols.iterator, symbols.async_iterator);
        assert_ne!(symbols.to_primitive, symbols.has_instance);
        assert_eq!(next_id, 12);
    }
}
