//! The module namespace exotic object (§4.9 "Module namespace objects"):
//! a frozen view over a module's live export bindings, enumerated in
//! code-point sort order of the export names.
//!
//! Export names are kept in an [`RbTree`] rather than the ordinary
//! insertion-ordered [`PropertyMap`](crate::property::PropertyMap) — module
//! namespace enumeration order is defined as sorted order, not declaration
//! order, so reusing the ordinary map here would need a separate sort pass
//! on every `[[OwnPropertyKeys]]` call. The tree is shared (via the
//! underlying `Gc`) with whatever instantiates the module, so a live
//! binding update that writes through the same handle is visible to every
//! importer without a separate notification mechanism.

use std::fmt;

use ratjs_gc::{Finalize, Trace};
use ratjs_rbtree::RbTree;

use crate::property::PropertyDescriptor;
use crate::value::{JsString, JsValue, PropertyKey};

use super::{JsObject, JsResult};

/// Wraps `RbTree<JsString, JsValue>` so `Trace` can be implemented here —
/// `RbTree` is foreign to this crate, same orphan-rule shape as
/// [`PropertyMap`](crate::property::PropertyMap).
#[derive(Default)]
pub struct SortedExports(RbTree<JsString, JsValue>);

impl fmt::Debug for SortedExports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter().map(|(k, v)| (k.as_str(), v))).finish()
    }
}

impl Finalize for SortedExports {}
unsafe impl Trace for SortedExports {
    unsafe fn trace(&self, stack: &mut ratjs_gc::MarkStack) {
        for (name, value) in self.0.iter() {
            name.trace(stack);
            value.trace(stack);
        }
    }
    unsafe fn root(&self) {
        for (name, value) in self.0.iter() {
            name.root();
            value.root();
        }
    }
    unsafe fn unroot(&self) {
        for (name, value) in self.0.iter() {
            name.unroot();
            value.unroot();
        }
    }
}

#[derive(Debug, Default)]
pub struct ModuleNamespaceData {
    exports: SortedExports,
}

impl Finalize for ModuleNamespaceData {}
unsafe impl Trace for ModuleNamespaceData {
    unsafe fn trace(&self, stack: &mut ratjs_gc::MarkStack) {
        self.exports.trace(stack);
    }
    unsafe fn root(&self) {
        self.exports.root();
    }
    unsafe fn unroot(&self) {
        self.exports.unroot();
    }
}

impl ModuleNamespaceData {
    pub fn new() -> Self {
        ModuleNamespaceData::default()
    }

    /// Installs or overwrites the live value bound to `name`, called by
    /// module instantiation/linking (and by re-evaluation of the module's
    /// top-level bindings) rather than by any exotic method here — the
    /// namespace object never originates a binding itself.
    pub fn bind(&mut self, name: JsString, value: JsValue) {
        self.exports.0.insert(name, value);
    }
}

pub fn new_namespace(data: ModuleNamespaceData) -> JsObject {
    JsObject::new(super::ObjectKind::ModuleNamespace(data), None)
}

fn exports(object: &JsObject) -> Vec<(JsString, JsValue)> {
    let data = object.data();
    let super::ObjectKind::ModuleNamespace(ns) = &data.kind else {
        unreachable!("module_namespace::* called on a non-namespace object");
    };
    ns.exports.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// A module namespace object's own `@@toStringTag` (§4.9): a fixed,
/// non-enumerable `"Module"` data property, not one of the live export
/// bindings `exports` tracks.
fn to_string_tag_descriptor() -> PropertyDescriptor {
    PropertyDescriptor::data(JsValue::from("Module"), false, false, false)
}

pub fn get_own_property(object: &JsObject, key: &PropertyKey, ctx: &mut crate::context::Context) -> Option<PropertyDescriptor> {
    if let PropertyKey::Symbol(sym) = key {
        if *sym == ctx.well_known_symbols().to_string_tag {
            return Some(to_string_tag_descriptor());
        }
        return None;
    }
    let PropertyKey::String(name) = key else {
        return None;
    };
    exports(object)
        .into_iter()
        .find(|(export_name, _)| export_name == name)
        .map(|(_, value)| PropertyDescriptor::data(value, true, true, false))
}

/// Every write attempt that would change the binding's shape is rejected by
/// returning `false`, not by throwing — a `TypeError` only appears one layer
/// up, in `Object.defineProperty`'s wrapper, which is outside this exotic
/// method's job (§4.9).
pub fn define_own_property(object: &JsObject, key: &PropertyKey, desc: PropertyDescriptor, ctx: &mut crate::context::Context) -> JsResult<bool> {
    let Some(current) = get_own_property(object, key, ctx) else {
        return Ok(false);
    };
    let configurable_change = desc.has_configurable() && desc.configurable();
    let enumerable_change = desc.has_enumerable() && desc.enumerable() != current.enumerable();
    let value_change = desc.has_value()
        && !crate::value::equality::same_value(desc.value().unwrap(), current.value().unwrap());
    if configurable_change || enumerable_change || value_change || desc.is_accessor_descriptor() {
        return Ok(false);
    }
    Ok(true)
}

pub fn get(object: &JsObject, key: &PropertyKey, ctx: &mut crate::context::Context) -> JsResult<JsValue> {
    Ok(get_own_property(object, key, ctx)
        .and_then(|desc| desc.value().cloned())
        .unwrap_or_else(JsValue::undefined))
}

/// A non-configurable own property can't be deleted; an absent key reports
/// success, matching ordinary `[[Delete]]`'s vacuous-success case.
pub fn delete(object: &JsObject, key: &PropertyKey, ctx: &mut crate::context::Context) -> bool {
    get_own_property(object, key, ctx).is_none()
}

/// Export names first (sorted order), then `@@toStringTag` last — matching
/// `[[OwnPropertyKeys]]`'s string-keys-before-symbol-keys ordering (§3.4).
pub fn own_property_keys(object: &JsObject, ctx: &mut crate::context::Context) -> Vec<PropertyKey> {
    let mut keys: Vec<PropertyKey> = exports(object).into_iter().map(|(name, _)| PropertyKey::String(name)).collect();
    keys.push(PropertyKey::Symbol(ctx.well_known_symbols().to_string_tag.clone()));
    keys
}
