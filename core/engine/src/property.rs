//! Property descriptors and their reconciliation rules (§3.3, §4.3).

use ratjs_gc::Trace as _;
use ratjs_macros::{Finalize, Trace};

use crate::value::{JsValue, PropertyKey};

bitflags::bitflags! {
    /// Which of a [`PropertyDescriptor`]'s five attributes are actually
    /// present. A descriptor built from a partial object literal (as
    /// `Object.defineProperty` receives) only touches the attributes it
    /// names; reconciliation treats a missing attribute as "keep whatever
    /// the existing property already has".
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DescriptorFlags: u8 {
        const VALUE = 0b0000_0001;
        const GET = 0b0000_0010;
        const SET = 0b0000_0100;
        const WRITABLE = 0b0000_1000;
        const ENUMERABLE = 0b0001_0000;
        const CONFIGURABLE = 0b0010_0000;
    }
}

/// A property descriptor: up to five attributes plus a presence bitmap
/// (§3.3). Either a **data** descriptor (`value`/`writable`), an
/// **accessor** descriptor (`get`/`set`), or **generic** (neither value nor
/// accessor fields present — only attribute flags).
#[derive(Debug, Clone, Default, Trace, Finalize)]
pub struct PropertyDescriptor {
    present: DescriptorFlagsShadow,
    value: Option<JsValue>,
    get: Option<JsValue>,
    set: Option<JsValue>,
    writable: bool,
    enumerable: bool,
    configurable: bool,
}

/// `DescriptorFlags` wrapped so `#[derive(Trace, Finalize)]` can see a
/// leaf type it doesn't need to scan (bitflags structs hold no GC pointers).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DescriptorFlagsShadow(DescriptorFlags);

impl ratjs_gc::Finalize for DescriptorFlagsShadow {}
unsafe impl ratjs_gc::Trace for DescriptorFlagsShadow {
    ratjs_gc::empty_trace!();
}

impl PropertyDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        let mut d = Self::new();
        d.set_value(value);
        d.set_writable(writable);
        d.set_enumerable(enumerable);
        d.set_configurable(configurable);
        d
    }

    pub fn accessor(
        get: Option<JsValue>,
        set: Option<JsValue>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        let mut d = Self::new();
        if let Some(g) = get {
            d.set_get(g);
        }
        if let Some(s) = set {
            d.set_set(s);
        }
        d.set_enumerable(enumerable);
        d.set_configurable(configurable);
        d
    }

    pub fn has_value(&self) -> bool {
        self.present.0.contains(DescriptorFlags::VALUE)
    }
    pub fn has_get(&self) -> bool {
        self.present.0.contains(DescriptorFlags::GET)
    }
    pub fn has_set(&self) -> bool {
        self.present.0.contains(DescriptorFlags::SET)
    }
    pub fn has_writable(&self) -> bool {
        self.present.0.contains(DescriptorFlags::WRITABLE)
    }
    pub fn has_enumerable(&self) -> bool {
        self.present.0.contains(DescriptorFlags::ENUMERABLE)
    }
    pub fn has_configurable(&self) -> bool {
        self.present.0.contains(DescriptorFlags::CONFIGURABLE)
    }

    pub fn value(&self) -> Option<&JsValue> {
        self.value.as_ref()
    }
    pub fn get(&self) -> Option<&JsValue> {
        self.get.as_ref()
    }
    pub fn set_accessor_get(&self) -> Option<&JsValue> {
        self.set.as_ref()
    }
    pub fn writable(&self) -> bool {
        self.writable
    }
    pub fn enumerable(&self) -> bool {
        self.enumerable
    }
    pub fn configurable(&self) -> bool {
        self.configurable
    }

    pub fn set_value(&mut self, value: JsValue) {
        self.present.0.insert(DescriptorFlags::VALUE);
        self.value = Some(value);
    }
    pub fn set_get(&mut self, get: JsValue) {
        self.present.0.insert(DescriptorFlags::GET);
        self.get = Some(get);
    }
    pub fn set_set(&mut self, set: JsValue) {
        self.present.0.insert(DescriptorFlags::SET);
        self.set = Some(set);
    }
    pub fn set_writable(&mut self, writable: bool) {
        self.present.0.insert(DescriptorFlags::WRITABLE);
        self.writable = writable;
    }
    pub fn set_enumerable(&mut self, enumerable: bool) {
        self.present.0.insert(DescriptorFlags::ENUMERABLE);
        self.enumerable = enumerable;
    }
    pub fn set_configurable(&mut self, configurable: bool) {
        self.present.0.insert(DescriptorFlags::CONFIGURABLE);
        self.configurable = configurable;
    }

    pub fn is_data_descriptor(&self) -> bool {
        self.has_value() || self.has_writable()
    }
    pub fn is_accessor_descriptor(&self) -> bool {
        self.has_get() || self.has_set()
    }
    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_data_descriptor() && !self.is_accessor_descriptor()
    }

    /// Fully-populated descriptor for a fresh own property created from a
    /// partial one, defaulting every absent attribute per ECMAScript's
    /// `CompletePropertyDescriptor`.
    pub fn complete(mut self) -> Self {
        if self.is_generic_descriptor() || self.is_data_descriptor() {
            if !self.has_value() {
                self.set_value(JsValue::undefined());
            }
            if !self.has_writable() {
                self.set_writable(false);
            }
        } else {
            if !self.has_get() {
                self.set_get(JsValue::undefined());
            }
            if !self.has_set() {
                self.set_set(JsValue::undefined());
            }
        }
        if !self.has_enumerable() {
            self.set_enumerable(false);
        }
        if !self.has_configurable() {
            self.set_configurable(false);
        }
        self
    }
}

/// `ValidateAndApplyPropertyDescriptor`'s reconciliation of an incoming
/// (possibly partial) descriptor against an existing one: a present-missing
/// attribute on the incoming descriptor always matches; `configurable: false`
/// on the current descriptor is contagious (rejects most changes) except the
/// narrow writable-true-to-false and value-change-on-non-writable-but-
/// configurable-false cases ECMAScript explicitly forbids too.
pub fn validate_and_reconcile(
    current: Option<&PropertyDescriptor>,
    incoming: &PropertyDescriptor,
    extensible_if_absent: bool,
) -> Option<PropertyDescriptor> {
    let Some(current) = current else {
        return if extensible_if_absent {
            Some(incoming.clone().complete())
        } else {
            None
        };
    };

    if !current.configurable() {
        if incoming.has_configurable() && incoming.configurable() {
            return None;
        }
        if incoming.has_enumerable() && incoming.enumerable() != current.enumerable() {
            return None;
        }
        if !incoming.is_generic_descriptor()
            && current.is_data_descriptor() != incoming.is_data_descriptor()
        {
            return None;
        }
        if current.is_data_descriptor() && incoming.is_data_descriptor() {
            if !current.writable() {
                if incoming.has_writable() && incoming.writable() {
                    return None;
                }
                if incoming.has_value() && !same_value(incoming.value().unwrap(), current.value().unwrap()) {
                    return None;
                }
            }
        } else if current.is_accessor_descriptor() && incoming.is_accessor_descriptor() {
            if incoming.has_get()
                && !same_value_opt(incoming.get(), current.get())
            {
                return None;
            }
            if incoming.has_set()
                && !same_value_opt(incoming.set_accessor_get(), current.set_accessor_get())
            {
                return None;
            }
        }
    }

    let mut merged = current.clone();
    if incoming.is_data_descriptor() && current.is_accessor_descriptor() {
        merged = PropertyDescriptor::data(JsValue::undefined(), false, current.enumerable(), current.configurable());
    } else if incoming.is_accessor_descriptor() && current.is_data_descriptor() {
        merged = PropertyDescriptor::accessor(None, None, current.enumerable(), current.configurable());
    }
    if incoming.has_value() {
        merged.set_value(incoming.value().unwrap().clone());
    }
    if incoming.has_writable() {
        merged.set_writable(incoming.writable());
    }
    if incoming.has_get() {
        merged.set_get(incoming.get().unwrap().clone());
    }
    if incoming.has_set() {
        merged.set_set(incoming.set_accessor_get().unwrap().clone());
    }
    if incoming.has_enumerable() {
        merged.set_enumerable(incoming.enumerable());
    }
    if incoming.has_configurable() {
        merged.set_configurable(incoming.configurable());
    }
    Some(merged)
}

fn same_value_opt(a: Option<&JsValue>, b: Option<&JsValue>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_value(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn same_value(a: &JsValue, b: &JsValue) -> bool {
    crate::value::equality::same_value(a, b)
}

/// The string/symbol-keyed property table of an object (§3.4's "hash table
/// of property descriptors"). A thin wrapper around `indexmap::IndexMap` so
/// `Trace` (foreign to this crate's `ratjs_gc` dependency, same as
/// `IndexMap` is foreign from `indexmap`) can be implemented here without
/// violating the orphan rule — this crate owns neither type on its own.
/// Iteration order is insertion order, matching `[[OwnPropertyKeys]]`'s
/// requirement that string and symbol keys enumerate in the order they were
/// first defined.
#[derive(Debug, Default)]
pub struct PropertyMap(indexmap::IndexMap<PropertyKey, PropertyDescriptor>);

impl std::ops::Deref for PropertyMap {
    type Target = indexmap::IndexMap<PropertyKey, PropertyDescriptor>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl std::ops::DerefMut for PropertyMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl ratjs_gc::Finalize for PropertyMap {}
unsafe impl ratjs_gc::Trace for PropertyMap {
    unsafe fn trace(&self, stack: &mut ratjs_gc::MarkStack) {
        for (key, desc) in self.0.iter() {
            key.trace(stack);
            desc.trace(stack);
        }
    }
    unsafe fn root(&self) {
        for (key, desc) in self.0.iter() {
            key.root();
            desc.root();
        }
    }
    unsafe fn unroot(&self) {
        for (key, desc) in self.0.iter() {
            key.unroot();
            desc.unroot();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_fresh_property_on_a_non_extensible_object_is_rejected() {
        let incoming = PropertyDescriptor::data(JsValue::from(1.0), true, true, true);
        assert!(validate_and_reconcile(None, &incoming, false).is_none());
    }

    #[test]
    fn non_configurable_non_writable_rejects_a_value_change() {
        let current = PropertyDescriptor::data(JsValue::from(1.0), false, true, false);
        let mut incoming = PropertyDescriptor::new();
        incoming.set_value(JsValue::from(2.0));
        assert!(validate_and_reconcile(Some(&current), &incoming, true).is_none());
    }

    #[test]
    fn a_present_missing_attribute_on_incoming_always_matches() {
        let current = PropertyDescriptor::data(JsValue::from(1.0), false, true, false);
        let incoming = PropertyDescriptor::new();
        let merged = validate_and_reconcile(Some(&current), &incoming, true).unwrap();
        assert_eq!(merged.value().unwrap().as_number(), Some(1.0));
    }
}
