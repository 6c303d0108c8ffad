//! The ordinary object's internal methods (§4.3's "OrdinaryXyz" algorithms).
//!
//! Every exotic kind falls back to these for the operations it doesn't
//! override — a `Proxy` still stores its own handler/target in its own
//! property map the same way, a module namespace still needs
//! `OrdinaryOwnPropertyKeys`'s index-then-string-then-symbol ordering as a
//! building block, and so on.

use crate::context::Context;
use crate::property::{self, PropertyDescriptor};
use crate::value::{JsValue, PropertyKey};

use super::{JsObject, JsResult};

pub fn ordinary_get_prototype_of(object: &JsObject) -> Option<JsObject> {
    object.data().prototype.clone()
}

/// `OrdinarySetPrototypeOf` (§4.3): rejects a cycle through the prototype
/// chain and refuses entirely on a non-extensible receiver.
pub fn ordinary_set_prototype_of(object: &JsObject, proto: Option<JsObject>) -> bool {
    if object.data().prototype == proto {
        return true;
    }
    if !object.data().extensible {
        return false;
    }
    let mut p = proto.clone();
    while let Some(candidate) = p {
        if candidate == *object {
            return false;
        }
        p = if candidate.is_proxy() {
            // A proxy's prototype chain can't be walked without invoking
            // traps, which this synchronous helper has no `Context` to do;
            // treat it as a chain terminator rather than loop forever.
            None
        } else {
            candidate.data().prototype.clone()
        };
    }
    object.data_mut().prototype = proto;
    true
}

/// `OrdinaryGetOwnProperty` (§4.3): the dense indexed part is consulted
/// first, then the string/symbol-keyed map.
pub fn ordinary_get_own_property(object: &JsObject, key: &PropertyKey) -> Option<PropertyDescriptor> {
    if let PropertyKey::Index(index) = key {
        let data = object.data();
        if let Some(Some(value)) = data.indexed.get(*index as usize) {
            return Some(PropertyDescriptor::data(value.clone(), true, true, true));
        }
    }
    object.data().properties.get(key).cloned()
}

/// `OrdinaryDefineOwnProperty`: validates against the current descriptor via
/// `ValidateAndApplyPropertyDescriptor`, then commits the merged result —
/// promoting a data write back into the dense indexed part when the key is
/// a plain writable/enumerable/configurable array index, demoting it into
/// the property map otherwise.
pub fn ordinary_define_own_property(
    object: &JsObject,
    key: &PropertyKey,
    desc: PropertyDescriptor,
    _ctx: &mut Context,
) -> JsResult<bool> {
    let current = ordinary_get_own_property(object, key);
    let extensible = object.data().extensible;
    let Some(merged) = property::validate_and_reconcile(current.as_ref(), &desc, extensible) else {
        return Ok(false);
    };

    if let PropertyKey::Index(index) = key {
        if is_plain_element(&merged) {
            let mut data = object.data_mut();
            let index = *index as usize;
            if index >= data.indexed.len() {
                data.indexed.resize(index + 1, None);
            }
            data.indexed[index] = merged.value().cloned();
            data.properties.shift_remove(key);
            return Ok(true);
        }
    }

    object.data_mut().properties.insert(key.clone(), merged);
    Ok(true)
}

fn is_plain_element(desc: &PropertyDescriptor) -> bool {
    desc.is_data_descriptor() && desc.writable() && desc.enumerable() && desc.configurable()
}

pub fn ordinary_get(
    object: &JsObject,
    key: &PropertyKey,
    receiver: &JsValue,
    ctx: &mut Context,
) -> JsResult<JsValue> {
    match ordinary_get_own_property(object, key) {
        None => match object.get_prototype_of(ctx)? {
            Some(parent) => parent.get(key, receiver, ctx),
            None => Ok(JsValue::undefined()),
        },
        Some(desc) => {
            if desc.is_data_descriptor() {
                return Ok(desc.value().cloned().unwrap_or_else(JsValue::undefined));
            }
            match desc.get() {
                Some(JsValue::Object(getter)) => getter.call(receiver, &[], ctx),
                _ => Ok(JsValue::undefined()),
            }
        }
    }
}

pub fn ordinary_set(
    object: &JsObject,
    key: &PropertyKey,
    value: JsValue,
    receiver: &JsValue,
    ctx: &mut Context,
) -> JsResult<bool> {
    let own_desc = match ordinary_get_own_property(object, key) {
        Some(desc) => desc,
        None => match object.get_prototype_of(ctx)? {
            Some(parent) => return parent.set(key, value, receiver, ctx),
            None => PropertyDescriptor::data(JsValue::undefined(), true, true, true),
        },
    };

    if own_desc.is_data_descriptor() {
        if !own_desc.writable() {
            return Ok(false);
        }
        let Some(receiver_object) = receiver.as_object().cloned() else {
            return Ok(false);
        };
        let existing = receiver_object.get_own_property(key, ctx)?;
        match existing {
            Some(existing_desc) if existing_desc.is_accessor_descriptor() => Ok(false),
            Some(existing_desc) if !existing_desc.writable() => Ok(false),
            Some(_) => {
                let mut update = PropertyDescriptor::new();
                update.set_value(value);
                receiver_object.define_own_property(key, update, ctx)
            }
            None => {
                let fresh = PropertyDescriptor::data(value, true, true, true);
                receiver_object.define_own_property(key, fresh, ctx)
            }
        }
    } else {
        match own_desc.set_accessor_get() {
            Some(JsValue::Object(setter)) => {
                setter.call(receiver, &[value], ctx)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub fn ordinary_delete(object: &JsObject, key: &PropertyKey) -> bool {
    if let PropertyKey::Index(index) = key {
        let mut data = object.data_mut();
        if let Some(slot) = data.indexed.get_mut(*index as usize) {
            *slot = None;
            return true;
        }
    }
    match ordinary_get_own_property(object, key) {
        Some(desc) if !desc.configurable() => false,
        Some(_) => {
            object.data_mut().properties.shift_remove(key);
            true
        }
        None => true,
    }
}

/// `OrdinaryOwnPropertyKeys` (§4.3): integer indices in ascending order,
/// then strings in insertion order, then symbols in insertion order.
pub fn ordinary_own_property_keys(object: &JsObject) -> Vec<PropertyKey> {
    let data = object.data();
    let mut keys = Vec::with_capacity(data.indexed.len() + data.properties.len());
    for (index, slot) in data.indexed.iter().enumerate() {
        if slot.is_some() {
            keys.push(PropertyKey::Index(index as u32));
        }
    }
    let mut strings = Vec::new();
    let mut symbols = Vec::new();
    for key in data.properties.keys() {
        match key {
            PropertyKey::Index(i) => keys.push(PropertyKey::Index(*i)),
            PropertyKey::String(_) => strings.push(key.clone()),
            PropertyKey::Symbol(_) => symbols.push(key.clone()),
        }
    }
    keys.sort_by_key(|k| match k {
        PropertyKey::Index(i) => *i,
        _ => unreachable!(),
    });
    keys.extend(strings);
    keys.extend(symbols);
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    fn fresh() -> JsObject {
        JsObject::new(ObjectKind::Ordinary, None)
    }

    #[test]
    fn deleting_a_non_configurable_own_property_fails() {
        let object = fresh();
        object.data_mut().properties.insert(
            PropertyKey::from("x"),
            PropertyDescriptor::data(JsValue::from(1.0), true, true, false),
        );
        assert!(!ordinary_delete(&object, &PropertyKey::from("x")));
    }

    #[test]
    fn deleting_an_absent_property_reports_success() {
        let object = fresh();
        assert!(ordinary_delete(&object, &PropertyKey::from("missing")));
    }

    #[test]
    fn own_property_keys_orders_indices_then_strings_then_symbols() {
        let object = fresh();
        {
            let mut data = object.data_mut();
            data.indexed.resize(3, None);
            data.indexed[2] = Some(JsValue::from(1.0));
            data.properties.insert(
                PropertyKey::from("b"),
                PropertyDescriptor::data(JsValue::undefined(), true, true, true),
            );
            data.properties.insert(
                PropertyKey::Symbol(crate::value::JsSymbol::new(None, 1)),
                PropertyDescriptor::data(JsValue::undefined(), true, true, true),
            );
            data.properties.insert(
                PropertyKey::from("a"),
                PropertyDescriptor::data(JsValue::undefined(), true, true, true),
            );
        }
        let keys = ordinary_own_property_keys(&object);
        assert_eq!(keys[0], PropertyKey::Index(2));
        assert_eq!(keys[1], PropertyKey::from("b"));
        assert_eq!(keys[2], PropertyKey::from("a"));
        assert!(matches!(keys[3], PropertyKey::Symbol(_)));
    }
}
