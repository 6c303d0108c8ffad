//! Module namespace end-to-end scenarios (§4.9, §3.4): export enumeration
//! order, live binding visibility, the frozen-shape invariant, and the
//! namespace's own `@@toStringTag`.

use ratjs_engine::object::module_namespace::{new_namespace, ModuleNamespaceData};
use ratjs_engine::object::ObjectKind;
use ratjs_engine::value::{JsString, JsValue, PropertyKey};
use ratjs_engine::{Context, JsObject};

fn test_context() -> Context {
    Context::new(JsObject::new(ObjectKind::Ordinary, None), 16)
}

fn namespace_with(exports: &[(&str, f64)]) -> JsObject {
    let mut data = ModuleNamespaceData::new();
    for (name, value) in exports {
        data.bind(JsString::from(*name), JsValue::from(*value));
    }
    new_namespace(data)
}

#[test]
fn own_property_keys_lists_export_names_sorted_then_the_string_tag() {
    let mut ctx = test_context();
    let ns = namespace_with(&[("b", 2.0), ("a", 1.0), ("c", 3.0)]);
    let keys = ns.own_property_keys(&mut ctx).unwrap();
    let names: Vec<&str> = keys
        .iter()
        .filter_map(|k| match k {
            PropertyKey::String(s) => Some(s.as_str()),
            PropertyKey::Symbol(_) => None,
        })
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert!(matches!(keys.last(), Some(PropertyKey::Symbol(_))));
}

#[test]
fn to_string_tag_is_a_fixed_non_enumerable_module_string() {
    let mut ctx = test_context();
    let ns = namespace_with(&[]);
    let tag_key = PropertyKey::from(ctx.well_known_symbols().to_string_tag.clone());
    let desc = ns.get_own_property(&tag_key, &mut ctx).unwrap().unwrap();
    match desc.value().unwrap() {
        JsValue::String(s) => assert_eq!(s.as_str(), "Module"),
        other => panic!("expected \"Module\", got {other:?}"),
    }
    assert!(!desc.enumerable());
    assert!(!desc.configurable());
}

#[test]
fn a_live_export_is_visible_through_get() {
    let mut ctx = test_context();
    let ns = namespace_with(&[("counter", 1.0)]);
    let receiver = JsValue::Object(ns.clone());
    let value = ns.get(&PropertyKey::from("counter"), &receiver, &mut ctx).unwrap();
    assert_eq!(value.as_number(), Some(1.0));
}

#[test]
fn defining_a_changed_value_on_an_export_is_rejected() {
    let mut ctx = test_context();
    let ns = namespace_with(&[("counter", 1.0)]);
    let desc = ratjs_engine::property::PropertyDescriptor::data(JsValue::from(2.0), true, true, false);
    let accepted = ns.define_own_property(&PropertyKey::from("counter"), desc, &mut ctx).unwrap();
    assert!(!accepted);
}

#[test]
fn deleting_an_export_fails_while_deleting_an_absent_key_is_vacuously_true() {
    let mut ctx = test_context();
    let ns = namespace_with(&[("counter", 1.0)]);
    assert!(!ns.delete(&PropertyKey::from("counter"), &mut ctx).unwrap());
    assert!(ns.delete(&PropertyKey::from("missing"), &mut ctx).unwrap());
}
