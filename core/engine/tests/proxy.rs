//! `Proxy` invariant and revocation end-to-end scenarios (§4.4).

use ratjs_engine::object::proxy::new_proxy;
use ratjs_engine::object::{FunctionData, FunctionKind, NativeFunctionData, ObjectKind};
use ratjs_engine::property::PropertyDescriptor;
use ratjs_engine::value::{JsValue, PropertyKey};
use ratjs_engine::{Context, ErrorKind, JsObject, JsResult, JsString};

fn test_context() -> Context {
    Context::new(JsObject::new(ObjectKind::Ordinary, None), 16)
}

fn native(f: ratjs_engine::object::NativeFunctionPtr) -> JsObject {
    JsObject::new(
        ObjectKind::Function(FunctionData {
            kind: FunctionKind::Native(NativeFunctionData(f)),
            constructable: false,
            name: JsString::from(""),
            length: 1,
        }),
        None,
    )
}

fn handler_with_trap(name: &str, trap: JsObject, ctx: &mut Context) -> JsObject {
    let handler = JsObject::new(ObjectKind::Ordinary, None);
    handler
        .define_own_property(&PropertyKey::from(name), PropertyDescriptor::data(JsValue::Object(trap), true, false, false), ctx)
        .unwrap();
    handler
}

fn is_type_error(err: &ratjs_engine::JsError) -> bool {
    matches!(err.as_value(), Some(JsValue::Object(o)) if matches!(o.data().kind, ObjectKind::Error { kind: ErrorKind::TypeError, .. }))
}

#[test]
fn a_get_prototype_of_trap_that_disagrees_with_a_frozen_target_is_a_type_error() {
    let mut ctx = test_context();
    let other_proto = JsObject::new(ObjectKind::Ordinary, None);

    fn returns_other_proto(_this: &JsValue, _args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
        Ok(JsValue::Object(ctx.object_prototype().unwrap()))
    }

    let target = JsObject::new(ObjectKind::Ordinary, None);
    target.set_integrity_level(true, &mut ctx).unwrap();
    let handler = handler_with_trap("getPrototypeOf", native(returns_other_proto), &mut ctx);
    let proxy = new_proxy(target, handler);

    let err = proxy.get_prototype_of(&mut ctx).unwrap_err();
    assert!(is_type_error(&err), "expected a catchable TypeError, got {err:?}");
    let _ = other_proto;
}

#[test]
fn a_get_prototype_of_trap_that_agrees_with_a_frozen_target_succeeds() {
    let mut ctx = test_context();
    let target = JsObject::new(ObjectKind::Ordinary, ctx.object_prototype());
    target.set_integrity_level(true, &mut ctx).unwrap();

    fn returns_target_proto(_this: &JsValue, _args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
        Ok(JsValue::Object(ctx.object_prototype().unwrap()))
    }

    let handler = handler_with_trap("getPrototypeOf", native(returns_target_proto), &mut ctx);
    let proxy = new_proxy(target, handler);

    let proto = proxy.get_prototype_of(&mut ctx).unwrap();
    assert_eq!(proto, ctx.object_prototype());
}

#[test]
fn every_operation_on_a_revoked_proxy_fails() {
    let mut ctx = test_context();
    let target = JsObject::new(ObjectKind::Ordinary, None);
    let handler = JsObject::new(ObjectKind::Ordinary, None);
    let proxy = new_proxy(target, handler);
    let ObjectKind::Proxy(data) = &mut proxy.data_mut().kind else {
        unreachable!();
    };
    data.revoke();

    assert!(proxy.get_prototype_of(&mut ctx).is_err());
    assert!(proxy.has_property(&PropertyKey::from("x"), &mut ctx).is_err());
}

#[test]
fn an_own_keys_trap_omitting_a_non_configurable_target_key_is_a_type_error() {
    let mut ctx = test_context();
    let target = JsObject::new(ObjectKind::Ordinary, None);
    target
        .define_own_property(&PropertyKey::from("fixed"), PropertyDescriptor::data(JsValue::from(1.0), true, true, false), &mut ctx)
        .unwrap();

    fn returns_empty_list(_this: &JsValue, _args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
        Ok(JsValue::Object(ctx.new_array_from_values(std::iter::empty())?))
    }

    let handler = handler_with_trap("ownKeys", native(returns_empty_list), &mut ctx);
    let proxy = new_proxy(target, handler);

    let err = proxy.own_property_keys(&mut ctx).unwrap_err();
    assert!(is_type_error(&err), "expected a catchable TypeError, got {err:?}");
}
