//! Cross-module error-channel scenarios (§4.7, §6.2): building a thrown
//! value through [`Context::throw`], recovering its message property, and
//! the uncaught-error dump path a host driver polls after running a script.

use ratjs_engine::object::ObjectKind;
use ratjs_engine::value::{JsValue, PropertyKey};
use ratjs_engine::{Context, ErrorKind, JsError, JsObject};

fn test_context() -> Context {
    Context::new(JsObject::new(ObjectKind::Ordinary, None), 16)
}

#[test]
fn throw_produces_an_error_object_with_a_message_property() {
    let mut ctx = test_context();
    let err = ctx.throw(ErrorKind::TypeError, "not a function");
    let JsError::Throw(value) = err else {
        panic!("throw() always returns the Throw channel");
    };
    let object = value.as_object().unwrap();
    assert!(matches!(object.data().kind, ObjectKind::Error { kind: ErrorKind::TypeError, .. }));
    let message = object.get(&PropertyKey::from("message"), &value, &mut ctx).unwrap();
    match message {
        JsValue::String(s) => assert_eq!(s.as_str(), "not a function"),
        other => panic!("expected a string message, got {other:?}"),
    }
}

#[test]
fn an_uncaught_error_is_recorded_and_dumped() {
    let mut ctx = test_context();
    assert_eq!(ctx.dump_error_stack(Vec::new()).unwrap(), ());
    let err = ctx.throw(ErrorKind::RangeError, "index out of bounds");
    ctx.record_uncaught(err);
    let mut out = Vec::new();
    ctx.dump_error_stack(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("uncaught exception"));
}

#[test]
fn a_fatal_error_carries_no_script_visible_value() {
    let fatal = JsError::fatal(ratjs_engine::error::InvariantError::RevokedProxy);
    assert!(fatal.as_value().is_none());
    assert!(format!("{fatal}").contains("fatal"));
}
