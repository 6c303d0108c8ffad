//! Array exotic `[[DefineOwnProperty]]` scenarios (§4.3, boundary case):
//! `"length"` overflow past 2^53-1, and length growth on an out-of-range
//! index write.

use ratjs_engine::object::ObjectKind;
use ratjs_engine::property::PropertyDescriptor;
use ratjs_engine::value::{JsValue, PropertyKey};
use ratjs_engine::{Context, ErrorKind, JsObject};

fn test_context() -> Context {
    Context::new(JsObject::new(ObjectKind::Ordinary, None), 16)
}

fn empty_array(ctx: &mut Context) -> JsObject {
    ctx.new_array_from_values(std::iter::empty()).unwrap()
}

#[test]
fn setting_length_beyond_the_maximum_safe_integer_throws_a_type_error() {
    let mut ctx = test_context();
    let array = empty_array(&mut ctx);
    let desc = PropertyDescriptor::data(JsValue::from(9_007_199_254_740_992.0), true, false, false);
    let err = array.define_own_property(&PropertyKey::from("length"), desc, &mut ctx).unwrap_err();
    match err.as_value() {
        Some(JsValue::Object(o)) => {
            assert!(matches!(o.data().kind, ObjectKind::Error { kind: ErrorKind::TypeError, .. }));
        }
        other => panic!("expected a catchable TypeError, got {other:?}"),
    }
}

#[test]
fn writing_past_the_current_length_grows_it_to_index_plus_one() {
    let mut ctx = test_context();
    let array = empty_array(&mut ctx);
    let desc = PropertyDescriptor::data(JsValue::from(1.0), true, true, true);
    assert!(array.define_own_property(&PropertyKey::Index(3), desc, &mut ctx).unwrap());
    let length = array.get_own_property(&PropertyKey::from("length"), &mut ctx).unwrap().unwrap();
    assert_eq!(length.value().unwrap().as_number(), Some(4.0));
}

#[test]
fn shrinking_length_truncates_higher_indices() {
    let mut ctx = test_context();
    let array = ctx.new_array_from_values([1.0, 2.0, 3.0].into_iter().map(JsValue::from)).unwrap();
    let desc = PropertyDescriptor::data(JsValue::from(1.0), true, false, false);
    assert!(array.define_own_property(&PropertyKey::from("length"), desc, &mut ctx).unwrap());
    assert!(array.get_own_property(&PropertyKey::Index(1), &mut ctx).unwrap().is_none());
    let length = array.get_own_property(&PropertyKey::from("length"), &mut ctx).unwrap().unwrap();
    assert_eq!(length.value().unwrap().as_number(), Some(1.0));
}
