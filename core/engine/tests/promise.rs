//! Promise resolve-chain end-to-end scenarios (§4.6, §4.8): settling through
//! the job queue, chained `then` handlers, and a thenable deferring
//! fulfillment by one job-queue turn.

use ratjs_engine::object::{FunctionData, FunctionKind, NativeFunctionData, ObjectKind};
use ratjs_engine::promise::{promise_resolve, then};
use ratjs_engine::property::PropertyDescriptor;
use ratjs_engine::value::{JsValue, PropertyKey};
use ratjs_engine::{Context, JsObject, JsResult, JsString};

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

fn double(_this: &JsValue, args: &[JsValue], _ctx: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(args[0].as_number().unwrap() * 2.0))
}

fn plus_three(_this: &JsValue, args: &[JsValue], _ctx: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(args[0].as_number().unwrap() + 3.0))
}

fn record_rejection(_this: &JsValue, args: &[JsValue], _ctx: &mut Context) -> JsResult<JsValue> {
    Ok(args[0].clone())
}

#[test]
fn a_resolve_chain_runs_handlers_in_registration_order_after_a_job_pump() {
    let mut ctx = test_context();
    let root = promise_resolve(JsValue::from(5.0), &mut ctx).unwrap();
    let doubled = then(&root, Some(native(double)), None, &mut ctx).unwrap();
    let final_step = then(&doubled, Some(native(plus_three)), None, &mut ctx).unwrap();
    ctx.run_jobs();
    assert_eq!(promise_data(&final_step).state().as_fulfilled().unwrap().as_number(), Some(13.0));
}

fn promise_data(promise: &JsObject) -> ratjs_engine::promise::PromiseData {
    match &promise.data().kind {
        ObjectKind::Promise(p) => p.clone(),
        _ => panic!("not a promise"),
    }
}

#[test]
fn a_rejection_propagates_past_a_fulfillment_only_handler() {
    let mut ctx = test_context();
    let capability = ratjs_engine::promise::new_promise_capability(&mut ctx);
    let passthrough = then(&capability.promise, Some(native(double)), None, &mut ctx).unwrap();
    let caught = then(&passthrough, None, Some(native(record_rejection)), &mut ctx).unwrap();
    capability
        .reject
        .call(&JsValue::undefined(), &[JsValue::from("boom")], &mut ctx)
        .unwrap();
    ctx.run_jobs();
    match promise_data(&caught).state().as_fulfilled().unwrap() {
        JsValue::String(s) => assert_eq!(s.as_str(), "boom"),
        other => panic!("expected the rejection reason to reach the catch handler, got {other:?}"),
    }
}

#[test]
fn a_thenable_resolution_defers_by_one_job_queue_turn() {
    let mut ctx = test_context();
    let capability = ratjs_engine::promise::new_promise_capability(&mut ctx);
    let thenable = JsObject::new(ObjectKind::Ordinary, None);

    fn thenable_then(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
        let resolve = args[0].as_object().cloned().unwrap();
        resolve.call(&JsValue::undefined(), &[JsValue::from(7.0)], ctx)
    }

    thenable
        .define_own_property(
            &PropertyKey::from("then"),
            PropertyDescriptor::data(JsValue::Object(native(thenable_then)), true, false, false),
            &mut ctx,
        )
        .unwrap();
    capability
        .resolve
        .call(&JsValue::undefined(), &[JsValue::Object(thenable)], &mut ctx)
        .unwrap();
    assert_eq!(*promise_data(&capability.promise).state(), ratjs_engine::promise::PromiseState::Pending);
    ctx.run_jobs();
    assert_eq!(promise_data(&capability.promise).state().as_fulfilled().unwrap().as_number(), Some(7.0));
}
