//! Promise capabilities, resolve/reject functions, and reaction propagation
//! via the microtask job queue (§3.8, §4.6).
//!
//! Grounded in full on `boa_engine::builtins::promise::{mod.rs, promise_job.rs}`
//! (`PromiseState`, `PromiseCapability`, `ReactionRecord`, `ResolvingFunctions`)
//! and reconciled against `original_source/src/lib/rjs_promise.c` for the
//! exact resolve-function algorithm steps. Departs from the teacher in one
//! structural way: `boa`'s resolve/reject functions are native closures that
//! capture a shared `already_resolved` cell; this crate's native functions
//! are bare `fn` pointers with no capture slots (§9's "ordinary Rust
//! dispatch" over a vtable), so resolving functions are instead their own
//! [`crate::object::FunctionKind::PromiseResolve`] variant, and "already
//! resolved" is read directly off the promise's own state rather than a
//! separate flag (equivalent: a promise's state flips exactly once, same as
//! the flag would).

use crate::context::Context;
use crate::error::{ErrorKind, JsError, JsResult};
use crate::job::Job;
use crate::object::{FunctionData, FunctionKind, JsObject, ObjectKind};
use crate::property::PropertyDescriptor;
use crate::value::{equality::same_value, JsString, JsValue, PropertyKey};

/// A promise's current settlement (§3.8).
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    Pending,
    Fulfilled(JsValue),
    Rejected(JsValue),
}

impl PromiseState {
    pub fn as_fulfilled(&self) -> Option<&JsValue> {
        match self {
            PromiseState::Fulfilled(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_rejected(&self) -> Option<&JsValue> {
        match self {
            PromiseState::Rejected(v) => Some(v),
            _ => None,
        }
    }
}

/// One registered reaction (§3.8): a downstream capability, which list it's
/// queued on (fulfill or reject), and an optional handler to run the stored
/// value/reason through before settling the downstream capability.
#[derive(Debug, Clone)]
struct ReactionRecord {
    capability: PromiseCapability,
    handler: Option<JsObject>,
    /// Which list this was registered on. With no handler, a fulfill
    /// reaction passes the value through as a fulfillment but a reject
    /// reaction passes the reason through as a rejection — the two lists
    /// aren't interchangeable once the handler is absent.
    is_reject: bool,
}

/// The object data of a `Promise` exotic object.
#[derive(Debug, Clone)]
pub struct PromiseData {
    state: PromiseState,
    fulfill_reactions: Vec<ReactionRecord>,
    reject_reactions: Vec<ReactionRecord>,
    handled: bool,
}

impl Default for PromiseData {
    fn default() -> Self {
        PromiseData {
            state: PromiseState::Pending,
            fulfill_reactions: Vec::new(),
            reject_reactions: Vec::new(),
            handled: false,
        }
    }
}

impl PromiseData {
    pub fn state(&self) -> &PromiseState {
        &self.state
    }
}

impl ratjs_gc::Finalize for PromiseData {}
unsafe impl ratjs_gc::Trace for PromiseData {
    unsafe fn trace(&self, stack: &mut ratjs_gc::MarkStack) {
        if let PromiseState::Fulfilled(v) | PromiseState::Rejected(v) = &self.state {
            v.trace(stack);
        }
        for r in self.fulfill_reactions.iter().chain(self.reject_reactions.iter()) {
            r.capability.promise.trace(stack);
            r.capability.resolve.trace(stack);
            r.capability.reject.trace(stack);
            if let Some(h) = &r.handler {
                h.trace(stack);
            }
        }
    }
    unsafe fn root(&self) {
        if let PromiseState::Fulfilled(v) | PromiseState::Rejected(v) = &self.state {
            v.root();
        }
        for r in self.fulfill_reactions.iter().chain(self.reject_reactions.iter()) {
            r.capability.promise.root();
            r.capability.resolve.root();
            r.capability.reject.root();
            if let Some(h) = &r.handler {
                h.root();
            }
        }
    }
    unsafe fn unroot(&self) {
        if let PromiseState::Fulfilled(v) | PromiseState::Rejected(v) = &self.state {
            v.unroot();
        }
        for r in self.fulfill_reactions.iter().chain(self.reject_reactions.iter()) {
            r.capability.promise.unroot();
            r.capability.resolve.unroot();
            r.capability.reject.unroot();
            if let Some(h) = &r.handler {
                h.unroot();
            }
        }
    }
}

/// The `(promise, resolve, reject)` triple (§4.6). `then` always mints one
/// of these directly rather than through a species-constructed user
/// `Promise` subclass — the built-in `Promise` constructor surface a real
/// species lookup would walk is library surface, out of scope here.
#[derive(Debug, Clone)]
pub struct PromiseCapability {
    pub promise: JsObject,
    pub resolve: JsObject,
    pub reject: JsObject,
}

fn resolving_function(promise: JsObject, reject: bool) -> JsObject {
    let kind = FunctionData {
        kind: FunctionKind::PromiseResolve { promise, reject },
        constructable: false,
        name: JsString::from(""),
        length: 1,
    };
    JsObject::new(ObjectKind::Function(kind), None)
}

/// `NewPromiseCapability` (§4.6), specialized to this crate's own internal
/// `Promise` exotic kind instead of an arbitrary constructor argument.
pub fn new_promise_capability(ctx: &mut Context) -> PromiseCapability {
    let promise = JsObject::new(ObjectKind::Promise(PromiseData::default()), ctx.object_prototype());
    PromiseCapability {
        resolve: resolving_function(promise.clone(), false),
        reject: resolving_function(promise.clone(), true),
        promise,
    }
}

fn promise_state(promise: &JsObject) -> PromiseState {
    let data = promise.data();
    match &data.kind {
        ObjectKind::Promise(p) => p.state.clone(),
        _ => unreachable!("resolving function bound to a non-promise object"),
    }
}

/// The body of both the resolve and the reject function (§4.6), dispatched
/// from [`crate::object::JsObject::call`]'s `PromiseResolve` arm.
pub fn call_resolving_function(promise: JsObject, reject: bool, argument: JsValue, ctx: &mut Context) -> JsResult<JsValue> {
    if promise_state(&promise) != PromiseState::Pending {
        return Ok(JsValue::undefined());
    }

    if reject {
        settle(&promise, PromiseState::Rejected(argument), ctx);
        return Ok(JsValue::undefined());
    }

    if same_value(&argument, &JsValue::Object(promise.clone())) {
        let err = ctx.make_error(ErrorKind::TypeError, "chaining cycle detected for promise");
        settle(&promise, PromiseState::Rejected(err), ctx);
        return Ok(JsValue::undefined());
    }

    let Some(resolution) = argument.as_object().cloned() else {
        settle(&promise, PromiseState::Fulfilled(argument), ctx);
        return Ok(JsValue::undefined());
    };

    let this = JsValue::Object(resolution.clone());
    let then = match resolution.get(&PropertyKey::from("then"), &this, ctx) {
        Ok(v) => v,
        Err(JsError::Throw(err)) => {
            settle(&promise, PromiseState::Rejected(err), ctx);
            return Ok(JsValue::undefined());
        }
        Err(fatal) => return Err(fatal),
    };

    if !then.as_object().is_some_and(JsObject::is_callable) {
        settle(&promise, PromiseState::Fulfilled(argument), ctx);
        return Ok(JsValue::undefined());
    }

    let then_callable = then.as_object().cloned().unwrap();
    let promise_for_job = promise.clone();
    ctx.enqueue_job(Job::new("PromiseResolveThenableJob", move |ctx| {
        let resolve = resolving_function(promise_for_job.clone(), false);
        let reject = resolving_function(promise_for_job.clone(), true);
        let this = JsValue::Object(resolution.clone());
        let args = [JsValue::Object(resolve), JsValue::Object(reject)];
        if let Err(err) = then_callable.call(&this, &args, ctx) {
            match err {
                JsError::Throw(reason) => {
                    call_resolving_function(promise_for_job.clone(), true, reason, ctx)?;
                }
                fatal => return Err(fatal),
            }
        }
        Ok(())
    }));
    Ok(JsValue::undefined())
}

fn settle(promise: &JsObject, new_state: PromiseState, ctx: &mut Context) {
    let value = match &new_state {
        PromiseState::Fulfilled(v) | PromiseState::Rejected(v) => v.clone(),
        PromiseState::Pending => unreachable!("settle never transitions back to pending"),
    };
    let reactions = {
        let mut data = promise.data_mut();
        let ObjectKind::Promise(p) = &mut data.kind else {
            unreachable!("settle called on a non-promise object");
        };
        let reactions = match &new_state {
            PromiseState::Fulfilled(_) => std::mem::take(&mut p.fulfill_reactions),
            PromiseState::Rejected(_) => std::mem::take(&mut p.reject_reactions),
            PromiseState::Pending => unreachable!(),
        };
        p.reject_reactions.clear();
        p.fulfill_reactions.clear();
        p.state = new_state;
        reactions
    };
    for reaction in reactions {
        enqueue_reaction_job(reaction, value.clone(), ctx);
    }
}

fn enqueue_reaction_job(reaction: ReactionRecord, argument: JsValue, ctx: &mut Context) {
    ctx.enqueue_job(Job::new("PromiseReactionJob", move |ctx| {
        let outcome = match &reaction.handler {
            Some(handler) => handler.call(&JsValue::undefined(), &[argument], ctx),
            None if reaction.is_reject => Err(JsError::Throw(argument)),
            None => Ok(argument),
        };
        match outcome {
            Ok(value) => {
                reaction.capability.resolve.call(&JsValue::undefined(), &[value], ctx)?;
            }
            Err(JsError::Throw(err)) => {
                reaction.capability.reject.call(&JsValue::undefined(), &[err], ctx)?;
            }
            Err(fatal) => return Err(fatal),
        }
        Ok(())
    }));
}

/// `PerformPromiseThen` (§4.6): registers (or immediately schedules, if the
/// receiver is already settled) the fulfill/reject reactions and returns the
/// freshly-minted downstream promise.
pub fn then(promise: &JsObject, on_fulfilled: Option<JsObject>, on_rejected: Option<JsObject>, ctx: &mut Context) -> JsResult<JsObject> {
    if !matches!(promise.data().kind, ObjectKind::Promise(_)) {
        return Err(ctx.throw(ErrorKind::TypeError, "then called on a non-promise object"));
    }
    let capability = new_promise_capability(ctx);
    let fulfill_reaction = ReactionRecord {
        capability: capability.clone(),
        handler: on_fulfilled,
        is_reject: false,
    };
    let reject_reaction = ReactionRecord {
        capability: capability.clone(),
        handler: on_rejected,
        is_reject: true,
    };

    let state = promise_state(promise);
    match state {
        PromiseState::Pending => {
            let mut data = promise.data_mut();
            if let ObjectKind::Promise(p) = &mut data.kind {
                p.fulfill_reactions.push(fulfill_reaction);
                p.reject_reactions.push(reject_reaction);
                p.handled = true;
            }
        }
        PromiseState::Fulfilled(value) => {
            mark_handled(promise);
            enqueue_reaction_job(fulfill_reaction, value, ctx);
        }
        PromiseState::Rejected(reason) => {
            mark_handled(promise);
            enqueue_reaction_job(reject_reaction, reason, ctx);
        }
    }
    Ok(capability.promise)
}

fn mark_handled(promise: &JsObject) {
    let mut data = promise.data_mut();
    if let ObjectKind::Promise(p) = &mut data.kind {
        p.handled = true;
    }
}

/// `PromiseResolve ( C, x )` specialized to this crate's internal `Promise`
/// kind (§4.6): returns `x` unchanged if it is already one of this crate's
/// promises, otherwise wraps it in a freshly-settled one.
pub fn promise_resolve(value: JsValue, ctx: &mut Context) -> JsResult<JsObject> {
    if let JsValue::Object(o) = &value {
        if matches!(o.data().kind, ObjectKind::Promise(_)) {
            return Ok(o.clone());
        }
    }
    let capability = new_promise_capability(ctx);
    capability.resolve.call(&JsValue::undefined(), &[value], ctx)?;
    Ok(capability.promise)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::JsValue;

    fn test_context() -> Context {
        Context::new(JsObject::new(ObjectKind::Ordinary, None), 16)
    }

    fn add_one(_this: &JsValue, args: &[JsValue], _ctx: &mut Context) -> JsResult<JsValue> {
        Ok(JsValue::from(args[0].as_number().unwrap() + 1.0))
    }

    fn times_ten(_this: &JsValue, args: &[JsValue], _ctx: &mut Context) -> JsResult<JsValue> {
        Ok(JsValue::from(args[0].as_number().unwrap() * 10.0))
    }

    fn native_handler(f: crate::object::NativeFunctionPtr) -> JsObject {
        JsObject::new(
            ObjectKind::Function(FunctionData {
                kind: FunctionKind::Native(crate::object::NativeFunctionData(f)),
                constructable: false,
                name: JsString::from(""),
                length: 1,
            }),
            None,
        )
    }

    #[test]
    fn resolving_with_a_plain_value_fulfills_synchronously() {
        let mut ctx = test_context();
        let capability = new_promise_capability(&mut ctx);
        capability.resolve.call(&JsValue::undefined(), &[JsValue::from(1.0)], &mut ctx).unwrap();
        assert_eq!(promise_state(&capability.promise), PromiseState::Fulfilled(JsValue::from(1.0)));
    }

    #[test]
    fn resolving_twice_only_keeps_the_first_settlement() {
        let mut ctx = test_context();
        let capability = new_promise_capability(&mut ctx);
        capability.resolve.call(&JsValue::undefined(), &[JsValue::from(1.0)], &mut ctx).unwrap();
        capability.resolve.call(&JsValue::undefined(), &[JsValue::from(2.0)], &mut ctx).unwrap();
        assert_eq!(promise_state(&capability.promise).as_fulfilled().unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn resolving_with_the_promise_itself_rejects_with_a_type_error() {
        let mut ctx = test_context();
        let capability = new_promise_capability(&mut ctx);
        let self_ref = JsValue::Object(capability.promise.clone());
        capability.resolve.call(&JsValue::undefined(), &[self_ref], &mut ctx).unwrap();
        let state = promise_state(&capability.promise);
        assert!(state.as_rejected().is_some());
    }

    #[test]
    fn a_resolve_chain_through_then_runs_handlers_in_order() {
        let mut ctx = test_context();
        let root = promise_resolve(JsValue::from(1.0), &mut ctx).unwrap();
        let step1 = then(&root, Some(native_handler(add_one)), None, &mut ctx).unwrap();
        let step2 = then(&step1, Some(native_handler(times_ten)), None, &mut ctx).unwrap();
        ctx.run_jobs();
        assert_eq!(promise_state(&step2).as_fulfilled().unwrap().as_number(), Some(20.0));
    }

    #[test]
    fn then_on_an_already_settled_promise_still_schedules_via_a_job() {
        let mut ctx = test_context();
        let root = promise_resolve(JsValue::from(5.0), &mut ctx).unwrap();
        let chained = then(&root, Some(native_handler(add_one)), None, &mut ctx).unwrap();
        assert_eq!(promise_state(&chained), PromiseState::Pending);
        ctx.run_jobs();
        assert_eq!(promise_state(&chained).as_fulfilled().unwrap().as_number(), Some(6.0));
    }

    #[test]
    fn a_thenable_resolution_defers_fulfillment_by_one_job_turn() {
        let mut ctx = test_context();
        let capability = new_promise_capability(&mut ctx);
        let thenable = JsObject::new(ObjectKind::Ordinary, None);
        fn thenable_then(_this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
            let resolve = args[0].as_object().cloned().unwrap();
            resolve.call(&JsValue::undefined(), &[JsValue::from(42.0)], ctx)
        }
        let then_fn = native_handler(thenable_then);
        thenable
            .define_own_property(
                &PropertyKey::from("then"),
                PropertyDescriptor::data(JsValue::Object(then_fn), true, false, false),
                &mut ctx,
            )
            .unwrap();
        capability.resolve.call(&JsValue::undefined(), &[JsValue::Object(thenable)], &mut ctx).unwrap();
        assert_eq!(promise_state(&capability.promise), PromiseState::Pending);
        ctx.run_jobs();
        assert_eq!(promise_state(&capability.promise).as_fulfilled().unwrap().as_number(), Some(42.0));
    }

    #[test]
    fn an_unhandled_rejection_passes_through_a_fulfillment_only_then_as_a_rejection() {
        let mut ctx = test_context();
        let capability = new_promise_capability(&mut ctx);
        let passthrough = then(&capability.promise, Some(native_handler(add_one)), None, &mut ctx).unwrap();
        capability.reject.call(&JsValue::undefined(), &[JsValue::from(9.0)], &mut ctx).unwrap();
        ctx.run_jobs();
        assert_eq!(promise_state(&passthrough).as_rejected().unwrap().as_number(), Some(9.0));
    }
}
