//! The `Proxy` exotic object (§4.4): every one of the ten internal
//! operations is overridable by a trap on the handler, with a mandatory
//! fallback to the target when the trap is absent, and an invariant check
//! against the target's own state once the trap returns.

use ratjs_gc::{Finalize, Trace};

use crate::context::Context;
use crate::error::{ErrorKind, InvariantError, JsError};
use crate::property::PropertyDescriptor;
use crate::value::{JsString, JsValue, PropertyKey};

use super::{JsObject, JsResult, ObjectKind};

/// A proxy's target/handler pair. Revocation clears both to `None` in place
/// (rather than flipping a separate flag) so every trap dispatch is a single
/// `Option` check away from the "already revoked" diagnosis (§4.4's
/// `RevokedProxy` diagnostic).
#[derive(Debug, Clone)]
pub struct ProxyData {
    target: Option<JsObject>,
    handler: Option<JsObject>,
}

impl Finalize for ProxyData {}
unsafe impl Trace for ProxyData {
    unsafe fn trace(&self, stack: &mut ratjs_gc::MarkStack) {
        self.target.trace(stack);
        self.handler.trace(stack);
    }
    unsafe fn root(&self) {
        self.target.root();
        self.handler.root();
    }
    unsafe fn unroot(&self) {
        self.target.unroot();
        self.handler.unroot();
    }
}

impl ProxyData {
    pub fn new(target: JsObject, handler: JsObject) -> Self {
        ProxyData {
            target: Some(target),
            handler: Some(handler),
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.target.is_none()
    }

    pub fn revoke(&mut self) {
        self.target = None;
        self.handler = None;
    }
}

pub fn new_proxy(target: JsObject, handler: JsObject) -> JsObject {
    JsObject::new(ObjectKind::Proxy(ProxyData::new(target, handler)), None)
}

fn parts(object: &JsObject, _ctx: &mut Context) -> JsResult<(JsObject, JsObject)> {
    let ObjectKind::Proxy(data) = &object.data().kind else {
        unreachable!("proxy::* called on a non-proxy object");
    };
    match (data.target.clone(), data.handler.clone()) {
        (Some(target), Some(handler)) => Ok((target, handler)),
        _ => Err(JsError::fatal(InvariantError::RevokedProxy)),
    }
}

fn trap(handler: &JsObject, name: &'static str, ctx: &mut Context) -> JsResult<Option<JsObject>> {
    let key = PropertyKey::from(JsString::from(name));
    let value = handler.get(&key, &JsValue::Object(handler.clone()), ctx)?;
    match value {
        JsValue::Undefined | JsValue::Null => Ok(None),
        JsValue::Object(f) if f.is_callable() => Ok(Some(f)),
        _ => Err(ctx.throw(ErrorKind::TypeError, "proxy trap is not callable")),
    }
}

/// An invariant violation is a script-visible `TypeError` (§4.4), not a host
/// failure: `rjs_proxy_object_inc.c`'s equivalent checks all call
/// `rjs_throw_type_error`, never abort the runtime.
fn invariant(ctx: &mut Context, message: &str) -> JsError {
    ctx.throw(ErrorKind::TypeError, message)
}

pub fn get_prototype_of(object: &JsObject, ctx: &mut Context) -> JsResult<Option<JsObject>> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "getPrototypeOf", ctx)? else {
        return target.get_prototype_of(ctx);
    };
    let result = trap.call(
        &JsValue::Object(handler),
        &[JsValue::Object(target.clone())],
        ctx,
    )?;
    let proto = match &result {
        JsValue::Null => None,
        JsValue::Object(o) => Some(o.clone()),
        _ => return Err(ctx.throw(ErrorKind::TypeError, "getPrototypeOf trap must return an object or null")),
    };
    if !target.is_extensible(ctx)? {
        let target_proto = target.get_prototype_of(ctx)?;
        if proto != target_proto {
            return Err(invariant(ctx, "getPrototypeOf result must match a non-extensible target"));
        }
    }
    Ok(proto)
}

pub fn set_prototype_of(object: &JsObject, proto: Option<JsObject>, ctx: &mut Context) -> JsResult<bool> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "setPrototypeOf", ctx)? else {
        return target.set_prototype_of(proto, ctx);
    };
    let proto_value = proto.clone().map(JsValue::Object).unwrap_or(JsValue::Null);
    let result = trap.call(
        &JsValue::Object(handler),
        &[JsValue::Object(target.clone()), proto_value],
        ctx,
    )?;
    if !result.to_boolean() {
        return Ok(false);
    }
    if !target.is_extensible(ctx)? && proto != target.get_prototype_of(ctx)? {
        return Err(invariant(ctx, "setPrototypeOf result must match a non-extensible target"));
    }
    Ok(true)
}

pub fn is_extensible(object: &JsObject, ctx: &mut Context) -> JsResult<bool> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "isExtensible", ctx)? else {
        return target.is_extensible(ctx);
    };
    let result = trap.call(&JsValue::Object(handler), &[JsValue::Object(target.clone())], ctx)?;
    let reported = result.to_boolean();
    if reported != target.is_extensible(ctx)? {
        return Err(invariant(ctx, "isExtensible result must match the target's extensibility"));
    }
    Ok(reported)
}

pub fn prevent_extensions(object: &JsObject, ctx: &mut Context) -> JsResult<bool> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "preventExtensions", ctx)? else {
        return target.prevent_extensions(ctx);
    };
    let result = trap.call(&JsValue::Object(handler), &[JsValue::Object(target.clone())], ctx)?;
    if !result.to_boolean() {
        return Ok(false);
    }
    if target.is_extensible(ctx)? {
        return Err(invariant(ctx, "preventExtensions trap reported success but target is still extensible"));
    }
    Ok(true)
}

pub fn get_own_property(
    object: &JsObject,
    key: &PropertyKey,
    ctx: &mut Context,
) -> JsResult<Option<PropertyDescriptor>> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "getOwnPropertyDescriptor", ctx)? else {
        return target.get_own_property(key, ctx);
    };
    let result = trap.call(
        &JsValue::Object(handler),
        &[JsValue::Object(target.clone()), JsValue::from(key.clone())],
        ctx,
    )?;
    let target_desc = target.get_own_property(key, ctx)?;
    match result {
        JsValue::Undefined => {
            if let Some(desc) = &target_desc {
                if !desc.configurable() {
                    return Err(invariant(ctx, "getOwnPropertyDescriptor cannot report undefined for a non-configurable target property"));
                }
                if !target.is_extensible(ctx)? {
                    return Err(invariant(ctx, "getOwnPropertyDescriptor cannot report undefined for an existing property of a non-extensible target"));
                }
            }
            Ok(None)
        }
        JsValue::Object(_) => {
            let desc = ctx.to_property_descriptor(&result)?.complete();
            let extensible = target.is_extensible(ctx)?;
            if crate::property::validate_and_reconcile(target_desc.as_ref(), &desc, extensible).is_none() {
                return Err(invariant(ctx, "getOwnPropertyDescriptor result is incompatible with the target property"));
            }
            if !desc.configurable() && target_desc.is_none() {
                return Err(invariant(ctx, "getOwnPropertyDescriptor cannot report a non-configurable property absent from the target"));
            }
            Ok(Some(desc))
        }
        _ => Err(ctx.throw(ErrorKind::TypeError, "getOwnPropertyDescriptor trap must return an object or undefined")),
    }
}

pub fn define_own_property(
    object: &JsObject,
    key: &PropertyKey,
    desc: PropertyDescriptor,
    ctx: &mut Context,
) -> JsResult<bool> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "defineProperty", ctx)? else {
        return target.define_own_property(key, desc, ctx);
    };
    let desc_object = ctx.from_property_descriptor(&desc)?;
    let result = trap.call(
        &JsValue::Object(handler),
        &[
            JsValue::Object(target.clone()),
            JsValue::from(key.clone()),
            JsValue::Object(desc_object),
        ],
        ctx,
    )?;
    if !result.to_boolean() {
        return Ok(false);
    }
    let target_desc = target.get_own_property(key, ctx)?;
    let extensible = target.is_extensible(ctx)?;
    if target_desc.is_none() && !extensible {
        return Err(invariant(ctx, "defineProperty cannot add a property to a non-extensible target"));
    }
    if crate::property::validate_and_reconcile(target_desc.as_ref(), &desc, extensible).is_none() {
        return Err(invariant(ctx, "defineProperty result is incompatible with the target property"));
    }
    Ok(true)
}

pub fn has_property(object: &JsObject, key: &PropertyKey, ctx: &mut Context) -> JsResult<bool> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "has", ctx)? else {
        return target.has_property(key, ctx);
    };
    let result = trap.call(
        &JsValue::Object(handler),
        &[JsValue::Object(target.clone()), JsValue::from(key.clone())],
        ctx,
    )?;
    let reported = result.to_boolean();
    if !reported {
        if let Some(desc) = target.get_own_property(key, ctx)? {
            if !desc.configurable() {
                return Err(invariant(ctx, "has cannot hide a non-configurable target property"));
            }
            if !target.is_extensible(ctx)? {
                return Err(invariant(ctx, "has cannot hide an own property of a non-extensible target"));
            }
        }
    }
    Ok(reported)
}

pub fn get(object: &JsObject, key: &PropertyKey, receiver: &JsValue, ctx: &mut Context) -> JsResult<JsValue> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "get", ctx)? else {
        return target.get(key, receiver, ctx);
    };
    let result = trap.call(
        &JsValue::Object(handler),
        &[JsValue::Object(target.clone()), JsValue::from(key.clone()), receiver.clone()],
        ctx,
    )?;
    if let Some(desc) = target.get_own_property(key, ctx)? {
        if !desc.configurable() {
            if desc.is_data_descriptor()
                && !desc.writable()
                && !crate::value::equality::same_value(&result, desc.value().unwrap())
            {
                return Err(invariant(ctx, "get result must match a non-configurable, non-writable target value"));
            }
            if desc.is_accessor_descriptor()
                && desc.get().map(JsValue::is_undefined).unwrap_or(true)
                && !result.is_undefined()
            {
                return Err(invariant(ctx, "get result must be undefined when the target getter is undefined"));
            }
        }
    }
    Ok(result)
}

pub fn set(
    object: &JsObject,
    key: &PropertyKey,
    value: JsValue,
    receiver: &JsValue,
    ctx: &mut Context,
) -> JsResult<bool> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "set", ctx)? else {
        return target.set(key, value, receiver, ctx);
    };
    let result = trap.call(
        &JsValue::Object(handler),
        &[
            JsValue::Object(target.clone()),
            JsValue::from(key.clone()),
            value.clone(),
            receiver.clone(),
        ],
        ctx,
    )?;
    if !result.to_boolean() {
        return Ok(false);
    }
    if let Some(desc) = target.get_own_property(key, ctx)? {
        if !desc.configurable() {
            if desc.is_data_descriptor()
                && !desc.writable()
                && !crate::value::equality::same_value(&value, desc.value().unwrap())
            {
                return Err(invariant(ctx, "set cannot change a non-configurable, non-writable target value"));
            }
            if desc.is_accessor_descriptor() && desc.set_accessor_get().map(JsValue::is_undefined).unwrap_or(true) {
                return Err(invariant(ctx, "set cannot succeed when the target setter is undefined"));
            }
        }
    }
    Ok(true)
}

pub fn delete(object: &JsObject, key: &PropertyKey, ctx: &mut Context) -> JsResult<bool> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "deleteProperty", ctx)? else {
        return target.delete(key, ctx);
    };
    let result = trap.call(
        &JsValue::Object(handler),
        &[JsValue::Object(target.clone()), JsValue::from(key.clone())],
        ctx,
    )?;
    if !result.to_boolean() {
        return Ok(false);
    }
    if let Some(desc) = target.get_own_property(key, ctx)? {
        if !desc.configurable() {
            return Err(invariant(ctx, "deleteProperty cannot remove a non-configurable target property"));
        }
        if !target.is_extensible(ctx)? {
            return Err(invariant(ctx, "deleteProperty cannot remove an own property of a non-extensible target"));
        }
    }
    Ok(true)
}

pub fn own_property_keys(object: &JsObject, ctx: &mut Context) -> JsResult<Vec<PropertyKey>> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "ownKeys", ctx)? else {
        return target.own_property_keys(ctx);
    };
    let result = trap.call(&JsValue::Object(handler), &[JsValue::Object(target.clone())], ctx)?;
    let JsValue::Object(list) = &result else {
        return Err(ctx.throw(ErrorKind::TypeError, "ownKeys trap must return an object"));
    };
    let len = list.get(&PropertyKey::from(JsString::from("length")), &result, ctx)?;
    let len = len.to_number(ctx)? as u32;
    let mut keys = Vec::with_capacity(len as usize);
    for i in 0..len {
        let value = list.get(&PropertyKey::Index(i), &result, ctx)?;
        keys.push(value.to_property_key(ctx)?);
    }
    let extensible = target.is_extensible(ctx)?;
    let target_keys = target.own_property_keys(ctx)?;
    if !extensible {
        for target_key in &target_keys {
            if !keys.contains(target_key) {
                return Err(invariant(ctx, "ownKeys result must include every target key when the target is non-extensible"));
            }
        }
    }
    for target_key in &target_keys {
        let desc = target.get_own_property(target_key, ctx)?;
        if matches!(desc, Some(d) if !d.configurable()) && !keys.contains(target_key) {
            return Err(invariant(ctx, "ownKeys result must include every non-configurable target key"));
        }
    }
    Ok(keys)
}

pub fn call(object: &JsObject, this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
    let (target, handler) = parts(object, ctx)?;
    let Some(trap) = trap(&handler, "apply", ctx)? else {
        return target.call(this, args, ctx);
    };
    let args_array = ctx.new_array_from_values(args.iter().cloned())?;
    trap.call(
        &JsValue::Object(handler),
        &[JsValue::Object(target), this.clone(), JsValue::Object(args_array)],
        ctx,
    )
}
