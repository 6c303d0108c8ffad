//! The (mapped) `arguments` exotic object of a non-strict, non-arrow
//! function call.
//!
//! A mapped argument index shares storage with the corresponding formal
//! parameter directly through a `Gc<GcCell<JsValue>>` cell — rather than
//! indirecting through an environment-record lookup by name, which is how
//! ECMAScript itself specifies the mapping — since that cell is exactly
//! what a parameter binding already is once resolved. Reading or writing a
//! mapped index reads or writes that same cell, so an assignment to
//! `arguments[0]` is visible as a change to the first parameter and vice
//! versa, without this object needing a reference to the calling frame's
//! environment record at all. Indices past the mapped count, or belonging
//! to a duplicate parameter name (unmappable per spec), fall back to the
//! ordinary own-property path untouched.

use ratjs_gc::{Finalize, Gc, GcCell, Trace};

use crate::context::Context;
use crate::property::PropertyDescriptor;
use crate::value::{JsValue, PropertyKey};

use super::{JsObject, JsResult, ObjectKind};

#[derive(Debug, Clone)]
pub struct ArgumentsData {
    mapped: Vec<Option<Gc<GcCell<JsValue>>>>,
}

impl Finalize for ArgumentsData {}
unsafe impl Trace for ArgumentsData {
    unsafe fn trace(&self, stack: &mut ratjs_gc::MarkStack) {
        self.mapped.trace(stack);
    }
    unsafe fn root(&self) {
        self.mapped.root();
    }
    unsafe fn unroot(&self) {
        self.mapped.unroot();
    }
}

impl ArgumentsData {
    /// `mapped[i]` is `Some(cell)` when argument `i` corresponds to a
    /// non-duplicate formal parameter and the function is non-strict; the
    /// cell is the shared parameter-binding slot itself.
    pub fn new(mapped: Vec<Option<Gc<GcCell<JsValue>>>>) -> Self {
        ArgumentsData { mapped }
    }
}

pub fn new_arguments(values: &[JsValue], mapped: Vec<Option<Gc<GcCell<JsValue>>>>, prototype: Option<JsObject>) -> JsObject {
    let object = JsObject::new(ObjectKind::Arguments(ArgumentsData::new(mapped)), prototype);
    {
        let mut data = object.data_mut();
        data.indexed = values.iter().cloned().map(Some).collect();
        data.properties.insert(
            PropertyKey::from("length"),
            PropertyDescriptor::data(JsValue::from(values.len() as i32), true, false, true),
        );
    }
    object
}

fn mapped_cell(object: &JsObject, key: &PropertyKey) -> Option<Gc<GcCell<JsValue>>> {
    let PropertyKey::Index(i) = key else {
        return None;
    };
    let ObjectKind::Arguments(data) = &object.data().kind else {
        unreachable!("arguments::* called on a non-arguments object");
    };
    data.mapped.get(*i as usize).cloned().flatten()
}

pub fn get_own_property(
    object: &JsObject,
    key: &PropertyKey,
    _ctx: &mut Context,
) -> JsResult<Option<PropertyDescriptor>> {
    let ordinary = super::internal_methods::ordinary_get_own_property(object, key);
    if let (Some(cell), Some(mut desc)) = (mapped_cell(object, key), ordinary.clone()) {
        desc.set_value(cell.borrow().clone());
        return Ok(Some(desc));
    }
    Ok(ordinary)
}

pub fn define_own_property(
    object: &JsObject,
    key: &PropertyKey,
    desc: PropertyDescriptor,
    ctx: &mut Context,
) -> JsResult<bool> {
    let cell = mapped_cell(object, key);
    let has_value = desc.has_value();
    let new_value = desc.value().cloned();
    let ok = super::internal_methods::ordinary_define_own_property(object, key, desc, ctx)?;
    if ok && has_value {
        if let (Some(cell), Some(value)) = (cell, new_value) {
            *cell.borrow_mut() = value;
        }
    }
    Ok(ok)
}

pub fn get(object: &JsObject, key: &PropertyKey, receiver: &JsValue, ctx: &mut Context) -> JsResult<JsValue> {
    if let Some(cell) = mapped_cell(object, key) {
        return Ok(cell.borrow().clone());
    }
    super::internal_methods::ordinary_get(object, key, receiver, ctx)
}

pub fn set(object: &JsObject, key: &PropertyKey, value: JsValue, receiver: &JsValue, ctx: &mut Context) -> JsResult<bool> {
    if let Some(cell) = mapped_cell(object, key) {
        *cell.borrow_mut() = value.clone();
    }
    super::internal_methods::ordinary_set(object, key, value, receiver, ctx)
}

pub fn delete(object: &JsObject, key: &PropertyKey, ctx: &mut Context) -> JsResult<bool> {
    let _ = ctx;
    let deleted = super::internal_methods::ordinary_delete(object, key);
    if deleted {
        if let PropertyKey::Index(i) = key {
            let mut data = object.data_mut();
            let ObjectKind::Arguments(args) = &mut data.kind else {
                unreachable!();
            };
            if let Some(slot) = args.mapped.get_mut(*i as usize) {
                *slot = None;
            }
        }
    }
    Ok(deleted)
}
