//! The typed-array ("Integer-Indexed") exotic object (§4.3, §4.5): a view
//! over an `ArrayBuffer`'s bytes through one of the eleven element codecs.

use ratjs_gc::{Finalize, Trace};

use crate::array_buffer::{ArrayBufferData, ElementKind, ElementValue};
use crate::context::Context;
use crate::error::ErrorKind;
use crate::property::PropertyDescriptor;
use crate::value::{JsValue, PropertyKey};

use super::{JsObject, JsResult, ObjectKind};

#[derive(Debug, Clone)]
pub struct IntegerIndexedData {
    pub buffer: JsObject,
    pub kind: ElementKind,
    pub byte_offset: usize,
    pub length: usize,
    pub little_endian: bool,
}

impl Finalize for IntegerIndexedData {}
unsafe impl Trace for IntegerIndexedData {
    unsafe fn trace(&self, stack: &mut ratjs_gc::MarkStack) {
        self.buffer.trace(stack);
    }
    unsafe fn root(&self) {
        self.buffer.root();
    }
    unsafe fn unroot(&self) {
        self.buffer.unroot();
    }
}

impl IntegerIndexedData {
    pub fn new(buffer: JsObject, kind: ElementKind, byte_offset: usize, length: usize) -> Self {
        IntegerIndexedData {
            buffer,
            kind,
            byte_offset,
            length,
            little_endian: cfg!(target_endian = "little"),
        }
    }
}

pub fn new_view(data: IntegerIndexedData) -> JsObject {
    JsObject::new(ObjectKind::IntegerIndexed(data), None)
}

fn view_of(object: &JsObject) -> IntegerIndexedData {
    let ObjectKind::IntegerIndexed(view) = &object.data().kind else {
        unreachable!("integer_indexed::* called on a non-view object");
    };
    view.clone()
}

/// `IsValidIntegerIndex`: a canonical, non-negative, in-bounds index into an
/// attached backing buffer. Everything else reports "no such own property"
/// rather than erroring — a typed array's integer-indexed exotic behavior
/// deliberately routes out-of-range numeric keys through the ordinary
/// string-keyed property path instead (e.g. `ta["3.5"]`).
fn valid_index(view: &IntegerIndexedData, key: &PropertyKey, ctx: &mut Context) -> JsResult<Option<usize>> {
    let PropertyKey::Index(i) = key else {
        return Ok(None);
    };
    let buffer = buffer_data(view, ctx)?;
    if buffer.is_detached() {
        return Ok(None);
    }
    let i = *i as usize;
    Ok((i < view.length).then_some(i))
}

fn buffer_data(view: &IntegerIndexedData, _ctx: &mut Context) -> JsResult<ratjs_gc::GcCellRef<'_, super::ObjectData>> {
    Ok(view.buffer.data())
}

fn read_element(view: &IntegerIndexedData, index: usize, ctx: &mut Context) -> JsResult<JsValue> {
    let data = view.buffer.data();
    let ObjectKind::ArrayBuffer(buffer) = &data.kind else {
        unreachable!("typed view's buffer slot is not an ArrayBuffer");
    };
    let offset = view.byte_offset + index * view.kind.byte_size();
    let bytes = buffer.read_bytes(offset, view.kind.byte_size(), ctx)?;
    drop(data);
    Ok(match view.kind.decode(&bytes, view.little_endian) {
        ElementValue::Number(n) => JsValue::Number(n),
        ElementValue::BigInt(b) => JsValue::BigInt(crate::value::JsBigInt::new(num_bigint::BigInt::from(b))),
    })
}

fn write_element(view: &IntegerIndexedData, index: usize, value: JsValue, ctx: &mut Context) -> JsResult<()> {
    let element = if view.kind.is_bigint() {
        let JsValue::BigInt(b) = &value else {
            return Err(ctx.throw(ErrorKind::TypeError, "expected a BigInt value for this typed array"));
        };
        use num_traits::ToPrimitive;
        ElementValue::BigInt(b.as_bigint().to_i128().unwrap_or(0))
    } else {
        ElementValue::Number(value.to_number(ctx)?)
    };
    let bytes = view.kind.encode(&element, view.little_endian);
    let offset = view.byte_offset + index * view.kind.byte_size();
    let mut data = view.buffer.data_mut();
    let ObjectKind::ArrayBuffer(buffer) = &mut data.kind else {
        unreachable!("typed view's buffer slot is not an ArrayBuffer");
    };
    buffer.write_bytes(offset, &bytes, ctx)
}

pub fn get_own_property(
    object: &JsObject,
    key: &PropertyKey,
    ctx: &mut Context,
) -> JsResult<Option<PropertyDescriptor>> {
    let view = view_of(object);
    match valid_index(&view, key, ctx)? {
        Some(index) => {
            let value = read_element(&view, index, ctx)?;
            Ok(Some(PropertyDescriptor::data(value, true, true, true)))
        }
        None => Ok(None),
    }
}

pub fn define_own_property(
    object: &JsObject,
    key: &PropertyKey,
    desc: PropertyDescriptor,
    ctx: &mut Context,
) -> JsResult<bool> {
    let view = view_of(object);
    let Some(index) = valid_index(&view, key, ctx)? else {
        return super::internal_methods::ordinary_define_own_property(object, key, desc, ctx);
    };
    if desc.has_configurable() && !desc.configurable() {
        return Ok(false);
    }
    if desc.has_enumerable() && !desc.enumerable() {
        return Ok(false);
    }
    if desc.is_accessor_descriptor() {
        return Ok(false);
    }
    if desc.has_writable() && !desc.writable() {
        return Ok(false);
    }
    if let Some(value) = desc.value().cloned() {
        write_element(&view, index, value, ctx)?;
    }
    Ok(true)
}

pub fn get(object: &JsObject, key: &PropertyKey, ctx: &mut Context) -> JsResult<JsValue> {
    let view = view_of(object);
    match valid_index(&view, key, ctx)? {
        Some(index) => read_element(&view, index, ctx),
        None => super::internal_methods::ordinary_get(object, key, &JsValue::Object(object.clone()), ctx),
    }
}

pub fn set(object: &JsObject, key: &PropertyKey, value: JsValue, ctx: &mut Context) -> JsResult<bool> {
    let view = view_of(object);
    match valid_index(&view, key, ctx)? {
        Some(index) => {
            write_element(&view, index, value, ctx)?;
            Ok(true)
        }
        None => {
            let receiver = JsValue::Object(object.clone());
            super::internal_methods::ordinary_set(object, key, value, &receiver, ctx)
        }
    }
}

pub fn own_property_keys(object: &JsObject) -> Vec<PropertyKey> {
    let view = view_of(object);
    let mut keys: Vec<PropertyKey> = (0..view.length as u32).map(PropertyKey::Index).collect();
    keys.extend(super::internal_methods::ordinary_own_property_keys(object));
    keys
}
