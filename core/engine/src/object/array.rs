//! The array exotic object's `[[DefineOwnProperty]]` override (§4.3,
//! `ArraySetLength`): writing `"length"` coerces and bounds-checks the new
//! length before committing it, and writing past the current length grows
//! `"length"` to match, mirroring `rjs_array_object_inc.c`'s `array_set_
//! length`/`array_define_own_property` pair.

use crate::context::Context;
use crate::error::ErrorKind;
use crate::property::PropertyDescriptor;
use crate::value::PropertyKey;

use super::internal_methods::ordinary_define_own_property;
use super::{JsObject, JsResult};

/// The largest integer an array length may hold (§3.1's boundary case): a
/// `"length"` write past this is a `TypeError`, not silently truncated.
const MAX_ARRAY_LENGTH: f64 = 9_007_199_254_740_991.0; // 2^53 - 1

fn length_key() -> PropertyKey {
    PropertyKey::from("length")
}

fn current_length(object: &JsObject) -> u32 {
    super::internal_methods::ordinary_get_own_property(object, &length_key())
        .and_then(|d| d.value().and_then(|v| v.as_number()))
        .map(|n| n as u32)
        .unwrap_or(0)
}

pub fn define_own_property(
    object: &JsObject,
    key: &PropertyKey,
    desc: PropertyDescriptor,
    ctx: &mut Context,
) -> JsResult<bool> {
    match key {
        PropertyKey::String(s) if s.as_str() == "length" => {
            let Some(new_len_value) = desc.value() else {
                return ordinary_define_own_property(object, key, desc, ctx);
            };
            let number_len = new_len_value.as_number().unwrap_or(f64::NAN);
            if number_len > MAX_ARRAY_LENGTH || number_len < 0.0 || number_len.fract() != 0.0 {
                return Err(ctx.throw(ErrorKind::TypeError, "invalid array length"));
            }
            let new_len = number_len as u32;
            let old_len = current_length(object);

            let mut new_len_desc = desc.clone();
            new_len_desc.set_value(crate::value::JsValue::from(number_len));

            if new_len >= old_len {
                return ordinary_define_own_property(object, key, new_len_desc, ctx);
            }

            let old_writable = super::internal_methods::ordinary_get_own_property(object, &length_key())
                .map(|d| d.writable())
                .unwrap_or(true);
            if !old_writable {
                return Ok(false);
            }
            let new_writable = !new_len_desc.has_writable() || new_len_desc.writable();
            if !new_writable {
                new_len_desc.set_writable(true);
            }
            if !ordinary_define_own_property(object, key, new_len_desc.clone(), ctx)? {
                return Ok(false);
            }

            {
                let mut data = object.data_mut();
                if (new_len as usize) < data.indexed.len() {
                    data.indexed.truncate(new_len as usize);
                }
            }

            if !new_writable {
                let mut lock = PropertyDescriptor::new();
                lock.set_writable(false);
                ordinary_define_own_property(object, key, lock, ctx)?;
            }
            Ok(true)
        }
        PropertyKey::Index(index) => {
            let old_len = current_length(object);
            let old_writable = super::internal_methods::ordinary_get_own_property(object, &length_key())
                .map(|d| d.writable())
                .unwrap_or(true);
            if *index >= old_len && !old_writable {
                return Ok(false);
            }
            if !ordinary_define_own_property(object, &PropertyKey::Index(*index), desc, ctx)? {
                return Ok(false);
            }
            if *index >= old_len && *index < u32::MAX {
                let mut grown = PropertyDescriptor::new();
                grown.set_value(crate::value::JsValue::from((*index + 1) as f64));
                ordinary_define_own_property(object, &length_key(), grown, ctx)?;
            }
            Ok(true)
        }
        _ => ordinary_define_own_property(object, key, desc, ctx),
    }
}
