//! `ToPrimitive`/`ToNumber`/`ToString`/`ToObject`/`ToPropertyKey` and the
//! integer-conversion family (`ToInteger`/`ToInt32`/`ToUint32`/`ToIndex`),
//! per §4.1.

use crate::context::Context;
use crate::error::{ErrorKind, JsError};
use crate::object::ObjectKind;
use crate::value::{JsString, JsValue, PropertyKey};

/// `ToPrimitive` hint (no hint defaults to `Number` except for `Date`,
/// which the built-in library surface — out of scope here — overrides).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Default,
    Number,
    String,
}

impl JsValue {
    /// `ToPrimitive(input, hint)`. Tries `Symbol.toPrimitive`, then the
    /// ordinary `valueOf`/`toString` method pair (order depends on hint).
    pub fn to_primitive(&self, ctx: &mut Context, hint: Hint) -> Result<JsValue, JsError> {
        let object = match self {
            JsValue::Object(o) => o.clone(),
            other => return Ok(other.clone()),
        };

        let exotic = object.get(
            &PropertyKey::Symbol(ctx.well_known_symbols().to_primitive.clone()),
            &JsValue::Object(object.clone()),
            ctx,
        )?;
        if let Some(f) = exotic.as_object().filter(|o| o.is_callable()) {
            let hint_str = match hint {
                Hint::Default => "default",
                Hint::Number => "number",
                Hint::String => "string",
            };
            let result = f.call(
                &JsValue::Object(object.clone()),
                &[JsValue::from(hint_str)],
                ctx,
            )?;
            if !result.is_object() {
                return Ok(result);
            }
            return Err(ctx.throw(ErrorKind::TypeError, "Symbol.toPrimitive returned an object"));
        }

        let method_order: [&str; 2] = match hint {
            Hint::String => ["toString", "valueOf"],
            Hint::Number | Hint::Default => ["valueOf", "toString"],
        };
        for name in method_order {
            let method = object.get(&PropertyKey::from(name), &JsValue::Object(object.clone()), ctx)?;
            if let Some(f) = method.as_object().filter(|o| o.is_callable()) {
                let result = f.call(&JsValue::Object(object.clone()), &[], ctx)?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(ctx.throw(ErrorKind::TypeError, "cannot convert object to primitive value"))
    }

    /// `ToNumber`.
    pub fn to_number(&self, ctx: &mut Context) -> Result<f64, JsError> {
        match self {
            JsValue::Undefined => Ok(f64::NAN),
            JsValue::Null => Ok(0.0),
            JsValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            JsValue::Number(n) => Ok(*n),
            JsValue::String(s) => Ok(string_to_number(s)),
            JsValue::Symbol(_) => Err(ctx.throw(ErrorKind::TypeError, "cannot convert a Symbol value to a number")),
            JsValue::BigInt(_) => Err(ctx.throw(ErrorKind::TypeError, "cannot convert a BigInt value to a number")),
            JsValue::Object(_) => {
                let prim = self.to_primitive(ctx, Hint::Number)?;
                prim.to_number(ctx)
            }
        }
    }

    /// `ToString`. Throws for symbols (which must go through explicit
    /// `.toString()`/`.description`, never implicit coercion).
    pub fn to_js_string(&self, ctx: &mut Context) -> Result<JsString, JsError> {
        match self {
            JsValue::Undefined => Ok(JsString::from("undefined")),
            JsValue::Null => Ok(JsString::from("null")),
            JsValue::Boolean(b) => Ok(JsString::from(if *b { "true" } else { "false" })),
            JsValue::Number(n) => Ok(JsString::from(number_to_string(*n).as_str())),
            JsValue::String(s) => Ok(s.clone()),
            JsValue::Symbol(_) => Err(ctx.throw(ErrorKind::TypeError, "cannot convert a Symbol value to a string")),
            JsValue::BigInt(b) => Ok(JsString::from(b.to_string().as_str())),
            JsValue::Object(_) => {
                let prim = self.to_primitive(ctx, Hint::String)?;
                prim.to_js_string(ctx)
            }
        }
    }

    /// `ToObject`. Primitive wrapper creation is left to the built-in
    /// library surface's constructors (out of scope); `undefined`/`null`
    /// always throw.
    pub fn to_object(&self, ctx: &mut Context) -> Result<crate::object::JsObject, JsError> {
        match self {
            JsValue::Object(o) => Ok(o.clone()),
            JsValue::Undefined | JsValue::Null => {
                Err(ctx.throw(ErrorKind::TypeError, "cannot convert undefined or null to object"))
            }
            other => ctx.wrap_primitive(other.clone()),
        }
    }

    /// `ToPropertyKey`.
    pub fn to_property_key(&self, ctx: &mut Context) -> Result<PropertyKey, JsError> {
        if let JsValue::Symbol(s) = self {
            return Ok(PropertyKey::Symbol(s.clone()));
        }
        let prim = self.to_primitive(ctx, Hint::String)?;
        if let JsValue::Symbol(s) = prim {
            return Ok(PropertyKey::Symbol(s));
        }
        Ok(PropertyKey::from(prim.to_js_string(ctx)?))
    }

    /// `ToInteger`: `NaN` becomes `0`; infinities pass through;
    /// fractional parts truncate toward zero. `-0` normalizes to `0`.
    pub fn to_integer(n: f64) -> f64 {
        if n.is_nan() {
            return 0.0;
        }
        if n.is_infinite() || n == 0.0 {
            return if n == 0.0 { 0.0 } else { n };
        }
        n.trunc()
    }

    /// `ToInt32`: truncate mod 2^32 then reinterpret as signed.
    pub fn to_int32(n: f64) -> i32 {
        Self::to_uint32(n) as i32
    }

    /// `ToUint32`: truncate and wrap mod 2^32.
    pub fn to_uint32(n: f64) -> u32 {
        if !n.is_finite() || n == 0.0 {
            return 0;
        }
        let n = n.trunc();
        let modulo = n.rem_euclid(4294967296.0);
        modulo as u32
    }

    /// `ToIndex`: requires an integer in `[0, 2^53 - 1]`.
    pub fn to_index(&self, ctx: &mut Context) -> Result<u64, JsError> {
        let n = self.to_number(ctx)?;
        let integer = Self::to_integer(n);
        if integer < 0.0 || integer > 9007199254740991.0 {
            return Err(ctx.throw(ErrorKind::RangeError, "index out of range"));
        }
        Ok(integer as u64)
    }
}

/// Parses a canonical numeric string per `ToNumber`'s `StringNumericLiteral`
/// grammar: leading/trailing whitespace is trimmed, an empty (or all
/// whitespace) string converts to `0`, `Infinity`/`-Infinity` are accepted,
/// and anything else that doesn't parse as a Rust `f64` is `NaN`.
fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    if let Some(oct) = trimmed.strip_prefix("0o").or_else(|| trimmed.strip_prefix("0O")) {
        return u64::from_str_radix(oct, 8).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    if let Some(bin) = trimmed.strip_prefix("0b").or_else(|| trimmed.strip_prefix("0B")) {
        return u64::from_str_radix(bin, 2).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Renders a number per `Number::toString` with radix 10 (the part of
/// `ToString` that doesn't require the shortest-round-trip `ryu`-style
/// algorithm to be byte-identical to V8 — the builtin library surface
/// that cares about that exactness is out of scope here).
fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    let mut buf = ryu_like(n);
    if buf.ends_with(".0") {
        buf.truncate(buf.len() - 2);
    }
    buf
}

fn ryu_like(n: f64) -> String {
    format!("{n}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_uint32_wraps_modulo_2_32() {
        assert_eq!(JsValue::to_uint32(4294967296.0), 0);
        assert_eq!(JsValue::to_uint32(4294967297.0), 1);
        assert_eq!(JsValue::to_uint32(-1.0), 4294967295);
    }

    #[test]
    fn to_int32_reinterprets_as_signed() {
        assert_eq!(JsValue::to_int32(4294967295.0), -1);
        assert_eq!(JsValue::to_int32(2147483648.0), i32::MIN);
    }

    #[test]
    fn to_integer_maps_nan_and_neg_zero_to_zero() {
        assert_eq!(JsValue::to_integer(f64::NAN), 0.0);
        assert_eq!(JsValue::to_integer(-0.0), 0.0);
        assert_eq!(JsValue::to_integer(4.7), 4.0);
        assert_eq!(JsValue::to_integer(-4.7), -4.0);
    }

    #[test]
    fn string_to_number_handles_whitespace_and_radix_prefixes() {
        assert_eq!(string_to_number("  42  "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x2A"), 42.0);
        assert!(string_to_number("not a number").is_nan());
    }
}
