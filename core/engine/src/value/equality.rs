//! `SameValue`, `SameValueZero`, and the `===`/`==` operators (§4.1).

use super::JsValue;

/// `SameValue`: like `===` except `NaN` equals itself and `+0`/`-0` differ.
pub fn same_value(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                true
            } else if *x == 0.0 && *y == 0.0 {
                x.is_sign_positive() == y.is_sign_positive()
            } else {
                x == y
            }
        }
        _ => strict_equals(a, b),
    }
}

/// `SameValueZero`: like `SameValue` but `+0` and `-0` are equal (used by
/// `Array.prototype.includes`, `Map`/`Set` key comparison).
pub fn same_value_zero(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => strict_equals(a, b),
    }
}

/// `===`. Unlike `SameValue`, `NaN !== NaN` and `+0 === -0`.
pub fn strict_equals(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(x), JsValue::Boolean(y)) => x == y,
        (JsValue::Number(x), JsValue::Number(y)) => x == y,
        (JsValue::String(x), JsValue::String(y)) => x == y,
        (JsValue::Symbol(x), JsValue::Symbol(y)) => x == y,
        (JsValue::BigInt(x), JsValue::BigInt(y)) => x == y,
        (JsValue::Object(x), JsValue::Object(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_distinguishes_signed_zeros_but_strict_equals_does_not() {
        assert!(!same_value(&JsValue::from(0.0), &JsValue::from(-0.0)));
        assert!(strict_equals(&JsValue::from(0.0), &JsValue::from(-0.0)));
    }

    #[test]
    fn same_value_treats_nan_as_equal_to_itself() {
        assert!(same_value(&JsValue::nan(), &JsValue::nan()));
        assert!(!strict_equals(&JsValue::nan(), &JsValue::nan()));
    }

    #[test]
    fn same_value_zero_treats_signed_zeros_as_equal() {
        assert!(same_value_zero(&JsValue::from(0.0), &JsValue::from(-0.0)));
    }
}
