use std::fmt;
use std::ops::Deref;

use num_bigint::BigInt;
use ratjs_gc::{empty_trace, Finalize, Gc, Trace};

/// Wraps `num_bigint::BigInt` so `Trace`/`Finalize` (traits local to
/// [`ratjs_gc`]) can be implemented for it here — the orphan rule forbids
/// implementing them directly on the foreign `num_bigint::BigInt` type.
/// Holds no outgoing GC references, so tracing it is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BigIntData(BigInt);

impl Finalize for BigIntData {}
unsafe impl Trace for BigIntData {
    empty_trace!();
}

impl From<BigInt> for BigIntData {
    fn from(value: BigInt) -> Self {
        BigIntData(value)
    }
}

impl Deref for BigIntData {
    type Target = BigInt;
    fn deref(&self) -> &BigInt {
        &self.0
    }
}

/// A heap-allocated arbitrary-precision integer value (§3.1, §6.3 tag
/// `0x7ffe`).
#[derive(Debug, Clone, ratjs_macros::Trace, ratjs_macros::Finalize)]
pub struct JsBigInt(Gc<BigIntData>);

impl JsBigInt {
    pub fn new(value: BigInt) -> Self {
        JsBigInt(Gc::new(BigIntData::from(value)))
    }

    pub fn from_str_radix(s: &str, radix: u32) -> Option<Self> {
        BigInt::parse_bytes(s.as_bytes(), radix).map(Self::new)
    }

    pub fn as_bigint(&self) -> &BigInt {
        &self.0 .0
    }
}

impl PartialEq for JsBigInt {
    fn eq(&self, other: &Self) -> bool {
        self.as_bigint() == other.as_bigint()
    }
}
impl Eq for JsBigInt {}

impl fmt::Display for JsBigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_bigint())
    }
}
