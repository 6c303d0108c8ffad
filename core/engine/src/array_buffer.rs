//! Data blocks, `ArrayBuffer`/`SharedArrayBuffer`, and the eleven typed-view
//! element codecs (§4.5).

use std::sync::{Arc, Mutex};

use ratjs_gc::{Finalize, Trace};

use crate::context::Context;
use crate::error::ErrorKind;
use crate::object::JsResult;

/// A data block: a byte buffer with a shared flag. Non-shared blocks are
/// owned outright by their `ArrayBufferData`; shared blocks live behind an
/// `Arc<Mutex<_>>` so every `SharedArrayBuffer` view referencing the same
/// block observes the same bytes, with `lock`/`unlock` backed by the real
/// mutex instead of the no-op the spec allows for non-shared blocks.
#[derive(Debug, Clone)]
enum DataBlock {
    Owned(Vec<u8>),
    Shared(Arc<Mutex<Vec<u8>>>),
}

impl DataBlock {
    fn len(&self) -> usize {
        match self {
            DataBlock::Owned(bytes) => bytes.len(),
            DataBlock::Shared(bytes) => bytes.lock().expect("data block mutex poisoned").len(),
        }
    }

    fn read(&self, offset: usize, len: usize, out: &mut [u8]) {
        match self {
            DataBlock::Owned(bytes) => out.copy_from_slice(&bytes[offset..offset + len]),
            DataBlock::Shared(bytes) => {
                let guard = bytes.lock().expect("data block mutex poisoned");
                out.copy_from_slice(&guard[offset..offset + len]);
            }
        }
    }

    fn write(&mut self, offset: usize, data: &[u8]) {
        match self {
            DataBlock::Owned(bytes) => bytes[offset..offset + data.len()].copy_from_slice(data),
            DataBlock::Shared(bytes) => {
                let mut guard = bytes.lock().expect("data block mutex poisoned");
                guard[offset..offset + data.len()].copy_from_slice(data);
            }
        }
    }
}

/// `ArrayBuffer`/`SharedArrayBuffer` backing storage (§4.5). Detaching an
/// owned buffer drops the data block and zeros the recorded length; a
/// shared buffer cannot be detached (`detach` is simply never called on
/// one — the exotic object layer enforces that, not this type).
#[derive(Debug, Clone)]
pub struct ArrayBufferData {
    block: Option<DataBlock>,
    byte_length: usize,
}

impl Finalize for ArrayBufferData {}
unsafe impl Trace for ArrayBufferData {
    ratjs_gc::empty_trace!();
}

impl ArrayBufferData {
    pub fn new(byte_length: usize) -> Self {
        ArrayBufferData {
            block: Some(DataBlock::Owned(vec![0; byte_length])),
            byte_length,
        }
    }

    pub fn new_shared(byte_length: usize) -> Self {
        ArrayBufferData {
            block: Some(DataBlock::Shared(Arc::new(Mutex::new(vec![0; byte_length])))),
            byte_length,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.block, Some(DataBlock::Shared(_)))
    }

    pub fn is_detached(&self) -> bool {
        self.block.is_none()
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    /// `DetachArrayBuffer`. A no-op (per spec) when called on a shared
    /// buffer is the caller's responsibility to avoid; this always detaches
    /// whatever block is present.
    pub fn detach(&mut self) {
        self.block = None;
        self.byte_length = 0;
    }

    fn require_attached(&self, ctx: &mut Context) -> JsResult<&DataBlock> {
        self.block
            .as_ref()
            .ok_or_else(|| ctx.throw(ErrorKind::TypeError, "array buffer is detached"))
    }

    pub fn read_bytes(&self, offset: usize, len: usize, ctx: &mut Context) -> JsResult<Vec<u8>> {
        let block = self.require_attached(ctx)?;
        if offset + len > block.len() {
            return Err(ctx.throw(ErrorKind::RangeError, "read out of bounds"));
        }
        let mut out = vec![0u8; len];
        block.read(offset, len, &mut out);
        Ok(out)
    }

    pub fn write_bytes(&mut self, offset: usize, data: &[u8], ctx: &mut Context) -> JsResult<()> {
        let byte_length = self.byte_length;
        let Some(block) = self.block.as_mut() else {
            return Err(ctx.throw(ErrorKind::TypeError, "array buffer is detached"));
        };
        if offset + data.len() > byte_length {
            return Err(ctx.throw(ErrorKind::RangeError, "write out of bounds"));
        }
        block.write(offset, data);
        Ok(())
    }
}

/// The eleven typed-view element kinds (§4.5). `BigInt64`/`BigUint64`
/// produce/accept `JsValue::BigInt` rather than `JsValue::Number`; every
/// other kind is a `Number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Uint8,
    Int8,
    Uint8Clamped,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Float32,
    Float64,
    BigUint64,
    BigInt64,
}

impl ElementKind {
    pub fn byte_size(self) -> usize {
        match self {
            ElementKind::Uint8 | ElementKind::Int8 | ElementKind::Uint8Clamped => 1,
            ElementKind::Uint16 | ElementKind::Int16 => 2,
            ElementKind::Uint32 | ElementKind::Int32 | ElementKind::Float32 => 4,
            ElementKind::Float64 | ElementKind::BigUint64 | ElementKind::BigInt64 => 8,
        }
    }

    pub fn is_bigint(self) -> bool {
        matches!(self, ElementKind::BigUint64 | ElementKind::BigInt64)
    }

    /// Decodes `self.byte_size()` bytes at `bytes[0..]` into a numeric
    /// value, per `little_endian`.
    pub fn decode(self, bytes: &[u8], little_endian: bool) -> ElementValue {
        macro_rules! num {
            ($ty:ty) => {{
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                if little_endian {
                    <$ty>::from_le_bytes(buf)
                } else {
                    <$ty>::from_be_bytes(buf)
                }
            }};
        }
        match self {
            ElementKind::Uint8 | ElementKind::Uint8Clamped => ElementValue::Number(bytes[0] as f64),
            ElementKind::Int8 => ElementValue::Number(bytes[0] as i8 as f64),
            ElementKind::Uint16 => ElementValue::Number(num!(u16) as f64),
            ElementKind::Int16 => ElementValue::Number(num!(i16) as f64),
            ElementKind::Uint32 => ElementValue::Number(num!(u32) as f64),
            ElementKind::Int32 => ElementValue::Number(num!(i32) as f64),
            ElementKind::Float32 => ElementValue::Number(num!(f32) as f64),
            ElementKind::Float64 => ElementValue::Number(num!(f64)),
            ElementKind::BigUint64 => ElementValue::BigInt(num!(u64) as i128),
            ElementKind::BigInt64 => ElementValue::BigInt(num!(i64) as i128),
        }
    }

    /// Encodes a value into `self.byte_size()` bytes. The `uint8clamped`
    /// codec saturates to `[0, 255]` and round-half-to-even ties, matching
    /// `original_source`'s `rjs_array_buffer_opt.c` clamping rule rather
    /// than the simpler round-half-up a naive port would reach for.
    pub fn encode(self, value: &ElementValue, little_endian: bool) -> Vec<u8> {
        macro_rules! bytes_of {
            ($v:expr) => {
                if little_endian { $v.to_le_bytes().to_vec() } else { $v.to_be_bytes().to_vec() }
            };
        }
        let n = match value {
            ElementValue::Number(n) => *n,
            ElementValue::BigInt(b) => *b as f64,
        };
        match self {
            ElementKind::Uint8 => vec![to_uint8_wrapping(n)],
            ElementKind::Int8 => vec![to_uint8_wrapping(n) as i8 as u8],
            ElementKind::Uint8Clamped => vec![clamp_uint8_round_half_even(n)],
            ElementKind::Uint16 => bytes_of!((to_uint32_wrapping(n) as u16)),
            ElementKind::Int16 => bytes_of!((to_uint32_wrapping(n) as u16 as i16)),
            ElementKind::Uint32 => bytes_of!(to_uint32_wrapping(n)),
            ElementKind::Int32 => bytes_of!((to_uint32_wrapping(n) as i32)),
            ElementKind::Float32 => bytes_of!((n as f32)),
            ElementKind::Float64 => bytes_of!(n),
            ElementKind::BigUint64 => bytes_of!((int_of(value) as u64)),
            ElementKind::BigInt64 => bytes_of!((int_of(value) as i64)),
        }
    }
}

fn int_of(value: &ElementValue) -> i128 {
    match value {
        ElementValue::BigInt(b) => *b,
        ElementValue::Number(n) => *n as i128,
    }
}

fn to_uint32_wrapping(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4294967296.0) as u32
}

fn to_uint8_wrapping(n: f64) -> u8 {
    (to_uint32_wrapping(n) & 0xff) as u8
}

/// `ClampUint8` per §4.5: saturate to `[0, 255]`, and on an exact `.5`
/// boundary round to the nearest *even* integer rather than always up.
fn clamp_uint8_round_half_even(n: f64) -> u8 {
    if n.is_nan() || n <= 0.0 {
        return 0;
    }
    if n >= 255.0 {
        return 255;
    }
    let floor = n.floor();
    let diff = n - floor;
    let rounded = if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    };
    rounded as u8
}

/// A decoded typed-view element: either a `f64` (every kind but the two
/// 64-bit BigInt kinds) or a 128-bit-staged integer for the BigInt kinds
/// (wide enough to hold a full `u64`/`i64` without precision loss before
/// it's narrowed into a `JsBigInt`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementValue {
    Number(f64),
    BigInt(i128),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint8clamped_saturates_out_of_range_values() {
        assert_eq!(clamp_uint8_round_half_even(-10.0), 0);
        assert_eq!(clamp_uint8_round_half_even(300.0), 255);
    }

    #[test]
    fn uint8clamped_rounds_half_to_even() {
        assert_eq!(clamp_uint8_round_half_even(2.5), 2);
        assert_eq!(clamp_uint8_round_half_even(3.5), 4);
    }

    #[test]
    fn int16_round_trips_through_little_endian_bytes() {
        let bytes = ElementKind::Int16.encode(&ElementValue::Number(-1.0), true);
        assert_eq!(bytes, vec![0xFF, 0xFF]);
        let decoded = ElementKind::Int16.decode(&bytes, true);
        assert_eq!(decoded, ElementValue::Number(-1.0));
    }

    #[test]
    fn uint16_big_endian_reads_ff_ff_as_max() {
        let decoded = ElementKind::Uint16.decode(&[0xFF, 0xFF], false);
        assert_eq!(decoded, ElementValue::Number(65535.0));
    }
}
