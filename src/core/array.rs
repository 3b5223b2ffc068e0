// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dense N-dimensional arrays with an explicit element type.
//!
//! [`ArrayData`] is the single array representation shared by coordinates,
//! data variables and array-valued attributes. Every variant wraps an
//! [`ndarray::ArrayD`] of one concrete element type; [`DType`] names that type
//! on the wire, so decoders never infer a type from the magnitude of values.
//!
//! ## Packed byte layout
//!
//! Both encoders store array payloads in the same packed form, in logical
//! (row-major) element order:
//!
//! | dtype | element bytes |
//! |---|---|
//! | `bool` | 1 byte, `0` or `1` |
//! | integers / floats | little-endian, native width |
//! | `complex64` / `complex128` | real then imaginary, little-endian f32 / f64 |
//! | `str` | `u32` little-endian byte length followed by UTF-8 bytes |

use byteorder::{ByteOrder, LittleEndian};
use ndarray::{ArrayD, IxDyn};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use super::error::{CodecError, Result};

/// Single-precision complex element.
pub type Complex32 = Complex<f32>;
/// Double-precision complex element.
pub type Complex64 = Complex<f64>;

/// Element type of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Two packed `f32` components
    Complex64,
    /// Two packed `f64` components
    Complex128,
    /// Variable-length UTF-8 strings
    String,
}

impl DType {
    /// All element types, in wire tag order.
    pub const ALL: [DType; 14] = [
        DType::Bool,
        DType::Int8,
        DType::Int16,
        DType::Int32,
        DType::Int64,
        DType::UInt8,
        DType::UInt16,
        DType::UInt32,
        DType::UInt64,
        DType::Float32,
        DType::Float64,
        DType::Complex64,
        DType::Complex128,
        DType::String,
    ];

    /// Wire name of this dtype.
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Complex64 => "complex64",
            DType::Complex128 => "complex128",
            DType::String => "str",
        }
    }

    /// Parse a wire name.
    pub fn parse(name: &str) -> Result<Self> {
        DType::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == name)
            .ok_or_else(|| CodecError::malformed("dtype", format!("unknown dtype '{name}'")))
    }

    /// One-byte tag used by the container format.
    pub fn tag(&self) -> u8 {
        // Position in ALL, offset so that 0 is never a valid tag.
        DType::ALL.iter().position(|d| d == self).unwrap_or(0) as u8 + 1
    }

    /// Inverse of [`DType::tag`].
    pub fn from_tag(tag: u8) -> Result<Self> {
        tag.checked_sub(1)
            .and_then(|i| DType::ALL.get(i as usize).copied())
            .ok_or_else(|| CodecError::malformed("dtype", format!("unknown dtype tag {tag}")))
    }

    /// Fixed element width in bytes, `None` for strings.
    pub fn byte_width(&self) -> Option<usize> {
        match self {
            DType::Bool | DType::Int8 | DType::UInt8 => Some(1),
            DType::Int16 | DType::UInt16 => Some(2),
            DType::Int32 | DType::UInt32 | DType::Float32 => Some(4),
            DType::Int64 | DType::UInt64 | DType::Float64 | DType::Complex64 => Some(8),
            DType::Complex128 => Some(16),
            DType::String => None,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, DType::Complex64 | DType::Complex128)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DType::Int8
                | DType::Int16
                | DType::Int32
                | DType::Int64
                | DType::UInt8
                | DType::UInt16
                | DType::UInt32
                | DType::UInt64
        )
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dense N-dimensional array of one element type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bool(ArrayD<bool>),
    Int8(ArrayD<i8>),
    Int16(ArrayD<i16>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    UInt8(ArrayD<u8>),
    UInt16(ArrayD<u16>),
    UInt32(ArrayD<u32>),
    UInt64(ArrayD<u64>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Complex64(ArrayD<Complex32>),
    Complex128(ArrayD<Complex64>),
    String(ArrayD<String>),
}

/// Apply `$body` to the inner `ArrayD` whatever its element type.
macro_rules! with_array {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            ArrayData::Bool($arr) => $body,
            ArrayData::Int8($arr) => $body,
            ArrayData::Int16($arr) => $body,
            ArrayData::Int32($arr) => $body,
            ArrayData::Int64($arr) => $body,
            ArrayData::UInt8($arr) => $body,
            ArrayData::UInt16($arr) => $body,
            ArrayData::UInt32($arr) => $body,
            ArrayData::UInt64($arr) => $body,
            ArrayData::Float32($arr) => $body,
            ArrayData::Float64($arr) => $body,
            ArrayData::Complex64($arr) => $body,
            ArrayData::Complex128($arr) => $body,
            ArrayData::String($arr) => $body,
        }
    };
}

/// Element types that can live in an [`ArrayData`].
pub trait Element: Clone + Sized {
    /// The dtype this element maps to.
    const DTYPE: DType;

    /// Wrap a typed array.
    fn wrap(array: ArrayD<Self>) -> ArrayData;

    /// Borrow the typed array if `data` holds this element type.
    fn unwrap_ref(data: &ArrayData) -> Option<&ArrayD<Self>>;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$variant;

            fn wrap(array: ArrayD<Self>) -> ArrayData {
                ArrayData::$variant(array)
            }

            fn unwrap_ref(data: &ArrayData) -> Option<&ArrayD<Self>> {
                match data {
                    ArrayData::$variant(a) => Some(a),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(bool, Bool);
impl_element!(i8, Int8);
impl_element!(i16, Int16);
impl_element!(i32, Int32);
impl_element!(i64, Int64);
impl_element!(u8, UInt8);
impl_element!(u16, UInt16);
impl_element!(u32, UInt32);
impl_element!(u64, UInt64);
impl_element!(f32, Float32);
impl_element!(f64, Float64);
impl_element!(Complex32, Complex64);
impl_element!(Complex64, Complex128);
impl_element!(String, String);

/// Number of elements for a shape, rejecting overflow.
pub fn num_elements(shape: &[usize]) -> Result<usize> {
    shape.iter().try_fold(1usize, |acc, &n| {
        acc.checked_mul(n)
            .ok_or_else(|| CodecError::malformed("shape", format!("shape {shape:?} overflows")))
    })
}

impl ArrayData {
    /// Wrap a typed `ndarray` array.
    pub fn new<T: Element>(array: ArrayD<T>) -> Self {
        T::wrap(array)
    }

    /// Build an array from a flat, row-major vector.
    pub fn from_shape_vec<T: Element>(shape: &[usize], values: Vec<T>) -> Result<Self> {
        let expected = num_elements(shape)?;
        if values.len() != expected {
            return Err(CodecError::shape_mismatch(
                "array",
                format!(
                    "shape {shape:?} needs {expected} elements, got {}",
                    values.len()
                ),
            ));
        }
        ArrayD::from_shape_vec(IxDyn(shape), values)
            .map(T::wrap)
            .map_err(|e| CodecError::shape_mismatch("array", e.to_string()))
    }

    /// Build a one-dimensional array.
    pub fn vector<T: Element>(values: Vec<T>) -> Self {
        T::wrap(ndarray::Array1::from_vec(values).into_dyn())
    }

    /// Build a one-dimensional string array.
    pub fn strings<S: AsRef<str>>(values: &[S]) -> Self {
        Self::vector(values.iter().map(|s| s.as_ref().to_string()).collect())
    }

    /// Borrow the typed array.
    pub fn as_array<T: Element>(&self) -> Option<&ArrayD<T>> {
        T::unwrap_ref(self)
    }

    pub fn dtype(&self) -> DType {
        match self {
            ArrayData::Bool(_) => DType::Bool,
            ArrayData::Int8(_) => DType::Int8,
            ArrayData::Int16(_) => DType::Int16,
            ArrayData::Int32(_) => DType::Int32,
            ArrayData::Int64(_) => DType::Int64,
            ArrayData::UInt8(_) => DType::UInt8,
            ArrayData::UInt16(_) => DType::UInt16,
            ArrayData::UInt32(_) => DType::UInt32,
            ArrayData::UInt64(_) => DType::UInt64,
            ArrayData::Float32(_) => DType::Float32,
            ArrayData::Float64(_) => DType::Float64,
            ArrayData::Complex64(_) => DType::Complex64,
            ArrayData::Complex128(_) => DType::Complex128,
            ArrayData::String(_) => DType::String,
        }
    }

    pub fn shape(&self) -> &[usize] {
        with_array!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        with_array!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow string elements in logical order, if this is a string array.
    pub fn as_strs(&self) -> Option<Vec<&str>> {
        match self {
            ArrayData::String(a) => Some(a.iter().map(String::as_str).collect()),
            _ => None,
        }
    }

    /// Real numeric elements widened to `f64`, in logical order.
    ///
    /// Returns `None` for bool, complex and string arrays.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            ArrayData::Int8(a) => Some(a.iter().map(|&v| v as f64).collect()),
            ArrayData::Int16(a) => Some(a.iter().map(|&v| v as f64).collect()),
            ArrayData::Int32(a) => Some(a.iter().map(|&v| v as f64).collect()),
            ArrayData::Int64(a) => Some(a.iter().map(|&v| v as f64).collect()),
            ArrayData::UInt8(a) => Some(a.iter().map(|&v| v as f64).collect()),
            ArrayData::UInt16(a) => Some(a.iter().map(|&v| v as f64).collect()),
            ArrayData::UInt32(a) => Some(a.iter().map(|&v| v as f64).collect()),
            ArrayData::UInt64(a) => Some(a.iter().map(|&v| v as f64).collect()),
            ArrayData::Float32(a) => Some(a.iter().map(|&v| v as f64).collect()),
            ArrayData::Float64(a) => Some(a.iter().copied().collect()),
            _ => None,
        }
    }

    /// Integer elements widened to `i128`, in logical order.
    pub fn to_i128_vec(&self) -> Option<Vec<i128>> {
        match self {
            ArrayData::Int8(a) => Some(a.iter().map(|&v| v as i128).collect()),
            ArrayData::Int16(a) => Some(a.iter().map(|&v| v as i128).collect()),
            ArrayData::Int32(a) => Some(a.iter().map(|&v| v as i128).collect()),
            ArrayData::Int64(a) => Some(a.iter().map(|&v| v as i128).collect()),
            ArrayData::UInt8(a) => Some(a.iter().map(|&v| v as i128).collect()),
            ArrayData::UInt16(a) => Some(a.iter().map(|&v| v as i128).collect()),
            ArrayData::UInt32(a) => Some(a.iter().map(|&v| v as i128).collect()),
            ArrayData::UInt64(a) => Some(a.iter().map(|&v| v as i128).collect()),
            _ => None,
        }
    }

    /// Render one element (by flat logical index) for error messages.
    pub fn element_repr(&self, index: usize) -> String {
        with_array!(self, a => a
            .iter()
            .nth(index)
            .map(|v| format!("{v:?}"))
            .unwrap_or_else(|| "<out of range>".to_string()))
    }

    /// Element-wise comparison.
    ///
    /// Floating-point and complex elements compare within
    /// `|a - b| <= atol + rtol * |b|`; two NaNs compare equal. All other
    /// element types compare exactly.
    pub fn approx_eq(&self, other: &ArrayData, rtol: f64, atol: f64) -> bool {
        if self.dtype() != other.dtype() || self.shape() != other.shape() {
            return false;
        }
        let close = |a: f64, b: f64| {
            (a.is_nan() && b.is_nan()) || a == b || (a - b).abs() <= atol + rtol * b.abs()
        };
        match (self, other) {
            (ArrayData::Float32(a), ArrayData::Float32(b)) => {
                a.iter().zip(b.iter()).all(|(x, y)| close(*x as f64, *y as f64))
            }
            (ArrayData::Float64(a), ArrayData::Float64(b)) => {
                a.iter().zip(b.iter()).all(|(x, y)| close(*x, *y))
            }
            (ArrayData::Complex64(a), ArrayData::Complex64(b)) => a.iter().zip(b.iter()).all(
                |(x, y)| close(x.re as f64, y.re as f64) && close(x.im as f64, y.im as f64),
            ),
            (ArrayData::Complex128(a), ArrayData::Complex128(b)) => a
                .iter()
                .zip(b.iter())
                .all(|(x, y)| close(x.re, y.re) && close(x.im, y.im)),
            _ => self == other,
        }
    }

    /// Element-wise exact comparison where two NaNs compare equal.
    pub fn exact_eq(&self, other: &ArrayData) -> bool {
        self.approx_eq(other, 0.0, 0.0)
    }

    /// Pack elements into the shared little-endian byte layout.
    ///
    /// Fails only for a string element too long for its `u32` length prefix.
    pub fn to_le_bytes(&self) -> Result<Vec<u8>> {
        Ok(match self {
            ArrayData::Bool(a) => a.iter().map(|&v| v as u8).collect(),
            ArrayData::Int8(a) => a.iter().map(|&v| v as u8).collect(),
            ArrayData::UInt8(a) => a.iter().copied().collect(),
            ArrayData::Int16(a) => pack(a.iter(), 2, |c, v| LittleEndian::write_i16(c, *v)),
            ArrayData::Int32(a) => pack(a.iter(), 4, |c, v| LittleEndian::write_i32(c, *v)),
            ArrayData::Int64(a) => pack(a.iter(), 8, |c, v| LittleEndian::write_i64(c, *v)),
            ArrayData::UInt16(a) => pack(a.iter(), 2, |c, v| LittleEndian::write_u16(c, *v)),
            ArrayData::UInt32(a) => pack(a.iter(), 4, |c, v| LittleEndian::write_u32(c, *v)),
            ArrayData::UInt64(a) => pack(a.iter(), 8, |c, v| LittleEndian::write_u64(c, *v)),
            ArrayData::Float32(a) => pack(a.iter(), 4, |c, v| LittleEndian::write_f32(c, *v)),
            ArrayData::Float64(a) => pack(a.iter(), 8, |c, v| LittleEndian::write_f64(c, *v)),
            ArrayData::Complex64(a) => pack(a.iter(), 8, |c, v| {
                LittleEndian::write_f32(&mut c[..4], v.re);
                LittleEndian::write_f32(&mut c[4..], v.im);
            }),
            ArrayData::Complex128(a) => pack(a.iter(), 16, |c, v| {
                LittleEndian::write_f64(&mut c[..8], v.re);
                LittleEndian::write_f64(&mut c[8..], v.im);
            }),
            ArrayData::String(a) => {
                let mut out = Vec::new();
                for s in a.iter() {
                    out.extend_from_slice(&string_len_prefix(s.len())?);
                    out.extend_from_slice(s.as_bytes());
                }
                out
            }
        })
    }

    /// Unpack the shared little-endian byte layout.
    pub fn from_le_bytes(dtype: DType, shape: &[usize], bytes: &[u8]) -> Result<Self> {
        let count = num_elements(shape)?;
        if let Some(width) = dtype.byte_width() {
            let expected = count.checked_mul(width).ok_or_else(|| {
                CodecError::malformed("array", format!("shape {shape:?} overflows"))
            })?;
            if bytes.len() != expected {
                return Err(CodecError::malformed(
                    "array",
                    format!(
                        "{dtype} array of shape {shape:?} needs {expected} bytes, got {}",
                        bytes.len()
                    ),
                ));
            }
        }
        match dtype {
            DType::Bool => {
                let values = bytes
                    .iter()
                    .map(|&b| match b {
                        0 => Ok(false),
                        1 => Ok(true),
                        other => Err(CodecError::malformed(
                            "array",
                            format!("invalid bool byte {other}"),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Self::from_shape_vec(shape, values)
            }
            DType::Int8 => Self::from_shape_vec(shape, bytes.iter().map(|&b| b as i8).collect()),
            DType::UInt8 => Self::from_shape_vec(shape, bytes.to_vec()),
            DType::Int16 => Self::from_shape_vec(shape, unpack(bytes, 2, LittleEndian::read_i16)),
            DType::Int32 => Self::from_shape_vec(shape, unpack(bytes, 4, LittleEndian::read_i32)),
            DType::Int64 => Self::from_shape_vec(shape, unpack(bytes, 8, LittleEndian::read_i64)),
            DType::UInt16 => Self::from_shape_vec(shape, unpack(bytes, 2, LittleEndian::read_u16)),
            DType::UInt32 => Self::from_shape_vec(shape, unpack(bytes, 4, LittleEndian::read_u32)),
            DType::UInt64 => Self::from_shape_vec(shape, unpack(bytes, 8, LittleEndian::read_u64)),
            DType::Float32 => {
                Self::from_shape_vec(shape, unpack(bytes, 4, LittleEndian::read_f32))
            }
            DType::Float64 => {
                Self::from_shape_vec(shape, unpack(bytes, 8, LittleEndian::read_f64))
            }
            DType::Complex64 => Self::from_shape_vec(
                shape,
                unpack(bytes, 8, |c| {
                    Complex32::new(LittleEndian::read_f32(&c[..4]), LittleEndian::read_f32(&c[4..]))
                }),
            ),
            DType::Complex128 => Self::from_shape_vec(
                shape,
                unpack(bytes, 16, |c| {
                    Complex64::new(LittleEndian::read_f64(&c[..8]), LittleEndian::read_f64(&c[8..]))
                }),
            ),
            DType::String => Self::from_shape_vec(shape, unpack_strings(bytes, count)?),
        }
    }
}

fn pack<'a, T: 'a>(
    values: impl ExactSizeIterator<Item = &'a T>,
    width: usize,
    write: impl Fn(&mut [u8], &T),
) -> Vec<u8> {
    let mut out = vec![0u8; values.len() * width];
    for (chunk, v) in out.chunks_exact_mut(width).zip(values) {
        write(chunk, v);
    }
    out
}

fn unpack<T>(bytes: &[u8], width: usize, read: impl Fn(&[u8]) -> T) -> Vec<T> {
    bytes.chunks_exact(width).map(read).collect()
}

fn string_len_prefix(len: usize) -> Result<[u8; 4]> {
    let len = u32::try_from(len).map_err(|_| {
        CodecError::malformed("array", format!("string of {len} bytes exceeds the u32 length prefix"))
    })?;
    Ok(len.to_le_bytes())
}

fn unpack_strings(bytes: &[u8], count: usize) -> Result<Vec<String>> {
    // Every string costs at least its 4-byte prefix.
    let mut out = Vec::with_capacity(count.min(bytes.len() / 4));
    let mut pos = 0usize;
    for i in 0..count {
        if pos + 4 > bytes.len() {
            return Err(CodecError::malformed(
                "array",
                format!("string element {i} length prefix truncated at byte {pos}"),
            ));
        }
        let len = LittleEndian::read_u32(&bytes[pos..pos + 4]) as usize;
        pos += 4;
        let end = pos.checked_add(len).filter(|&e| e <= bytes.len()).ok_or_else(|| {
            CodecError::malformed(
                "array",
                format!("string element {i} of {len} bytes exceeds payload"),
            )
        })?;
        let s = std::str::from_utf8(&bytes[pos..end])
            .map_err(|e| CodecError::malformed("array", format!("string element {i}: {e}")))?;
        out.push(s.to_string());
        pos = end;
    }
    if pos != bytes.len() {
        return Err(CodecError::malformed(
            "array",
            format!("{} trailing bytes after {count} strings", bytes.len() - pos),
        ));
    }
    Ok(out)
}
