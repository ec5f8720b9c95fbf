//! Single values and the native Rust types that back buffer elements.

use std::fmt;

use crate::element_type::ElementType;

/// A single value read from, or written to, a buffer.
///
/// Writing a scalar into a buffer converts it to the buffer's element type with
/// `as`-cast semantics: booleans become `0`/`1`, and any non-zero number becomes
/// `true` when the target is `Boolean`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Scalar {
    /// Decodes one value of type `element_type` from `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than the element type size.
    pub fn read(element_type: ElementType, bytes: &[u8]) -> Scalar {
        let bytes = &bytes[..element_type.size()];
        match element_type {
            ElementType::Boolean => Scalar::Bool(bytes[0] != 0),
            ElementType::Int8 => Scalar::Int(bytemuck::pod_read_unaligned::<i8>(bytes) as i64),
            ElementType::Int16 => Scalar::Int(bytemuck::pod_read_unaligned::<i16>(bytes) as i64),
            ElementType::Int32 => Scalar::Int(bytemuck::pod_read_unaligned::<i32>(bytes) as i64),
            ElementType::Int64 => Scalar::Int(bytemuck::pod_read_unaligned::<i64>(bytes)),
            ElementType::UInt8 => Scalar::UInt(bytes[0] as u64),
            ElementType::UInt16 => {
                Scalar::UInt(bytemuck::pod_read_unaligned::<u16>(bytes) as u64)
            }
            ElementType::UInt32 => {
                Scalar::UInt(bytemuck::pod_read_unaligned::<u32>(bytes) as u64)
            }
            ElementType::UInt64 => Scalar::UInt(bytemuck::pod_read_unaligned::<u64>(bytes)),
            ElementType::Float32 => {
                Scalar::Float(bytemuck::pod_read_unaligned::<f32>(bytes) as f64)
            }
            ElementType::Float64 => Scalar::Float(bytemuck::pod_read_unaligned::<f64>(bytes)),
        }
    }

    /// Encodes this value as `element_type` into the first bytes of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than the element type size.
    pub fn write(self, element_type: ElementType, out: &mut [u8]) {
        let out = &mut out[..element_type.size()];
        match element_type {
            ElementType::Boolean => out[0] = self.as_bool() as u8,
            ElementType::Int8 => out.copy_from_slice(bytemuck::bytes_of(&(self.as_i64() as i8))),
            ElementType::Int16 => {
                out.copy_from_slice(bytemuck::bytes_of(&(self.as_i64() as i16)))
            }
            ElementType::Int32 => {
                out.copy_from_slice(bytemuck::bytes_of(&(self.as_i64() as i32)))
            }
            ElementType::Int64 => out.copy_from_slice(bytemuck::bytes_of(&self.as_i64())),
            ElementType::UInt8 => out[0] = self.as_u64() as u8,
            ElementType::UInt16 => {
                out.copy_from_slice(bytemuck::bytes_of(&(self.as_u64() as u16)))
            }
            ElementType::UInt32 => {
                out.copy_from_slice(bytemuck::bytes_of(&(self.as_u64() as u32)))
            }
            ElementType::UInt64 => out.copy_from_slice(bytemuck::bytes_of(&self.as_u64())),
            ElementType::Float32 => {
                out.copy_from_slice(bytemuck::bytes_of(&(self.as_f64() as f32)))
            }
            ElementType::Float64 => out.copy_from_slice(bytemuck::bytes_of(&self.as_f64())),
        }
    }

    /// Encodes this value as `element_type` into a new byte vector.
    pub fn to_bytes(self, element_type: ElementType) -> Vec<u8> {
        let mut bytes = vec![0u8; element_type.size()];
        self.write(element_type, &mut bytes);
        bytes
    }

    pub fn as_bool(&self) -> bool {
        match *self {
            Scalar::Bool(v) => v,
            Scalar::Int(v) => v != 0,
            Scalar::UInt(v) => v != 0,
            Scalar::Float(v) => v != 0.0,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match *self {
            Scalar::Bool(v) => v as i64,
            Scalar::Int(v) => v,
            Scalar::UInt(v) => v as i64,
            Scalar::Float(v) => v as i64,
        }
    }

    pub fn as_u64(&self) -> u64 {
        match *self {
            Scalar::Bool(v) => v as u64,
            Scalar::Int(v) => v as u64,
            Scalar::UInt(v) => v,
            Scalar::Float(v) => v as u64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::Bool(v) => v as u8 as f64,
            Scalar::Int(v) => v as f64,
            Scalar::UInt(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }

    /// The narrowest element type able to hold this value without conversion.
    pub fn natural_type(&self) -> ElementType {
        match self {
            Scalar::Bool(_) => ElementType::Boolean,
            Scalar::Int(_) => ElementType::Int64,
            Scalar::UInt(_) => ElementType::UInt64,
            Scalar::Float(_) => ElementType::Float64,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Scalar::Bool(true) => f.write_str("True"),
            Scalar::Bool(false) => f.write_str("False"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::UInt(v) => write!(f, "{v}"),
            Scalar::Float(v) => fmt_float(f, v),
        }
    }
}

/// Floats always show a fractional part, so `1.0` renders as "1.0" rather than "1".
pub(crate) fn fmt_float<T>(f: &mut fmt::Formatter<'_>, v: T) -> fmt::Result
where
    T: Into<f64> + fmt::Display + Copy,
{
    let wide: f64 = v.into();
    if wide.is_finite() && wide.fract() == 0.0 && wide.abs() < 1e16 {
        write!(f, "{wide:.1}")
    } else {
        write!(f, "{v}")
    }
}

macro_rules! impl_scalar_from {
    ($variant:ident, $wide:ty, $($t:ty),+) => {
        $(
            impl From<$t> for Scalar {
                fn from(value: $t) -> Self {
                    Scalar::$variant(value as $wide)
                }
            }
        )+
    };
}

impl_scalar_from!(Int, i64, i8, i16, i32, i64);
impl_scalar_from!(UInt, u64, u8, u16, u32, u64, usize);
impl_scalar_from!(Float, f64, f32, f64);

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// A native Rust type that can back the values of a buffer.
///
/// Implemented for the fixed-width integer and floating point types; booleans are
/// stored as one byte per value and have dedicated buffer constructors.
pub trait NativeElement: bytemuck::Pod + PartialEq + fmt::Debug + Send + Sync + 'static {
    const ELEMENT_TYPE: ElementType;

    fn from_scalar(value: Scalar) -> Self;

    fn to_scalar(self) -> Scalar;
}

macro_rules! impl_native_element {
    ($t:ty, $element_type:ident, $accessor:ident) => {
        impl NativeElement for $t {
            const ELEMENT_TYPE: ElementType = ElementType::$element_type;

            #[inline]
            fn from_scalar(value: Scalar) -> Self {
                value.$accessor() as $t
            }

            #[inline]
            fn to_scalar(self) -> Scalar {
                Scalar::from(self)
            }
        }
    };
}

impl_native_element!(i8, Int8, as_i64);
impl_native_element!(i16, Int16, as_i64);
impl_native_element!(i32, Int32, as_i64);
impl_native_element!(i64, Int64, as_i64);
impl_native_element!(u8, UInt8, as_u64);
impl_native_element!(u16, UInt16, as_u64);
impl_native_element!(u32, UInt32, as_u64);
impl_native_element!(u64, UInt64, as_u64);
impl_native_element!(f32, Float32, as_f64);
impl_native_element!(f64, Float64, as_f64);
