//! Static dtype catalog and float width arithmetic.

use std::fmt;
use std::num::FpCategory;

use half::f16;
use num_traits::Float;

use crate::error::DtypeError;
use crate::value::{Builtin, Value};

/// Fixed-width numeric dtypes understood by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dtype {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
}

/// Broad category of a dtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DtypeCategory {
    SignedInt,
    UnsignedInt,
    Float,
}

/// Names of every registered dtype, in catalog order
pub const DTYPE_NAMES: [&str; 11] = [
    "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64", "float16",
    "float32", "float64",
];

/// Immutable description of one registered dtype
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DtypeDescriptor {
    pub dtype: Dtype,
    pub name: &'static str,
    pub category: DtypeCategory,
    pub width: u32,
    pub min_representable: Value,
    pub max_representable: Value,
    pub castable_builtin: Builtin,
}

impl DtypeDescriptor {
    const fn int(dtype: Dtype, name: &'static str, width: u32, min: i128, max: i128) -> Self {
        let category = if min < 0 {
            DtypeCategory::SignedInt
        } else {
            DtypeCategory::UnsignedInt
        };
        Self {
            dtype,
            name,
            category,
            width,
            min_representable: Value::Int(min),
            max_representable: Value::Int(max),
            castable_builtin: Builtin::Int,
        }
    }

    const fn float(dtype: Dtype, name: &'static str, width: u32) -> Self {
        Self {
            dtype,
            name,
            category: DtypeCategory::Float,
            width,
            min_representable: Value::Float(f64::NEG_INFINITY),
            max_representable: Value::Float(f64::INFINITY),
            castable_builtin: Builtin::Float,
        }
    }

    pub fn is_float(&self) -> bool {
        self.category == DtypeCategory::Float
    }

    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }

    /// Float width helper, `None` for integer dtypes
    pub fn float_width(&self) -> Option<FloatWidth> {
        if self.is_float() {
            FloatWidth::from_width(self.width)
        } else {
            None
        }
    }

    /// Integer range, `None` for float dtypes
    pub fn int_range(&self) -> Option<(i128, i128)> {
        match (self.min_representable, self.max_representable) {
            (Value::Int(min), Value::Int(max)) => Some((min, max)),
            _ => None,
        }
    }
}

impl fmt::Display for DtypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

static CATALOG: [DtypeDescriptor; 11] = [
    DtypeDescriptor::int(Dtype::Int8, "int8", 8, i8::MIN as i128, i8::MAX as i128),
    DtypeDescriptor::int(Dtype::Int16, "int16", 16, i16::MIN as i128, i16::MAX as i128),
    DtypeDescriptor::int(Dtype::Int32, "int32", 32, i32::MIN as i128, i32::MAX as i128),
    DtypeDescriptor::int(Dtype::Int64, "int64", 64, i64::MIN as i128, i64::MAX as i128),
    DtypeDescriptor::int(Dtype::UInt8, "uint8", 8, 0, u8::MAX as i128),
    DtypeDescriptor::int(Dtype::UInt16, "uint16", 16, 0, u16::MAX as i128),
    DtypeDescriptor::int(Dtype::UInt32, "uint32", 32, 0, u32::MAX as i128),
    DtypeDescriptor::int(Dtype::UInt64, "uint64", 64, 0, u64::MAX as i128),
    DtypeDescriptor::float(Dtype::Float16, "float16", 16),
    DtypeDescriptor::float(Dtype::Float32, "float32", 32),
    DtypeDescriptor::float(Dtype::Float64, "float64", 64),
];

impl Dtype {
    /// Every registered dtype, in catalog order
    pub const ALL: [Dtype; 11] = [
        Dtype::Int8,
        Dtype::Int16,
        Dtype::Int32,
        Dtype::Int64,
        Dtype::UInt8,
        Dtype::UInt16,
        Dtype::UInt32,
        Dtype::UInt64,
        Dtype::Float16,
        Dtype::Float32,
        Dtype::Float64,
    ];

    /// The catalog entry for this dtype
    pub fn descriptor(self) -> &'static DtypeDescriptor {
        // Catalog order matches declaration order
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything that names a dtype: the dtype object itself or its name
pub trait AsDtype {
    /// Look the dtype up in the catalog
    fn as_descriptor(&self) -> Result<&'static DtypeDescriptor, DtypeError>;
}

impl AsDtype for Dtype {
    fn as_descriptor(&self) -> Result<&'static DtypeDescriptor, DtypeError> {
        Ok(self.descriptor())
    }
}

impl AsDtype for &DtypeDescriptor {
    fn as_descriptor(&self) -> Result<&'static DtypeDescriptor, DtypeError> {
        Ok(self.dtype.descriptor())
    }
}

impl AsDtype for str {
    fn as_descriptor(&self) -> Result<&'static DtypeDescriptor, DtypeError> {
        CATALOG
            .iter()
            .find(|descriptor| descriptor.name == self)
            .ok_or_else(|| DtypeError::unknown_dtype(self))
    }
}

impl AsDtype for &str {
    fn as_descriptor(&self) -> Result<&'static DtypeDescriptor, DtypeError> {
        (**self).as_descriptor()
    }
}

impl AsDtype for String {
    fn as_descriptor(&self) -> Result<&'static DtypeDescriptor, DtypeError> {
        self.as_str().as_descriptor()
    }
}

/// Resolve a dtype name or object to its catalog descriptor
pub fn descriptor_for<D: AsDtype>(dtype: D) -> Result<&'static DtypeDescriptor, DtypeError> {
    dtype.as_descriptor()
}

/// The builtin able to hold every value of the dtype exactly
pub fn castable_builtin_for(descriptor: &DtypeDescriptor) -> Builtin {
    descriptor.castable_builtin
}

/// Whether strategies can be built for this dtype name on this platform
///
/// Float dtypes additionally require the subnormal probe to understand their
/// width, so callers can skip a dtype instead of handling errors mid-run.
pub fn is_supported(name: &str) -> bool {
    match descriptor_for(name) {
        Ok(descriptor) => match descriptor.float_width() {
            Some(width) => crate::probe::flushes_to_zero(width.bits()).is_ok(),
            None => descriptor.is_integer(),
        },
        Err(_) => false,
    }
}

/// IEEE 754 binary formats backing the float dtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    Width16,
    Width32,
    Width64,
}

fn smallest_normal_of<T: Float + Into<f64>>() -> f64 {
    T::min_positive_value().into()
}

fn max_finite_of<T: Float + Into<f64>>() -> f64 {
    T::max_value().into()
}

fn classify_as<T: Float>(value: T) -> FpCategory {
    value.classify()
}

impl FloatWidth {
    pub fn from_width(width: u32) -> Option<Self> {
        match width {
            16 => Some(FloatWidth::Width16),
            32 => Some(FloatWidth::Width32),
            64 => Some(FloatWidth::Width64),
            _ => None,
        }
    }

    pub const fn bits(self) -> u32 {
        match self {
            FloatWidth::Width16 => 16,
            FloatWidth::Width32 => 32,
            FloatWidth::Width64 => 64,
        }
    }

    /// Number of explicitly stored mantissa bits
    pub const fn mantissa_bits(self) -> u32 {
        match self {
            FloatWidth::Width16 => 10,
            FloatWidth::Width32 => 23,
            FloatWidth::Width64 => 52,
        }
    }

    pub fn smallest_normal(self) -> f64 {
        match self {
            FloatWidth::Width16 => smallest_normal_of::<f16>(),
            FloatWidth::Width32 => smallest_normal_of::<f32>(),
            FloatWidth::Width64 => smallest_normal_of::<f64>(),
        }
    }

    pub fn max_finite(self) -> f64 {
        match self {
            FloatWidth::Width16 => max_finite_of::<f16>(),
            FloatWidth::Width32 => max_finite_of::<f32>(),
            FloatWidth::Width64 => max_finite_of::<f64>(),
        }
    }

    /// Smallest positive subnormal value
    pub fn min_subnormal(self) -> f64 {
        self.decode(1)
    }

    /// Round to the nearest value representable at this width
    ///
    /// Values beyond the finite range round to infinity.
    pub fn round(self, value: f64) -> f64 {
        match self {
            FloatWidth::Width16 => f16::from_f64(value).to_f64(),
            FloatWidth::Width32 => value as f32 as f64,
            FloatWidth::Width64 => value,
        }
    }

    pub fn is_representable(self, value: f64) -> bool {
        value.is_nan() || self.round(value).to_bits() == value.to_bits()
    }

    /// Nonzero value smaller in magnitude than the smallest normal
    pub fn is_subnormal(self, value: f64) -> bool {
        let category = match self {
            FloatWidth::Width16 => classify_as(f16::from_f64(value)),
            FloatWidth::Width32 => classify_as(value as f32),
            FloatWidth::Width64 => classify_as(value),
        };
        category == FpCategory::Subnormal
    }

    /// Bit pattern of a representable value at this width
    pub fn encode(self, value: f64) -> u64 {
        match self {
            FloatWidth::Width16 => f16::from_f64(value).to_bits() as u64,
            FloatWidth::Width32 => (value as f32).to_bits() as u64,
            FloatWidth::Width64 => value.to_bits(),
        }
    }

    /// Value of a bit pattern at this width; extra high bits are ignored
    pub fn decode(self, bits: u64) -> f64 {
        match self {
            FloatWidth::Width16 => f16::from_bits(bits as u16).to_f64(),
            FloatWidth::Width32 => f32::from_bits(bits as u32) as f64,
            FloatWidth::Width64 => f64::from_bits(bits),
        }
    }

    /// Next representable value towards positive infinity
    ///
    /// Treats `-0.0` as strictly below `0.0`.
    pub fn next_up(self, value: f64) -> f64 {
        if value.is_nan() || value == f64::INFINITY {
            return value;
        }
        if value == 0.0 {
            return if value.is_sign_negative() {
                0.0
            } else {
                self.min_subnormal()
            };
        }
        let bits = self.encode(value);
        if value > 0.0 {
            self.decode(bits + 1)
        } else {
            self.decode(bits - 1)
        }
    }

    /// Next representable value towards negative infinity
    pub fn next_down(self, value: f64) -> f64 {
        -self.next_up(-value)
    }
}
