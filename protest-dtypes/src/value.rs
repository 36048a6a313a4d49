//! The castable builtin value type shared by every dtype strategy.

use std::fmt;

use crate::dtype::{Dtype, DtypeDescriptor};

/// Builtin numeric kinds able to hold any value of a dtype without loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Builtin {
    /// Wide integer holding every fixed-width integer dtype
    Int,
    /// Widest available float, holding every float dtype
    Float,
}

/// A generated value, stored in its dtype's castable builtin
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Int(i128),
    Float(f64),
}

impl Value {
    /// The builtin kind this value is stored in
    pub fn builtin(&self) -> Builtin {
        match self {
            Value::Int(_) => Builtin::Int,
            Value::Float(_) => Builtin::Float,
        }
    }

    /// The integer payload, if this is an integer value
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(_) => None,
        }
    }

    /// The float payload, if this is a float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(_) => None,
            Value::Float(v) => Some(*v),
        }
    }

    /// Numeric value as an `f64`, rounding large integers
    pub fn to_f64(&self) -> f64 {
        match self {
            Value::Int(v) => *v as f64,
            Value::Float(v) => *v,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Float(v) if v.is_nan())
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Value::Float(v) if v.is_infinite())
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Value::Int(_) => true,
            Value::Float(v) => v.is_finite(),
        }
    }

    /// Bitwise identity: NaN matches NaN and `0.0` does not match `-0.0`
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            _ => false,
        }
    }

    /// Cast into the dtype and back to the builtin
    ///
    /// Returns `None` when the value is stored in the wrong builtin or does
    /// not fit the dtype at all.
    pub fn cast_to(&self, descriptor: &DtypeDescriptor) -> Option<Value> {
        match (*self, descriptor.dtype) {
            (Value::Int(v), Dtype::Int8) => num_traits::cast::<i128, i8>(v).map(Value::from),
            (Value::Int(v), Dtype::Int16) => num_traits::cast::<i128, i16>(v).map(Value::from),
            (Value::Int(v), Dtype::Int32) => num_traits::cast::<i128, i32>(v).map(Value::from),
            (Value::Int(v), Dtype::Int64) => num_traits::cast::<i128, i64>(v).map(Value::from),
            (Value::Int(v), Dtype::UInt8) => num_traits::cast::<i128, u8>(v).map(Value::from),
            (Value::Int(v), Dtype::UInt16) => num_traits::cast::<i128, u16>(v).map(Value::from),
            (Value::Int(v), Dtype::UInt32) => num_traits::cast::<i128, u32>(v).map(Value::from),
            (Value::Int(v), Dtype::UInt64) => num_traits::cast::<i128, u64>(v).map(Value::from),
            (Value::Float(v), _) => descriptor
                .float_width()
                .map(|width| Value::Float(width.round(v))),
            (Value::Int(_), _) => None,
        }
    }

    /// Whether casting to the dtype and back leaves the value unchanged
    pub fn is_castable_to(&self, descriptor: &DtypeDescriptor) -> bool {
        self.cast_to(descriptor)
            .is_some_and(|round_tripped| round_tripped.same_value(self))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
        }
    }
}

macro_rules! impl_value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(v as i128)
                }
            }
        )*
    };
}

impl_value_from_int!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}
