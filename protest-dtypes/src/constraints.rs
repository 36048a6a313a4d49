//! User constraints and their resolution against a dtype's representable range.
//!
//! Resolution happens once, when a strategy is built. After that every
//! generated or shrunk value is checked against [`ResolvedConstraints::permits`],
//! so nothing outside the resolved set can escape a strategy.

use std::cmp::Ordering;
use std::fmt;

use crate::dtype::{DtypeDescriptor, FloatWidth};
use crate::error::DtypeError;
use crate::value::Value;

/// Option keys accepted by [`Constraints::from_options`]
pub const OPTION_KEYS: [&str; 6] = [
    "min_value",
    "max_value",
    "exclude_min",
    "exclude_max",
    "allow_nan",
    "allow_infinity",
];

/// A loosely typed option value, as passed through keyword-style APIs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionValue {
    Number(Value),
    Flag(bool),
}

impl From<bool> for OptionValue {
    fn from(flag: bool) -> Self {
        OptionValue::Flag(flag)
    }
}

impl From<Value> for OptionValue {
    fn from(value: Value) -> Self {
        OptionValue::Number(value)
    }
}

macro_rules! impl_option_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for OptionValue {
                fn from(v: $t) -> Self {
                    OptionValue::Number(Value::from(v))
                }
            }
        )*
    };
}

impl_option_from_number!(i8, i16, i32, i64, i128, u8, u16, u32, u64, f32, f64);

/// Constraints requested by the caller, before resolution
///
/// Unset bounds mean "the representable edge". Unset `allow_nan` means NaN is
/// allowed when no bound is given; unset `allow_infinity` means infinities are
/// allowed when they lie inside the bounds. Both flags are accepted and
/// ignored for integer dtypes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraints {
    pub min_value: Option<Value>,
    pub max_value: Option<Value>,
    pub exclude_min: bool,
    pub exclude_max: bool,
    pub allow_nan: Option<bool>,
    pub allow_infinity: Option<bool>,
}

impl Constraints {
    /// No constraints beyond the dtype itself
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_value(mut self, value: impl Into<Value>) -> Self {
        self.min_value = Some(value.into());
        self
    }

    pub fn max_value(mut self, value: impl Into<Value>) -> Self {
        self.max_value = Some(value.into());
        self
    }

    pub fn exclude_min(mut self, exclude: bool) -> Self {
        self.exclude_min = exclude;
        self
    }

    pub fn exclude_max(mut self, exclude: bool) -> Self {
        self.exclude_max = exclude;
        self
    }

    pub fn allow_nan(mut self, allow: bool) -> Self {
        self.allow_nan = Some(allow);
        self
    }

    pub fn allow_infinity(mut self, allow: bool) -> Self {
        self.allow_infinity = Some(allow);
        self
    }

    /// Build constraints from keyword-style options
    ///
    /// Unknown keys, repeated keys and values of the wrong kind are rejected.
    pub fn from_options(options: &[(&str, OptionValue)]) -> Result<Self, DtypeError> {
        let mut constraints = Self::default();
        let mut seen: Vec<&str> = Vec::with_capacity(options.len());

        for &(key, value) in options {
            if !OPTION_KEYS.contains(&key) {
                return Err(DtypeError::invalid_constraints_with_field(
                    format!("unrecognized option {:?}", key),
                    key,
                ));
            }
            if seen.contains(&key) {
                return Err(DtypeError::invalid_constraints_with_field(
                    format!("option {:?} given more than once", key),
                    key,
                ));
            }
            seen.push(key);

            match (key, value) {
                ("min_value", OptionValue::Number(v)) => constraints.min_value = Some(v),
                ("max_value", OptionValue::Number(v)) => constraints.max_value = Some(v),
                ("exclude_min", OptionValue::Flag(flag)) => constraints.exclude_min = flag,
                ("exclude_max", OptionValue::Flag(flag)) => constraints.exclude_max = flag,
                ("allow_nan", OptionValue::Flag(flag)) => constraints.allow_nan = Some(flag),
                ("allow_infinity", OptionValue::Flag(flag)) => {
                    constraints.allow_infinity = Some(flag)
                }
                (key, OptionValue::Number(_)) => {
                    return Err(DtypeError::invalid_constraints_with_field(
                        format!("option {:?} expects a boolean", key),
                        key,
                    ));
                }
                (key, OptionValue::Flag(_)) => {
                    return Err(DtypeError::invalid_constraints_with_field(
                        format!("option {:?} expects a number", key),
                        key,
                    ));
                }
            }
        }

        Ok(constraints)
    }
}

/// Which end of the interval a bound sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Min,
    Max,
}

impl BoundSide {
    fn field(self) -> &'static str {
        match self {
            BoundSide::Min => "min_value",
            BoundSide::Max => "max_value",
        }
    }

    fn exclude_field(self) -> &'static str {
        match self {
            BoundSide::Min => "exclude_min",
            BoundSide::Max => "exclude_max",
        }
    }
}

/// Non-fatal observations made while resolving constraints
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionWarning {
    /// An exclusive bound lay outside the representable range and was clamped
    /// to the edge; the exclusion now applies to the edge itself
    ExclusiveBoundClamped {
        side: BoundSide,
        requested: Value,
        clamped: Value,
    },
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionWarning::ExclusiveBoundClamped {
                side,
                requested,
                clamped,
            } => write!(
                f,
                "{}={} was clamped to {} while {}=true; the representable edge is now excluded",
                side.field(),
                requested,
                clamped,
                side.exclude_field()
            ),
        }
    }
}

/// Constraints after clamping and validation
///
/// `lowest` and `highest` are the inclusive extremes of the permitted
/// non-NaN values, with exclusions and the infinity flag already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConstraints {
    pub min_value: Value,
    pub max_value: Value,
    pub exclude_min: bool,
    pub exclude_max: bool,
    pub allow_nan: bool,
    pub allow_infinity: bool,
    lowest: Value,
    highest: Value,
    width: Option<FloatWidth>,
    warnings: Vec<ResolutionWarning>,
}

impl ResolvedConstraints {
    /// Least permitted value
    pub fn lowest(&self) -> Value {
        self.lowest
    }

    /// Greatest permitted value
    pub fn highest(&self) -> Value {
        self.highest
    }

    pub fn float_width(&self) -> Option<FloatWidth> {
        self.width
    }

    pub fn warnings(&self) -> &[ResolutionWarning] {
        &self.warnings
    }

    /// Whether an exclusive bound was clamped during resolution
    pub fn has_clamped_exclusive_bound(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, ResolutionWarning::ExclusiveBoundClamped { .. }))
    }

    /// Whether `value` belongs to the resolved set and is representable
    pub fn permits(&self, value: &Value) -> bool {
        match (*value, self.lowest, self.highest, self.width) {
            (Value::Int(v), Value::Int(lo), Value::Int(hi), None) => lo <= v && v <= hi,
            (Value::Float(v), Value::Float(lo), Value::Float(hi), Some(width)) => {
                if v.is_nan() {
                    return self.allow_nan;
                }
                if v.is_infinite() && !self.allow_infinity {
                    return false;
                }
                signed_le(lo, v) && signed_le(v, hi) && width.is_representable(v)
            }
            _ => false,
        }
    }

    /// Integer inclusive bounds, `None` for float constraints
    pub(crate) fn int_bounds(&self) -> Option<(i128, i128)> {
        match (self.lowest, self.highest) {
            (Value::Int(lo), Value::Int(hi)) => Some((lo, hi)),
            _ => None,
        }
    }

    /// Float inclusive bounds, `None` for integer constraints
    pub(crate) fn float_bounds(&self) -> Option<(f64, f64)> {
        match (self.lowest, self.highest) {
            (Value::Float(lo), Value::Float(hi)) => Some((lo, hi)),
            _ => None,
        }
    }
}

/// `a <= b`, with `-0.0` ordered strictly below `0.0`
pub(crate) fn signed_le(a: f64, b: f64) -> bool {
    if a == 0.0 && b == 0.0 {
        return a.is_sign_negative() || b.is_sign_positive();
    }
    a <= b
}

/// Exact ordering of an integer against a non-NaN float
fn cmp_int_float(int: i128, float: f64) -> Ordering {
    let edge = 2f64.powi(127);
    if float >= edge {
        return Ordering::Less;
    }
    if float < -edge {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal if float > whole => Ordering::Less,
        Ordering::Equal if float < whole => Ordering::Greater,
        ordering => ordering,
    }
}

/// Resolve requested constraints against a dtype
pub fn resolve(
    descriptor: &DtypeDescriptor,
    constraints: &Constraints,
) -> Result<ResolvedConstraints, DtypeError> {
    check_requested(constraints)?;
    match descriptor.float_width() {
        Some(width) => resolve_float(width, constraints),
        None => match descriptor.int_range() {
            Some(range) => resolve_int(range, constraints),
            None => Err(DtypeError::UnsupportedWidth {
                width: descriptor.width,
            }),
        },
    }
}

fn check_requested(constraints: &Constraints) -> Result<(), DtypeError> {
    let sides = [
        (BoundSide::Min, constraints.min_value, constraints.exclude_min),
        (BoundSide::Max, constraints.max_value, constraints.exclude_max),
    ];
    for (side, bound, exclude) in sides {
        if bound.is_some_and(|b| b.is_nan()) {
            return Err(DtypeError::invalid_constraints_with_field(
                "bound must not be NaN",
                side.field(),
            ));
        }
        if exclude && !bound.is_some_and(|b| b.is_finite()) {
            return Err(DtypeError::invalid_constraints_with_field(
                format!(
                    "{}=true requires a finite {}",
                    side.exclude_field(),
                    side.field()
                ),
                side.exclude_field(),
            ));
        }
    }

    if let (Some(min), Some(max)) = (constraints.min_value, constraints.max_value) {
        let inverted = match (min, max) {
            (Value::Int(lo), Value::Int(hi)) => lo > hi,
            (Value::Int(lo), Value::Float(hi)) => cmp_int_float(lo, hi) == Ordering::Greater,
            (Value::Float(lo), Value::Int(hi)) => cmp_int_float(hi, lo) == Ordering::Less,
            (Value::Float(lo), Value::Float(hi)) => lo > hi,
        };
        if inverted {
            return Err(DtypeError::invalid_constraints_with_field(
                format!("min_value={} is greater than max_value={}", min, max),
                "min_value",
            ));
        }
    }
    Ok(())
}

fn warn_clamped(
    warnings: &mut Vec<ResolutionWarning>,
    side: BoundSide,
    requested: Value,
    clamped: Value,
) {
    tracing::warn!(
        field = side.field(),
        %requested,
        %clamped,
        "exclusive bound clamped to the representable range"
    );
    warnings.push(ResolutionWarning::ExclusiveBoundClamped {
        side,
        requested,
        clamped,
    });
}

fn empty_interval() -> DtypeError {
    DtypeError::invalid_constraints("no representable value satisfies the constraints")
}

// Returns (requested bound as an integer, exclusion still meaningful)
fn int_bound(bound: Value, side: BoundSide) -> (i128, bool) {
    match bound {
        Value::Int(v) => (v, true),
        Value::Float(v) => {
            let tightened = match side {
                BoundSide::Min => v.ceil(),
                BoundSide::Max => v.floor(),
            };
            // `as` saturates, so infinite bounds land beyond the edge
            (tightened as i128, tightened == v)
        }
    }
}

fn resolve_int(
    (rep_min, rep_max): (i128, i128),
    constraints: &Constraints,
) -> Result<ResolvedConstraints, DtypeError> {
    let mut warnings = Vec::new();
    let mut exclude_min = constraints.exclude_min;
    let mut exclude_max = constraints.exclude_max;

    let min_value = match constraints.min_value {
        None => rep_min,
        Some(bound) => {
            let (requested, exact) = int_bound(bound, BoundSide::Min);
            let value = requested.clamp(rep_min, rep_max);
            exclude_min &= exact;
            if value != requested && exclude_min {
                warn_clamped(&mut warnings, BoundSide::Min, bound, Value::Int(value));
            }
            value
        }
    };
    let max_value = match constraints.max_value {
        None => rep_max,
        Some(bound) => {
            let (requested, exact) = int_bound(bound, BoundSide::Max);
            let value = requested.clamp(rep_min, rep_max);
            exclude_max &= exact;
            if value != requested && exclude_max {
                warn_clamped(&mut warnings, BoundSide::Max, bound, Value::Int(value));
            }
            value
        }
    };

    let lowest = min_value + i128::from(exclude_min);
    let highest = max_value - i128::from(exclude_max);
    if lowest > highest {
        return Err(empty_interval());
    }

    Ok(ResolvedConstraints {
        min_value: Value::Int(min_value),
        max_value: Value::Int(max_value),
        exclude_min,
        exclude_max,
        allow_nan: false,
        allow_infinity: false,
        lowest: Value::Int(lowest),
        highest: Value::Int(highest),
        width: None,
        warnings,
    })
}

// Returns (bound, exclusion still meaningful, clamped to the edge)
fn float_bound(bound: f64, side: BoundSide, width: FloatWidth) -> (f64, bool, bool) {
    let max_finite = width.max_finite();
    if bound.is_infinite() {
        return (bound, true, false);
    }
    match side {
        BoundSide::Min if bound < -max_finite => return (-max_finite, true, true),
        BoundSide::Min if bound > max_finite => return (f64::INFINITY, false, true),
        BoundSide::Max if bound > max_finite => return (max_finite, true, true),
        BoundSide::Max if bound < -max_finite => return (f64::NEG_INFINITY, false, true),
        _ => {}
    }

    let mut rounded = width.round(bound);
    match side {
        BoundSide::Min if rounded < bound => rounded = width.next_up(rounded),
        BoundSide::Max if rounded > bound => rounded = width.next_down(rounded),
        _ => {}
    }
    // A bound moved inward already excludes the requested value
    (rounded, rounded == bound, false)
}

// Integer bounds may lose precision on the way to f64, so they are checked
// against the exact integer once more
fn requested_float_bound(bound: Value, side: BoundSide, width: FloatWidth) -> (f64, bool, bool) {
    let (mut value, mut exact, clamped) = float_bound(bound.to_f64(), side, width);
    if let Value::Int(requested) = bound {
        if !clamped {
            match (side, cmp_int_float(requested, value)) {
                (BoundSide::Min, Ordering::Greater) => value = width.next_up(value),
                (BoundSide::Max, Ordering::Less) => value = width.next_down(value),
                _ => {}
            }
            exact &= cmp_int_float(requested, value) == Ordering::Equal;
        }
    }
    (value, exact, clamped)
}

fn resolve_float(
    width: FloatWidth,
    constraints: &Constraints,
) -> Result<ResolvedConstraints, DtypeError> {
    let mut warnings = Vec::new();
    let mut exclude_min = constraints.exclude_min;
    let mut exclude_max = constraints.exclude_max;
    let bounded = constraints.min_value.is_some() || constraints.max_value.is_some();

    let min_value = match constraints.min_value {
        None => f64::NEG_INFINITY,
        Some(bound) => {
            let (value, exact, clamped) = requested_float_bound(bound, BoundSide::Min, width);
            exclude_min &= exact;
            if clamped && exclude_min {
                warn_clamped(&mut warnings, BoundSide::Min, bound, Value::Float(value));
            }
            value
        }
    };
    let max_value = match constraints.max_value {
        None => f64::INFINITY,
        Some(bound) => {
            let (value, exact, clamped) = requested_float_bound(bound, BoundSide::Max, width);
            exclude_max &= exact;
            if clamped && exclude_max {
                warn_clamped(&mut warnings, BoundSide::Max, bound, Value::Float(value));
            }
            value
        }
    };

    let allow_nan = match constraints.allow_nan {
        None => !bounded,
        Some(true) if bounded => {
            return Err(DtypeError::invalid_constraints_with_field(
                "allow_nan=true cannot be combined with min_value or max_value",
                "allow_nan",
            ));
        }
        Some(allow) => allow,
    };

    let infinity_in_bounds = min_value == f64::NEG_INFINITY || max_value == f64::INFINITY;
    let allow_infinity = match constraints.allow_infinity {
        None => infinity_in_bounds,
        Some(true) if !infinity_in_bounds => {
            return Err(DtypeError::invalid_constraints_with_field(
                "allow_infinity=true cannot be combined with two finite bounds",
                "allow_infinity",
            ));
        }
        Some(allow) => allow,
    };

    let mut lowest = if exclude_min {
        width.next_up(min_value)
    } else {
        min_value
    };
    let mut highest = if exclude_max {
        width.next_down(max_value)
    } else {
        max_value
    };
    if !allow_infinity {
        if lowest == f64::NEG_INFINITY {
            lowest = -width.max_finite();
        }
        if highest == f64::INFINITY {
            highest = width.max_finite();
        }
        if lowest == f64::INFINITY || highest == f64::NEG_INFINITY {
            return Err(empty_interval());
        }
    }
    if !signed_le(lowest, highest) {
        return Err(empty_interval());
    }

    Ok(ResolvedConstraints {
        min_value: Value::Float(min_value),
        max_value: Value::Float(max_value),
        exclude_min,
        exclude_max,
        allow_nan,
        allow_infinity,
        lowest: Value::Float(lowest),
        highest: Value::Float(highest),
        width: Some(width),
        warnings,
    })
}
