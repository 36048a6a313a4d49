//! Scalar strategies built from a dtype and a set of constraints.

use std::sync::Arc;

use crate::config::GeneratorConfig;
use crate::constraints::{Constraints, OptionValue, ResolvedConstraints, resolve};
use crate::dtype::{AsDtype, DtypeDescriptor, FloatWidth};
use crate::error::DtypeError;
use crate::floats::FloatSpace;
use crate::ints;
use crate::probe::{RuntimeProbe, SubnormalProbe};
use crate::strategy::Strategy;
use crate::value::Value;

/// Strategy producing values of one dtype under resolved constraints
///
/// Values are stored in the dtype's castable builtin and always survive a
/// round trip through the dtype unchanged.
#[derive(Debug, Clone)]
pub struct DtypeStrategy {
    descriptor: &'static DtypeDescriptor,
    constraints: ResolvedConstraints,
    probe: Arc<dyn SubnormalProbe>,
}

impl DtypeStrategy {
    /// Build a strategy consulting the runtime subnormal probe
    pub fn new(dtype: impl AsDtype, constraints: Constraints) -> Result<Self, DtypeError> {
        Self::with_probe(dtype, constraints, Arc::new(RuntimeProbe))
    }

    /// Build a strategy consulting a caller-supplied subnormal probe
    pub fn with_probe(
        dtype: impl AsDtype,
        constraints: Constraints,
        probe: Arc<dyn SubnormalProbe>,
    ) -> Result<Self, DtypeError> {
        let descriptor = dtype.as_descriptor()?;
        let constraints = resolve(descriptor, &constraints)?;
        if let Some(width) = descriptor.float_width() {
            // Fail now rather than on the first draw
            if probe.flushes_to_zero(width.bits())? {
                check_flushed_interval(width, &constraints)?;
            }
        }
        tracing::debug!(
            dtype = descriptor.name,
            lowest = %constraints.lowest(),
            highest = %constraints.highest(),
            allow_nan = constraints.allow_nan,
            allow_infinity = constraints.allow_infinity,
            "built dtype strategy"
        );
        Ok(Self {
            descriptor,
            constraints,
            probe,
        })
    }

    pub fn descriptor(&self) -> &'static DtypeDescriptor {
        self.descriptor
    }

    pub fn constraints(&self) -> &ResolvedConstraints {
        &self.constraints
    }

    /// Whether `value` is one this strategy could produce
    pub fn permits(&self, value: &Value) -> Result<bool, DtypeError> {
        match self.float_space()? {
            Some(space) => Ok(value
                .as_float()
                .is_some_and(|v| space.is_valid(v))),
            None => Ok(self.constraints.permits(value)),
        }
    }

    fn float_space(&self) -> Result<Option<FloatSpace<'_>>, DtypeError> {
        match self.descriptor.float_width() {
            Some(width) => Ok(Some(FloatSpace {
                width,
                constraints: &self.constraints,
                flushes: self.probe.flushes_to_zero(width.bits())?,
            })),
            None => Ok(None),
        }
    }
}

impl Strategy for DtypeStrategy {
    type Value = Value;

    fn generate(
        &self,
        rng: &mut dyn rand::RngCore,
        config: &GeneratorConfig,
    ) -> Result<Value, DtypeError> {
        if let Some(space) = self.float_space()? {
            return space.generate(rng, config).map(Value::Float);
        }
        match self.constraints.int_bounds() {
            Some((lo, hi)) => Ok(Value::Int(ints::draw(rng, lo, hi))),
            None => Err(DtypeError::UnsupportedWidth {
                width: self.descriptor.width,
            }),
        }
    }

    fn shrink(&self, value: &Value) -> Box<dyn Iterator<Item = Value>> {
        let candidates: Vec<Value> = match (*value, self.float_space()) {
            (Value::Float(v), Ok(Some(space))) => space
                .shrink_candidates(v)
                .into_iter()
                .map(Value::Float)
                .collect(),
            (Value::Int(v), Ok(None)) => match self.constraints.int_bounds() {
                Some((lo, hi)) => ints::shrink_candidates(v, lo, hi)
                    .into_iter()
                    .map(Value::Int)
                    .collect(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        };
        Box::new(candidates.into_iter())
    }
}

// Zero or a normal value must survive when subnormals flush to zero
fn check_flushed_interval(
    width: FloatWidth,
    constraints: &ResolvedConstraints,
) -> Result<(), DtypeError> {
    let Some((lo, hi)) = constraints.float_bounds() else {
        return Ok(());
    };
    let normal = width.smallest_normal();
    if (lo <= 0.0 && 0.0 <= hi) || hi >= normal || lo <= -normal {
        return Ok(());
    }
    Err(DtypeError::invalid_constraints(format!(
        "no non-subnormal {}-bit floats in [{}, {}] while subnormals flush to zero",
        width.bits(),
        lo,
        hi
    )))
}

/// Strategy for values of `dtype` satisfying `constraints`
pub fn from_dtype(dtype: impl AsDtype, constraints: Constraints) -> Result<DtypeStrategy, DtypeError> {
    DtypeStrategy::new(dtype, constraints)
}

/// [`from_dtype`] taking keyword-style options such as `("min_value", 1.into())`
pub fn from_dtype_with_options(
    dtype: impl AsDtype,
    options: &[(&str, OptionValue)],
) -> Result<DtypeStrategy, DtypeError> {
    DtypeStrategy::new(dtype, Constraints::from_options(options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Dtype;
    use crate::probe::FixedProbe;
    use crate::rng::create_seeded_rng;

    #[test]
    fn test_unknown_dtype_name() {
        assert_eq!(
            from_dtype("float128", Constraints::new()).unwrap_err(),
            DtypeError::unknown_dtype("float128")
        );
    }

    #[test]
    fn test_invalid_constraints_surface_at_construction() {
        let err = from_dtype_with_options("int8", &[("min_value", 5.into()), ("max_value", 1.into())])
            .unwrap_err();
        assert_eq!(err.field(), Some("min_value"));
    }

    #[test]
    fn test_generates_in_builtin() {
        let mut rng = create_seeded_rng(2);
        let config = GeneratorConfig::default();
        for dtype in Dtype::ALL {
            let strategy = from_dtype(dtype, Constraints::new()).unwrap();
            for _ in 0..100 {
                let value = strategy.generate(&mut rng, &config).unwrap();
                assert_eq!(value.builtin(), dtype.descriptor().castable_builtin);
                assert!(value.is_castable_to(dtype.descriptor()), "{} from {}", value, dtype);
            }
        }
    }

    #[test]
    fn test_shrink_candidates_are_permitted() {
        let strategy = from_dtype(Dtype::UInt8, Constraints::new().min_value(1).max_value(2)).unwrap();
        let candidates: Vec<Value> = strategy.shrink(&Value::Int(2)).collect();
        assert_eq!(candidates, vec![Value::Int(1)]);

        let strategy = from_dtype(Dtype::Float32, Constraints::new().min_value(1).max_value(2)).unwrap();
        for candidate in strategy.shrink(&Value::Float(1.5)) {
            assert!(strategy.permits(&candidate).unwrap());
        }
    }

    #[test]
    fn test_shrink_of_mismatched_value_is_empty() {
        let strategy = from_dtype(Dtype::Int16, Constraints::new()).unwrap();
        assert_eq!(strategy.shrink(&Value::Float(3.0)).count(), 0);
    }

    #[test]
    fn test_probe_decides_subnormal_validity() {
        let subnormal = Value::Float(FloatWidth::Width32.min_subnormal());
        let flushing =
            DtypeStrategy::with_probe(Dtype::Float32, Constraints::new(), Arc::new(FixedProbe::flushing()))
                .unwrap();
        assert!(!flushing.permits(&subnormal).unwrap());

        let preserving = DtypeStrategy::with_probe(
            Dtype::Float32,
            Constraints::new(),
            Arc::new(FixedProbe::preserving()),
        )
        .unwrap();
        assert!(preserving.permits(&subnormal).unwrap());
    }

    #[test]
    fn test_subnormal_only_interval_rejected_when_flushing() {
        let tiny = FloatWidth::Width32.min_subnormal();
        let constraints = Constraints::new().min_value(tiny).max_value(tiny * 4.0);
        let err = DtypeStrategy::with_probe(
            Dtype::Float32,
            constraints,
            Arc::new(FixedProbe::flushing()),
        )
        .unwrap_err();
        assert!(matches!(err, DtypeError::InvalidConstraints { .. }));

        let preserving = DtypeStrategy::with_probe(
            Dtype::Float32,
            constraints,
            Arc::new(FixedProbe::preserving()),
        )
        .unwrap();
        let value = preserving
            .generate(&mut create_seeded_rng(1), &GeneratorConfig::default())
            .unwrap();
        assert!(preserving.permits(&value).unwrap());

        let reaches_zero = Constraints::new().min_value(-tiny).max_value(tiny);
        let flushing = DtypeStrategy::with_probe(
            Dtype::Float32,
            reaches_zero,
            Arc::new(FixedProbe::flushing()),
        )
        .unwrap();
        let value = flushing
            .generate(&mut create_seeded_rng(1), &GeneratorConfig::default())
            .unwrap();
        assert_eq!(value.to_f64(), 0.0);
    }

    #[test]
    fn test_shrink_of_out_of_range_integer_is_empty() {
        let strategy = from_dtype(Dtype::Int64, Constraints::new()).unwrap();
        assert_eq!(strategy.shrink(&Value::Int(i128::MIN)).count(), 0);
        assert_eq!(strategy.shrink(&Value::Int(i128::MAX)).count(), 0);
    }

    #[test]
    fn test_reusable_values() {
        let strategy = from_dtype("float64", Constraints::new()).unwrap();
        assert!(strategy.has_reusable_values());
    }
}
