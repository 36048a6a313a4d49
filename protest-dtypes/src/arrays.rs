//! Fixed-shape arrays filled from an element strategy.

use crate::config::GeneratorConfig;
use crate::dtype::{AsDtype, Dtype};
use crate::error::DtypeError;
use crate::shrink::{ShrinkKey, ShrinkOrder};
use crate::strategy::Strategy;
use crate::value::Value;

/// A dense array stored flat in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    pub dtype: Dtype,
    pub shape: Vec<usize>,
    pub data: Vec<Value>,
}

impl Array {
    /// Number of elements
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.data.iter()
    }
}

impl ShrinkOrder for Array {
    type Key = Vec<ShrinkKey>;

    fn shrink_key(&self) -> Vec<ShrinkKey> {
        self.data.shrink_key()
    }
}

/// Strategy for arrays of one shape whose elements come from `elements`
#[derive(Debug, Clone)]
pub struct ArrayStrategy<S> {
    dtype: Dtype,
    shape: Vec<usize>,
    size: usize,
    elements: S,
}

impl<S> ArrayStrategy<S>
where
    S: Strategy<Value = Value>,
{
    pub fn new(dtype: impl AsDtype, shape: &[usize], elements: S) -> Result<Self, DtypeError> {
        let dtype = dtype.as_descriptor()?.dtype;
        let size = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| {
                DtypeError::invalid_constraints_with_field(
                    format!("shape {:?} has too many elements", shape),
                    "shape",
                )
            })?;
        Ok(Self {
            dtype,
            shape: shape.to_vec(),
            size,
            elements,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn elements(&self) -> &S {
        &self.elements
    }
}

impl<S> Strategy for ArrayStrategy<S>
where
    S: Strategy<Value = Value>,
{
    type Value = Array;

    fn generate(
        &self,
        rng: &mut dyn rand::RngCore,
        config: &GeneratorConfig,
    ) -> Result<Array, DtypeError> {
        let data = (0..self.size)
            .map(|_| self.elements.generate(rng, config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Array {
            dtype: self.dtype,
            shape: self.shape.clone(),
            data,
        })
    }

    fn shrink(&self, value: &Array) -> Box<dyn Iterator<Item = Array>> {
        let mut shrinks = Vec::new();

        // One element at a time, leftmost first
        for (index, element) in value.data.iter().enumerate() {
            for candidate in self.elements.shrink(element) {
                let mut shrunk = value.clone();
                shrunk.data[index] = candidate;
                shrinks.push(shrunk);
            }
        }

        Box::new(shrinks.into_iter())
    }

    fn has_reusable_values(&self) -> bool {
        self.elements.has_reusable_values()
    }
}

/// Arrays of `dtype` and `shape` with elements drawn from `elements`
pub fn arrays<S>(dtype: impl AsDtype, shape: &[usize], elements: S) -> Result<ArrayStrategy<S>, DtypeError>
where
    S: Strategy<Value = Value>,
{
    ArrayStrategy::new(dtype, shape, elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::Constraints;
    use crate::from_dtype::from_dtype;
    use crate::rng::create_seeded_rng;
    use crate::shrink::ShrinkEngine;

    #[test]
    fn test_generates_shape_product_elements() {
        let elements = from_dtype(Dtype::Int8, Constraints::new().min_value(-1).max_value(1)).unwrap();
        let strategy = arrays(Dtype::Int8, &[2, 5], elements).unwrap();
        let mut rng = create_seeded_rng(6);
        let array = strategy.generate(&mut rng, &GeneratorConfig::default()).unwrap();
        assert_eq!(array.shape, vec![2, 5]);
        assert_eq!(array.size(), 10);
        assert!(array.iter().all(|v| (-1..=1).contains(&v.as_int().unwrap())));
    }

    #[test]
    fn test_empty_and_scalar_shapes() {
        let elements = from_dtype(Dtype::Float32, Constraints::new()).unwrap();
        let mut rng = create_seeded_rng(6);
        let config = GeneratorConfig::default();

        let empty = arrays("float32", &[3, 0], elements.clone()).unwrap();
        assert_eq!(empty.generate(&mut rng, &config).unwrap().size(), 0);

        let scalar = arrays("float32", &[], elements).unwrap();
        assert_eq!(scalar.generate(&mut rng, &config).unwrap().size(), 1);
    }

    #[test]
    fn test_rejects_unknown_dtype_and_huge_shape() {
        let elements = from_dtype(Dtype::UInt8, Constraints::new()).unwrap();
        assert!(arrays("bfloat16", &[1], elements.clone()).is_err());
        let err = arrays(Dtype::UInt8, &[usize::MAX, 2], elements).unwrap_err();
        assert_eq!(err.field(), Some("shape"));
    }

    #[test]
    fn test_shrinks_element_wise() {
        let elements = from_dtype(Dtype::UInt16, Constraints::new()).unwrap();
        let strategy = arrays(Dtype::UInt16, &[3], elements).unwrap();
        let array = Array {
            dtype: Dtype::UInt16,
            shape: vec![3],
            data: vec![Value::Int(40), Value::Int(0), Value::Int(7)],
        };
        let result = ShrinkEngine::new().shrink(&strategy, array, |a| {
            a.iter().any(|v| v.as_int().unwrap_or(0) >= 5)
        });
        assert_eq!(
            result.minimal.data,
            vec![Value::Int(0), Value::Int(0), Value::Int(5)]
        );
    }
}
