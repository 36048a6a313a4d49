//! Shrinking towards minimal examples.
//!
//! Values are ordered by a [`ShrinkKey`]; the engine only ever moves to a
//! candidate with a strictly smaller key, so every run terminates and the
//! same input always reaches the same minimal value.

use std::cmp::Ordering;

use crate::config::TestConfig;
use crate::error::DtypeError;
use crate::explore::examples;
use crate::strategy::Strategy;
use crate::value::Value;

/// Total order on an `f64` magnitude
#[derive(Debug, Clone, Copy)]
pub struct Magnitude(pub f64);

impl PartialEq for Magnitude {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Magnitude {}

impl PartialOrd for Magnitude {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Magnitude {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Class of a float for ordering: finite values before infinities before NaN
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FloatClass {
    Finite,
    Infinite,
    Nan,
}

/// Simplicity key of a scalar value; smaller is simpler
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShrinkKey {
    /// Magnitude, then negative after positive
    Int { magnitude: u128, negative: bool },
    /// Class, then whole before fractional, then magnitude, then sign
    Float {
        class: FloatClass,
        fractional: bool,
        magnitude: Magnitude,
        negative: bool,
    },
}

/// Values that can be compared for simplicity
pub trait ShrinkOrder {
    type Key: Ord;

    fn shrink_key(&self) -> Self::Key;
}

impl ShrinkOrder for Value {
    type Key = ShrinkKey;

    fn shrink_key(&self) -> ShrinkKey {
        match *self {
            Value::Int(v) => ShrinkKey::Int {
                magnitude: v.unsigned_abs(),
                negative: v < 0,
            },
            Value::Float(v) => {
                let class = if v.is_nan() {
                    FloatClass::Nan
                } else if v.is_infinite() {
                    FloatClass::Infinite
                } else {
                    FloatClass::Finite
                };
                let finite = class == FloatClass::Finite;
                ShrinkKey::Float {
                    class,
                    fractional: finite && v.fract() != 0.0,
                    magnitude: Magnitude(if finite { v.abs() } else { 0.0 }),
                    negative: !v.is_nan() && v.is_sign_negative(),
                }
            }
        }
    }
}

impl<T: ShrinkOrder> ShrinkOrder for Vec<T> {
    type Key = Vec<T::Key>;

    fn shrink_key(&self) -> Vec<T::Key> {
        self.iter().map(ShrinkOrder::shrink_key).collect()
    }
}

/// Result of a shrinking run
#[derive(Debug, Clone)]
pub struct ShrinkResult<T> {
    /// Value the run started from
    pub original: T,
    /// Simplest value found that still satisfies the predicate
    pub minimal: T,
    /// Number of accepted shrink steps
    pub shrink_steps: usize,
    /// Whether the run stopped because no simpler candidate remained
    pub completed: bool,
}

impl<T> ShrinkResult<T> {
    pub fn new(original: T, minimal: T, shrink_steps: usize, completed: bool) -> Self {
        Self {
            original,
            minimal,
            shrink_steps,
            completed,
        }
    }

    /// Result for a value that was not shrunk
    pub fn no_shrinking(original: T) -> Self
    where
        T: Clone,
    {
        Self {
            minimal: original.clone(),
            original,
            shrink_steps: 0,
            completed: true,
        }
    }
}

/// Greedy shrinker driven by a strategy's candidates
#[derive(Debug, Clone)]
pub struct ShrinkEngine {
    max_iterations: usize,
}

impl Default for ShrinkEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ShrinkEngine {
    /// Create an engine allowing 1000 accepted steps
    pub fn new() -> Self {
        Self::with_max_iterations(1000)
    }

    pub fn with_max_iterations(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    /// Create an engine using the configuration's shrink budget
    pub fn from_config(config: &TestConfig) -> Self {
        Self::with_max_iterations(config.max_shrink_iterations)
    }

    /// Shrink `value` while `predicate` keeps holding
    ///
    /// Accepts the first candidate that is strictly simpler and still
    /// satisfies the predicate, then starts over from it. A value that does
    /// not satisfy the predicate is returned unchanged.
    pub fn shrink<S, F>(&self, strategy: &S, value: S::Value, predicate: F) -> ShrinkResult<S::Value>
    where
        S: Strategy,
        S::Value: ShrinkOrder,
        F: Fn(&S::Value) -> bool,
    {
        if !predicate(&value) {
            return ShrinkResult::no_shrinking(value);
        }

        let mut current = value.clone();
        let mut shrink_steps = 0;

        while shrink_steps < self.max_iterations {
            let current_key = current.shrink_key();
            let next = strategy
                .shrink(&current)
                .find(|candidate| candidate.shrink_key() < current_key && predicate(candidate));

            match next {
                Some(simpler) => {
                    shrink_steps += 1;
                    tracing::trace!(step = shrink_steps, value = ?simpler, "accepted shrink");
                    current = simpler;
                }
                None => {
                    tracing::debug!(steps = shrink_steps, minimal = ?current, "shrinking completed");
                    return ShrinkResult::new(value, current, shrink_steps, true);
                }
            }
        }

        tracing::debug!(
            steps = shrink_steps,
            minimal = ?current,
            "shrinking stopped at the iteration limit"
        );
        ShrinkResult::new(value, current, shrink_steps, false)
    }
}

/// Simplest value the strategy can produce that satisfies `condition`
///
/// Draws up to the default number of examples looking for a witness, then
/// shrinks it.
pub fn minimal<S, F>(strategy: &S, condition: F) -> Result<S::Value, DtypeError>
where
    S: Strategy,
    S::Value: ShrinkOrder,
    F: Fn(&S::Value) -> bool,
{
    minimal_with_config(strategy, condition, &TestConfig::default())
}

/// [`minimal`] with an explicit search and shrink budget
pub fn minimal_with_config<S, F>(
    strategy: &S,
    condition: F,
    config: &TestConfig,
) -> Result<S::Value, DtypeError>
where
    S: Strategy,
    S::Value: ShrinkOrder,
    F: Fn(&S::Value) -> bool,
{
    config.validate()?;

    let mut witness = None;
    for example in examples(strategy, config.seed, &config.generator_config).take(config.max_examples) {
        let example = example?;
        if condition(&example) {
            witness = Some(example);
            break;
        }
    }
    let witness = witness.ok_or(DtypeError::NoFailureFound {
        examples: config.max_examples,
    })?;

    let result = ShrinkEngine::from_config(config).shrink(strategy, witness, &condition);
    Ok(result.minimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;

    fn key(value: impl Into<Value>) -> ShrinkKey {
        value.into().shrink_key()
    }

    #[test]
    fn test_int_key_order() {
        assert!(key(0) < key(1));
        assert!(key(1) < key(-1));
        assert!(key(-1) < key(2));
        assert!(key(100) < key(-200));
    }

    #[test]
    fn test_float_key_order() {
        assert!(key(0.0) < key(-0.0));
        assert!(key(-0.0) < key(1.0));
        assert!(key(1.0) < key(-1.0));
        assert!(key(1000.0) < key(0.5));
        assert!(key(0.5) < key(0.75));
        assert!(key(f64::MAX) < key(f64::INFINITY));
        assert!(key(f64::INFINITY) < key(f64::NEG_INFINITY));
        assert!(key(f64::NEG_INFINITY) < key(f64::NAN));
        assert_eq!(key(f64::NAN), key(-f64::NAN));
    }

    #[test]
    fn test_vec_key_is_lexicographic() {
        let simple = vec![Value::Int(0), Value::Int(5)];
        let complex = vec![Value::Int(1), Value::Int(0)];
        assert!(simple.shrink_key() < complex.shrink_key());
    }

    /// Halves towards zero
    struct Halving;

    impl Strategy for Halving {
        type Value = Value;

        fn generate(
            &self,
            rng: &mut dyn rand::RngCore,
            _config: &GeneratorConfig,
        ) -> Result<Value, DtypeError> {
            Ok(Value::Int((rng.next_u32() % 1000) as i128))
        }

        fn shrink(&self, value: &Value) -> Box<dyn Iterator<Item = Value>> {
            let v = value.as_int().unwrap_or(0);
            // Also offers a larger value, which the engine must ignore
            Box::new(vec![Value::Int(v + 1), Value::Int(v / 2), Value::Int(v - 1)].into_iter())
        }
    }

    #[test]
    fn test_engine_only_accepts_simpler_values() {
        let engine = ShrinkEngine::new();
        let result = engine.shrink(&Halving, Value::Int(100), |v| v.as_int().unwrap_or(0) >= 10);
        assert_eq!(result.minimal, Value::Int(10));
        assert_eq!(result.original, Value::Int(100));
        assert!(result.completed);
        assert!(result.shrink_steps > 0);
    }

    #[test]
    fn test_engine_respects_iteration_limit() {
        let engine = ShrinkEngine::with_max_iterations(2);
        let result = engine.shrink(&Halving, Value::Int(100), |_| true);
        assert_eq!(result.minimal, Value::Int(25));
        assert_eq!(result.shrink_steps, 2);
        assert!(!result.completed);
    }

    #[test]
    fn test_engine_leaves_non_matching_value_alone() {
        let engine = ShrinkEngine::new();
        let result = engine.shrink(&Halving, Value::Int(3), |v| v.as_int() == Some(50));
        assert_eq!(result.minimal, Value::Int(3));
        assert_eq!(result.shrink_steps, 0);
    }

    #[test]
    fn test_minimal_with_custom_strategy() {
        let config = TestConfig::with_seed(8);
        let found =
            minimal_with_config(&Halving, |v| v.as_int().unwrap_or(0) >= 300, &config).unwrap();
        assert_eq!(found, Value::Int(300));
    }

    #[test]
    fn test_minimal_reports_missing_witness() {
        let config = TestConfig::with_seed(8).max_examples(20);
        assert_eq!(
            minimal_with_config(&Halving, |v| v.as_int() == Some(5000), &config),
            Err(DtypeError::NoFailureFound { examples: 20 })
        );
    }

    #[test]
    fn test_minimal_validates_config() {
        let config = TestConfig::with_seed(8).max_examples(0);
        assert!(matches!(
            minimal_with_config(&Halving, |_| true, &config),
            Err(DtypeError::Config(_))
        ));
    }
}
