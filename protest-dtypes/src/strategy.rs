//! The strategy abstraction shared by dtype scalars and arrays.

use std::fmt::Debug;

use crate::config::GeneratorConfig;
use crate::error::DtypeError;

/// A source of values with a matching notion of "simpler"
///
/// Strategies are immutable once built and may be shared across threads;
/// randomness comes only from the RNG handed to [`Strategy::generate`].
pub trait Strategy {
    /// The type of values this strategy generates
    type Value: Clone + Debug + 'static;

    /// Draw one value
    fn generate(
        &self,
        rng: &mut dyn rand::RngCore,
        config: &GeneratorConfig,
    ) -> Result<Self::Value, DtypeError>;

    /// Candidate values simpler than `value`, all of which this strategy could produce
    fn shrink(&self, value: &Self::Value) -> Box<dyn Iterator<Item = Self::Value>>;

    /// Whether generated values are plain data that may be reused across examples
    fn has_reusable_values(&self) -> bool {
        true
    }

    /// Keep only values satisfying `predicate`
    fn filter<F>(self, predicate: F) -> Filter<Self, F>
    where
        Self: Sized,
        F: Fn(&Self::Value) -> bool,
    {
        Filter {
            strategy: self,
            predicate,
        }
    }
}

impl<S: Strategy + ?Sized> Strategy for &S {
    type Value = S::Value;

    fn generate(
        &self,
        rng: &mut dyn rand::RngCore,
        config: &GeneratorConfig,
    ) -> Result<Self::Value, DtypeError> {
        (**self).generate(rng, config)
    }

    fn shrink(&self, value: &Self::Value) -> Box<dyn Iterator<Item = Self::Value>> {
        (**self).shrink(value)
    }

    fn has_reusable_values(&self) -> bool {
        (**self).has_reusable_values()
    }
}

/// A strategy that rejects values failing a predicate
#[derive(Debug, Clone)]
pub struct Filter<S, F> {
    strategy: S,
    predicate: F,
}

impl<S, F> Strategy for Filter<S, F>
where
    S: Strategy,
    F: Fn(&S::Value) -> bool,
{
    type Value = S::Value;

    fn generate(
        &self,
        rng: &mut dyn rand::RngCore,
        config: &GeneratorConfig,
    ) -> Result<Self::Value, DtypeError> {
        let attempts = config.max_filter_attempts;
        for _ in 0..attempts {
            let value = self.strategy.generate(rng, config)?;
            if (self.predicate)(&value) {
                return Ok(value);
            }
        }
        tracing::debug!(attempts, "filter rejected every drawn value");
        Err(DtypeError::FilterExhausted { attempts })
    }

    fn shrink(&self, value: &Self::Value) -> Box<dyn Iterator<Item = Self::Value>> {
        let candidates: Vec<_> = self
            .strategy
            .shrink(value)
            .filter(|candidate| (self.predicate)(candidate))
            .collect();
        Box::new(candidates.into_iter())
    }

    fn has_reusable_values(&self) -> bool {
        self.strategy.has_reusable_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_seeded_rng;

    /// Counts up from zero in steps of one, shrinking towards zero
    struct Counter;

    impl Strategy for Counter {
        type Value = u32;

        fn generate(
            &self,
            rng: &mut dyn rand::RngCore,
            _config: &GeneratorConfig,
        ) -> Result<u32, DtypeError> {
            Ok(rng.next_u32() % 100)
        }

        fn shrink(&self, value: &u32) -> Box<dyn Iterator<Item = u32>> {
            Box::new((0..*value).collect::<Vec<_>>().into_iter())
        }
    }

    #[test]
    fn test_filter_keeps_matching_values() {
        let strategy = Counter.filter(|v| v % 2 == 0);
        let mut rng = create_seeded_rng(3);
        let config = GeneratorConfig::default();
        for _ in 0..50 {
            let value = strategy.generate(&mut rng, &config).unwrap();
            assert_eq!(value % 2, 0);
        }
    }

    #[test]
    fn test_filter_exhaustion_is_reported() {
        let strategy = Counter.filter(|v| *v > 1000);
        let mut rng = create_seeded_rng(3);
        let config = GeneratorConfig::new(25, 10).unwrap();
        assert_eq!(
            strategy.generate(&mut rng, &config),
            Err(DtypeError::FilterExhausted { attempts: 25 })
        );
    }

    #[test]
    fn test_filter_shrinks_only_to_matching_values() {
        let strategy = Counter.filter(|v| v % 3 == 0);
        let shrunk: Vec<u32> = strategy.shrink(&10).collect();
        assert_eq!(shrunk, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_references_are_strategies() {
        let strategy = Counter;
        let by_ref = &strategy;
        assert!(by_ref.has_reusable_values());
        assert_eq!(by_ref.shrink(&2).count(), 2);
    }
}
