//! Lazy example streams and witness search.

use rand::rngs::StdRng;

use crate::config::{GeneratorConfig, TestConfig};
use crate::error::DtypeError;
use crate::rng::{create_seeded_rng, fresh_seed};
use crate::strategy::Strategy;

/// An endless, replayable stream of values drawn from a strategy
///
/// Every stream has a seed. Streams created without one draw a fresh seed,
/// which [`Examples::seed`] reports so a failing run can be replayed.
pub struct Examples<'a, S> {
    strategy: &'a S,
    config: GeneratorConfig,
    seed: u64,
    rng: StdRng,
}

impl<S: Strategy> Examples<'_, S> {
    /// The seed this stream replays from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewind the stream to its first value
    pub fn restart(&mut self) {
        self.rng = create_seeded_rng(self.seed);
    }
}

impl<S: Strategy> Iterator for Examples<'_, S> {
    type Item = Result<S::Value, DtypeError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.strategy.generate(&mut self.rng, &self.config))
    }
}

/// Stream values from `strategy`, seeded for reproducibility when `seed` is given
pub fn examples<'a, S: Strategy>(
    strategy: &'a S,
    seed: Option<u64>,
    config: &GeneratorConfig,
) -> Examples<'a, S> {
    let seed = seed.unwrap_or_else(fresh_seed);
    Examples {
        strategy,
        config: config.clone(),
        seed,
        rng: create_seeded_rng(seed),
    }
}

/// First drawn value satisfying `condition`
///
/// Draws at most `config.max_examples` values. Generation errors stop the
/// search and are returned as-is.
pub fn find_any<S, F>(strategy: &S, condition: F, config: &TestConfig) -> Result<S::Value, DtypeError>
where
    S: Strategy,
    F: Fn(&S::Value) -> bool,
{
    config.validate()?;
    let stream = examples(strategy, config.seed, &config.generator_config);
    for example in stream.take(config.max_examples) {
        let example = example?;
        if condition(&example) {
            return Ok(example);
        }
    }
    tracing::debug!(
        examples = config.max_examples,
        "no example satisfied the condition"
    );
    Err(DtypeError::NoFailureFound {
        examples: config.max_examples,
    })
}

/// Whether any of the first `config.max_examples` values satisfies `condition`
pub fn has_example<S, F>(strategy: &S, condition: F, config: &TestConfig) -> Result<bool, DtypeError>
where
    S: Strategy,
    F: Fn(&S::Value) -> bool,
{
    match find_any(strategy, condition, config) {
        Ok(_) => Ok(true),
        Err(DtypeError::NoFailureFound { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}
