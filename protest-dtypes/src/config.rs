//! Configuration types for bounding generation and search work.

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Invalid filter attempt budget (must be > 0)
    InvalidFilterAttempts(usize),
    /// Invalid resample attempt budget (must be > 0)
    InvalidResampleAttempts(usize),
    /// Invalid number of examples to search (must be > 0)
    InvalidMaxExamples(usize),
    /// Invalid number of shrink iterations (must be > 0)
    InvalidShrinkIterations(usize),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidFilterAttempts(n) => {
                write!(f, "Invalid filter attempts: {} (must be > 0)", n)
            }
            ConfigError::InvalidResampleAttempts(n) => {
                write!(f, "Invalid resample attempts: {} (must be > 0)", n)
            }
            ConfigError::InvalidMaxExamples(n) => {
                write!(f, "Invalid max examples: {} (must be > 0)", n)
            }
            ConfigError::InvalidShrinkIterations(n) => {
                write!(f, "Invalid shrink iterations count: {} (must be > 0)", n)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for a single generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Rejection sampling budget for `Strategy::filter`
    pub max_filter_attempts: usize,
    /// How many lane draws a strategy may discard before falling back to a bound
    pub max_resample_attempts: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_filter_attempts: 1000,
            max_resample_attempts: 100,
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator configuration with validation
    pub fn new(max_filter_attempts: usize, max_resample_attempts: usize) -> Result<Self, ConfigError> {
        let config = Self {
            max_filter_attempts,
            max_resample_attempts,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the generator configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_filter_attempts == 0 {
            return Err(ConfigError::InvalidFilterAttempts(self.max_filter_attempts));
        }
        if self.max_resample_attempts == 0 {
            return Err(ConfigError::InvalidResampleAttempts(
                self.max_resample_attempts,
            ));
        }
        Ok(())
    }
}

/// Configuration for searching example streams and shrinking
#[derive(Debug, Clone, PartialEq)]
pub struct TestConfig {
    /// Number of examples drawn before a search gives up
    pub max_examples: usize,
    /// Maximum number of accepted shrink steps
    pub max_shrink_iterations: usize,
    /// Optional seed for reproducible searches
    pub seed: Option<u64>,
    /// Configuration handed to every generation call
    pub generator_config: GeneratorConfig,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            max_examples: 1000,
            max_shrink_iterations: 1000,
            seed: None,
            generator_config: GeneratorConfig::default(),
        }
    }
}

impl TestConfig {
    /// Create a new test configuration with validation
    pub fn new(
        max_examples: usize,
        max_shrink_iterations: usize,
        seed: Option<u64>,
        generator_config: GeneratorConfig,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            max_examples,
            max_shrink_iterations,
            seed,
            generator_config,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration pinned to a seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Override the number of examples to search
    pub fn max_examples(mut self, max_examples: usize) -> Self {
        self.max_examples = max_examples;
        self
    }

    /// Validate the test configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_examples == 0 {
            return Err(ConfigError::InvalidMaxExamples(self.max_examples));
        }
        if self.max_shrink_iterations == 0 {
            return Err(ConfigError::InvalidShrinkIterations(
                self.max_shrink_iterations,
            ));
        }
        self.generator_config.validate()
    }
}
