#![allow(clippy::result_large_err)]

//! # Protest Dtypes - Value Strategies for Array-API Dtypes
//!
//! Strategies that generate scalar values of fixed-width numeric dtypes under
//! user constraints, and shrink failing values to minimal examples. Generated
//! values always survive a round trip through their dtype unchanged, respect
//! bounds and NaN/infinity exclusions, and never include subnormals on
//! platforms that flush them to zero.
//!
//! ## Quick Start
//!
//! ```rust
//! use protest_dtypes::{Constraints, GeneratorConfig, Strategy, Value, from_dtype, minimal};
//! use protest_dtypes::rng::create_seeded_rng;
//!
//! let strategy = from_dtype("float32", Constraints::new().min_value(1).max_value(2)).unwrap();
//! let mut rng = create_seeded_rng(42);
//! let value = strategy.generate(&mut rng, &GeneratorConfig::default()).unwrap();
//! let x = value.as_float().unwrap();
//! assert!((1.0..=2.0).contains(&x));
//!
//! // Shrink to the simplest value satisfying a condition
//! let smallest = minimal(&strategy, |v| v.to_f64() >= 1.5).unwrap();
//! assert_eq!(smallest, Value::Float(2.0));
//! ```

pub mod arrays;
pub mod config;
pub mod constraints;
pub mod dtype;
pub mod error;
pub mod explore;
mod floats;
pub mod from_dtype;
mod ints;
pub mod probe;
pub mod rng;
pub mod shrink;
pub mod strategy;
pub mod value;

// Re-export the main public API
pub use arrays::{Array, ArrayStrategy, arrays};
pub use config::{ConfigError, GeneratorConfig, TestConfig};
pub use constraints::{
    BoundSide, Constraints, OptionValue, ResolutionWarning, ResolvedConstraints, resolve,
};
pub use dtype::{
    AsDtype, DTYPE_NAMES, Dtype, DtypeCategory, DtypeDescriptor, FloatWidth, castable_builtin_for,
    descriptor_for, is_supported,
};
pub use error::DtypeError;
pub use explore::{Examples, examples, find_any, has_example};
pub use from_dtype::{DtypeStrategy, from_dtype, from_dtype_with_options};
pub use probe::{
    FixedProbe, RuntimeProbe, SubnormalProbe, WIDTH_SMALLEST_NORMALS, flushes_to_zero,
    smallest_normal,
};
pub use shrink::{ShrinkEngine, ShrinkKey, ShrinkOrder, ShrinkResult, minimal, minimal_with_config};
pub use strategy::{Filter, Strategy};
pub use value::{Builtin, Value};
