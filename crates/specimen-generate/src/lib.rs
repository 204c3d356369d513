//! Constraint-aware random values for structural schemas.
//!
//! [`GenerationEngine`] walks a schema graph and draws a value the schema
//! accepts; [`Fixtures`] and the free functions pair it with a seedable
//! random stream.

pub mod api;
pub mod engine;
pub mod errors;
pub mod generators;
pub mod model;
pub mod rng;

pub use api::{Fixtures, configure, generate, generate_intersection, register_plugin, reset, seed};
pub use engine::{GenerationContext, GenerationEngine};
pub use errors::GenerationError;
pub use generators::{CustomGenerator, PluginRegistry};
pub use model::GenerateOptions;
pub use rng::RandomSource;
