//! Seeded fixture generation.
//!
//! The free functions work on a thread-local [`Fixtures`] handle, so each
//! thread owns its own random stream and plugins.

use std::cell::RefCell;

use specimen_core::{Schema, Value};

use crate::engine::GenerationEngine;
use crate::errors::GenerationError;
use crate::generators::CustomGenerator;
use crate::model::GenerateOptions;
use crate::rng::RandomSource;

/// An engine paired with the random source it draws from.
#[derive(Debug, Default)]
pub struct Fixtures {
    engine: GenerationEngine,
    source: RandomSource,
}

impl Fixtures {
    pub fn new(options: GenerateOptions, seed: Option<u64>) -> Self {
        Self {
            engine: GenerationEngine::new(options),
            source: RandomSource::new(seed),
        }
    }

    pub fn engine(&self) -> &GenerationEngine {
        &self.engine
    }

    pub fn configure(&mut self, options: GenerateOptions) {
        self.engine.set_options(options);
    }

    pub fn register_plugin(&mut self, schema: &Schema, plugin: impl CustomGenerator + 'static) {
        self.engine.register_plugin(schema, plugin);
    }

    pub fn seed(&mut self, seed: Option<u64>) {
        self.source.seed(seed);
    }

    pub fn reset(&mut self) {
        self.source.reset();
    }

    pub fn generate(&mut self, schema: &Schema) -> Result<Value, GenerationError> {
        self.engine.generate(schema, self.source.rng())
    }

    pub fn generate_intersection(
        &mut self,
        left: &Schema,
        right: &Schema,
    ) -> Result<Value, GenerationError> {
        self.engine.generate_intersection(left, right, self.source.rng())
    }
}

thread_local! {
    static FIXTURES: RefCell<Fixtures> = RefCell::new(Fixtures::default());
}

/// Pins the thread's seed (or unpins it with `None`) and restarts its stream.
pub fn seed(seed: Option<u64>) {
    FIXTURES.with_borrow_mut(|fixtures| fixtures.seed(seed));
}

/// Restarts the thread's stream. With a pinned seed the next call repeats
/// the first call made after seeding.
pub fn reset() {
    FIXTURES.with_borrow_mut(Fixtures::reset);
}

pub fn configure(options: GenerateOptions) {
    FIXTURES.with_borrow_mut(|fixtures| fixtures.configure(options));
}

/// Registers a plugin on the thread's engine. Plugins must not call back
/// into these free functions; they receive the engine and stream instead.
pub fn register_plugin(schema: &Schema, plugin: impl CustomGenerator + 'static) {
    FIXTURES.with_borrow_mut(|fixtures| fixtures.register_plugin(schema, plugin));
}

pub fn generate(schema: &Schema) -> Result<Value, GenerationError> {
    FIXTURES.with_borrow_mut(|fixtures| fixtures.generate(schema))
}

pub fn generate_intersection(left: &Schema, right: &Schema) -> Result<Value, GenerationError> {
    FIXTURES.with_borrow_mut(|fixtures| fixtures.generate_intersection(left, right))
}
