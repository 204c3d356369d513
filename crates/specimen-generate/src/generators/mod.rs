//! Leaf generators and the custom generator seam.

pub(crate) mod collections;
pub(crate) mod formats;
pub(crate) mod primitives;

use std::collections::HashMap;
use std::fmt;

use rand::RngCore;
use specimen_core::{Schema, SchemaId, Value};

use crate::engine::{GenerationContext, GenerationEngine};
use crate::errors::GenerationError;

/// Caller-supplied generator that takes over one schema node.
///
/// It receives the engine so it can delegate parts of the value back to the
/// built-in generators.
pub trait CustomGenerator: Send + Sync {
    fn generate(
        &self,
        schema: &Schema,
        ctx: GenerationContext,
        engine: &GenerationEngine,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError>;
}

impl<F> CustomGenerator for F
where
    F: Fn(&Schema, GenerationContext, &GenerationEngine, &mut dyn RngCore) -> Result<Value, GenerationError>
        + Send
        + Sync,
{
    fn generate(
        &self,
        schema: &Schema,
        ctx: GenerationContext,
        engine: &GenerationEngine,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerationError> {
        self(schema, ctx, engine, rng)
    }
}

struct Registration {
    // Held so the node, and with it its identity, outlives the registration.
    _schema: Schema,
    plugin: Box<dyn CustomGenerator>,
}

/// Custom generators keyed by node identity.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<SchemaId, Registration>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes generation for exactly this node to `plugin`, replacing any
    /// earlier registration for it.
    pub fn register(&mut self, schema: &Schema, plugin: impl CustomGenerator + 'static) {
        self.plugins.insert(
            schema.id(),
            Registration {
                _schema: schema.clone(),
                plugin: Box::new(plugin),
            },
        );
    }

    pub fn unregister(&mut self, schema: &Schema) -> bool {
        self.plugins.remove(&schema.id()).is_some()
    }

    pub fn get(&self, schema: &Schema) -> Option<&dyn CustomGenerator> {
        self.plugins
            .get(&schema.id())
            .map(|registration| registration.plugin.as_ref())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.len())
            .finish()
    }
}
