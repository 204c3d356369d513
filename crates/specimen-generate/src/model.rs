use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;

/// Options for the generation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Composite depth past which collections shrink to their minimum size and
    /// optional parts are left out.
    pub max_depth: usize,
    /// Maximum candidates drawn by any bounded sampling loop.
    pub max_attempts: u32,
    /// Upper length for strings without a max length.
    pub default_string_max: usize,
    /// Upper size for collections without a max size.
    pub default_collection_max: usize,
    /// Maximum undeclared keys added to passthrough and catch-all objects.
    pub max_extra_keys: usize,
    /// Distance an unbounded numeric side extends from the other side.
    pub numeric_span: f64,
    /// Run transform effects on generated values.
    pub apply_transforms: bool,
    /// Delay before generated promises settle.
    pub promise_delay_ms: Option<u64>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_attempts: 50,
            default_string_max: 32,
            default_collection_max: 5,
            max_extra_keys: 3,
            numeric_span: 10_000.0,
            apply_transforms: false,
            promise_delay_ms: None,
        }
    }
}

impl GenerateOptions {
    /// Parses options from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, GenerationError> {
        Ok(toml::from_str(source)?)
    }

    pub fn promise_delay(&self) -> Option<Duration> {
        self.promise_delay_ms.map(Duration::from_millis)
    }
}
