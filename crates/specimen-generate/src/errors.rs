use thiserror::Error;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Schema(#[from] specimen_core::Error),
    #[error("refinement rejected {attempts} candidates")]
    RefinementExhausted { attempts: u32 },
    #[error("custom generator failed: {0}")]
    Plugin(String),
    #[error("invalid options: {0}")]
    Config(#[from] toml::de::Error),
}

impl GenerationError {
    /// The schema error underneath, if this failure came from the schema
    /// itself rather than from sampling or a plugin.
    pub fn as_schema_error(&self) -> Option<&specimen_core::Error> {
        match self {
            GenerationError::Schema(err) => Some(err),
            _ => None,
        }
    }
}
