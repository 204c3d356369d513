use thiserror::Error;

use crate::kind::TypeKind;

/// Core error type shared across specimen crates.
///
/// Every variant is a deterministic property of the input schema, so none of
/// them is worth retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// No handler exists for a kind or kind pair.
    #[error("unsupported combination: {left} with {right}")]
    UnsupportedCombination { left: TypeKind, right: TypeKind },
    /// The schema describes no values at all.
    #[error("impossible type: {0}")]
    ImpossibleType(String),
    /// Folded checks leave an empty range.
    #[error("infeasible constraint: {0}")]
    InfeasibleConstraint(String),
    /// The schema graph breaks an assumption the engine relies on.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn impossible(message: impl Into<String>) -> Self {
        Error::ImpossibleType(message.into())
    }

    pub fn infeasible(message: impl Into<String>) -> Self {
        Error::InfeasibleConstraint(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}

/// Convenience alias for results returned by specimen crates.
pub type Result<T> = std::result::Result<T, Error>;
