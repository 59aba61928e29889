//! Error types for the anova library.
//!
//! Every failure is detected eagerly, either while the factor model is built
//! or immediately before the computation step it would break, and carries the
//! effect or denominator that triggered it.

use thiserror::Error;

/// The main error type for the anova library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ============ Design Errors ============
    /// The factor declaration is invalid: ordering, too many random crossed
    /// factors, malformed nesting, bad names or unusable input columns.
    #[error("invalid design configuration: {message}")]
    Configuration {
        /// Description of what is invalid.
        message: String,
    },

    /// The observations are not balanced across cells.
    #[error("unbalanced design: {message}")]
    Imbalance {
        /// Description of the offending cell counts.
        message: String,
    },

    /// The analysis needs replication and the data has none.
    #[error("insufficient replicates: {message}")]
    InsufficientReplicates {
        /// Description of why replicates are required.
        message: String,
    },

    // ============ Numeric Errors ============
    /// An F-ratio is undefined, or no mean-square combination matches an
    /// expected mean square.
    #[error("numeric degeneracy for effect {effect}: {message}")]
    NumericDegeneracy {
        /// Name of the effect being tested.
        effect: String,
        /// Description of the degenerate denominator.
        message: String,
    },
}

/// A specialized `Result` type for anova operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new `Imbalance` error.
    #[must_use]
    pub fn imbalance(message: impl Into<String>) -> Self {
        Self::Imbalance {
            message: message.into(),
        }
    }

    /// Create a new `InsufficientReplicates` error.
    #[must_use]
    pub fn insufficient_replicates(message: impl Into<String>) -> Self {
        Self::InsufficientReplicates {
            message: message.into(),
        }
    }

    /// Create a new `NumericDegeneracy` error for the named effect.
    #[must_use]
    pub fn numeric_degeneracy(effect: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NumericDegeneracy {
            effect: effect.into(),
            message: message.into(),
        }
    }
}
