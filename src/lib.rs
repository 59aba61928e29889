//! # ANOVA
//!
//! Balanced multi-factor analysis of variance for fixed, random, nested and
//! repeated-measures designs.
//!
//! ## Overview
//!
//! The library partitions the variability of a balanced N-dimensional
//! dataset into sums of squares for every main effect, interaction and nested
//! effect, chooses the correct error term for each F-test from the expected
//! mean squares of the design, and reports:
//! - Sums of squares, degrees of freedom and mean squares
//! - F statistics and p-values
//! - Generalized ω² effect sizes
//! - Planned contrasts between factor levels
//! - Levene's test for homogeneity of variance
//!
//! ## Quick Start
//!
//! ```rust
//! use anova::{AnovaBuilder, FactorType};
//! use ndarray::{Array, IxDyn};
//!
//! // 4 replicates × 3 levels
//! let values = vec![
//!     1.0, 3.0, 4.5,
//!     3.0, 3.5, 6.0,
//!     2.0, 4.5, 6.0,
//!     2.0, 5.0, 7.5,
//! ];
//! let data = Array::from_shape_vec(IxDyn(&[4, 3]), values).unwrap();
//!
//! let result = AnovaBuilder::new().analyze(data).unwrap();
//! let a = result.result("A").unwrap();
//! assert_eq!(a.df, 2);
//! assert!((a.f - 16.0).abs() < 1e-10);
//! ```
//!
//! ## Data layout
//!
//! Axis 0 holds replicates (when present); the remaining axes are factors,
//! least significant first. Nested factors come first, each nested within all
//! factors after it. A subject/block factor splits the fixed factors into
//! within-subject (before it) and among-subject (after it) groups.
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of result structures
//! - `parallel`: Compute factor-subset sums of squares in parallel using rayon
//! - `python`: Enable Python bindings via PyO3

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod builder;
pub mod config;
pub mod contrast;
mod engine;
pub mod error;
pub mod factor;
pub mod input;
pub mod levene;
#[cfg(feature = "python")]
pub mod python;
pub mod stats;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::AnovaBuilder;
    pub use crate::config::{AnovaConfig, LeveneCenter};
    pub use crate::contrast::{
        contrast, difference_contrasts, repeated_contrasts, simple_contrasts, ContrastWeights,
    };
    pub use crate::engine::anova;
    pub use crate::error::{Error, Result};
    pub use crate::factor::{DesignShape, Factor, FactorModel, FactorSet, FactorType, SubjectRole};
    pub use crate::input::{Column, Observations, Table};
    pub use crate::levene::{levene, levene_with};
    pub use crate::types::{
        Advisory, AnovaData, AnovaEffect, AnovaFactor, AnovaResult, AnovaValue, ContrastResult,
        Denominator, DenominatorTerm,
    };
}

// Re-export commonly used items at crate root
pub use builder::AnovaBuilder;
pub use config::{AnovaConfig, LeveneCenter};
pub use contrast::{contrast, difference_contrasts, repeated_contrasts, simple_contrasts, ContrastWeights};
pub use engine::anova;
pub use error::{Error, Result};
pub use factor::{DesignShape, FactorSet, FactorType};
pub use input::{Column, Observations, Table};
pub use levene::{levene, levene_with};
pub use types::{AnovaData, AnovaEffect, AnovaResult, ContrastResult};
