//! Analysis configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::factor::FactorType;

/// Options of one analysis.
///
/// # Example
///
/// ```
/// use anova::{AnovaConfig, FactorType};
///
/// let config = AnovaConfig::default()
///     .with_factor_types(vec![FactorType::Fixed, FactorType::Random])
///     .with_factor_names(vec!["Dose".into(), "Site".into()]);
/// assert!(config.compute_effect_sizes);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaConfig {
    /// Factor types by position; missing trailing entries default to fixed.
    pub factor_types: Vec<FactorType>,
    /// Factor names by position; empty for the input's names or `A`, `B`, ….
    pub factor_names: Vec<String>,
    /// Whether to estimate ω² for each effect.
    pub compute_effect_sizes: bool,
}

impl Default for AnovaConfig {
    fn default() -> Self {
        Self {
            factor_types: Vec::new(),
            factor_names: Vec::new(),
            compute_effect_sizes: true,
        }
    }
}

impl AnovaConfig {
    /// Set the factor types.
    #[must_use]
    pub fn with_factor_types(mut self, types: Vec<FactorType>) -> Self {
        self.factor_types = types;
        self
    }

    /// Set the factor names.
    #[must_use]
    pub fn with_factor_names(mut self, names: Vec<String>) -> Self {
        self.factor_names = names;
        self
    }

    /// Enable or disable ω² estimation.
    #[must_use]
    pub fn with_effect_sizes(mut self, enabled: bool) -> Self {
        self.compute_effect_sizes = enabled;
        self
    }
}

/// Center used by Levene's test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LeveneCenter {
    /// Deviations from the cell mean (Levene's original test).
    #[default]
    Mean,
    /// Deviations from the cell median (Brown–Forsythe variant).
    Median,
}
