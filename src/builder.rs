//! Builder for running an analysis from any input form.
//!
//! # Example
//!
//! ```
//! use anova::{AnovaBuilder, FactorType};
//! use ndarray::{Array, IxDyn};
//!
//! // 2 replicates × 2 levels of A × 3 levels of B
//! let values: Vec<f64> = (0..12).map(|i| f64::from(i % 5) + f64::from(i % 3)).collect();
//! let data = Array::from_shape_vec(IxDyn(&[2, 2, 3]), values).unwrap();
//!
//! let result = AnovaBuilder::new()
//!     .factor_types(vec![FactorType::Fixed, FactorType::Random])
//!     .factor_names(vec!["Dose".into(), "Site".into()])
//!     .analyze(data)
//!     .unwrap();
//!
//! assert_eq!(result.result("Dose").unwrap().denominator.name(), "Dose × Site");
//! ```

use ndarray::ArrayD;

use crate::config::AnovaConfig;
use crate::engine::anova;
use crate::error::Result;
use crate::factor::FactorType;
use crate::input::{Observations, Table};
use crate::types::AnovaData;

/// Builder for configuring and running an ANOVA.
#[derive(Debug, Clone)]
pub struct AnovaBuilder {
    config: AnovaConfig,
    has_replicates: bool,
}

impl Default for AnovaBuilder {
    fn default() -> Self {
        Self {
            config: AnovaConfig::default(),
            has_replicates: true,
        }
    }
}

impl AnovaBuilder {
    /// Create a new builder: all factors fixed, replicates along axis 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the factor types by position.
    #[must_use]
    pub fn factor_types(mut self, types: Vec<FactorType>) -> Self {
        self.config.factor_types = types;
        self
    }

    /// Set the factor names by position.
    #[must_use]
    pub fn factor_names(mut self, names: Vec<String>) -> Self {
        self.config.factor_names = names;
        self
    }

    /// Whether axis 0 of an array input holds replicates (default true).
    #[must_use]
    pub fn has_replicates(mut self, has_replicates: bool) -> Self {
        self.has_replicates = has_replicates;
        self
    }

    /// Enable or disable ω² estimation (default enabled).
    #[must_use]
    pub fn effect_sizes(mut self, enabled: bool) -> Self {
        self.config.compute_effect_sizes = enabled;
        self
    }

    /// The configuration built so far.
    #[must_use]
    pub fn config(&self) -> &AnovaConfig {
        &self.config
    }

    /// Analyze an N-dimensional observation array.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid input or an invalid factor model.
    pub fn analyze(&self, data: ArrayD<f64>) -> Result<AnovaData> {
        let observations = Observations::from_array(data, self.has_replicates)?;
        anova(&observations, &self.config)
    }

    /// Analyze an array whose cells hold replicate vectors.
    ///
    /// # Errors
    ///
    /// Returns an error for unbalanced cells or an invalid factor model.
    pub fn analyze_cells(&self, cells: &ArrayD<Vec<f64>>) -> Result<AnovaData> {
        anova(&Observations::from_cells(cells)?, &self.config)
    }

    /// Analyze a flat vector with one level assignment vector per factor.
    ///
    /// # Errors
    ///
    /// Returns an error for unbalanced assignments or an invalid factor model.
    pub fn analyze_assigned<L: Ord + Clone>(&self, values: &[f64], assignments: &[Vec<L>]) -> Result<AnovaData> {
        anova(&Observations::from_assignments(values, assignments)?, &self.config)
    }

    /// Analyze the response and factor columns of a table.
    ///
    /// # Errors
    ///
    /// Returns an error for missing columns, unbalanced cells or an invalid
    /// factor model.
    pub fn analyze_table(&self, table: &Table, response: &str, factors: &[&str]) -> Result<AnovaData> {
        anova(&Observations::from_table(table, response, factors)?, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::input::Column;
    use ndarray::{Array, IxDyn};

    #[test]
    fn test_builder_defaults() {
        let builder = AnovaBuilder::new();
        assert!(builder.config().factor_types.is_empty());
        assert!(builder.config().compute_effect_sizes);
    }

    #[test]
    fn test_builder_unreplicated_array() {
        let data = Array::from_shape_vec(IxDyn(&[2, 3]), vec![1.0, 4.0, 2.0, 3.0, 7.0, 5.0]).unwrap();
        let result = AnovaBuilder::new().has_replicates(false).analyze(data).unwrap();
        assert_eq!(result.error().unwrap().df, 2);
        assert_eq!(result.results().count(), 2);
    }

    #[test]
    fn test_builder_forms_agree() {
        let cells = Array::from_shape_vec(
            IxDyn(&[3]),
            vec![vec![1.0, 2.0, 4.0], vec![3.0, 5.0, 4.0], vec![7.0, 6.0, 9.0]],
        )
        .unwrap();
        let builder = AnovaBuilder::new().effect_sizes(false);
        let from_cells = builder.analyze_cells(&cells).unwrap();

        let values = [1.0, 2.0, 4.0, 3.0, 5.0, 4.0, 7.0, 6.0, 9.0];
        let levels = vec![vec![1, 1, 1, 2, 2, 2, 3, 3, 3]];
        let from_flat = builder.analyze_assigned(&values, &levels).unwrap();

        let table = Table::new()
            .with_column("y", Column::Float(values.to_vec()))
            .with_column("g", Column::Integer(vec![1, 1, 1, 2, 2, 2, 3, 3, 3]));
        let from_table = builder.analyze_table(&table, "y", &["g"]).unwrap();

        let f = from_cells.result("A").unwrap().f;
        assert!((from_flat.result("A").unwrap().f - f).abs() < 1e-12);
        assert!((from_table.result("g").unwrap().f - f).abs() < 1e-12);
        assert!(from_cells.result("A").unwrap().omega_squared.is_none());
    }

    #[test]
    fn test_builder_imbalance() {
        let levels = vec![vec![1, 1, 2]];
        let err = AnovaBuilder::new()
            .analyze_assigned(&[1.0, 2.0, 3.0], &levels)
            .unwrap_err();
        assert!(matches!(err, Error::Imbalance { .. }));
    }
}
