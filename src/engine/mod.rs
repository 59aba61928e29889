//! ANOVA pipeline.
//!
//! Observations pass through:
//! 1. [`FactorModel`] validation
//! 2. Sum-of-squares decomposition
//! 3. Effect table assembly (pooling, nesting, residual error)
//! 4. Expected mean squares and denominator selection
//! 5. F-tests, p-values and ω²

mod decompose;
mod dof;
mod ems;
mod evaluate;
mod terms;

use tracing::{debug, debug_span};

use crate::config::AnovaConfig;
use crate::error::Result;
use crate::factor::FactorModel;
use crate::input::Observations;
use crate::types::AnovaData;

/// Run a balanced multi-factor ANOVA.
///
/// Factor names come from `config`, then from the input (table column
/// names), then default to `A`, `B`, … by position.
///
/// # Errors
///
/// Returns [`crate::Error::Configuration`] for an invalid factor model and
/// [`crate::Error::NumericDegeneracy`] when an F-ratio has no usable
/// denominator. This includes a Satterthwaite combination
/// MS₁ + MS₂ − MS₃ that comes out non-positive, which fails the whole table.
/// The quasi-F′ form (MS + MS₃) / (MS₁ + MS₂), which avoids the subtraction,
/// is not computed.
///
/// # Example
///
/// ```
/// use anova::{anova, AnovaConfig, Observations};
/// use ndarray::{Array, IxDyn};
///
/// // 3 replicates × 2 levels
/// let data = Array::from_shape_vec(IxDyn(&[3, 2]), vec![1.0, 4.0, 2.0, 5.0, 3.0, 7.0]).unwrap();
/// let observations = Observations::from_array(data, true).unwrap();
/// let result = anova(&observations, &AnovaConfig::default()).unwrap();
/// assert_eq!(result.result("A").unwrap().df, 1);
/// ```
pub fn anova(observations: &Observations, config: &AnovaConfig) -> Result<AnovaData> {
    let names = if config.factor_names.is_empty() {
        observations.factor_names()
    } else {
        config.factor_names.as_slice()
    };
    let model = FactorModel::new(
        &observations.factor_levels(),
        &config.factor_types,
        names,
        observations.replicates(),
    )?;
    analyze_model(observations, &model, config.compute_effect_sizes)
}

/// Run the pipeline on an already validated model.
pub(crate) fn analyze_model(
    observations: &Observations,
    model: &FactorModel,
    effect_sizes: bool,
) -> Result<AnovaData> {
    let _span = debug_span!(
        "anova",
        factors = model.len(),
        replicates = model.replicates(),
        shape = ?model.shape()
    )
    .entered();

    let decomposition = decompose::decompose(observations, model)?;
    let table = terms::build(model, &decomposition)?;
    debug!(
        effects = table.effects.len(),
        residual_error = table.residual,
        "assembled effect table"
    );
    let choices = ems::denominators(model, &table)?;
    evaluate::evaluate(model, &decomposition, &table, &choices, effect_sizes)
}
