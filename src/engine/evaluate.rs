//! F-tests and generalized ω² effect sizes.
//!
//! # Effect size
//!
//! Each effect's variance component is estimated from its mean square and
//! denominator:
//!
//! σ̂²_E = w_E · (MS_E − MS_den), w_E = (Π_{subscripts} lᵢ / N) · Π_{fixed live} (lᵢ − 1) / lᵢ
//!
//! Generalized ω² (Olejnik & Algina, 2003) divides by the error variance
//! plus the components of every effect involving a measured (random) factor:
//!
//! ω²_E = σ̂²_E / (σ̂²_E + Σ_{measured F} σ̂²_F + MS_error)
//!
//! where σ̂²_E appears in the denominator only when E is not itself measured.

use tracing::warn;

use super::decompose::Decomposition;
use super::dof;
use super::ems::DenominatorChoice;
use super::terms::{Term, TermTable};
use crate::error::{Error, Result};
use crate::factor::{DesignShape, FactorModel, FactorType};
use crate::stats::{f_distribution_p_value, satterthwaite_df};
use crate::types::{
    Advisory, AnovaData, AnovaEffect, AnovaFactor, AnovaResult, AnovaValue, Denominator,
    DenominatorTerm,
};

/// Name of the error row.
pub(crate) const ERROR_NAME: &str = "Error";
/// Name of the total row.
pub(crate) const TOTAL_NAME: &str = "Total";

/// Compute F-tests for every effect and assemble the result table.
pub(crate) fn evaluate(
    model: &FactorModel,
    decomposition: &Decomposition,
    table: &TermTable,
    choices: &[DenominatorChoice],
    effect_sizes: bool,
) -> Result<AnovaData> {
    let sources: Vec<&Term> = table.effects.iter().chain([&table.error]).collect();
    let names: Vec<String> = table
        .effects
        .iter()
        .map(|t| t.name(model))
        .chain([ERROR_NAME.to_string()])
        .collect();
    let error_ms = table.error.ms();

    let mut results = Vec::with_capacity(table.effects.len());
    for (i, (effect, choice)) in table.effects.iter().zip(choices).enumerate() {
        let denominator = build_denominator(*choice, &names, &sources);
        if !(denominator.ms > 0.0 && denominator.ms.is_finite()) {
            let mut message = format!(
                "denominator {} has mean square {}",
                denominator.name(),
                denominator.ms
            );
            if denominator.approximate {
                message.push_str(
                    "; the quasi-F′ ratio (MS + MS₃) / (MS₁ + MS₂) is not computed for such designs",
                );
            }
            return Err(Error::numeric_degeneracy(&names[i], message));
        }

        let ms = effect.ms();
        let f = ms / denominator.ms;
        let p = f_distribution_p_value(f, effect.df as f64, denominator.df);

        let mut advisories = Vec::new();
        if denominator.approximate {
            advisories.push(Advisory::ApproximateDenominator);
        }

        results.push(AnovaResult {
            name: names[i].clone(),
            factors: effect.live,
            nested_within: effect.nesting,
            ss: effect.ss,
            df: effect.df,
            ms,
            f,
            p,
            omega_squared: None,
            denominator,
            advisories,
        });
    }

    if effect_sizes {
        apply_effect_sizes(model, table, &mut results, error_ms);
    }

    let mut effects: Vec<AnovaEffect> = results.into_iter().map(AnovaEffect::Result).collect();
    effects.push(AnovaEffect::Factor(AnovaFactor {
        name: ERROR_NAME.to_string(),
        ss: table.error.ss,
        df: table.error.df,
        ms: error_ms,
    }));
    effects.push(AnovaEffect::Value(AnovaValue {
        name: TOTAL_NAME.to_string(),
        ss: decomposition.total_ss,
        df: dof::total_df(model),
    }));

    let total = model.total_observations();
    Ok(AnovaData {
        effects,
        factors: model.factors().to_vec(),
        shape: model.shape(),
        grand_mean: decomposition.grand_mean,
        level_means: decomposition.level_means.clone(),
        observations_per_level: model.factors().iter().map(|f| total / f.levels).collect(),
    })
}

fn build_denominator(choice: DenominatorChoice, names: &[String], sources: &[&Term]) -> Denominator {
    let term = |index: usize, coefficient: f64| DenominatorTerm {
        name: names[index].clone(),
        coefficient,
        ms: sources[index].ms(),
        df: sources[index].df,
    };
    match choice {
        DenominatorChoice::Single(d) => {
            let only = term(d, 1.0);
            Denominator {
                ms: only.ms,
                df: only.df as f64,
                terms: vec![only],
                approximate: false,
            }
        }
        DenominatorChoice::Combination { plus, minus } => {
            let terms = vec![term(plus[0], 1.0), term(plus[1], 1.0), term(minus, -1.0)];
            let parts: Vec<(f64, f64, f64)> = terms
                .iter()
                .map(|t| (t.coefficient, t.ms, t.df as f64))
                .collect();
            Denominator {
                ms: parts.iter().map(|(c, ms, _)| c * ms).sum(),
                df: satterthwaite_df(&parts),
                terms,
                approximate: true,
            }
        }
    }
}

/// Variance-component weight of an effect.
fn component_weight(model: &FactorModel, effect: &Term) -> f64 {
    let fixed_ratio: f64 = effect
        .live
        .iter()
        .map(|p| &model.factors()[p])
        .filter(|f| f.factor_type == FactorType::Fixed)
        .map(|f| (f.levels - 1) as f64 / f.levels as f64)
        .product();
    model.level_product(effect.subscripts()) as f64 / model.total_observations() as f64
        * fixed_ratio
}

/// Whether ω² for this design rests on inferred variance-component rules.
fn inferred_effect_sizes(model: &FactorModel) -> bool {
    let crossed: Vec<FactorType> = model
        .factors()
        .iter()
        .map(|f| f.factor_type)
        .filter(|t| t.is_crossed())
        .collect();
    model.shape() == DesignShape::Nested
        || (crossed.len() == 3 && crossed.contains(&FactorType::Random))
}

fn apply_effect_sizes(model: &FactorModel, table: &TermTable, results: &mut [AnovaResult], error_ms: f64) {
    let random = model.random_factors();
    let components: Vec<f64> = table
        .effects
        .iter()
        .zip(results.iter())
        .map(|(effect, result)| component_weight(model, effect) * (result.ms - result.denominator.ms))
        .collect();
    let measured: Vec<bool> = table
        .effects
        .iter()
        .map(|t| !t.subscripts().intersection(random).is_empty())
        .collect();
    let measured_sum: f64 = components
        .iter()
        .zip(&measured)
        .filter(|(_, &m)| m)
        .map(|(c, _)| c.max(0.0))
        .sum();
    let inferred = inferred_effect_sizes(model);

    for (i, result) in results.iter_mut().enumerate() {
        let own = if measured[i] { 0.0 } else { components[i].max(0.0) };
        let total = own + measured_sum + error_ms;
        if total <= 0.0 {
            continue;
        }
        let raw = components[i] / total;
        if raw < 0.0 {
            warn!(effect = %result.name, raw, "negative variance component, ω² reported as 0");
            result.omega_squared = Some(0.0);
            result
                .advisories
                .push(Advisory::NegativeVarianceComponent { raw });
        } else {
            result.omega_squared = Some(raw);
        }
        if inferred {
            result.advisories.push(Advisory::InferredEffectSize);
        }
    }
}
