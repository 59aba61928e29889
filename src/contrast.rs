//! Planned single-factor contrasts.
//!
//! A contrast compares weighted level means of one crossed factor. Its F-test
//! borrows the denominator of that factor's main effect from a completed
//! ANOVA, so a contrast in a mixed design is tested against the same error
//! term as the factor itself.
//!
//! # Generators
//! - [`simple_contrasts`]: every level against a control level
//! - [`repeated_contrasts`]: each level against the next
//! - [`difference_contrasts`]: Helmert (each level against the mean of the
//!   following levels) or, reversed, each level against the mean of the
//!   preceding levels

use tracing::debug;

use crate::error::{Error, Result};
use crate::factor::FactorSet;
use crate::stats::f_distribution_p_value;
use crate::types::{Advisory, AnovaData, ContrastResult};

const WEIGHT_TOLERANCE: f64 = 1e-10;

/// Weights of a linear contrast, one per factor level.
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastWeights {
    weights: Vec<f64>,
    label: String,
}

impl ContrastWeights {
    /// Explicit weights.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the weights are not finite, are all
    /// zero, or do not sum to zero.
    pub fn from_weights(weights: Vec<f64>) -> Result<Self> {
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::configuration("contrast weights must be finite"));
        }
        if weights.iter().all(|&w| w == 0.0) {
            return Err(Error::configuration("contrast weights must not all be zero"));
        }
        let sum: f64 = weights.iter().sum();
        let scale: f64 = weights.iter().map(|w| w.abs()).sum();
        if sum.abs() > WEIGHT_TOLERANCE * scale {
            return Err(Error::configuration(format!(
                "contrast weights must sum to zero, got {sum}"
            )));
        }
        let label = format!(
            "[{}]",
            weights
                .iter()
                .map(|w| format!("{w}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self { weights, label })
    }

    /// Compare the mean of the levels coded 1 with the mean of the levels
    /// coded 2; levels coded 0 are excluded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if a code is not 0, 1 or 2, or either
    /// group is empty.
    pub fn from_groups(groups: &[u8]) -> Result<Self> {
        if let Some(code) = groups.iter().find(|&&g| g > 2) {
            return Err(Error::configuration(format!(
                "contrast group codes must be 0, 1 or 2, got {code}"
            )));
        }
        let members = |code: u8| -> Vec<usize> {
            groups
                .iter()
                .enumerate()
                .filter(|(_, &g)| g == code)
                .map(|(level, _)| level)
                .collect()
        };
        let first = members(1);
        let second = members(2);
        if first.is_empty() || second.is_empty() {
            return Err(Error::configuration(
                "contrast groups 1 and 2 must each contain at least one level",
            ));
        }
        Ok(Self::compare(groups.len(), &first, &second))
    }

    /// Mean of `first` levels against mean of `second` levels.
    fn compare(levels: usize, first: &[usize], second: &[usize]) -> Self {
        let mut weights = vec![0.0; levels];
        for &level in first {
            weights[level] = 1.0 / first.len() as f64;
        }
        for &level in second {
            weights[level] = -1.0 / second.len() as f64;
        }
        let label = format!("{} vs {}", level_label(first), level_label(second));
        Self { weights, label }
    }

    /// Weights by level.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Description of the comparison.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// 1-based level numbers, collapsed to a range when consecutive.
fn level_label(levels: &[usize]) -> String {
    match levels {
        [only] => (only + 1).to_string(),
        [first, .., last] if last - first + 1 == levels.len() => {
            format!("{}..{}", first + 1, last + 1)
        }
        _ => levels
            .iter()
            .map(|l| (l + 1).to_string())
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Test a single contrast on the levels of the factor at `factor`.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if the factor does not exist, is not a
/// crossed fixed or random factor, or the weight count differs from its
/// level count.
///
/// # Example
///
/// ```
/// use anova::{anova, contrast, AnovaConfig, ContrastWeights, Observations};
/// use ndarray::{Array, IxDyn};
///
/// let values = vec![1.0, 3.0, 6.0, 2.0, 4.0, 7.0, 3.0, 5.0, 8.0];
/// let data = Array::from_shape_vec(IxDyn(&[3, 3]), values).unwrap();
/// let result = anova(&Observations::from_array(data, true).unwrap(), &AnovaConfig::default()).unwrap();
///
/// let first_vs_last = ContrastWeights::from_groups(&[1, 0, 2]).unwrap();
/// let c = contrast(&result, 0, &first_vs_last).unwrap();
/// assert!((c.contrast + 5.0).abs() < 1e-12);
/// ```
pub fn contrast(data: &AnovaData, factor: usize, weights: &ContrastWeights) -> Result<ContrastResult> {
    let descriptor = data.factors.get(factor).ok_or_else(|| {
        Error::configuration(format!(
            "factor {factor} does not exist in a {}-factor design",
            data.factors.len()
        ))
    })?;
    if !descriptor.factor_type.is_crossed() {
        return Err(Error::configuration(format!(
            "contrasts require a crossed fixed or random factor, {} is {}",
            descriptor.name, descriptor.factor_type
        )));
    }
    let means = &data.level_means[factor];
    if weights.weights.len() != means.len() {
        return Err(Error::configuration(format!(
            "{} contrast weights given for {} levels of {}",
            weights.weights.len(),
            means.len(),
            descriptor.name
        )));
    }
    let main = data.result_for(FactorSet::single(factor)).ok_or_else(|| {
        Error::configuration(format!("{} has no main-effect test", descriptor.name))
    })?;

    let per_level = data.observations_per_level[factor] as f64;
    let value: f64 = weights.weights.iter().zip(means).map(|(w, m)| w * m).sum();
    let scale: f64 = weights.weights.iter().map(|w| w * w / per_level).sum();
    let ss = value * value / scale;
    let denominator = main.denominator.clone();
    let f = ss / denominator.ms;
    let p = f_distribution_p_value(f, 1.0, denominator.df);
    let r = (f / (f + denominator.df)).sqrt();

    let crossed = data.factors.iter().filter(|f| f.factor_type.is_crossed()).count();
    let mut advisories = Vec::new();
    if crossed > 1 {
        advisories.push(Advisory::MultiFactorContrast);
    }

    debug!(factor = %descriptor.name, comparison = %weights.label, f, p, "contrast");

    Ok(ContrastResult {
        name: format!("{}: {}", descriptor.name, weights.label),
        contrast: value,
        ss,
        df: 1,
        f,
        p,
        r,
        denominator,
        advisories,
    })
}

fn levels_of(data: &AnovaData, factor: usize) -> Result<usize> {
    data.level_means
        .get(factor)
        .map(Vec::len)
        .filter(|&levels| levels > 0)
        .ok_or_else(|| Error::configuration(format!("factor {factor} has no level means")))
}

/// Compare every level with the `control` level.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for an invalid factor or control level.
pub fn simple_contrasts(data: &AnovaData, control: usize, factor: usize) -> Result<Vec<ContrastResult>> {
    let levels = levels_of(data, factor)?;
    if control >= levels {
        return Err(Error::configuration(format!(
            "control level {control} is out of range for {levels} levels"
        )));
    }
    (0..levels)
        .filter(|&level| level != control)
        .map(|level| contrast(data, factor, &ContrastWeights::compare(levels, &[level], &[control])))
        .collect()
}

/// Compare each level with the next.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for an invalid factor.
pub fn repeated_contrasts(data: &AnovaData, factor: usize) -> Result<Vec<ContrastResult>> {
    let levels = levels_of(data, factor)?;
    (0..levels - 1)
        .map(|level| contrast(data, factor, &ContrastWeights::compare(levels, &[level], &[level + 1])))
        .collect()
}

/// Compare each level with the mean of the following levels (Helmert), or
/// with the mean of the preceding levels when `reverse` is set.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for an invalid factor.
pub fn difference_contrasts(data: &AnovaData, factor: usize, reverse: bool) -> Result<Vec<ContrastResult>> {
    let levels = levels_of(data, factor)?;
    let all: Vec<usize> = (0..levels).collect();
    (0..levels - 1)
        .map(|i| {
            let weights = if reverse {
                let level = i + 1;
                ContrastWeights::compare(levels, &[level], &all[..level])
            } else {
                ContrastWeights::compare(levels, &[i], &all[i + 1..])
            };
            contrast(data, factor, &weights)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnovaConfig;
    use crate::engine::anova;
    use crate::factor::FactorType;
    use crate::input::Observations;
    use ndarray::{Array, IxDyn};

    /// Means 2, 4, 6 with 4 replicates and MS_error = 1.
    fn one_way() -> AnovaData {
        let groups = [[1.0, 3.0, 2.0, 2.0], [3.0, 3.5, 4.5, 5.0], [4.5, 6.0, 6.0, 7.5]];
        let values: Vec<f64> = (0..4)
            .flat_map(|rep| groups.iter().map(move |g| g[rep]))
            .collect();
        let data = Array::from_shape_vec(IxDyn(&[4, 3]), values).unwrap();
        anova(&Observations::from_array(data, true).unwrap(), &AnovaConfig::default()).unwrap()
    }

    #[test]
    fn test_weights_validation() {
        assert!(ContrastWeights::from_weights(vec![1.0, -1.0]).is_ok());
        assert!(ContrastWeights::from_weights(vec![1.0, 1.0]).is_err());
        assert!(ContrastWeights::from_weights(vec![0.0, 0.0]).is_err());
        assert!(ContrastWeights::from_groups(&[1, 1, 0]).is_err());
        assert!(ContrastWeights::from_groups(&[1, 3, 2]).is_err());
    }

    #[test]
    fn test_group_weights() {
        let w = ContrastWeights::from_groups(&[1, 1, 2, 0]).unwrap();
        assert_eq!(w.weights(), &[0.5, 0.5, -1.0, 0.0]);
        assert_eq!(w.label(), "1..2 vs 3");
    }

    #[test]
    fn test_first_versus_last() {
        let data = one_way();
        let c = contrast(&data, 0, &ContrastWeights::from_groups(&[1, 0, 2]).unwrap()).unwrap();
        // ψ = 2 − 6, SS = 16 / (2/4) = 32
        assert!((c.contrast + 4.0).abs() < 1e-12);
        assert!((c.ss - 32.0).abs() < 1e-10);
        assert_eq!(c.df, 1);
        assert!((c.f - 32.0).abs() < 1e-10);
        assert!((c.r - (32.0_f64 / 41.0).sqrt()).abs() < 1e-12);
        assert!(c.p < 0.001);
        assert!(c.advisories.is_empty());
        assert_eq!(c.name, "A: 1 vs 3");
    }

    #[test]
    fn test_helmert_partitions_factor_ss() {
        let data = one_way();
        let helmert = difference_contrasts(&data, 0, false).unwrap();
        assert_eq!(helmert.len(), 2);
        let ss: f64 = helmert.iter().map(|c| c.ss).sum();
        assert!((ss - data.result("A").unwrap().ss).abs() < 1e-10);
        assert_eq!(helmert[0].name, "A: 1 vs 2..3");

        let reverse = difference_contrasts(&data, 0, true).unwrap();
        assert_eq!(reverse[1].name, "A: 3 vs 1..2");
        let ss: f64 = reverse.iter().map(|c| c.ss).sum();
        assert!((ss - 32.0).abs() < 1e-10);
    }

    #[test]
    fn test_simple_and_repeated() {
        let data = one_way();
        let simple = simple_contrasts(&data, 0, 0).unwrap();
        assert_eq!(simple.len(), 2);
        assert!((simple[0].contrast - 2.0).abs() < 1e-12);
        assert!((simple[1].contrast - 4.0).abs() < 1e-12);
        assert!(simple_contrasts(&data, 3, 0).is_err());

        let repeated = repeated_contrasts(&data, 0).unwrap();
        assert_eq!(repeated.len(), 2);
        assert!(repeated.iter().all(|c| (c.contrast + 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_weight_count_checked() {
        let data = one_way();
        let w = ContrastWeights::from_weights(vec![1.0, -1.0]).unwrap();
        assert!(contrast(&data, 0, &w).is_err());
        assert!(contrast(&data, 1, &w).is_err());
    }

    #[test]
    fn test_mixed_design_borrows_main_effect_denominator() {
        let values: Vec<f64> = (0..24)
            .map(|i| f64::from(i % 4) * 1.5 + f64::from((i * 5) % 7) + f64::from(i / 12))
            .collect();
        let data = Array::from_shape_vec(IxDyn(&[2, 3, 4]), values).unwrap();
        let config = AnovaConfig::default().with_factor_types(vec![FactorType::Fixed, FactorType::Random]);
        let result = anova(&Observations::from_array(data, true).unwrap(), &config).unwrap();

        let c = contrast(&result, 0, &ContrastWeights::from_groups(&[1, 2, 0]).unwrap()).unwrap();
        assert_eq!(c.denominator.name(), "A × B");
        assert!(c.advisories.contains(&Advisory::MultiFactorContrast));
    }

    #[test]
    fn test_nested_factor_rejected() {
        let values: Vec<f64> = (0..12).map(|i| f64::from((i * 5) % 7)).collect();
        let data = Array::from_shape_vec(IxDyn(&[2, 3, 2]), values).unwrap();
        let config = AnovaConfig::default().with_factor_types(vec![FactorType::Nested]);
        let result = anova(&Observations::from_array(data, true).unwrap(), &config).unwrap();
        let w = ContrastWeights::from_weights(vec![1.0, 0.0, -1.0]).unwrap();
        assert!(contrast(&result, 0, &w).is_err());
    }
}
