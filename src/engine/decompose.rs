//! Sum-of-squares decomposition.
//!
//! Calculates total, within-cell and nested sums of squares, and the sum of
//! squares of every subset of the cell-defining factors.
//!
//! # Algorithm
//! 1. Total SS = Σ(y − ȳ)², within-cell SS = Σ(y − cell mean)²
//! 2. Nested factors, lowest first: average the factor away and sum the
//!    weighted squared differences between the two mean tables
//! 3. For every non-empty subset R of the remaining factors:
//!    Q(R) = (N / Π lᵢ) · Σ (marginal mean_R − ȳ)²
//! 4. SS(R) = Q(R) − Σ SS(T) over non-empty proper subsets T, lowest order first

use std::collections::BTreeMap;

use ndarray::{ArrayD, Axis};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::factor::{FactorModel, FactorSet};
use crate::input::Observations;

/// Sums of squares of one analysis.
#[derive(Debug, Clone)]
pub(crate) struct Decomposition {
    /// Grand mean of all observations.
    pub grand_mean: f64,
    /// Total sum of squares.
    pub total_ss: f64,
    /// Within-cell sum of squares, present when replicated.
    pub within_ss: Option<f64>,
    /// Sum of squares of each nested factor, indexed by position.
    pub nested_ss: Vec<f64>,
    /// Sum of squares of each non-empty subset of the cell factors.
    pub subset_ss: BTreeMap<FactorSet, f64>,
    /// Level means of each factor, empty for nested factors.
    pub level_means: Vec<Vec<f64>>,
}

/// Decompose the total sum of squares.
pub(crate) fn decompose(observations: &Observations, model: &FactorModel) -> Result<Decomposition> {
    let data = observations.data();
    let grand_mean = data
        .mean()
        .ok_or_else(|| Error::configuration("observation array is empty"))?;
    let total_ss: f64 = data.iter().map(|y| (y - grand_mean).powi(2)).sum();

    let cell_means = observations.cell_means();
    let within_ss = observations.has_replicates().then(|| {
        data.axis_iter(Axis(0))
            .map(|replicate| {
                replicate
                    .iter()
                    .zip(cell_means.iter())
                    .map(|(y, m)| (y - m).powi(2))
                    .sum::<f64>()
            })
            .sum::<f64>()
    });

    // Peel nested factors off the front of the cell-mean table
    let nested_count = model.nested_count();
    let mut weight = model.replicates() as f64;
    let mut table = cell_means;
    let mut nested_ss = Vec::with_capacity(nested_count);
    for factor in &model.factors()[..nested_count] {
        let parent = mean_axis(&table, 0)?;
        let ss: f64 = table
            .axis_iter(Axis(0))
            .map(|unit| {
                unit.iter()
                    .zip(parent.iter())
                    .map(|(m, p)| (m - p).powi(2))
                    .sum::<f64>()
            })
            .sum();
        nested_ss.push(weight * ss);
        weight *= factor.levels as f64;
        table = parent;
    }

    let cell_factors = model.cell_factors();
    let mut subsets: Vec<FactorSet> = cell_factors.proper_subsets().collect();
    subsets.push(cell_factors);
    subsets.sort_by_key(|s| (s.len(), s.bits()));

    let total = data.len() as f64;
    let marginal = |subset: &FactorSet| -> Result<(FactorSet, f64, ArrayD<f64>)> {
        let means = marginal_means(&table, *subset, nested_count)?;
        let weight = total / model.level_product(*subset) as f64;
        let q = weight * means.iter().map(|m| (m - grand_mean).powi(2)).sum::<f64>();
        Ok((*subset, q, means))
    };

    #[cfg(feature = "parallel")]
    let marginals: Vec<(FactorSet, f64, ArrayD<f64>)> =
        subsets.par_iter().map(marginal).collect::<Result<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let marginals: Vec<(FactorSet, f64, ArrayD<f64>)> =
        subsets.iter().map(marginal).collect::<Result<_>>()?;

    let mut level_means = vec![Vec::new(); model.len()];
    let mut subset_ss: BTreeMap<FactorSet, f64> = BTreeMap::new();
    for (subset, q, means) in marginals {
        if subset.len() == 1 {
            for position in subset.iter() {
                level_means[position] = means.iter().copied().collect();
            }
        }
        let lower: f64 = subset
            .proper_subsets()
            .map(|t| subset_ss.get(&t).copied().unwrap_or(0.0))
            .sum();
        subset_ss.insert(subset, (q - lower).max(0.0));
    }

    debug!(
        subsets = subset_ss.len(),
        nested = nested_ss.len(),
        total_ss,
        "decomposed sums of squares"
    );

    Ok(Decomposition {
        grand_mean,
        total_ss,
        within_ss,
        nested_ss,
        subset_ss,
        level_means,
    })
}

/// Average the cell-mean table over every factor not in `keep`.
///
/// `offset` is the position of the table's first axis.
fn marginal_means(table: &ArrayD<f64>, keep: FactorSet, offset: usize) -> Result<ArrayD<f64>> {
    let mut means = table.clone();
    for axis in (0..table.ndim()).rev() {
        if !keep.contains(axis + offset) {
            means = mean_axis(&means, axis)?;
        }
    }
    Ok(means)
}

fn mean_axis(table: &ArrayD<f64>, axis: usize) -> Result<ArrayD<f64>> {
    table
        .mean_axis(Axis(axis))
        .ok_or_else(|| Error::configuration(format!("cannot average over empty axis {axis}")))
}
