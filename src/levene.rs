//! Levene's test for homogeneity of variance.
//!
//! Every observation is replaced by its absolute deviation from the cell
//! centre, then a fully fixed crossed ANOVA runs on the deviations. Using the
//! cell median gives the Brown–Forsythe variant.

use ndarray::{ArrayD, Axis, IxDyn};
use tracing::debug;

use crate::config::LeveneCenter;
use crate::engine::analyze_model;
use crate::error::{Error, Result};
use crate::factor::FactorModel;
use crate::input::Observations;
use crate::types::AnovaData;

/// Levene's test using cell means.
///
/// # Errors
///
/// Returns [`Error::InsufficientReplicates`] if cells hold a single
/// observation.
pub fn levene(observations: &Observations) -> Result<AnovaData> {
    levene_with(observations, LeveneCenter::Mean)
}

/// Levene's test with a chosen cell centre.
///
/// # Errors
///
/// Returns [`Error::InsufficientReplicates`] if cells hold a single
/// observation, and [`Error::NumericDegeneracy`] if every deviation equals
/// its cell's mean deviation.
pub fn levene_with(observations: &Observations, center: LeveneCenter) -> Result<AnovaData> {
    if !observations.has_replicates() {
        return Err(Error::insufficient_replicates(
            "Levene's test needs more than one observation per cell",
        ));
    }

    let centers = match center {
        LeveneCenter::Mean => observations.cell_means(),
        LeveneCenter::Median => cell_medians(observations.data())?,
    };
    let deviations = (observations.data() - &centers).mapv(f64::abs);
    debug!(?center, cells = centers.len(), "levene deviations");

    let model = FactorModel::new(
        &observations.factor_levels(),
        &[],
        observations.factor_names(),
        observations.replicates(),
    )?;
    analyze_model(&observations.with_data(deviations), &model, false)
}

/// Median of each cell along the replicate axis.
fn cell_medians(data: &ArrayD<f64>) -> Result<ArrayD<f64>> {
    let medians: Vec<f64> = data
        .lanes(Axis(0))
        .into_iter()
        .map(|lane| {
            let mut values = lane.to_vec();
            values.sort_by(f64::total_cmp);
            let mid = values.len() / 2;
            if values.len() % 2 == 0 {
                (values[mid - 1] + values[mid]) / 2.0
            } else {
                values[mid]
            }
        })
        .collect();
    ArrayD::from_shape_vec(IxDyn(&data.shape()[1..]), medians)
        .map_err(|e| Error::configuration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnovaConfig;
    use crate::engine::anova;
    use ndarray::Array;

    fn groups_array(groups: &[[f64; 4]]) -> Observations {
        let values: Vec<f64> = (0..4)
            .flat_map(|rep| groups.iter().map(move |g| g[rep]))
            .collect();
        let data = Array::from_shape_vec(IxDyn(&[4, groups.len()]), values).unwrap();
        Observations::from_array(data, true).unwrap()
    }

    #[test]
    fn test_levene_matches_anova_on_deviations() {
        let obs = groups_array(&[[1.0, 3.0, 2.0, 2.0], [3.0, 3.5, 4.5, 5.0], [4.5, 6.0, 6.0, 7.5]]);
        let result = levene(&obs).unwrap();
        let a = result.result("A").unwrap();
        // Deviation means 0.5, 0.75, 0.75; within SS 3.5
        assert!((a.f - 3.0 / 14.0).abs() < 1e-10);
        assert_eq!(a.omega_squared, None);

        let deviations = groups_array(&[[1.0, 1.0, 0.0, 0.0], [1.0, 0.5, 0.5, 1.0], [1.5, 0.0, 0.0, 1.5]]);
        let direct = anova(&deviations, &AnovaConfig::default()).unwrap();
        assert!((direct.result("A").unwrap().p - a.p).abs() < 1e-12);
    }

    #[test]
    fn test_median_center() {
        let obs = groups_array(&[[1.0, 2.0, 9.0, 2.0], [4.0, 5.0, 6.0, 5.0]]);
        let data = levene_with(&obs, LeveneCenter::Median).unwrap();
        let a = data.result("A").unwrap();
        // Median deviations: [1, 0, 7, 0] and [1, 0, 1, 0]
        let expected = groups_array(&[[1.0, 0.0, 7.0, 0.0], [1.0, 0.0, 1.0, 0.0]]);
        let direct = anova(&expected, &AnovaConfig::default()).unwrap();
        assert!((direct.result("A").unwrap().f - a.f).abs() < 1e-12);
    }

    #[test]
    fn test_requires_replicates() {
        let data = Array::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 2.0, 3.0, 5.0]).unwrap();
        let obs = Observations::from_array(data, false).unwrap();
        assert!(matches!(levene(&obs), Err(Error::InsufficientReplicates { .. })));

        // A replicate axis of length 1 carries no replicates either
        let data = Array::from_shape_vec(IxDyn(&[1, 2, 2]), vec![1.0, 2.0, 3.0, 5.0]).unwrap();
        let obs = Observations::from_array(data, true).unwrap();
        assert!(matches!(levene(&obs), Err(Error::InsufficientReplicates { .. })));
    }
}
