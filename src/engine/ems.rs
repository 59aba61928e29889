//! Expected mean squares and denominator selection.
//!
//! Expected mean squares follow the Cornfield–Tukey rules for the restricted
//! mixed model. Source F contributes a variance component to the expected
//! mean square of effect E when every factor subscripting E also subscripts
//! F, and every live factor of F that is not live in E is random. The error
//! contributes to everything.
//!
//! The denominator of E is a source whose expected mean square equals that of
//! E without E's own component. When no single source matches, a combination
//! D₁ + D₂ − D₃ is used with Satterthwaite degrees of freedom.

use super::terms::{Term, TermTable};
use crate::error::{Error, Result};
use crate::factor::{DesignShape, FactorModel, FactorSet};

/// Sources forming a denominator, as indices into the effect list; the
/// error has index `effects.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DenominatorChoice {
    /// A single mean square.
    Single(usize),
    /// MS(plus₀) + MS(plus₁) − MS(minus).
    Combination { plus: [usize; 2], minus: usize },
}

/// Whether `source` contributes a variance component to the expected mean
/// square of `effect`.
fn contributes(random: FactorSet, source: &Term, effect: &Term) -> bool {
    effect.subscripts().is_subset_of(source.subscripts())
        && source.live.difference(effect.live).is_subset_of(random)
}

/// Components of every expected mean square.
///
/// Row `e` lists, per source index, whether that source contributes to the
/// expected mean square of effect `e`. The error row is included last and
/// holds only the error itself.
pub(crate) fn expected_mean_squares(model: &FactorModel, table: &TermTable) -> Vec<Vec<bool>> {
    let random = model.random_factors();
    let error = table.effects.len();
    let sources: Vec<&Term> = table.effects.iter().chain([&table.error]).collect();

    sources
        .iter()
        .enumerate()
        .map(|(e, effect)| {
            sources
                .iter()
                .enumerate()
                .map(|(f, source)| {
                    f == error || f == e || (e != error && contributes(random, source, effect))
                })
                .collect()
        })
        .collect()
}

/// Choose the denominator of every effect.
///
/// # Errors
///
/// Returns [`Error::NumericDegeneracy`] when no source or combination of
/// sources matches an effect's expected mean square.
pub(crate) fn denominators(model: &FactorModel, table: &TermTable) -> Result<Vec<DenominatorChoice>> {
    let error = table.effects.len();
    if model.shape() == DesignShape::FullyFixed {
        return Ok(vec![DenominatorChoice::Single(error); error]);
    }

    let ems = expected_mean_squares(model, table);
    (0..error)
        .map(|e| {
            let target: Vec<i32> = ems[e]
                .iter()
                .enumerate()
                .map(|(f, &c)| i32::from(c && f != e))
                .collect();
            find_denominator(&ems, &target, e).ok_or_else(|| {
                Error::numeric_degeneracy(
                    table.effects[e].name(model),
                    "no mean square or combination of mean squares matches its expected mean square",
                )
            })
        })
        .collect()
}

fn find_denominator(ems: &[Vec<bool>], target: &[i32], effect: usize) -> Option<DenominatorChoice> {
    let rows: Vec<Vec<i32>> = ems
        .iter()
        .map(|row| row.iter().map(|&c| i32::from(c)).collect())
        .collect();
    let candidates: Vec<usize> = (0..rows.len()).filter(|&d| d != effect).collect();

    if let Some(&d) = candidates.iter().find(|&&d| rows[d] == target) {
        return Some(DenominatorChoice::Single(d));
    }

    for (i, &d1) in candidates.iter().enumerate() {
        for &d2 in &candidates[i + 1..] {
            for &d3 in &candidates {
                if d3 == d1 || d3 == d2 {
                    continue;
                }
                let matches = target
                    .iter()
                    .enumerate()
                    .all(|(k, &t)| rows[d1][k] + rows[d2][k] - rows[d3][k] == t);
                if matches {
                    return Some(DenominatorChoice::Combination {
                        plus: [d1, d2],
                        minus: d3,
                    });
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::decompose::decompose;
    use crate::engine::terms::build;
    use crate::factor::FactorType::{self, Fixed, Nested, Random, Subject};
    use crate::input::Observations;
    use ndarray::{Array, IxDyn};

    /// Denominator names per effect name.
    fn denominator_names(shape: &[usize], types: &[FactorType], replicated: bool) -> Vec<(String, String)> {
        let n: usize = shape.iter().product();
        let values: Vec<f64> = (0..n).map(|i| ((i * 13) % 7) as f64).collect();
        let data = Array::from_shape_vec(IxDyn(shape), values).unwrap();
        let obs = Observations::from_array(data, replicated).unwrap();
        let model = FactorModel::new(&obs.factor_levels(), types, &[], obs.replicates()).unwrap();
        let table = build(&model, &decompose(&obs, &model).unwrap()).unwrap();
        let name = |i: usize| {
            if i == table.effects.len() {
                "Error".to_string()
            } else {
                table.effects[i].name(&model)
            }
        };
        denominators(&model, &table)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(e, d)| {
                let den = match d {
                    DenominatorChoice::Single(i) => name(i),
                    DenominatorChoice::Combination { plus, minus } => {
                        format!("{} + {} − {}", name(plus[0]), name(plus[1]), name(minus))
                    }
                };
                (name(e), den)
            })
            .collect()
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
            .collect()
    }

    #[test]
    fn test_fully_fixed_uses_error() {
        let dens = denominator_names(&[2, 2, 3], &[], true);
        assert!(dens.iter().all(|(_, d)| d == "Error"));
    }

    #[test]
    fn test_two_way_mixed() {
        let dens = denominator_names(&[2, 3, 4], &[Fixed, Random], true);
        assert_eq!(
            dens,
            pairs(&[("A", "A × B"), ("B", "Error"), ("A × B", "Error")])
        );
    }

    #[test]
    fn test_two_way_random() {
        let dens = denominator_names(&[2, 3, 4], &[Random, Random], true);
        assert_eq!(
            dens,
            pairs(&[("A", "A × B"), ("B", "A × B"), ("A × B", "Error")])
        );
    }

    #[test]
    fn test_three_way_two_fixed_one_random() {
        let dens = denominator_names(&[2, 2, 3, 4], &[Fixed, Fixed, Random], true);
        assert_eq!(
            dens,
            pairs(&[
                ("A", "A × C"),
                ("B", "B × C"),
                ("C", "Error"),
                ("A × B", "A × B × C"),
                ("A × C", "Error"),
                ("B × C", "Error"),
                ("A × B × C", "Error"),
            ])
        );
    }

    #[test]
    fn test_three_way_one_fixed_two_random() {
        let dens = denominator_names(&[2, 2, 3, 4], &[Fixed, Random, Random], true);
        assert_eq!(
            dens,
            pairs(&[
                ("A", "A × B + A × C − A × B × C"),
                ("B", "B × C"),
                ("C", "B × C"),
                ("A × B", "A × B × C"),
                ("A × C", "A × B × C"),
                ("B × C", "Error"),
                ("A × B × C", "Error"),
            ])
        );
    }

    #[test]
    fn test_three_way_random() {
        let dens = denominator_names(&[2, 2, 3, 4], &[Random, Random, Random], true);
        assert_eq!(
            dens[..3],
            pairs(&[
                ("A", "A × B + A × C − A × B × C"),
                ("B", "A × B + B × C − A × B × C"),
                ("C", "A × C + B × C − A × B × C"),
            ])[..]
        );
        assert_eq!(dens[3].1, "A × B × C");
    }

    #[test]
    fn test_nested_within_fixed() {
        // A nested within B
        let dens = denominator_names(&[2, 3, 4], &[Nested, Fixed], true);
        assert_eq!(dens, pairs(&[("B", "A(B)"), ("A(B)", "Error")]));
    }

    #[test]
    fn test_repeated_measures() {
        // A within, B subject, C among, no replicates
        let dens = denominator_names(&[3, 4, 2], &[Fixed, Subject, Fixed], false);
        assert_eq!(
            dens,
            pairs(&[
                ("A", "Error"),
                ("B(C)", "Error"),
                ("C", "B(C)"),
                ("A × C", "Error"),
            ])
        );
    }

    #[test]
    fn test_expected_mean_square_rows() {
        let n = 24;
        let data = Array::from_shape_vec(IxDyn(&[2, 3, 4]), (0..n).map(f64::from).collect()).unwrap();
        let obs = Observations::from_array(data, true).unwrap();
        let model = FactorModel::new(&obs.factor_levels(), &[Fixed, Random], &[], 2).unwrap();
        let table = build(&model, &decompose(&obs, &model).unwrap()).unwrap();
        let ems = expected_mean_squares(&model, &table);

        // Sources: A, B, A × B, Error
        assert_eq!(ems[0], vec![true, false, true, true]);
        assert_eq!(ems[1], vec![false, true, false, true]);
        assert_eq!(ems[2], vec![false, false, true, true]);
        assert_eq!(ems[3], vec![false, false, false, true]);
    }

    #[test]
    fn test_error_row_holds_only_error() {
        // A × B and A(B) span every factor with random live factors
        for types in [[Random, Random], [Nested, Random]] {
            let data = Array::from_shape_vec(IxDyn(&[2, 3, 4]), (0..24).map(f64::from).collect()).unwrap();
            let obs = Observations::from_array(data, true).unwrap();
            let model = FactorModel::new(&obs.factor_levels(), &types, &[], 2).unwrap();
            let table = build(&model, &decompose(&obs, &model).unwrap()).unwrap();
            let ems = expected_mean_squares(&model, &table);

            let error = table.effects.len();
            let expected: Vec<bool> = (0..=error).map(|f| f == error).collect();
            assert_eq!(ems[error], expected);
        }
    }
}
