//! Effect table assembly.
//!
//! Turns factor-subset sums of squares into the effects of the model:
//! subsets involving the subject factor are pooled over the among-subject
//! factors, nested factors become effects nested within their parents, and
//! without replicates the effect spanning every factor becomes the error.

use std::collections::BTreeMap;

use super::decompose::Decomposition;
use super::dof;
use crate::error::{Error, Result};
use crate::factor::{FactorModel, FactorSet};

/// One source of variation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Term {
    /// Factors whose levels vary within the effect.
    pub live: FactorSet,
    /// Factors the effect is nested within.
    pub nesting: FactorSet,
    /// Sum of squares.
    pub ss: f64,
    /// Degrees of freedom.
    pub df: usize,
}

impl Term {
    /// Every factor subscripting the effect, live or nesting.
    pub fn subscripts(&self) -> FactorSet {
        self.live.union(self.nesting)
    }

    pub fn ms(&self) -> f64 {
        self.ss / self.df as f64
    }

    /// Display name, e.g. `A × B` or `S(A)`.
    pub fn name(&self, model: &FactorModel) -> String {
        if self.nesting.is_empty() {
            model.set_name(self.live)
        } else {
            format!("{}({})", model.set_name(self.live), model.set_name(self.nesting))
        }
    }
}

/// Tested effects and the error term.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TermTable {
    /// Effects in table order.
    pub effects: Vec<Term>,
    /// Within-cell error, or the residual effect when unreplicated.
    pub error: Term,
    /// Whether the error is a residual effect rather than within-cell variation.
    pub residual: bool,
}

/// Build the effect table.
pub(crate) fn build(model: &FactorModel, decomposition: &Decomposition) -> Result<TermTable> {
    let among = model
        .subject()
        .and_then(|s| model.factor(s))
        .map_or(FactorSet::empty(), |f| f.nested_within);
    let subject = model.subject();

    let mut pooled: BTreeMap<FactorSet, (FactorSet, f64)> = BTreeMap::new();
    for (&subset, &ss) in &decomposition.subset_ss {
        let (live, nesting) = match subject {
            Some(s) if subset.contains(s) => (subset.difference(among), among),
            _ => (subset, FactorSet::empty()),
        };
        pooled.entry(live).or_insert((nesting, 0.0)).1 += ss;
    }

    let mut effects: Vec<Term> = pooled
        .into_iter()
        .map(|(live, (nesting, ss))| Term {
            live,
            nesting,
            ss,
            df: dof::effect_df(model, live, nesting),
        })
        .collect();
    effects.sort_by_key(|t| (t.live.len(), t.live.bits()));

    // Nested effects follow, outermost first
    for (position, &ss) in decomposition.nested_ss.iter().enumerate().rev() {
        let live = FactorSet::single(position);
        let nesting = model.factors()[position].nested_within;
        effects.push(Term {
            live,
            nesting,
            ss,
            df: dof::effect_df(model, live, nesting),
        });
    }

    let (error, residual) = match decomposition.within_ss {
        Some(ss) => (
            Term {
                live: FactorSet::empty(),
                nesting: model.all(),
                ss,
                df: dof::within_df(model),
            },
            false,
        ),
        None => {
            let index = effects
                .iter()
                .position(|t| t.subscripts() == model.all())
                .ok_or_else(|| {
                    Error::configuration("design has no source of error variance")
                })?;
            (effects.remove(index), true)
        }
    };

    Ok(TermTable {
        effects,
        error,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::decompose::decompose;
    use crate::factor::FactorType::{self, Fixed, Nested, Subject};
    use crate::input::Observations;
    use ndarray::{Array, IxDyn};

    fn table(shape: &[usize], types: &[FactorType], replicated: bool) -> (FactorModel, TermTable, f64) {
        let n: usize = shape.iter().product();
        let values: Vec<f64> = (0..n).map(|i| ((i * 37) % 17) as f64 + 0.1 * i as f64).collect();
        let data = Array::from_shape_vec(IxDyn(shape), values).unwrap();
        let obs = Observations::from_array(data, replicated).unwrap();
        let model = FactorModel::new(&obs.factor_levels(), types, &[], obs.replicates()).unwrap();
        let dec = decompose(&obs, &model).unwrap();
        let terms = build(&model, &dec).unwrap();
        (model, terms, dec.total_ss)
    }

    fn names(model: &FactorModel, terms: &TermTable) -> Vec<String> {
        terms.effects.iter().map(|t| t.name(model)).collect()
    }

    #[test]
    fn test_crossed_order() {
        let (model, terms, _) = table(&[2, 2, 3, 4], &[], true);
        assert_eq!(
            names(&model, &terms),
            vec!["A", "B", "C", "A × B", "A × C", "B × C", "A × B × C"]
        );
        assert!(!terms.residual);
    }

    #[test]
    fn test_residual_error() {
        let (model, terms, total) = table(&[3, 4], &[], false);
        assert_eq!(names(&model, &terms), vec!["A", "B"]);
        assert!(terms.residual);
        assert_eq!(terms.error.live, model.all());
        assert_eq!(terms.error.df, 6);
        let ss: f64 = terms.effects.iter().map(|t| t.ss).sum::<f64>() + terms.error.ss;
        assert!((ss - total).abs() < 1e-9);
    }

    #[test]
    fn test_subject_pooling() {
        // A within, B subject, C among, no replicates
        let (model, terms, total) = table(&[3, 4, 2], &[Fixed, Subject, Fixed], false);
        assert_eq!(names(&model, &terms), vec!["A", "B(C)", "C", "A × C"]);
        let s = &terms.effects[1];
        assert_eq!(s.df, 3 * 2);
        assert_eq!(terms.error.name(&model), "A × B(C)");
        assert_eq!(terms.error.df, 2 * 3 * 2);
        let df: usize = terms.effects.iter().map(|t| t.df).sum::<usize>() + terms.error.df;
        assert_eq!(df, 23);
        let ss: f64 = terms.effects.iter().map(|t| t.ss).sum::<f64>() + terms.error.ss;
        assert!((ss - total).abs() < 1e-9);
    }

    #[test]
    fn test_nested_effects() {
        let (model, terms, total) = table(&[2, 3, 2, 4], &[Nested, Nested], true);
        assert_eq!(names(&model, &terms), vec!["C", "B(C)", "A(B × C)"]);
        assert_eq!(terms.effects[1].df, 4);
        assert_eq!(terms.effects[2].df, 16);
        let ss: f64 = terms.effects.iter().map(|t| t.ss).sum::<f64>() + terms.error.ss;
        assert!((ss - total).abs() < 1e-9);
    }

    #[test]
    fn test_unreplicated_nested_uses_lowest_nested_as_error() {
        let (model, terms, _) = table(&[3, 4], &[Nested], false);
        assert_eq!(names(&model, &terms), vec!["B"]);
        assert_eq!(terms.error.name(&model), "A(B)");
        assert_eq!(terms.error.df, 8);
    }
}
