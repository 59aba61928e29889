//! Degrees of freedom.
//!
//! An effect with live factors L nested within factors P has
//! Π_{L}(lᵢ − 1) · Π_{P} lⱼ degrees of freedom. The within-cell error has
//! N − Π lᵢ and the total N − 1.

use crate::factor::{FactorModel, FactorSet};

/// Degrees of freedom of an effect.
pub(crate) fn effect_df(model: &FactorModel, live: FactorSet, nesting: FactorSet) -> usize {
    let crossed: usize = live
        .iter()
        .map(|p| model.factors()[p].levels - 1)
        .product();
    crossed * model.level_product(nesting)
}

/// Degrees of freedom of the within-cell error.
pub(crate) fn within_df(model: &FactorModel) -> usize {
    model.total_observations() - model.cells()
}

/// Degrees of freedom of the total.
pub(crate) fn total_df(model: &FactorModel) -> usize {
    model.total_observations() - 1
}
