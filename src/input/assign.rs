//! Grouping of flat observations by factor-level assignments.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Group `values` into cells.
///
/// Returns the level count of each factor and the observations of every cell
/// in row-major cell order (last factor varies fastest). Within a cell,
/// observations keep their input order.
pub(super) fn group_by_cell<L: Ord + Clone>(
    values: &[f64],
    assignments: &[Vec<L>],
) -> Result<(Vec<usize>, Vec<Vec<f64>>)> {
    if values.is_empty() {
        return Err(Error::configuration("observation vector is empty"));
    }
    if assignments.is_empty() {
        return Err(Error::configuration(
            "at least one factor assignment vector is required",
        ));
    }
    for (factor, levels) in assignments.iter().enumerate() {
        if levels.len() != values.len() {
            return Err(Error::configuration(format!(
                "factor {} assigns {} observations, expected {}",
                factor + 1,
                levels.len(),
                values.len()
            )));
        }
    }

    // Sorted distinct levels give each factor its level order
    let indices: Vec<BTreeMap<&L, usize>> = assignments
        .iter()
        .map(|levels| {
            let mut map: BTreeMap<&L, usize> = levels.iter().map(|l| (l, 0)).collect();
            for (i, slot) in map.values_mut().enumerate() {
                *slot = i;
            }
            map
        })
        .collect();
    let shape: Vec<usize> = indices.iter().map(BTreeMap::len).collect();

    let mut strides = vec![1usize; shape.len()];
    for f in (0..shape.len().saturating_sub(1)).rev() {
        strides[f] = strides[f + 1] * shape[f + 1];
    }
    let cell_count: usize = shape.iter().product();

    let mut cells: Vec<Vec<f64>> = vec![Vec::new(); cell_count];
    for (i, &value) in values.iter().enumerate() {
        let cell: usize = assignments
            .iter()
            .zip(&indices)
            .zip(&strides)
            .map(|((levels, index), stride)| index[&levels[i]] * stride)
            .sum();
        cells[cell].push(value);
    }

    let expected = cells[0].len();
    if let Some((cell, members)) = cells.iter().enumerate().find(|(_, c)| c.len() != expected) {
        return Err(Error::imbalance(format!(
            "cell {:?} has {} observations, expected {expected}",
            unravel(cell, &shape),
            members.len()
        )));
    }
    Ok((shape, cells))
}

/// Convert a row-major flat cell index into per-factor level indices.
fn unravel(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for (f, &len) in shape.iter().enumerate().rev() {
        index[f] = flat % len;
        flat /= len;
    }
    index
}
