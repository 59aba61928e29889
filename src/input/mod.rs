//! Observation structures and the three input adapters.
//!
//! Every input shape normalizes to one [`Observations`] value: an
//! `ndarray::ArrayD<f64>` whose optional leading axis holds replicates and
//! whose remaining axes are factors, least significant first.
//!
//! - [`Observations::from_array`]: an N-dimensional array
//! - [`Observations::from_cells`]: an array of replicate vectors
//! - [`Observations::from_assignments`]: a flat vector plus factor levels
//! - [`Observations::from_table`]: named columns of a [`Table`]

mod assign;
mod table;

pub use table::{Column, Table};

use ndarray::{ArrayD, Axis, Dimension, IxDyn};

use crate::error::{Error, Result};

/// A balanced observation array.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    data: ArrayD<f64>,
    replicated: bool,
    factor_names: Vec<String>,
}

impl Observations {
    /// Wrap an N-dimensional array.
    ///
    /// When `has_replicates` is true, axis 0 indexes replicates and the
    /// remaining axes are factors. A replicate axis of length 1 is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the array has no factor axis, an
    /// empty axis, or a non-finite value.
    pub fn from_array(data: ArrayD<f64>, has_replicates: bool) -> Result<Self> {
        let required = if has_replicates { 2 } else { 1 };
        if data.ndim() < required {
            return Err(Error::configuration(format!(
                "observation array needs at least {required} dimension(s), got {}",
                data.ndim()
            )));
        }
        if let Some(axis) = data.shape().iter().position(|&len| len == 0) {
            return Err(Error::configuration(format!(
                "observation array axis {axis} is empty"
            )));
        }
        if let Some((index, value)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::configuration(format!(
                "observation {:?} is not finite ({value})",
                index.slice()
            )));
        }

        let (data, replicated) = if has_replicates && data.len_of(Axis(0)) == 1 {
            (data.index_axis_move(Axis(0), 0), false)
        } else {
            (data, has_replicates)
        };

        Ok(Self {
            data,
            replicated,
            factor_names: Vec::new(),
        })
    }

    /// Build from an array whose cells hold replicate vectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Imbalance`] if the cells hold different numbers of
    /// replicates, and [`Error::Configuration`] for empty cells or values that
    /// are not finite.
    pub fn from_cells(cells: &ArrayD<Vec<f64>>) -> Result<Self> {
        let first = cells
            .iter()
            .next()
            .ok_or_else(|| Error::configuration("observation array has no cells"))?;
        let replicates = first.len();
        if replicates == 0 {
            return Err(Error::configuration("observation cells must not be empty"));
        }

        if let Some((index, cell)) = cells.indexed_iter().find(|(_, c)| c.len() != replicates) {
            return Err(Error::imbalance(format!(
                "cell {:?} has {} replicates, expected {replicates}",
                index.slice(),
                cell.len()
            )));
        }

        let mut shape = Vec::with_capacity(cells.ndim() + 1);
        shape.push(replicates);
        shape.extend_from_slice(cells.shape());

        let mut values = Vec::with_capacity(replicates * cells.len());
        for rep in 0..replicates {
            values.extend(cells.iter().map(|cell| cell[rep]));
        }

        let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| Error::configuration(e.to_string()))?;
        Self::from_array(data, true)
    }

    /// Build from a flat vector with one level assignment vector per factor.
    ///
    /// `assignments[f][i]` is the level of factor `f` for observation `i`.
    /// Levels may be any ordered type and need not be consecutive; they are
    /// sorted to define level order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Imbalance`] if any factor-level combination is missing
    /// or cells hold different numbers of observations, and
    /// [`Error::Configuration`] for mismatched lengths.
    pub fn from_assignments<L: Ord + Clone>(values: &[f64], assignments: &[Vec<L>]) -> Result<Self> {
        let (shape, cell_values) = assign::group_by_cell(values, assignments)?;
        Self::from_grouped(&shape, cell_values)
    }

    /// Build from the response and factor columns of a table.
    ///
    /// Factor names are taken from the column names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for missing or unsuitable columns and
    /// [`Error::Imbalance`] for unbalanced cells.
    pub fn from_table(table: &Table, response: &str, factors: &[&str]) -> Result<Self> {
        let values = table.response(response)?;
        let assignments = factors
            .iter()
            .map(|name| table.levels(name))
            .collect::<Result<Vec<_>>>()?;
        if assignments.iter().any(|a| a.len() != values.len()) {
            return Err(Error::configuration(
                "factor columns must have the same length as the response column",
            ));
        }

        let mut observations = Self::from_assignments(&values, &assignments)?;
        observations.factor_names = factors.iter().map(|s| (*s).to_string()).collect();
        Ok(observations)
    }

    fn from_grouped(levels: &[usize], cells: Vec<Vec<f64>>) -> Result<Self> {
        let replicates = cells.first().map_or(0, Vec::len);
        let mut shape = Vec::with_capacity(levels.len() + 1);
        if replicates > 1 {
            shape.push(replicates);
        }
        shape.extend_from_slice(levels);

        let mut values = Vec::with_capacity(replicates * cells.len());
        for rep in 0..replicates {
            values.extend(cells.iter().map(|cell| cell[rep]));
        }

        let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| Error::configuration(e.to_string()))?;
        Self::from_array(data, replicates > 1)
    }

    /// The underlying array (replicate axis first when present).
    #[must_use]
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Whether axis 0 holds replicates.
    #[must_use]
    pub fn has_replicates(&self) -> bool {
        self.replicated
    }

    /// Observations per cell.
    #[must_use]
    pub fn replicates(&self) -> usize {
        if self.replicated {
            self.data.len_of(Axis(0))
        } else {
            1
        }
    }

    /// Level count of each factor, least significant first.
    #[must_use]
    pub fn factor_levels(&self) -> Vec<usize> {
        let skip = usize::from(self.replicated);
        self.data.shape()[skip..].to_vec()
    }

    /// Number of factors.
    #[must_use]
    pub fn factor_count(&self) -> usize {
        self.data.ndim() - usize::from(self.replicated)
    }

    /// Factor names carried by the input (table columns), if any.
    #[must_use]
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// Total number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether there are no observations (never true once constructed).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell means: the array averaged over the replicate axis.
    #[must_use]
    pub(crate) fn cell_means(&self) -> ArrayD<f64> {
        if self.replicated {
            let replicates = self.data.len_of(Axis(0)) as f64;
            self.data.sum_axis(Axis(0)) / replicates
        } else {
            self.data.clone()
        }
    }

    /// Replace the data, keeping the replicate layout and names.
    pub(crate) fn with_data(&self, data: ArrayD<f64>) -> Self {
        Self {
            data,
            replicated: self.replicated,
            factor_names: self.factor_names.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, Array};

    #[test]
    fn test_from_array_with_replicates() {
        let data = Array::from_shape_vec(IxDyn(&[4, 3]), (0..12).map(f64::from).collect()).unwrap();
        let obs = Observations::from_array(data, true).unwrap();
        assert_eq!(obs.replicates(), 4);
        assert_eq!(obs.factor_levels(), vec![3]);
        assert_eq!(obs.len(), 12);
    }

    #[test]
    fn test_single_replicate_axis_dropped() {
        let data = Array::from_shape_vec(IxDyn(&[1, 2, 3]), vec![1.0; 6]).unwrap();
        let obs = Observations::from_array(data, true).unwrap();
        assert!(!obs.has_replicates());
        assert_eq!(obs.factor_levels(), vec![2, 3]);
    }

    #[test]
    fn test_rejects_non_finite() {
        let data = arr2(&[[1.0, f64::NAN], [2.0, 3.0]]).into_dyn();
        let err = Observations::from_array(data, false).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_rejects_missing_factor_axis() {
        let data = Array::from_shape_vec(IxDyn(&[3]), vec![1.0, 2.0, 3.0]).unwrap();
        assert!(Observations::from_array(data, true).is_err());
    }

    #[test]
    fn test_from_cells_stacks_replicates() {
        let cells = Array::from_shape_vec(
            IxDyn(&[2]),
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        )
        .unwrap();
        let obs = Observations::from_cells(&cells).unwrap();
        assert_eq!(obs.replicates(), 3);
        assert_eq!(obs.data()[[0, 1]], 4.0);
        assert_eq!(obs.data()[[2, 0]], 3.0);
    }

    #[test]
    fn test_from_cells_imbalance() {
        let cells = Array::from_shape_vec(IxDyn(&[2]), vec![vec![1.0, 2.0], vec![4.0]]).unwrap();
        let err = Observations::from_cells(&cells).unwrap_err();
        assert!(matches!(err, Error::Imbalance { .. }));
    }

    #[test]
    fn test_cell_means() {
        let data = Array::from_shape_vec(IxDyn(&[2, 2]), vec![1.0, 10.0, 3.0, 20.0]).unwrap();
        let obs = Observations::from_array(data, true).unwrap();
        let means = obs.cell_means();
        assert_eq!(means.shape(), &[2]);
        assert!((means[[0]] - 2.0).abs() < 1e-12);
        assert!((means[[1]] - 15.0).abs() < 1e-12);
    }
}
