//! Python bindings.
//!
//! Exposes the analysis to Python using PyO3. Enable the `python` feature to
//! use this.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::AnovaConfig;
use crate::error::Error;
use crate::factor::FactorType;
use crate::input::Observations;
use crate::types::{AnovaData, AnovaEffect};

/// A factor level passed from Python.
#[derive(FromPyObject, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum PyLevel {
    Int(i64),
    Text(String),
}

/// Python wrapper for one row of an ANOVA table.
#[pyclass(name = "Effect")]
#[derive(Clone)]
pub struct PyEffect {
    /// Effect name
    #[pyo3(get)]
    pub name: String,
    /// Sum of squares
    #[pyo3(get)]
    pub ss: f64,
    /// Degrees of freedom
    #[pyo3(get)]
    pub df: usize,
    /// Mean square (None for the total)
    #[pyo3(get)]
    pub ms: Option<f64>,
    /// F statistic (tested effects only)
    #[pyo3(get)]
    pub f: Option<f64>,
    /// p-value (tested effects only)
    #[pyo3(get)]
    pub p: Option<f64>,
    /// Generalized ω²
    #[pyo3(get)]
    pub omega_squared: Option<f64>,
    /// Name of the F-ratio denominator
    #[pyo3(get)]
    pub denominator: Option<String>,
}

#[pymethods]
impl PyEffect {
    fn __repr__(&self) -> String {
        match (self.f, self.p) {
            (Some(f), Some(p)) => format!(
                "Effect(name={:?}, ss={}, df={}, f={f}, p={p})",
                self.name, self.ss, self.df
            ),
            _ => format!("Effect(name={:?}, ss={}, df={})", self.name, self.ss, self.df),
        }
    }
}

impl From<&AnovaEffect> for PyEffect {
    fn from(effect: &AnovaEffect) -> Self {
        let result = effect.as_result();
        Self {
            name: effect.name().to_string(),
            ss: effect.ss(),
            df: effect.df(),
            ms: effect.ms(),
            f: result.map(|r| r.f),
            p: result.map(|r| r.p),
            omega_squared: result.and_then(|r| r.omega_squared),
            denominator: result.map(|r| r.denominator.name()),
        }
    }
}

fn to_py_err(e: Error) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn effects(data: &AnovaData) -> Vec<PyEffect> {
    data.effects.iter().map(PyEffect::from).collect()
}

/// Run a balanced ANOVA on a flat vector with per-factor level assignments.
#[pyfunction]
#[pyo3(name = "anova", signature = (values, assignments, factor_types=None, factor_names=None))]
fn py_anova(
    values: Vec<f64>,
    assignments: Vec<Vec<PyLevel>>,
    factor_types: Option<Vec<String>>,
    factor_names: Option<Vec<String>>,
) -> PyResult<Vec<PyEffect>> {
    let types = factor_types
        .unwrap_or_default()
        .iter()
        .map(|t| t.parse::<FactorType>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_py_err)?;
    let config = AnovaConfig::default()
        .with_factor_types(types)
        .with_factor_names(factor_names.unwrap_or_default());

    let observations = Observations::from_assignments(&values, &assignments).map_err(to_py_err)?;
    let data = crate::engine::anova(&observations, &config).map_err(to_py_err)?;
    Ok(effects(&data))
}

/// Levene's test on a flat vector with per-factor level assignments.
#[pyfunction]
#[pyo3(name = "levene")]
fn py_levene(values: Vec<f64>, assignments: Vec<Vec<PyLevel>>) -> PyResult<Vec<PyEffect>> {
    let observations = Observations::from_assignments(&values, &assignments).map_err(to_py_err)?;
    let data = crate::levene::levene(&observations).map_err(to_py_err)?;
    Ok(effects(&data))
}

/// The anova Python module.
#[pymodule]
#[pyo3(name = "anova")]
fn anova_module(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyEffect>()?;
    m.add_function(wrap_pyfunction!(py_anova, m)?)?;
    m.add_function(wrap_pyfunction!(py_levene, m)?)?;
    Ok(())
}
