//! Minimal named-column table for the tabular input form.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A single table column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Floating-point values (responses only).
    Float(Vec<f64>),
    /// Integer values (responses or factor levels).
    Integer(Vec<i64>),
    /// Text labels (factor levels).
    Text(Vec<String>),
}

impl Column {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Integer(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    /// Whether the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A factor level read from a table column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Level {
    Integer(i64),
    Text(String),
}

/// Named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: BTreeMap<String, Column>,
}

impl Table {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, replacing any column with the same name.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    /// Look up a column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| Error::configuration(format!("table has no column {name:?}")))
    }

    /// Response values of a numeric column.
    pub(super) fn response(&self, name: &str) -> Result<Vec<f64>> {
        match self.require(name)? {
            Column::Float(v) => Ok(v.clone()),
            #[allow(clippy::cast_precision_loss)]
            Column::Integer(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            Column::Text(_) => Err(Error::configuration(format!(
                "response column {name:?} must be numeric"
            ))),
        }
    }

    /// Factor levels of an integer or text column.
    pub(super) fn levels(&self, name: &str) -> Result<Vec<Level>> {
        match self.require(name)? {
            Column::Integer(v) => Ok(v.iter().copied().map(Level::Integer).collect()),
            Column::Text(v) => Ok(v.iter().cloned().map(Level::Text).collect()),
            Column::Float(_) => Err(Error::configuration(format!(
                "factor column {name:?} must hold integer or text levels"
            ))),
        }
    }
}
