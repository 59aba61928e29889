//! ANOVA result types.
//!
//! An analysis returns an [`AnovaData`] tree: tested effects as
//! [`AnovaResult`], the error term as [`AnovaFactor`] and the total as
//! [`AnovaValue`], wrapped in the [`AnovaEffect`] enum.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::factor::{DesignShape, Factor, FactorSet};

/// Caveat attached to a result.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Advisory {
    /// The effect's variance-component estimate was negative; ω² is reported
    /// as zero and the raw estimate is kept here.
    NegativeVarianceComponent {
        /// Raw (negative) ω² estimate.
        raw: f64,
    },
    /// The effect size for nested and 3-way mixed designs follows inferred
    /// variance-component rules and has lower confidence.
    InferredEffectSize,
    /// The denominator is a linear combination of mean squares with
    /// Satterthwaite degrees of freedom.
    ApproximateDenominator,
    /// A single-factor contrast in a design with several crossed factors.
    MultiFactorContrast,
}

/// One mean square entering a denominator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DenominatorTerm {
    /// Name of the effect supplying the mean square.
    pub name: String,
    /// Coefficient in the combination (+1 or −1).
    pub coefficient: f64,
    /// Mean square.
    pub ms: f64,
    /// Degrees of freedom.
    pub df: usize,
}

/// Denominator of an F-ratio.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Denominator {
    /// Mean squares combined into the denominator.
    pub terms: Vec<DenominatorTerm>,
    /// Combined mean square Σ cᵢ·MSᵢ.
    pub ms: f64,
    /// Degrees of freedom, Satterthwaite when `approximate`.
    pub df: f64,
    /// Whether the denominator is a combination of mean squares.
    pub approximate: bool,
}

impl Denominator {
    /// Display name, e.g. `A × B + A × C − A × B × C`.
    #[must_use]
    pub fn name(&self) -> String {
        let mut name = String::new();
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                name.push_str(if term.coefficient < 0.0 { " − " } else { " + " });
            }
            name.push_str(&term.name);
        }
        name
    }
}

/// An item without a mean square (the total).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaValue {
    /// Name of this value.
    pub name: String,
    /// Sum of squares.
    pub ss: f64,
    /// Degrees of freedom.
    pub df: usize,
}

/// An item with a mean square that is not itself tested (the error).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaFactor {
    /// Name of this factor.
    pub name: String,
    /// Sum of squares.
    pub ss: f64,
    /// Degrees of freedom.
    pub df: usize,
    /// Mean square.
    pub ms: f64,
}

/// A tested effect.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaResult {
    /// Name of this effect.
    pub name: String,
    /// Live factors of the effect.
    pub factors: FactorSet,
    /// Factors the effect is nested within.
    pub nested_within: FactorSet,
    /// Sum of squares.
    pub ss: f64,
    /// Degrees of freedom.
    pub df: usize,
    /// Mean square.
    pub ms: f64,
    /// F statistic.
    pub f: f64,
    /// Probability of a Type I error.
    pub p: f64,
    /// Generalized ω² effect size; `None` when effect sizes were not computed.
    pub omega_squared: Option<f64>,
    /// Denominator of the F-ratio.
    pub denominator: Denominator,
    /// Caveats attached to this result.
    pub advisories: Vec<Advisory>,
}

/// Any row of an ANOVA table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnovaEffect {
    /// A plain value (total).
    Value(AnovaValue),
    /// An untested mean square (error).
    Factor(AnovaFactor),
    /// A tested effect.
    Result(AnovaResult),
}

impl AnovaEffect {
    /// Name of the row.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Value(v) => &v.name,
            Self::Factor(f) => &f.name,
            Self::Result(r) => &r.name,
        }
    }

    /// Sum of squares.
    #[must_use]
    pub fn ss(&self) -> f64 {
        match self {
            Self::Value(v) => v.ss,
            Self::Factor(f) => f.ss,
            Self::Result(r) => r.ss,
        }
    }

    /// Degrees of freedom.
    #[must_use]
    pub fn df(&self) -> usize {
        match self {
            Self::Value(v) => v.df,
            Self::Factor(f) => f.df,
            Self::Result(r) => r.df,
        }
    }

    /// Mean square, if the row has one.
    #[must_use]
    pub fn ms(&self) -> Option<f64> {
        match self {
            Self::Value(_) => None,
            Self::Factor(f) => Some(f.ms),
            Self::Result(r) => Some(r.ms),
        }
    }

    /// The tested result, if this row is one.
    #[must_use]
    pub fn as_result(&self) -> Option<&AnovaResult> {
        match self {
            Self::Result(r) => Some(r),
            _ => None,
        }
    }
}

/// Complete results of an ANOVA.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnovaData {
    /// Rows in table order: tested effects, error, total.
    pub effects: Vec<AnovaEffect>,
    /// Factor descriptors.
    pub factors: Vec<Factor>,
    /// Design classification.
    pub shape: DesignShape,
    /// Grand mean of all observations.
    pub grand_mean: f64,
    /// Level means of each factor, indexed by position; empty for nested factors.
    pub level_means: Vec<Vec<f64>>,
    /// Observations per level of each factor, indexed by position.
    pub observations_per_level: Vec<usize>,
}

impl AnovaData {
    /// Tested effects.
    pub fn results(&self) -> impl Iterator<Item = &AnovaResult> {
        self.effects.iter().filter_map(AnovaEffect::as_result)
    }

    /// Look up a row by name.
    #[must_use]
    pub fn effect(&self, name: &str) -> Option<&AnovaEffect> {
        self.effects.iter().find(|e| e.name() == name)
    }

    /// Look up a tested effect by name.
    #[must_use]
    pub fn result(&self, name: &str) -> Option<&AnovaResult> {
        self.effect(name).and_then(AnovaEffect::as_result)
    }

    /// The tested effect whose live factors are exactly `factors` and which
    /// is not nested.
    #[must_use]
    pub fn result_for(&self, factors: FactorSet) -> Option<&AnovaResult> {
        self.results()
            .find(|r| r.factors == factors && r.nested_within.is_empty())
    }

    /// The error row.
    #[must_use]
    pub fn error(&self) -> Option<&AnovaFactor> {
        self.effects.iter().find_map(|e| match e {
            AnovaEffect::Factor(f) => Some(f),
            _ => None,
        })
    }

    /// The total row.
    #[must_use]
    pub fn total(&self) -> Option<&AnovaValue> {
        self.effects.iter().find_map(|e| match e {
            AnovaEffect::Value(v) => Some(v),
            _ => None,
        })
    }
}

impl fmt::Display for AnovaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<24} {:>12} {:>5} {:>12} {:>10} {:>10} {:>8}",
            "Effect", "SS", "DF", "MS", "F", "p", "ω²"
        )?;
        for effect in &self.effects {
            match effect {
                AnovaEffect::Result(r) => writeln!(
                    f,
                    "{:<24} {:>12.4} {:>5} {:>12.4} {:>10.4} {:>10.4} {:>8}",
                    r.name,
                    r.ss,
                    r.df,
                    r.ms,
                    r.f,
                    r.p,
                    r.omega_squared.map_or_else(String::new, |w| format!("{w:.4}"))
                )?,
                AnovaEffect::Factor(e) => writeln!(
                    f,
                    "{:<24} {:>12.4} {:>5} {:>12.4}",
                    e.name, e.ss, e.df, e.ms
                )?,
                AnovaEffect::Value(v) => {
                    writeln!(f, "{:<24} {:>12.4} {:>5}", v.name, v.ss, v.df)?;
                }
            }
        }
        Ok(())
    }
}

/// Result of a single linear contrast.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContrastResult {
    /// Label of the comparison.
    pub name: String,
    /// Contrast value Σ wⱼ·meanⱼ.
    pub contrast: f64,
    /// Sum of squares of the contrast.
    pub ss: f64,
    /// Degrees of freedom (always 1).
    pub df: usize,
    /// F statistic.
    pub f: f64,
    /// Probability of a Type I error.
    pub p: f64,
    /// Effect size r = √(F / (F + df_denominator)).
    pub r: f64,
    /// Denominator borrowed from the factor's F-test.
    pub denominator: Denominator,
    /// Caveats attached to this result.
    pub advisories: Vec<Advisory>,
}
