//! Factor descriptors and the validated factor model.
//!
//! Factors are identified by their position along the observation array,
//! least significant first. Nested factors occupy the leading positions, a
//! subject/block factor splits the fixed factors into within-subject (before
//! it) and among-subject (after it) groups.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of factors in one design.
pub const MAX_FACTORS: usize = 10;

/// Maximum number of crossed fixed/random factors when any random effect is present.
pub const MAX_CROSSED_WITH_RANDOM: usize = 3;

/// Maximum number of fixed factors in a repeated-measures design.
pub const MAX_REPEATED_MEASURES_FIXED: usize = 3;

/// Type of a factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FactorType {
    /// A crossed fixed-effects (manipulated) factor.
    Fixed,
    /// A crossed random-effects (measured) factor.
    Random,
    /// A random factor fully nested within the factors above it.
    Nested,
    /// A random subject/block factor measured across within-subject factors.
    Subject,
}

impl FactorType {
    /// Alias for [`FactorType::Fixed`].
    pub const MANIPULATED: Self = Self::Fixed;
    /// Alias for [`FactorType::Random`].
    pub const MEASURED: Self = Self::Random;
    /// Alias for [`FactorType::Subject`].
    pub const BLOCK: Self = Self::Subject;

    /// Whether the factor's levels are a random sample (everything but fixed).
    #[must_use]
    pub fn is_random(self) -> bool {
        !matches!(self, Self::Fixed)
    }

    /// Whether the factor is crossed with the other crossed factors.
    #[must_use]
    pub fn is_crossed(self) -> bool {
        matches!(self, Self::Fixed | Self::Random)
    }
}

impl Default for FactorType {
    fn default() -> Self {
        Self::Fixed
    }
}

impl fmt::Display for FactorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fixed => "fixed",
            Self::Random => "random",
            Self::Nested => "nested",
            Self::Subject => "subject",
        };
        f.write_str(name)
    }
}

impl FromStr for FactorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "manipulated" => Ok(Self::Fixed),
            "random" | "measured" => Ok(Self::Random),
            "nested" => Ok(Self::Nested),
            "subject" | "block" => Ok(Self::Subject),
            other => Err(Error::configuration(format!("unknown factor type {other:?}"))),
        }
    }
}

/// Placement of a fixed factor relative to the subject/block factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SubjectRole {
    /// Every subject is measured at every level.
    Within,
    /// Each subject belongs to exactly one level.
    Among,
}

/// A set of factor positions stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactorSet(u32);

impl FactorSet {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// A set holding a single position.
    #[must_use]
    pub const fn single(position: usize) -> Self {
        Self(1 << position)
    }

    /// Build a set from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits of the set.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Number of positions in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether `position` is in the set.
    #[must_use]
    pub const fn contains(self, position: usize) -> bool {
        self.0 & (1 << position) != 0
    }

    /// Add a position.
    #[must_use]
    pub const fn with(self, position: usize) -> Self {
        Self(self.0 | (1 << position))
    }

    /// Set union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Set intersection.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Positions in `self` but not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Whether every position of `self` is in `other`.
    #[must_use]
    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Iterate positions in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..u32::BITS as usize).filter(move |&p| self.contains(p))
    }

    /// Iterate all non-empty proper subsets.
    pub fn proper_subsets(self) -> impl Iterator<Item = Self> {
        let full = self.0;
        let mut sub = full;
        std::iter::from_fn(move || {
            if sub == 0 {
                return None;
            }
            sub = (sub - 1) & full;
            (sub != 0).then_some(Self(sub))
        })
    }

    /// Iterate all subsets, including the empty set and `self`.
    pub fn subsets(self) -> impl Iterator<Item = Self> {
        std::iter::once(self)
            .chain(self.proper_subsets())
            .chain(std::iter::once(Self::empty()).filter(move |_| !self.is_empty()))
    }
}

impl FromIterator<usize> for FactorSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// Descriptor of a single factor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Factor {
    /// Display name.
    pub name: String,
    /// Position along the observation array (0 = least significant).
    pub position: usize,
    /// Factor type.
    pub factor_type: FactorType,
    /// Number of levels.
    pub levels: usize,
    /// Factors this one is nested within.
    pub nested_within: FactorSet,
    /// Within/among-subject placement in a repeated-measures design.
    pub subject_role: Option<SubjectRole>,
}

/// Broad shape of a design, used to pick the error-term rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DesignShape {
    /// All factors fixed and crossed.
    FullyFixed,
    /// Crossed fixed and random factors.
    Mixed,
    /// All crossed factors random.
    FullyRandom,
    /// At least one nested factor, no subject factor.
    Nested,
    /// A subject/block factor is present.
    RepeatedMeasures,
}

/// Validated factor structure of one analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactorModel {
    factors: Vec<Factor>,
    replicates: usize,
}

impl FactorModel {
    /// Build and validate a factor model.
    ///
    /// # Arguments
    /// * `levels` - Level count of each factor, least significant first
    /// * `types` - Declared types; missing trailing entries default to fixed
    /// * `names` - Factor names; empty for alphabetical defaults
    /// * `replicates` - Observations per cell (1 when unreplicated)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if:
    /// - there are no factors, too many factors, or more types/names than factors
    /// - any factor has fewer than 2 levels
    /// - nested factors do not precede the other factors
    /// - there is more than one subject/block factor, it is combined with
    ///   random factors, or it has no within-subject factor
    /// - random effects are combined with more than 3 crossed factors
    /// - there is no source of error variance
    pub fn new(
        levels: &[usize],
        types: &[FactorType],
        names: &[String],
        replicates: usize,
    ) -> Result<Self> {
        let count = levels.len();
        if count == 0 {
            return Err(Error::configuration("at least one factor is required"));
        }
        if count > MAX_FACTORS {
            return Err(Error::configuration(format!(
                "{count} factors exceeds the maximum of {MAX_FACTORS}"
            )));
        }
        if types.len() > count {
            return Err(Error::configuration(format!(
                "{} factor types given for {count} factors",
                types.len()
            )));
        }
        if !names.is_empty() && names.len() != count {
            return Err(Error::configuration(format!(
                "{} factor names given for {count} factors",
                names.len()
            )));
        }
        if replicates == 0 {
            return Err(Error::configuration("replicate count must be at least 1"));
        }

        let types: Vec<FactorType> = (0..count)
            .map(|i| types.get(i).copied().unwrap_or_default())
            .collect();

        for (i, &l) in levels.iter().enumerate() {
            if l < 2 {
                return Err(Error::configuration(format!(
                    "factor {} must have at least 2 levels, got {l}",
                    i + 1
                )));
            }
        }

        let nested_count = types.iter().take_while(|&&t| t == FactorType::Nested).count();
        if types[nested_count..].contains(&FactorType::Nested) {
            return Err(Error::configuration(
                "nested factors must be ordered before all crossed and subject factors",
            ));
        }
        if nested_count == count {
            return Err(Error::configuration(
                "nested factors need at least one crossed or subject factor to nest within",
            ));
        }

        let subjects: Vec<usize> = (0..count)
            .filter(|&i| types[i] == FactorType::Subject)
            .collect();
        if subjects.len() > 1 {
            return Err(Error::configuration(
                "at most one subject/block factor is allowed",
            ));
        }

        let random_crossed = types.iter().filter(|&&t| t == FactorType::Random).count();
        let crossed = types.iter().filter(|t| t.is_crossed()).count();

        let subject = subjects.first().copied();
        if let Some(s) = subject {
            if random_crossed > 0 {
                return Err(Error::configuration(
                    "repeated-measures designs support fixed factors only alongside the subject/block factor",
                ));
            }
            if crossed > MAX_REPEATED_MEASURES_FIXED {
                return Err(Error::configuration(format!(
                    "repeated-measures designs are limited to {MAX_REPEATED_MEASURES_FIXED} fixed factors, got {crossed}"
                )));
            }
            if s == nested_count {
                return Err(Error::configuration(
                    "the subject/block factor must follow at least one within-subject fixed factor",
                ));
            }
        } else if random_crossed > 0 && crossed > MAX_CROSSED_WITH_RANDOM {
            return Err(Error::configuration(format!(
                "designs with random factors are limited to {MAX_CROSSED_WITH_RANDOM} crossed factors, got {crossed}"
            )));
        }

        if replicates == 1 && nested_count == 0 && count < 2 {
            return Err(Error::configuration(
                "an unreplicated design needs at least two factors so the highest interaction can serve as error",
            ));
        }

        let names: Vec<String> = if names.is_empty() {
            (0..count).map(default_factor_name).collect()
        } else {
            names.to_vec()
        };
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(Error::configuration(format!("factor {} has an empty name", i + 1)));
            }
            if names[..i].contains(name) {
                return Err(Error::configuration(format!("duplicate factor name {name:?}")));
            }
        }

        let among: FactorSet = match subject {
            Some(s) => (s + 1..count).collect(),
            None => FactorSet::empty(),
        };

        let factors = (0..count)
            .map(|i| {
                let factor_type = types[i];
                let nested_within = match factor_type {
                    FactorType::Nested => (i + 1..count).collect(),
                    FactorType::Subject => among,
                    FactorType::Fixed | FactorType::Random => FactorSet::empty(),
                };
                let subject_role = match (subject, factor_type) {
                    (Some(s), FactorType::Fixed) if i < s => Some(SubjectRole::Within),
                    (Some(_), FactorType::Fixed) => Some(SubjectRole::Among),
                    _ => None,
                };
                Factor {
                    name: names[i].clone(),
                    position: i,
                    factor_type,
                    levels: levels[i],
                    nested_within,
                    subject_role,
                }
            })
            .collect();

        Ok(Self {
            factors,
            replicates,
        })
    }

    /// All factors, least significant first.
    #[must_use]
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// The factor at `position`.
    #[must_use]
    pub fn factor(&self, position: usize) -> Option<&Factor> {
        self.factors.get(position)
    }

    /// Number of factors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Whether the model has no factors (never true for a validated model).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Observations per cell.
    #[must_use]
    pub fn replicates(&self) -> usize {
        self.replicates
    }

    /// Whether a within-cell error term exists.
    #[must_use]
    pub fn has_replicates(&self) -> bool {
        self.replicates > 1
    }

    /// Number of cells (product of all level counts).
    #[must_use]
    pub fn cells(&self) -> usize {
        self.factors.iter().map(|f| f.levels).product()
    }

    /// Total number of observations.
    #[must_use]
    pub fn total_observations(&self) -> usize {
        self.cells() * self.replicates
    }

    /// Number of leading nested factors.
    #[must_use]
    pub fn nested_count(&self) -> usize {
        self.factors
            .iter()
            .filter(|f| f.factor_type == FactorType::Nested)
            .count()
    }

    /// Every factor position.
    #[must_use]
    pub fn all(&self) -> FactorSet {
        (0..self.factors.len()).collect()
    }

    /// Positions of the factors forming the cell-mean table
    /// (crossed factors and the subject factor).
    #[must_use]
    pub fn cell_factors(&self) -> FactorSet {
        self.factors
            .iter()
            .filter(|f| f.factor_type != FactorType::Nested)
            .map(|f| f.position)
            .collect()
    }

    /// Positions of the random-type factors (random, nested, subject).
    #[must_use]
    pub fn random_factors(&self) -> FactorSet {
        self.factors
            .iter()
            .filter(|f| f.factor_type.is_random())
            .map(|f| f.position)
            .collect()
    }

    /// Position of the subject/block factor, if any.
    #[must_use]
    pub fn subject(&self) -> Option<usize> {
        self.factors
            .iter()
            .find(|f| f.factor_type == FactorType::Subject)
            .map(|f| f.position)
    }

    /// Product of level counts over a set of factors.
    #[must_use]
    pub fn level_product(&self, set: FactorSet) -> usize {
        set.iter().map(|p| self.factors[p].levels).product()
    }

    /// Display name of a set of factors, joined with `×`.
    #[must_use]
    pub fn set_name(&self, set: FactorSet) -> String {
        set.iter()
            .map(|p| self.factors[p].name.as_str())
            .collect::<Vec<_>>()
            .join(" × ")
    }

    /// Classify the design.
    #[must_use]
    pub fn shape(&self) -> DesignShape {
        let all_of = |t: FactorType| self.factors.iter().all(|f| f.factor_type == t);
        if self.subject().is_some() {
            DesignShape::RepeatedMeasures
        } else if self.nested_count() > 0 {
            DesignShape::Nested
        } else if all_of(FactorType::Fixed) {
            DesignShape::FullyFixed
        } else if all_of(FactorType::Random) {
            DesignShape::FullyRandom
        } else {
            DesignShape::Mixed
        }
    }
}

/// Alphabetical default name for the factor at `position`.
fn default_factor_name(position: usize) -> String {
    char::from_u32('A' as u32 + position as u32)
        .map_or_else(|| format!("F{}", position + 1), String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use FactorType::{Fixed, Nested, Random, Subject};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_factor_set_operations() {
        let a = FactorSet::single(0);
        let ab = a.with(1);
        assert_eq!(ab.len(), 2);
        assert!(a.is_subset_of(ab));
        assert!(!ab.is_subset_of(a));
        assert_eq!(ab.difference(a), FactorSet::single(1));
        assert_eq!(ab.iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_factor_set_subsets() {
        let abc: FactorSet = [0, 2, 3].into_iter().collect();
        let proper: Vec<FactorSet> = abc.proper_subsets().collect();
        assert_eq!(proper.len(), 6);
        assert!(proper.iter().all(|s| s.is_subset_of(abc) && *s != abc));
        assert_eq!(abc.subsets().count(), 8);
        assert_eq!(FactorSet::empty().subsets().count(), 1);
    }

    #[test]
    fn test_defaults_to_fixed_with_letter_names() {
        let model = FactorModel::new(&[3, 2], &[], &[], 4).unwrap();
        assert_eq!(model.factors()[0].name, "A");
        assert_eq!(model.factors()[1].name, "B");
        assert!(model.factors().iter().all(|f| f.factor_type == Fixed));
        assert_eq!(model.shape(), DesignShape::FullyFixed);
        assert_eq!(model.total_observations(), 24);
    }

    #[test]
    fn test_levels_must_be_at_least_two() {
        let err = FactorModel::new(&[3, 1], &[], &[], 2).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_nested_must_come_first() {
        let err = FactorModel::new(&[3, 2], &[Fixed, Nested], &[], 2).unwrap_err();
        assert!(err.to_string().contains("nested"));

        let model = FactorModel::new(&[3, 2, 2], &[Nested, Nested, Fixed], &[], 2).unwrap();
        assert_eq!(model.nested_count(), 2);
        assert_eq!(model.factors()[0].nested_within, [1, 2].into_iter().collect());
        assert_eq!(model.factors()[1].nested_within, FactorSet::single(2));
        assert_eq!(model.shape(), DesignShape::Nested);
    }

    #[test]
    fn test_random_limited_to_three_crossed() {
        let result = FactorModel::new(&[2, 2, 2, 2], &[Random], &[], 2);
        assert!(result.is_err());

        // Fully fixed designs have no crossed-factor limit
        assert!(FactorModel::new(&[2, 2, 2, 2], &[], &[], 2).is_ok());
    }

    #[test]
    fn test_subject_roles() {
        let model = FactorModel::new(&[3, 5, 2], &[Fixed, Subject, Fixed], &[], 1).unwrap();
        assert_eq!(model.factors()[0].subject_role, Some(SubjectRole::Within));
        assert_eq!(model.factors()[2].subject_role, Some(SubjectRole::Among));
        assert_eq!(model.factors()[1].nested_within, FactorSet::single(2));
        assert_eq!(model.shape(), DesignShape::RepeatedMeasures);
    }

    #[test]
    fn test_subject_constraints() {
        // Only one subject factor
        assert!(FactorModel::new(&[3, 4, 4], &[Fixed, Subject, Subject], &[], 1).is_err());
        // Needs a within-subject factor before it
        assert!(FactorModel::new(&[4, 3], &[Subject, Fixed], &[], 1).is_err());
        // No random crossed factors alongside it
        assert!(FactorModel::new(&[3, 4, 2], &[Fixed, Subject, Random], &[], 1).is_err());
    }

    #[test]
    fn test_unreplicated_single_factor_rejected() {
        assert!(FactorModel::new(&[4], &[], &[], 1).is_err());
        assert!(FactorModel::new(&[4, 3], &[], &[], 1).is_ok());
        assert!(FactorModel::new(&[3, 4], &[Nested], &[], 1).is_ok());
    }

    #[test]
    fn test_names_validated() {
        assert!(FactorModel::new(&[2, 2], &[], &names(&["Dose"]), 2).is_err());
        assert!(FactorModel::new(&[2, 2], &[], &names(&["Dose", "Dose"]), 2).is_err());
        let model = FactorModel::new(&[2, 2], &[], &names(&["Dose", "Site"]), 2).unwrap();
        assert_eq!(model.set_name(model.all()), "Dose × Site");
    }

    #[test]
    fn test_too_many_types() {
        assert!(FactorModel::new(&[2, 2], &[Fixed, Fixed, Fixed], &[], 2).is_err());
    }

    #[test]
    fn test_parse_factor_type() {
        assert_eq!("Measured".parse::<FactorType>().unwrap(), Random);
        assert_eq!("block".parse::<FactorType>().unwrap(), Subject);
        assert!("crossed".parse::<FactorType>().is_err());
    }

    #[test]
    fn test_shapes() {
        let mixed = FactorModel::new(&[2, 3], &[Fixed, Random], &[], 2).unwrap();
        assert_eq!(mixed.shape(), DesignShape::Mixed);
        let random = FactorModel::new(&[2, 3], &[Random, Random], &[], 2).unwrap();
        assert_eq!(random.shape(), DesignShape::FullyRandom);
        assert_eq!(random.random_factors(), random.all());
    }
}
