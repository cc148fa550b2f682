//! @acp:module "Constraints"
//! @acp:summary "Maximum-consecutive-repetition bounds per tracked property"
//! @acp:domain scheduling
//! @acp:layer model
//! @acp:stability stable
//!
//! A constraint caps how many consecutive rows may share the same present
//! value of one property. Constraints are conjunctive, so evaluation order
//! does not change eligibility; the set is kept sorted only to make logs and
//! output stable.
//!
//! Constraint sets come from three places:
//! - the `constraints` map of the project config
//! - a constraints text file (`Constraint <property> <max_run>` per line)
//! - built-in warm-up defaults

mod file;

pub use file::{parse_constraint_file, read_constraint_file};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A single `(property, max_run)` bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraint<'a> {
    pub property: &'a str,
    pub max_run: usize,
}

/// Validated mapping from property name to maximum run length (`>= 1`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, i64>", into = "BTreeMap<String, usize>")]
pub struct ConstraintSet {
    bounds: BTreeMap<String, usize>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set built from literal, already positive bounds.
    pub(crate) fn from_bounds<const N: usize>(bounds: [(&str, usize); N]) -> Self {
        Self {
            bounds: bounds
                .into_iter()
                .map(|(property, max_run)| (property.to_string(), max_run))
                .collect(),
        }
    }

    pub fn get(&self, property: &str) -> Option<usize> {
        self.bounds.get(property).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Constraint<'_>> {
        self.bounds.iter().map(|(property, &max_run)| Constraint {
            property,
            max_run,
        })
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Add one bound. Re-adding the same value is a no-op.
    pub fn insert(&mut self, property: &str, max_run: i64) -> Result<(), ConfigError> {
        let max_run = positive(property, max_run)?;
        match self.bounds.get(property) {
            Some(&existing) if existing != max_run => Err(ConfigError::ConflictingMaxRun {
                property: property.to_string(),
                first: existing,
                second: max_run,
            }),
            Some(_) => Ok(()),
            None => {
                self.bounds.insert(property.to_string(), max_run);
                Ok(())
            }
        }
    }
}

fn positive(property: &str, value: i64) -> Result<usize, ConfigError> {
    if value < 1 {
        return Err(ConfigError::InvalidMaxRun {
            property: property.to_string(),
            value: value.to_string(),
        });
    }
    usize::try_from(value).map_err(|_| ConfigError::InvalidMaxRun {
        property: property.to_string(),
        value: value.to_string(),
    })
}

/// Build a [`ConstraintSet`] from raw `(property, max_run)` pairs.
///
/// Fails on a non-positive bound or a property repeated with a different
/// bound. Properties that no row carries are legal and simply never exclude.
pub fn validate_constraints<I, K>(spec: I) -> Result<ConstraintSet, ConfigError>
where
    I: IntoIterator<Item = (K, i64)>,
    K: AsRef<str>,
{
    let mut set = ConstraintSet::new();
    for (property, max_run) in spec {
        set.insert(property.as_ref(), max_run)?;
    }
    Ok(set)
}

impl TryFrom<BTreeMap<String, i64>> for ConstraintSet {
    type Error = ConfigError;

    fn try_from(map: BTreeMap<String, i64>) -> Result<Self, Self::Error> {
        validate_constraints(map)
    }
}

impl From<ConstraintSet> for BTreeMap<String, usize> {
    fn from(set: ConstraintSet) -> Self {
        set.bounds
    }
}
