//! @acp:module "Rows"
//! @acp:summary "Trial rows with an identifier and named categorical properties"
//! @acp:domain scheduling
//! @acp:layer model
//!
//! A [`Row`] is one trial to be scheduled. Properties are looked up by name
//! so new columns need no recompilation. A property may be explicitly
//! [`PropertyValue::Absent`] ("not applicable"), which the run-length rules
//! treat as invisible.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Unique trial identifier (the `ItemNum` column by default).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

macro_rules! item_id_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for ItemId {
            fn from(n: $t) -> Self {
                Self(n.to_string())
            }
        })*
    };
}

item_id_from_int!(i32, i64, u32, u64, usize);

/// Value of one property on one row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    Present(String),
    /// Not applicable for this row; never part of a run.
    Absent,
}

impl PropertyValue {
    pub fn as_present(&self) -> Option<&str> {
        match self {
            PropertyValue::Present(v) => Some(v),
            PropertyValue::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PropertyValue::Absent)
    }
}

/// One schedulable trial. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: ItemId,
    properties: BTreeMap<String, PropertyValue>,
    /// Source cells in header order, kept verbatim for output.
    record: Vec<String>,
}

impl Row {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            properties: BTreeMap::new(),
            record: Vec::new(),
        }
    }

    /// Builder: set a present property value.
    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties
            .insert(property.into(), PropertyValue::Present(value.into()));
        self
    }

    /// Builder: mark a property as absent.
    pub fn with_absent(mut self, property: impl Into<String>) -> Self {
        self.properties.insert(property.into(), PropertyValue::Absent);
        self
    }

    pub(crate) fn with_record(mut self, record: Vec<String>) -> Self {
        self.record = record;
        self
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Present value of `property`; `None` when absent or not a column.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).and_then(PropertyValue::as_present)
    }

    pub fn value(&self, property: &str) -> Option<&PropertyValue> {
        self.properties.get(property)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn record(&self) -> &[String] {
        &self.record
    }
}

/// Comparison used by a [`RowFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    Equals,
    NotEquals,
    Contains,
}

/// Predicate over one property of a row, e.g. `Type contains "Filler"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    pub property: String,
    pub op: FilterOp,
    pub value: String,
}

impl RowFilter {
    pub fn equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            op: FilterOp::Equals,
            value: value.into(),
        }
    }

    pub fn contains(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            op: FilterOp::Contains,
            value: value.into(),
        }
    }

    /// Absent values only satisfy `NotEquals`.
    pub fn matches(&self, row: &Row) -> bool {
        match (self.op, row.get(&self.property)) {
            (FilterOp::Equals, Some(v)) => v == self.value,
            (FilterOp::Contains, Some(v)) => v.contains(&self.value),
            (FilterOp::NotEquals, Some(v)) => v != self.value,
            (FilterOp::NotEquals, None) => true,
            (_, None) => false,
        }
    }
}

/// True when every filter matches (an empty filter list matches everything).
pub fn matches_all(filters: &[RowFilter], row: &Row) -> bool {
    filters.iter().all(|f| f.matches(row))
}

/// Parses `Prop=value`, `Prop!=value` or `Prop~value` (contains).
impl FromStr for RowFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (property, op, value) = if let Some((p, v)) = s.split_once("!=") {
            (p, FilterOp::NotEquals, v)
        } else if let Some((p, v)) = s.split_once('~') {
            (p, FilterOp::Contains, v)
        } else if let Some((p, v)) = s.split_once('=') {
            (p, FilterOp::Equals, v)
        } else {
            return Err(ConfigError::InvalidFilter(s.to_string()));
        };

        let property = property.trim();
        if property.is_empty() {
            return Err(ConfigError::InvalidFilter(s.to_string()));
        }

        Ok(Self {
            property: property.to_string(),
            op,
            value: value.trim().to_string(),
        })
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            FilterOp::Equals => "=",
            FilterOp::NotEquals => "!=",
            FilterOp::Contains => "~",
        };
        write!(f, "{}{}{}", self.property, op, self.value)
    }
}
