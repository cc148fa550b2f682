//! Constraint text files.
//!
//! One bound per line:
//!
//! ```text
//! # comments and blank lines are skipped
//! Constraint ExpCondition 2
//! Constraint Type 2
//! ```
//!
//! Lines starting with any other keyword are ignored.

use std::path::Path;

use super::ConstraintSet;
use crate::error::{ConfigError, Result};

const KEYWORD: &str = "Constraint";

/// Parse the contents of a constraints file.
pub fn parse_constraint_file(content: &str) -> std::result::Result<ConstraintSet, ConfigError> {
    let mut set = ConstraintSet::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens[0] != KEYWORD {
            continue;
        }

        let &[_, property, max_run] = tokens.as_slice() else {
            return Err(ConfigError::MalformedConstraintLine {
                line: idx + 1,
                content: trimmed.to_string(),
            });
        };

        let max_run: i64 = max_run.parse().map_err(|_| ConfigError::InvalidMaxRun {
            property: property.to_string(),
            value: max_run.to_string(),
        })?;

        set.insert(property, max_run)?;
    }

    Ok(set)
}

/// Read and parse a constraints file from disk.
pub fn read_constraint_file<P: AsRef<Path>>(path: P) -> Result<ConstraintSet> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_constraint_file(&content)?)
}
