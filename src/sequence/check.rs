//! Run-length verification of finished sequences.

use std::fmt;

use serde::Serialize;

use crate::constraints::ConstraintSet;
use crate::row::Row;

/// A run of one present value that is longer than its constraint allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub property: String,
    pub value: String,
    pub run_length: usize,
    pub max_run: usize,
    /// Sequence position (0-based) of the first row in the run.
    pub start: usize,
    /// Sequence position of the last row in the run.
    pub end: usize,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={} repeats {} times (max {}) at rows {}..={}",
            self.property, self.value, self.run_length, self.max_run, self.start + 1, self.end + 1
        )
    }
}

struct Run<'a> {
    value: &'a str,
    len: usize,
    start: usize,
    end: usize,
}

/// Every maximal over-long run in `rows`, property by property.
///
/// Uses the same absence rule as the builder: rows without a present value
/// for a property are skipped, so they neither end nor extend its run.
pub fn check_sequence(rows: &[Row], constraints: &ConstraintSet) -> Vec<Violation> {
    let mut violations = Vec::new();

    for constraint in constraints.iter() {
        let mut current: Option<Run<'_>> = None;

        let close = |run: Run<'_>, violations: &mut Vec<Violation>| {
            if run.len > constraint.max_run {
                violations.push(Violation {
                    property: constraint.property.to_string(),
                    value: run.value.to_string(),
                    run_length: run.len,
                    max_run: constraint.max_run,
                    start: run.start,
                    end: run.end,
                });
            }
        };

        for (pos, value) in rows
            .iter()
            .enumerate()
            .filter_map(|(pos, row)| row.get(constraint.property).map(|v| (pos, v)))
        {
            match current.as_mut() {
                Some(run) if run.value == value => {
                    run.len += 1;
                    run.end = pos;
                }
                _ => {
                    if let Some(run) = current.take() {
                        close(run, &mut violations);
                    }
                    current = Some(Run {
                        value,
                        len: 1,
                        start: pos,
                        end: pos,
                    });
                }
            }
        }

        if let Some(run) = current {
            close(run, &mut violations);
        }
    }

    violations
}
