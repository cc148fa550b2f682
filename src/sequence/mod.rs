//! @acp:module "Sequence Builder"
//! @acp:summary "Extend an ordered trial sequence under run-length constraints"
//! @acp:domain scheduling
//! @acp:layer logic
//!
//! Rows are drawn one at a time from the pool. Before each draw, every
//! constraint `(p, m)` looks at the last `m` *present* values of `p` in the
//! sequence; if there are `m` of them and they are all equal, rows carrying
//! that value are ineligible. Absent values are skipped when forming the
//! window, so they neither break nor extend a run.
//!
//! A dead end (no eligible row) throws away everything placed during the
//! call and starts over from the original prefix and pool. After
//! `retry_limit` dead ends the call fails.

mod check;

pub use check::{check_sequence, Violation};

use std::collections::HashSet;

use rand::Rng;
use tracing::{debug, trace};

use crate::constraints::ConstraintSet;
use crate::error::{ConfigError, Error, Result};
use crate::row::Row;

/// Retry ceiling used when none is configured.
pub const DEFAULT_RETRY_LIMIT: u32 = 500;

/// Appends rows to a sequence with bounded full-restart retries.
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    retry_limit: u32,
    context: String,
}

impl Default for SequenceBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_LIMIT)
    }
}

impl SequenceBuilder {
    pub fn new(retry_limit: u32) -> Self {
        Self {
            retry_limit,
            context: "sequence".to_string(),
        }
    }

    /// Label reported in errors and logs (file name, order index, block).
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Append exactly `count` rows from `pool` onto `sequence`.
    ///
    /// The prefix is assumed to satisfy `constraints` already. Returns the
    /// prefix followed by the new rows; on failure nothing is returned and
    /// the caller must not persist partial work.
    pub fn extend<R: Rng + ?Sized>(
        &self,
        pool: &[Row],
        sequence: &[Row],
        constraints: &ConstraintSet,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Row>> {
        self.validate_request(pool, sequence, count)?;

        let mut dead_ends = 0u32;

        'attempt: loop {
            let mut remaining: Vec<&Row> = pool.iter().collect();
            let mut placed: Vec<&Row> = sequence.iter().collect();

            for _ in 0..count {
                let eligible = eligible_indices(&remaining, &placed, constraints);

                if eligible.is_empty() {
                    dead_ends += 1;
                    if dead_ends >= self.retry_limit {
                        return Err(Error::Pseudorandomization {
                            context: self.context.clone(),
                            attempts: dead_ends,
                        });
                    }
                    debug!(
                        context = %self.context,
                        placed = placed.len() - sequence.len(),
                        attempt = dead_ends + 1,
                        "dead end, restarting from scratch"
                    );
                    continue 'attempt;
                }

                let pick = eligible[rng.random_range(0..eligible.len())];
                let row = remaining.remove(pick);
                trace!(context = %self.context, item = %row.id(), "placed row");
                placed.push(row);
            }

            debug!(
                context = %self.context,
                added = count,
                restarts = dead_ends,
                "extension complete"
            );
            return Ok(placed.into_iter().cloned().collect());
        }
    }

    fn validate_request(&self, pool: &[Row], sequence: &[Row], count: usize) -> Result<()> {
        if self.retry_limit == 0 {
            return Err(ConfigError::ZeroRetryLimit.into());
        }
        if count > pool.len() {
            return Err(ConfigError::CountExceedsPool {
                requested: count,
                available: pool.len(),
            }
            .into());
        }

        let mut seen = HashSet::with_capacity(pool.len() + sequence.len());
        for row in sequence.iter().chain(pool) {
            if !seen.insert(row.id()) {
                return Err(ConfigError::DuplicateItem(row.id().to_string()).into());
            }
        }
        Ok(())
    }
}

/// Free-function form of [`SequenceBuilder::extend`].
pub fn extend<R: Rng + ?Sized>(
    pool: &[Row],
    sequence: &[Row],
    constraints: &ConstraintSet,
    count: usize,
    retry_limit: u32,
    rng: &mut R,
) -> Result<Vec<Row>> {
    SequenceBuilder::new(retry_limit).extend(pool, sequence, constraints, count, rng)
}

/// The value of `property` that has reached its cap at the end of `placed`.
///
/// Looks at the trailing `max_run` present values only; rows where the
/// property is absent are skipped.
fn saturated_value<'r>(placed: &[&'r Row], property: &str, max_run: usize) -> Option<&'r str> {
    let mut window = placed
        .iter()
        .rev()
        .filter_map(|&row| row.get(property))
        .take(max_run);

    let first = window.next()?;
    let mut len = 1;
    for value in window {
        if value != first {
            return None;
        }
        len += 1;
    }
    (len >= max_run).then_some(first)
}

/// Indices into `remaining` of rows that may be placed next.
fn eligible_indices(remaining: &[&Row], placed: &[&Row], constraints: &ConstraintSet) -> Vec<usize> {
    let blocked: Vec<(&str, &str)> = constraints
        .iter()
        .filter_map(|c| saturated_value(placed, c.property, c.max_run).map(|v| (c.property, v)))
        .collect();

    remaining
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            blocked
                .iter()
                .all(|&(property, value)| row.get(property) != Some(value))
        })
        .map(|(idx, _)| idx)
        .collect()
}
