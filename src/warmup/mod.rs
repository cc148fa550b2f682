//! @acp:module "Warm-up Selection"
//! @acp:summary "Anchor row, warm-up block and full-list ordering on top of the builder"
//! @acp:domain scheduling
//! @acp:layer service
//!
//! One order is built in three steps:
//! 1. The anchor row is drawn from the rows matching the anchor filters with
//!    a fixed seed, so every order of a list opens with the same trial.
//! 2. A short warm-up block is drawn from the warm-up pool (fillers by
//!    default) under its own, usually stricter, constraint set.
//! 3. Every remaining row is placed under the main constraint set.
//!
//! Several orders of the same list each get their own seed from a master
//! stream and are labeled with a 1-based order index.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constraints::ConstraintSet;
use crate::error::{ConfigError, Result};
use crate::row::{matches_all, Row, RowFilter};
use crate::sequence::{SequenceBuilder, DEFAULT_RETRY_LIMIT};

/// Seed of the anchor draw when none is configured.
pub const DEFAULT_ANCHOR_SEED: u64 = 42;

fn default_anchor_seed() -> u64 {
    DEFAULT_ANCHOR_SEED
}

fn default_filler_filters() -> Vec<RowFilter> {
    vec![RowFilter::contains("Type", "Filler")]
}

fn default_warmup_count() -> usize {
    1
}

fn default_warmup_retry_limit() -> u32 {
    10
}

fn default_retry_limit() -> u32 {
    DEFAULT_RETRY_LIMIT
}

fn default_warmup_constraints() -> ConstraintSet {
    // Type only needs to be >= the block length here
    ConstraintSet::from_bounds([("ExpCondition", 1), ("Type", 3), ("HasQuestion", 1), ("Answer", 2)])
}

/// Which rows may open every order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorSpec {
    #[serde(default = "default_filler_filters")]
    pub filters: Vec<RowFilter>,

    #[serde(default = "default_anchor_seed")]
    pub seed: u64,
}

impl Default for AnchorSpec {
    fn default() -> Self {
        Self {
            filters: default_filler_filters(),
            seed: DEFAULT_ANCHOR_SEED,
        }
    }
}

/// The short block placed right after the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmupSpec {
    #[serde(default = "default_filler_filters")]
    pub filters: Vec<RowFilter>,

    #[serde(default = "default_warmup_count")]
    pub count: usize,

    #[serde(default = "default_warmup_constraints")]
    pub constraints: ConstraintSet,

    #[serde(default = "default_warmup_retry_limit")]
    pub retry_limit: u32,
}

impl Default for WarmupSpec {
    fn default() -> Self {
        Self {
            filters: default_filler_filters(),
            count: default_warmup_count(),
            constraints: default_warmup_constraints(),
            retry_limit: default_warmup_retry_limit(),
        }
    }
}

/// Everything needed to turn a row table into one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlan {
    #[serde(default)]
    pub anchor: AnchorSpec,

    #[serde(default)]
    pub warmup: WarmupSpec,

    /// Constraints for the main block.
    #[serde(default)]
    pub constraints: ConstraintSet,

    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,
}

impl Default for OrderPlan {
    fn default() -> Self {
        Self {
            anchor: AnchorSpec::default(),
            warmup: WarmupSpec::default(),
            constraints: ConstraintSet::new(),
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }
}

impl OrderPlan {
    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }
}

/// One generated order with its 1-based index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledOrder {
    pub index: usize,
    pub rows: Vec<Row>,
}

/// Deterministically pick the anchor row; the draw ignores the caller's rng.
pub fn select_anchor<'r>(rows: &'r [Row], anchor: &AnchorSpec) -> Result<&'r Row> {
    let candidates: Vec<&Row> = rows.iter().filter(|r| matches_all(&anchor.filters, r)).collect();
    if candidates.is_empty() {
        return Err(ConfigError::NoAnchorCandidate.into());
    }

    let mut rng = ChaCha8Rng::seed_from_u64(anchor.seed);
    Ok(candidates[rng.random_range(0..candidates.len())])
}

fn without(rows: &[Row], placed: &[Row]) -> Vec<Row> {
    let used: HashSet<_> = placed.iter().map(Row::id).collect();
    rows.iter()
        .filter(|r| !used.contains(r.id()))
        .cloned()
        .collect()
}

/// Build one complete order of `rows` following `plan`.
pub fn generate_order<R: Rng + ?Sized>(
    rows: &[Row],
    plan: &OrderPlan,
    rng: &mut R,
    context: &str,
) -> Result<Vec<Row>> {
    let anchor = select_anchor(rows, &plan.anchor)?;
    debug!(context, anchor = %anchor.id(), "selected anchor row");
    let mut sequence = vec![anchor.clone()];

    if plan.warmup.count > 0 {
        let pool: Vec<Row> = without(rows, &sequence)
            .into_iter()
            .filter(|r| matches_all(&plan.warmup.filters, r))
            .collect();

        sequence = SequenceBuilder::new(plan.warmup.retry_limit)
            .with_context(format!("{context} (warm-up)"))
            .extend(
                &pool,
                &sequence,
                &plan.warmup.constraints,
                plan.warmup.count,
                rng,
            )?;
    }

    let remaining = without(rows, &sequence);
    SequenceBuilder::new(plan.retry_limit)
        .with_context(context)
        .extend(
            &remaining,
            &sequence,
            &plan.constraints,
            remaining.len(),
            rng,
        )
}

/// Build `n_orders` independent orders of the same rows.
///
/// Order `k` draws from its own `ChaCha8Rng`, seeded from a master stream
/// started at `seed`, so results do not depend on how many draws earlier
/// orders needed.
pub fn generate_orders(
    rows: &[Row],
    plan: &OrderPlan,
    n_orders: usize,
    seed: u64,
    context: &str,
) -> Result<Vec<LabeledOrder>> {
    if n_orders == 0 {
        return Err(ConfigError::ZeroOrders.into());
    }

    let mut master = ChaCha8Rng::seed_from_u64(seed);
    let mut orders = Vec::with_capacity(n_orders);

    for index in 1..=n_orders {
        let mut rng = ChaCha8Rng::seed_from_u64(master.random::<u64>());
        let label = format!("{context}, order {index}");
        let order = generate_order(rows, plan, &mut rng, &label)?;
        info!(context, order = index, rows = order.len(), "order generated");
        orders.push(LabeledOrder { index, rows: order });
    }

    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::validate_constraints;
    use crate::sequence::check_sequence;

    fn trial_list() -> Vec<Row> {
        let mut rows = Vec::new();
        for i in 0..12 {
            let row = Row::new(format!("F{i}"))
                .with("Type", "Filler")
                .with("ExpCondition", format!("Filler{}", i % 3));
            rows.push(if i % 2 == 0 {
                row.with("HasQuestion", "Yes")
                    .with("Answer", if (i / 2) % 2 == 0 { "True" } else { "False" })
            } else {
                row.with("HasQuestion", "No").with_absent("Answer")
            });
        }
        for i in 0..12 {
            let row = Row::new(format!("I{i}"))
                .with("Type", "Item")
                .with("ExpCondition", if i % 2 == 0 { "High" } else { "Low" });
            rows.push(if (i / 2) % 2 == 0 {
                row.with("HasQuestion", "Yes")
                    .with("Answer", if i % 3 == 0 { "True" } else { "False" })
            } else {
                row.with("HasQuestion", "No").with_absent("Answer")
            });
        }
        rows
    }

    fn main_constraints() -> ConstraintSet {
        validate_constraints([
            ("ExpCondition", 2),
            ("Type", 2),
            ("HasQuestion", 3),
            ("Answer", 3),
        ])
        .unwrap()
    }

    #[test]
    fn test_anchor_is_stable_across_calls() {
        let rows = trial_list();
        let spec = AnchorSpec::default();
        let a = select_anchor(&rows, &spec).unwrap();
        let b = select_anchor(&rows, &spec).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.get("Type"), Some("Filler"));
    }

    #[test]
    fn test_anchor_requires_candidate() {
        let rows = vec![Row::new(1).with("Type", "Item")];
        let err = select_anchor(&rows, &AnchorSpec::default()).unwrap_err();
        assert_eq!(err.as_config(), Some(&ConfigError::NoAnchorCandidate));
    }

    #[test]
    fn test_order_opens_with_anchor_and_fillers() {
        let rows = trial_list();
        let plan = OrderPlan {
            warmup: WarmupSpec {
                count: 2,
                ..WarmupSpec::default()
            },
            ..OrderPlan::default()
        }
        .with_constraints(main_constraints());

        let anchor = select_anchor(&rows, &plan.anchor).unwrap().id().clone();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let order = generate_order(&rows, &plan, &mut rng, "list").unwrap();

        assert_eq!(order.len(), rows.len());
        assert_eq!(order[0].id(), &anchor);
        assert!(order[..3].iter().all(|r| r.get("Type") == Some("Filler")));
        // Anchor plus two warm-up fillers is a run of three on Type
        assert!(check_sequence(&order[1..], &plan.constraints).is_empty());
    }

    #[test]
    fn test_orders_share_anchor_but_differ() {
        let rows = trial_list();
        let plan = OrderPlan::default().with_constraints(main_constraints());

        let orders = generate_orders(&rows, &plan, 4, 42, "list").unwrap();
        assert_eq!(orders.len(), 4);
        assert_eq!(
            orders.iter().map(|o| o.index).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );

        let first_ids: HashSet<_> = orders.iter().map(|o| o.rows[0].id().clone()).collect();
        assert_eq!(first_ids.len(), 1);

        let distinct: HashSet<Vec<String>> = orders
            .iter()
            .map(|o| o.rows.iter().map(|r| r.id().to_string()).collect())
            .collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_zero_orders_rejected() {
        let rows = trial_list();
        let plan = OrderPlan::default().with_constraints(main_constraints());

        let err = generate_orders(&rows, &plan, 0, 42, "list").unwrap_err();
        assert_eq!(err.as_config(), Some(&ConfigError::ZeroOrders));
    }

    #[test]
    fn test_orders_are_reproducible() {
        let rows = trial_list();
        let plan = OrderPlan::default().with_constraints(main_constraints());

        let a = generate_orders(&rows, &plan, 3, 7, "list").unwrap();
        let b = generate_orders(&rows, &plan, 3, 7, "list").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_plan_deserializes_with_defaults() {
        let plan: OrderPlan = serde_json::from_str(r#"{"constraints": {"Type": 2}}"#).unwrap();
        assert_eq!(plan.retry_limit, DEFAULT_RETRY_LIMIT);
        assert_eq!(plan.warmup.count, 1);
        assert_eq!(plan.warmup.constraints.len(), 4);
        assert_eq!(plan.warmup.constraints.get("ExpCondition"), Some(1));
        assert_eq!(plan.warmup.constraints.get("Type"), Some(3));
        assert_eq!(plan.anchor.seed, DEFAULT_ANCHOR_SEED);
        assert_eq!(plan.constraints.get("Type"), Some(2));
    }
}
