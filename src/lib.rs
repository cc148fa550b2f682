#![forbid(unsafe_code)]

//! @acp:module "stimorder Library"
//! @acp:summary "Constrained pseudorandomization of experimental trial lists"
//! @acp:domain scheduling
//! @acp:layer api
//! @acp:stability stable
//!
//! # stimorder
//!
//! Generates trial orders for psycholinguistic experiments in which no
//! tracked property (condition, trial type, question presence, answer)
//! repeats more often in a row than allowed.
//!
//! ## Features
//!
//! - **Run-length constraints**: per-property caps, with "not applicable"
//!   values ignored when counting runs
//! - **Warm-up block**: every order opens with the same anchor row followed
//!   by a short block of fillers
//! - **Reproducible**: all randomness flows from explicit seeds
//! - **Batch mode**: many lists, many orders per list, one failure per file
//!
//! ## Example
//!
//! ```rust,no_run
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use stimorder::{validate_constraints, Row, SequenceBuilder};
//!
//! fn main() -> stimorder::Result<()> {
//!     let pool: Vec<Row> = ["A", "A", "A", "B", "B", "B"]
//!         .iter()
//!         .enumerate()
//!         .map(|(i, c)| Row::new(i).with("Condition", *c))
//!         .collect();
//!     let constraints = validate_constraints([("Condition", 2)])?;
//!
//!     let mut rng = ChaCha8Rng::seed_from_u64(42);
//!     let order = SequenceBuilder::new(500).extend(&pool, &[], &constraints, 6, &mut rng)?;
//!     assert_eq!(order.len(), 6);
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod constraints;
pub mod error;
pub mod row;
pub mod sequence;
pub mod table;
pub mod warmup;

// Re-exports
pub use config::Config;
pub use constraints::{parse_constraint_file, validate_constraints, Constraint, ConstraintSet};
pub use error::{ConfigError, Error, Result};
pub use row::{FilterOp, ItemId, PropertyValue, Row, RowFilter};
pub use sequence::{check_sequence, extend, SequenceBuilder, Violation, DEFAULT_RETRY_LIMIT};
pub use table::{RowTable, TableOptions};
pub use warmup::{
    generate_order, generate_orders, select_anchor, AnchorSpec, LabeledOrder, OrderPlan,
    WarmupSpec,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
