//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Provides implementations for all CLI commands.
//! Each command is in its own submodule for maintainability.

pub mod check;
pub mod constraints;
pub mod init;
pub mod order;

pub use check::{check_file, execute_check, CheckOptions, GroupReport};
pub use constraints::{execute_constraints, ConstraintsOptions};
pub use init::{execute_init, InitOptions};
pub use order::{execute_order, order_batch, order_file, BatchSummary, FileOutcome, OrderOptions};
