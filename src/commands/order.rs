//! @acp:module "Order Command"
//! @acp:summary "Pseudorandomize a batch of trial lists"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `stimorder order`. Every input file is handled on its own:
//! a failure is reported for that file and the rest of the batch carries on.

use std::path::{Path, PathBuf};

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ConfigError;
use crate::table::{discover_inputs, output_path, write_orders_to_path, RowTable};
use crate::warmup::{generate_orders, OrderPlan};

/// Options for the order command
#[derive(Debug, Clone, Default)]
pub struct OrderOptions {
    /// Input CSV files or directories of CSV files
    pub inputs: Vec<PathBuf>,
    /// Orders per file (overrides config)
    pub orders: Option<usize>,
    /// Base seed (overrides config)
    pub seed: Option<u64>,
    /// Main-block retry limit (overrides config)
    pub retry_limit: Option<u32>,
    /// Constraints file (overrides config)
    pub constraints_file: Option<PathBuf>,
}

/// Result of ordering one input file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub orders: usize,
    pub rows: usize,
}

/// Summary of a batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: Vec<FileOutcome>,
    pub failed: Vec<(PathBuf, crate::Error)>,
}

/// Read, order and write one list. Nothing is written unless every order succeeds.
pub fn order_file(
    input: &Path,
    config: &Config,
    plan: &OrderPlan,
    n_orders: usize,
    seed: u64,
) -> crate::Result<FileOutcome> {
    let table = RowTable::from_path(input, &config.table)?;
    let context = input.display().to_string();

    let orders = generate_orders(table.rows(), plan, n_orders, seed, &context)?;

    let output = output_path(input, &config.output_suffix);
    write_orders_to_path(
        &output,
        table.headers(),
        &config.table.id_column,
        &config.group_column,
        &orders,
    )?;

    Ok(FileOutcome {
        input: input.to_path_buf(),
        output,
        orders: orders.len(),
        rows: table.len(),
    })
}

/// Order every file, in parallel, without letting one failure stop the rest.
///
/// File `i` (in discovery order) uses seed `seed + i`.
pub fn order_batch(files: &[PathBuf], config: &Config, plan: &OrderPlan) -> BatchSummary {
    let progress = ProgressBar::new(files.len() as u64);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} files {msg}")
    {
        progress.set_style(bar_style.progress_chars("=>-"));
    }

    let results: Vec<(PathBuf, crate::Result<FileOutcome>)> = files
        .par_iter()
        .enumerate()
        .map(|(idx, file)| {
            let seed = config.seed.wrapping_add(idx as u64);
            let result = order_file(file, config, plan, config.orders, seed);
            progress.inc(1);
            (file.clone(), result)
        })
        .collect();

    progress.finish_and_clear();

    let mut summary = BatchSummary::default();
    for (file, result) in results {
        match result {
            Ok(outcome) => {
                info!(file = %file.display(), orders = outcome.orders, "file ordered");
                summary.succeeded.push(outcome);
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "file failed");
                summary.failed.push((file, e));
            }
        }
    }
    summary
}

/// Execute the order command
pub fn execute_order(options: OrderOptions, mut config: Config) -> Result<BatchSummary> {
    if let Some(orders) = options.orders {
        config.orders = orders;
    }
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    if let Some(limit) = options.retry_limit {
        config.retry_limit = limit;
    }
    if options.constraints_file.is_some() {
        config.constraints_file = options.constraints_file.clone();
    }

    if config.orders == 0 {
        return Err(ConfigError::ZeroOrders.into());
    }

    let plan = config.order_plan()?;
    let files = discover_inputs(&options.inputs, &config.output_suffix)?;
    if files.is_empty() {
        anyhow::bail!("no CSV files found in the given inputs");
    }

    println!(
        "{} Pseudorandomizing {} file(s), {} order(s) each...",
        style("→").cyan(),
        files.len(),
        config.orders
    );

    let summary = order_batch(&files, &config, &plan);

    for outcome in &summary.succeeded {
        println!(
            "{} {} -> {} ({} rows x {} orders)",
            style("✓").green(),
            outcome.input.display(),
            outcome.output.display(),
            outcome.rows,
            outcome.orders
        );
    }
    for (file, error) in &summary.failed {
        eprintln!("{} {}: {}", style("✗").red(), file.display(), error);
    }

    if !summary.failed.is_empty() {
        anyhow::bail!(
            "{} of {} file(s) could not be pseudorandomized",
            summary.failed.len(),
            files.len()
        );
    }

    println!("{} All files were successfully pseudorandomized", style("✓").green());
    Ok(summary)
}
