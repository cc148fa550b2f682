//! @acp:module "Check Command"
//! @acp:summary "Verify run-length constraints in a generated order file"
//! @acp:domain cli
//! @acp:layer handler

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Result;
use console::style;
use serde::Serialize;

use crate::config::Config;
use crate::sequence::{check_sequence, Violation};
use crate::table::RowTable;

/// Options for the check command
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Ordered CSV to verify
    pub file: PathBuf,
    /// Column separating orders (defaults to the config's group column)
    pub group_column: Option<String>,
    /// Skip the first N rows of every order (e.g. the warm-up block)
    pub skip: usize,
    /// Output as JSON
    pub json: bool,
}

/// Check result for one order in the file
#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub group: String,
    pub rows: usize,
    pub duplicates: Vec<String>,
    pub violations: Vec<Violation>,
}

impl GroupReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.violations.is_empty()
    }
}

/// Check every order in `options.file` against the configured constraints
pub fn check_file(options: &CheckOptions, config: &Config) -> crate::Result<Vec<GroupReport>> {
    let constraints = config.constraint_set()?;
    let table = RowTable::from_orders_path(&options.file, &config.table)?;
    let group_column = options
        .group_column
        .clone()
        .unwrap_or_else(|| config.group_column.clone());

    let groups = if table.headers().contains(&group_column) {
        table.groups(&group_column)
    } else {
        vec![(String::new(), table.rows().to_vec())]
    };

    let reports = groups
        .into_iter()
        .map(|(group, rows)| {
            let mut seen = HashSet::new();
            let duplicates = rows
                .iter()
                .filter(|r| !seen.insert(r.id().clone()))
                .map(|r| r.id().to_string())
                .collect();

            let checked = rows.get(options.skip..).unwrap_or_default();
            let violations = check_sequence(checked, &constraints)
                .into_iter()
                .map(|mut v| {
                    v.start += options.skip;
                    v.end += options.skip;
                    v
                })
                .collect();

            GroupReport {
                group,
                rows: rows.len(),
                duplicates,
                violations,
            }
        })
        .collect();

    Ok(reports)
}

/// Execute the check command
pub fn execute_check(options: CheckOptions, config: Config) -> Result<()> {
    let reports = check_file(&options, &config)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            let label = if report.group.is_empty() {
                options.file.display().to_string()
            } else {
                format!("order {}", report.group)
            };

            if report.is_clean() {
                println!("{} {} ({} rows)", style("✓").green(), label, report.rows);
                continue;
            }

            println!("{} {} ({} rows)", style("✗").red(), label, report.rows);
            for id in &report.duplicates {
                println!("  duplicate item: {}", id);
            }
            for violation in &report.violations {
                println!("  {}", violation);
            }
        }
    }

    let failed = reports.iter().filter(|r| !r.is_clean()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} order(s) violate the constraints", failed, reports.len());
    }
    Ok(())
}
