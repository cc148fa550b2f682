//! @acp:module "Constraints Command"
//! @acp:summary "Validate and show the effective constraint sets"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::Result;
use console::style;
use serde::Serialize;

use crate::config::Config;
use crate::constraints::ConstraintSet;

/// Options for the constraints command
#[derive(Debug, Clone, Default)]
pub struct ConstraintsOptions {
    /// Constraints file (overrides config)
    pub file: Option<PathBuf>,
    /// Output as JSON
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct EffectiveConstraints<'a> {
    warmup: &'a ConstraintSet,
    main: &'a ConstraintSet,
}

/// Execute the constraints command
pub fn execute_constraints(options: ConstraintsOptions, mut config: Config) -> Result<()> {
    if options.file.is_some() {
        config.constraints_file = options.file;
    }

    let main = config.constraint_set()?;

    if options.json {
        let out = EffectiveConstraints {
            warmup: &config.warmup.constraints,
            main: &main,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} Constraints are valid", style("✓").green());
    print_set("Warm-up", &config.warmup.constraints);
    print_set("Main", &main);
    Ok(())
}

fn print_set(title: &str, set: &ConstraintSet) {
    println!("{} ({}):", style(title).bold(), set.len());
    if set.is_empty() {
        println!("  {}", style("(none)").dim());
    }
    for c in set.iter() {
        println!("  {:<16} max run {}", c.property, c.max_run);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_conflicting_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("constraints.txt");
        std::fs::write(&path, "Constraint Type 2\nConstraint Type 5\n").unwrap();

        let options = ConstraintsOptions {
            file: Some(path),
            json: true,
        };
        assert!(execute_constraints(options, Config::default()).is_err());
    }

    #[test]
    fn test_file_may_relax_default_bounds() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("constraints.txt");
        // Differs from the built-in Type bound
        std::fs::write(&path, "Constraint Type 3\nConstraint Region 1\n").unwrap();

        let options = ConstraintsOptions {
            file: Some(path),
            json: false,
        };
        execute_constraints(options, Config::default()).unwrap();
    }
}
