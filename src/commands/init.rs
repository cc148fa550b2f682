//! @acp:module "Init Command"
//! @acp:summary "Write a default stimorder config"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Implements `stimorder init`.

use std::path::PathBuf;

use anyhow::Result;
use console::style;

use crate::config::{Config, CONFIG_FILE};

/// Options for the init command
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Where to write the config
    pub path: PathBuf,
    /// Force overwrite existing config
    pub force: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(CONFIG_FILE),
            force: false,
        }
    }
}

/// Execute the init command
pub fn execute_init(options: InitOptions) -> Result<()> {
    if options.path.exists() && !options.force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            options.path.display()
        );
    }

    let config = Config::default();
    config.save(&options.path)?;

    println!("{} Created {}", style("✓").green(), options.path.display());
    println!("  Constraints:");
    for c in config.constraints.iter() {
        println!("    {} <= {}", c.property, c.max_run);
    }
    println!("  Edit the file, then run 'stimorder order <lists>'");

    Ok(())
}
