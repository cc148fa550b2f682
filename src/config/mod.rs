//! @acp:module "Configuration"
//! @acp:summary "Project configuration loading and defaults"
//! @acp:domain cli
//! @acp:layer config

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constraints::{read_constraint_file, ConstraintSet};
use crate::table::TableOptions;
use crate::warmup::{AnchorSpec, OrderPlan, WarmupSpec};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = ".stimorder.config.json";

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_constraints() -> ConstraintSet {
    ConstraintSet::from_bounds([("ExpCondition", 2), ("Type", 2), ("HasQuestion", 3), ("Answer", 3)])
}

fn default_retry_limit() -> u32 {
    crate::sequence::DEFAULT_RETRY_LIMIT
}

fn default_seed() -> u64 {
    42
}

fn default_orders() -> usize {
    1
}

fn default_group_column() -> String {
    "Group".to_string()
}

fn default_output_suffix() -> String {
    "_pseudorandomized".to_string()
}

/// @acp:summary "Main stimorder configuration structure"
/// @acp:lock normal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Config format version
    #[serde(default = "default_version")]
    pub version: String,

    /// How CSV cells become row properties
    #[serde(flatten)]
    pub table: TableOptions,

    /// Main-block constraints (property -> max consecutive repeats)
    #[serde(default = "default_constraints")]
    pub constraints: ConstraintSet,

    /// Optional `Constraint <property> <max>` file; replaces `constraints` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints_file: Option<PathBuf>,

    /// Anchor (first row) selection
    #[serde(default)]
    pub anchor: AnchorSpec,

    /// Warm-up block after the anchor
    #[serde(default)]
    pub warmup: WarmupSpec,

    /// Full restarts allowed for the main block
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Base seed for row selection
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Orders generated per input file
    #[serde(default = "default_orders")]
    pub orders: usize,

    /// Output column holding the order index
    #[serde(default = "default_group_column")]
    pub group_column: String,

    /// Appended to the input file stem for the output file
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            table: TableOptions::default(),
            constraints: default_constraints(),
            constraints_file: None,
            anchor: AnchorSpec::default(),
            warmup: WarmupSpec::default(),
            retry_limit: default_retry_limit(),
            seed: default_seed(),
            orders: default_orders(),
            group_column: default_group_column(),
            output_suffix: default_output_suffix(),
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

impl Config {
    /// @acp:summary "Load config from a JSON (or YAML) file"
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if is_yaml(path) {
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// @acp:summary "Save config to a file"
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Main-block constraints: the constraints file if one is set, else `constraints`.
    pub fn constraint_set(&self) -> crate::Result<ConstraintSet> {
        match &self.constraints_file {
            Some(path) => read_constraint_file(path),
            None => Ok(self.constraints.clone()),
        }
    }

    /// The order plan described by this config.
    pub fn order_plan(&self) -> crate::Result<OrderPlan> {
        Ok(OrderPlan {
            anchor: self.anchor.clone(),
            warmup: self.warmup.clone(),
            constraints: self.constraint_set()?,
            retry_limit: self.retry_limit,
        })
    }
}
