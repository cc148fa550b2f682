#![forbid(unsafe_code)]
//! stimorder Command Line Interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stimorder::commands::{
    execute_check, execute_constraints, execute_init, execute_order, CheckOptions,
    ConstraintsOptions, InitOptions, OrderOptions,
};
use stimorder::config::CONFIG_FILE;
use stimorder::Config;

#[derive(Parser)]
#[command(name = "stimorder")]
#[command(about = "Constrained pseudorandomization of experimental trial lists")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (JSON, or YAML by extension)
    #[arg(short, long, global = true, env = "STIMORDER_CONFIG", default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Generate pseudorandomized orders for one or more trial lists
    Order {
        /// CSV files, or directories containing CSV files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Number of orders per file
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
        orders: Option<u64>,

        /// Base random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Maximum full restarts for the main block
        #[arg(long)]
        retry_limit: Option<u32>,

        /// Constraints file (`Constraint <property> <max>` per line)
        #[arg(long)]
        constraints: Option<PathBuf>,
    },

    /// Verify the constraints in a generated order file
    Check {
        /// Ordered CSV file
        file: PathBuf,

        /// Column separating orders
        #[arg(long)]
        group_column: Option<String>,

        /// Ignore the first N rows of every order
        #[arg(long, default_value = "0")]
        skip: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate and show the effective constraints
    Constraints {
        /// Constraints file (`Constraint <property> <max>` per line)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("stimorder=debug")
        } else {
            EnvFilter::new("stimorder=info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Init writes the config, every other command reads it
    if let Commands::Init { force } = cli.command {
        let options = InitOptions {
            path: cli.config,
            force,
        };
        return execute_init(options);
    }

    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),

        Commands::Order {
            inputs,
            orders,
            seed,
            retry_limit,
            constraints,
        } => {
            let options = OrderOptions {
                inputs,
                orders: orders.map(|n| n as usize),
                seed,
                retry_limit,
                constraints_file: constraints,
            };
            execute_order(options, config)?;
        }

        Commands::Check {
            file,
            group_column,
            skip,
            json,
        } => {
            let options = CheckOptions {
                file,
                group_column,
                skip,
                json,
            };
            execute_check(options, config)?;
        }

        Commands::Constraints { file, json } => {
            let options = ConstraintsOptions { file, json };
            execute_constraints(options, config)?;
        }
    }

    Ok(())
}
