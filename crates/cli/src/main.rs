//! Hostdeck CLI - database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run the API database migrations
//! hostdeck migrate
//!
//! # Seed hosting plans
//! hostdeck seed plans --file crates/cli/data/plans.yaml
//!
//! # Seed the comparison table for web hosting plans
//! hostdeck seed specs --file crates/cli/data/web_specs.yaml --category web
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed plans` - Upsert hosting plans from YAML
//! - `seed specs` - Upsert plan comparison rows from YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use hostdeck_core::PlanCategory;

mod commands;

#[derive(Parser)]
#[command(name = "hostdeck")]
#[command(author, version, about = "Hostdeck CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the plan catalog
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert hosting plans by category and name
    Plans {
        /// Path to the plans YAML file
        #[arg(short, long)]
        file: String,

        /// Delete existing plans in the file's categories first
        #[arg(long)]
        reset: bool,
    },
    /// Upsert comparison rows for one category's plans
    Specs {
        /// Path to the specs YAML file
        #[arg(short, long)]
        file: String,

        /// Plan category the rows belong to (`web`, `wordpress`, `woocommerce`, `email`)
        #[arg(short, long, default_value = "web")]
        category: PlanCategory,

        /// Delete existing rows for the matched plans first
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Plans { file, reset } => commands::seed::plans(&file, reset).await?,
            SeedTarget::Specs {
                file,
                category,
                reset,
            } => commands::seed::specs(&file, category, reset).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_specs_category_defaults_to_web() {
        let cli = Cli::try_parse_from(["hostdeck", "seed", "specs", "--file", "s.yaml"]);
        match cli.map(|c| c.command) {
            Ok(Commands::Seed {
                target: SeedTarget::Specs { category, reset, .. },
            }) => {
                assert_eq!(category, PlanCategory::Web);
                assert!(!reset);
            }
            _ => panic!("expected seed specs"),
        }
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let cli = Cli::try_parse_from([
            "hostdeck", "seed", "specs", "--file", "s.yaml", "--category", "vps",
        ]);
        assert!(cli.is_err());
    }
}
