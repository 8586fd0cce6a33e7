pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::sql::Transition;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "markcheck")]
#[command(about = "Reconcile products against marking-registry codes and generate ledger SQL")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override output directory from config
    #[arg(long, global = true)]
    pub output_path: Option<String>,

    /// Write result files to the output directory
    #[arg(long, global = true)]
    pub write_files: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Count registry marks per product and roll up totals
    Reconcile {
        /// JSON file with the product list
        #[arg(long)]
        products: String,

        /// Registry document whose marks are counted
        #[arg(long, requires = "innbin", conflicts_with = "codes")]
        document_id: Option<String>,

        #[arg(long)]
        innbin: Option<String>,

        /// JSON file with codes to count instead of a registry document
        #[arg(long)]
        codes: Option<String>,
    },

    /// Generate ledger SQL for a list of codes
    Sql {
        /// JSON file with the code list
        #[arg(long)]
        codes: String,

        #[arg(long, value_parser = parse_transition)]
        transition: Transition,

        /// Overrides ledger.prod_group from config
        #[arg(long)]
        prod_group: Option<String>,

        /// "Type" column value for deactivate (1 unit, 2 aggregate)
        #[arg(long, default_value = "1")]
        type_value: i64,

        /// BIN for the optional registry lookup
        #[arg(long)]
        bin: Option<String>,

        /// Look valid codes up in the registry (best effort)
        #[arg(long, requires = "bin")]
        lookup: bool,
    },

    /// Extract token, BIN and codes from a captured curl command
    Curl {
        /// File with the pasted curl command, or "-" for stdin
        #[arg(long, default_value = "-")]
        input: String,

        /// Re-issue the captured code info request
        #[arg(long)]
        replay: bool,
    },

    /// Check whether a bearer token is accepted by the registry
    CheckToken {
        #[arg(long)]
        token: String,
    },
}

#[cfg(feature = "cli")]
fn parse_transition(value: &str) -> std::result::Result<Transition, String> {
    value.parse().map_err(|e: crate::utils::error::MarkError| e.to_string())
}
