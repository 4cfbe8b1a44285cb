use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `claimsight` - accident photo to claim-handling recommendation.
#[derive(Parser, Debug)]
#[command(name = "claimsight")]
#[command(version)]
#[command(about = "Insurance claim assistant: image description, policy retrieval, recommendations.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.claimsight/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP facade
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the claim agent once and print the normalized recommendation
    Run {
        /// Accident description
        #[arg(short, long)]
        description: String,
    },

    /// Look up the policy guideline matching a query
    Fetch {
        /// Free-text accident description
        #[arg(short, long)]
        query: String,

        /// Nearest policies to consider
        #[arg(short, default_value_t = 1)]
        n: usize,
    },

    /// Import policy records from a JSON array and register the vector index
    Seed {
        /// JSON file holding an array of policy records
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show document counts and the vector index definition
    Doctor,
}
