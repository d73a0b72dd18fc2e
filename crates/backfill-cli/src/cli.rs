use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "backfill",
    about = "Inspect reference schemas and expansion plans",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the reference paths declared by a schema
    Refmap(RefmapArgs),
    /// Reduce an expansion expression to its minimal clauses
    Neutralize(NeutralizeArgs),
    /// Show the remote calls an expansion expression would make
    Plan(PlanArgs),
    /// Expand a document against fixture data
    Expand(ExpandArgs),
}

#[derive(Args)]
pub struct RefmapArgs {
    /// JSON schema declaration
    pub schema: PathBuf,
}

#[derive(Args)]
pub struct NeutralizeArgs {
    pub expression: String,
}

#[derive(Args)]
pub struct PlanArgs {
    pub schema: PathBuf,
    pub expression: String,
    /// Remote operation invoked on each target resource
    #[arg(long, default_value = "read")]
    pub fetch_op: String,
}

#[derive(Args)]
pub struct ExpandArgs {
    pub schema: PathBuf,
    /// JSON document to expand
    pub document: PathBuf,
    pub expression: String,
    /// JSON object of `{resource: {id: document}}` served as remote data
    #[arg(long)]
    pub fixtures: PathBuf,
    /// TOML store configuration; only its `[dispatch]` table is used
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Print the per-field outcome after the document
    #[arg(long)]
    pub report: bool,
}
