use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sqlgym",
    version,
    about = "Practice SQL against seeded sandbox databases and grade answers"
)]
pub struct Cli {
    /// tracing filter directive (e.g. `info`, `sqlgym_core=debug`)
    #[arg(long, global = true, env = "SQLGYM_LOG", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a starter sqlgym.yaml with sample challenges
    Init(InitArgs),
    /// Run SQL against a freshly seeded database without grading
    Run(RunArgs),
    /// Grade SQL against one challenge's solution
    Check(CheckArgs),
    /// Self-test: grade every challenge solution against itself
    Solutions(SolutionsArgs),
    /// Show the tables of each sandbox database
    Schemas(SchemasArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "sqlgym.yaml")]
    pub config: PathBuf,
}

/// Where the SQL text comes from. `--file -` reads stdin.
#[derive(Parser, Clone)]
pub struct SqlSource {
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub sql: Option<String>,

    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    /// employees | ecommerce | movies
    #[arg(long)]
    pub schema: String,

    #[command(flatten)]
    pub source: SqlSource,

    /// text | json | csv
    #[arg(long, default_value = "text")]
    pub format: String,

    /// optional config whose `settings` apply to this run
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct CheckArgs {
    #[arg(long, default_value = "sqlgym.yaml")]
    pub config: PathBuf,

    #[arg(long)]
    pub challenge: String,

    #[command(flatten)]
    pub source: SqlSource,

    /// text | json
    #[arg(long, default_value = "text")]
    pub format: String,

    /// reject unknown config keys
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Clone)]
pub struct SolutionsArgs {
    #[arg(long, default_value = "sqlgym.yaml")]
    pub config: PathBuf,

    /// only challenges tagged with this concept
    #[arg(long)]
    pub concept: Option<String>,

    /// beginner | intermediate | advanced
    #[arg(long)]
    pub difficulty: Option<String>,

    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Clone)]
pub struct SchemasArgs {
    #[arg(long)]
    pub schema: Option<String>,

    /// text | json
    #[arg(long, default_value = "text")]
    pub format: String,
}
