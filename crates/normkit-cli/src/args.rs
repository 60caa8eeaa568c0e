use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "normkit",
    about = "Normalize flat, denormalized data into linked entity tables from a declarative project document",
    version,
    after_help = "Examples:\n  normkit normalize --project project.toml --target orders\n  normkit validate --project project.toml\n  normkit graph --project project.toml --format dot\n  normkit explain --project project.toml --entity orders"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a normalization pass and print the resulting tables
    Normalize(NormalizeArgs),

    /// Validate a project document without running it
    Validate(ValidateArgs),

    /// Render the entity dependency graph
    Graph(GraphArgs),

    /// Explain how a single entity's columns are derived
    Explain(ExplainArgs),
}

#[derive(Parser, Debug)]
pub struct NormalizeArgs {
    /// Path to the project document
    #[arg(long, default_value = "project.toml")]
    pub project: String,

    /// Entities to normalize (default: every entity in the project)
    #[arg(long, value_delimiter = ',')]
    pub target: Vec<String>,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the project document
    #[arg(long, default_value = "project.toml")]
    pub project: String,

    /// Output format for the report
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Path to the project document
    #[arg(long, default_value = "project.toml")]
    pub project: String,

    /// Output format for the dependency graph
    #[arg(long, default_value = "dot")]
    pub format: GraphFormat,
}

#[derive(Parser, Debug)]
pub struct ExplainArgs {
    /// Path to the project document
    #[arg(long, default_value = "project.toml")]
    pub project: String,

    /// Entity to explain
    pub entity: String,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum GraphFormat {
    Dot,
    Json,
}
