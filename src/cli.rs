//! CLI argument parsing.
//!
//! The CLI only gathers inputs; loading, running and writing live in the
//! command handlers so tests can drive the pipeline without a process.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default directory that holds one output folder per converted page.
pub const DEFAULT_OUTPUT_ROOT: &str = "output";

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "amp-prototyper",
    version,
    about = "Rewrite an HTML page into an AMP page with a declarative step list",
    after_help = "Commands:\n  compile <SOURCE>          Run the steps against a page and write artifacts\n  steps                     Print the built-in step list\n  check --steps <FILE>      Validate a step list without running it\n\nExamples:\n  amp-prototyper compile http://127.0.0.1:8080\n  amp-prototyper compile site/index.html --output test\n  amp-prototyper compile site/index.html --steps custom/steps.json --verbose\n  amp-prototyper compile example.com --custom-host staging.example.com\n  amp-prototyper steps > my-steps.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Compile(CompileArgs),
    Steps(StepsArgs),
    Check(CheckArgs),
}

/// Compile command inputs for a single page.
#[derive(Parser, Debug)]
#[command(about = "Convert a page and write step snapshots and the final AMP page")]
pub struct CompileArgs {
    /// Local HTML file or URL of the page to convert
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Step list JSON file (defaults to the built-in steps)
    #[arg(long, value_name = "FILE")]
    pub steps: Option<PathBuf>,

    /// Output folder name (defaults to SOURCE with `/` replaced by `_`)
    #[arg(long, value_name = "NAME")]
    pub output: Option<String>,

    /// Directory that holds output folders
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_ROOT)]
    pub output_root: PathBuf,

    /// Print full error detail for failed actions
    #[arg(long)]
    pub verbose: bool,

    /// Only write the original and final pages
    #[arg(long)]
    pub no_save_steps: bool,

    /// Placeholder overrides for step parameters (KEY=VALUE,...)
    #[arg(long, value_name = "KV")]
    pub env: Option<String>,

    /// Host used for $HOST and $DOMAIN instead of the source's
    #[arg(long, value_name = "HOST")]
    pub custom_host: Option<String>,

    /// Extra stylesheet appended to the page's linked stylesheets
    #[arg(long, value_name = "FILE")]
    pub styles: Vec<PathBuf>,

    /// Emit the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Steps command inputs.
#[derive(Parser, Debug)]
#[command(about = "Print the built-in step list as JSON")]
pub struct StepsArgs {}

/// Check command inputs for validating a step list.
#[derive(Parser, Debug)]
#[command(about = "Validate a step list and summarize its steps")]
pub struct CheckArgs {
    /// Step list JSON file
    #[arg(long, value_name = "FILE")]
    pub steps: PathBuf,
}
