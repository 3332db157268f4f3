//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use packup::util::shell::ColorChoice;

/// packup - build JavaScript and TypeScript packages from their package.json
#[derive(Parser)]
#[command(name = "packup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Package directory (defaults to the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build type declarations and bundles for the package
    Build(BuildArgs),

    /// Check that every output declared in package.json exists
    Check(CheckArgs),

    /// Remove the dist directory
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Minify the bundles
    #[arg(long)]
    pub minify: bool,

    /// Emit source maps (the default)
    #[arg(long, conflicts_with = "no_sourcemap")]
    pub sourcemap: bool,

    /// Do not emit source maps
    #[arg(long)]
    pub no_sourcemap: bool,

    /// Print the planned tasks as JSON and exit without building
    #[arg(long)]
    pub plan: bool,

    /// Number of parallel declaration jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct CheckArgs {}

#[derive(Args)]
pub struct CleanArgs {}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
