//! packup CLI - build JavaScript and TypeScript packages

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

use packup::builder::{ContextError, TaskError};
use packup::core::ManifestError;
use packup::util::Shell;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::Session;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        if let Some(help) = diagnostic_help(&e) {
            eprintln!("help: {}", help);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.quiet {
        EnvFilter::new("packup=error")
    } else if cli.verbose {
        EnvFilter::new("packup=debug")
    } else {
        EnvFilter::new("packup=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, cli.color));

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, &Session::new(shell, cli.dir)?),
        Commands::Check(args) => commands::check::execute(args, &Session::new(shell, cli.dir)?),
        Commands::Clean(args) => commands::clean::execute(args, &Session::new(shell, cli.dir)?),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Help text attached to the first diagnostic error in the chain.
fn diagnostic_help(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| {
        let diagnostic: &dyn Diagnostic = if let Some(e) = cause.downcast_ref::<ManifestError>() {
            e
        } else if let Some(e) = cause.downcast_ref::<ContextError>() {
            e
        } else if let Some(e) = cause.downcast_ref::<TaskError>() {
            e
        } else {
            return None;
        };
        diagnostic.help().map(|help| help.to_string())
    })
}
