//! `packup build` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::commands::Session;
use packup::ops::packup_build::{build, BuildOptions};
use packup::util::shell::Status;

pub fn execute(args: BuildArgs, session: &Session) -> Result<()> {
    let pkg = session.package()?;
    let config = session.config();

    // CLI flags override config; absent flags leave config alone
    let sourcemap = if args.no_sourcemap {
        Some(false)
    } else if args.sourcemap {
        Some(true)
    } else {
        None
    };

    let opts = BuildOptions {
        minify: args.minify.then_some(true),
        sourcemap,
        emit_plan: args.plan,
        jobs: args.jobs,
    };

    if !args.plan {
        session.shell.status(
            Status::Building,
            format!("{} v{} ({})", pkg.name(), pkg.version(), pkg.root().display()),
        );
    }

    build(&pkg, &config, &opts, Arc::clone(&session.shell))?;

    Ok(())
}
