//! `packup check` command

use anyhow::{bail, Result};

use crate::cli::CheckArgs;
use crate::commands::Session;
use packup::ops::packup_check::check;
use packup::util::shell::Status;

pub fn execute(_args: CheckArgs, session: &Session) -> Result<()> {
    let pkg = session.package()?;

    session.shell.status(
        Status::Checking,
        format!("{} v{} ({})", pkg.name(), pkg.version(), pkg.root().display()),
    );

    let report = check(&pkg)?;

    if !report.is_ok() {
        let missing: Vec<String> = report.missing.iter().map(|m| format!("  - {}", m)).collect();
        bail!(
            "{} of {} declared output(s) missing:\n{}\n\
             help: run `packup build` first",
            report.missing.len(),
            report.outputs.len(),
            missing.join("\n")
        );
    }

    session.shell.status(
        Status::Finished,
        format!("all {} declared output(s) exist", report.outputs.len()),
    );

    Ok(())
}
