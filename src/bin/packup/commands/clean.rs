//! `packup clean` command

use anyhow::Result;

use crate::cli::CleanArgs;
use crate::commands::Session;
use packup::ops::packup_clean::clean;
use packup::util::shell::Status;

pub fn execute(_args: CleanArgs, session: &Session) -> Result<()> {
    let pkg = session.package()?;
    let config = session.config();

    let dist = clean(&pkg, &config.build)?;
    session.shell.status(Status::Removed, dist.display());

    Ok(())
}
