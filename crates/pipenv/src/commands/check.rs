use std::fmt::Write;

use anyhow::Result;
use owo_colors::OwoColorize;

use pipenv_project::ProjectOptions;

use crate::commands::{ExitStatus, discover};
use crate::printer::Printer;

/// Check whether the lockfile was generated from the current `Pipfile`.
pub(crate) fn check(options: &ProjectOptions, printer: Printer) -> Result<ExitStatus> {
    let project = discover(options)?;

    let Some(lockfile) = project.lockfile()? else {
        writeln!(
            printer.stderr(),
            "No `Pipfile.lock` found; it must be generated from the `Pipfile`"
        )?;
        return Ok(ExitStatus::Failure);
    };

    if lockfile.matches(project.pipfile()) {
        writeln!(printer.stderr(), "`Pipfile.lock` is up to date")?;
        Ok(ExitStatus::Success)
    } else {
        writeln!(
            printer.stderr(),
            "`Pipfile.lock` is out of date (expected hash {}, found {})",
            project.pipfile().hash().cyan(),
            lockfile.hash().cyan()
        )?;
        Ok(ExitStatus::Failure)
    }
}
