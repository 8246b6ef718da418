use std::fmt::Write;

use anyhow::{Context, Result};

use pipenv_fs::Simplified;
use pipenv_project::{Project, ProjectOptions};

use crate::commands::ExitStatus;
use crate::printer::Printer;

/// Create a `Pipfile` in the current directory.
pub(crate) fn init(options: &ProjectOptions, printer: Printer) -> Result<ExitStatus> {
    let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
    let project = Project::init(&cwd, options)?;

    writeln!(
        printer.stderr(),
        "Created `{}`",
        project.pipfile_path().user_display()
    )?;
    Ok(ExitStatus::Success)
}
