use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};

use pipenv_fs::{LineEnding, Simplified};
use pipenv_lock::Lockfile;
use pipenv_project::ProjectOptions;

use crate::commands::{ExitStatus, discover};
use crate::printer::Printer;

/// Write the contents of `file` to the project's lockfile.
///
/// The contents are written as-is, apart from their line endings.
pub(crate) fn write_lock(
    file: &Path,
    line_ending: Option<LineEnding>,
    options: &ProjectOptions,
    printer: Printer,
) -> Result<ExitStatus> {
    let mut project = discover(options)?;

    let contents = fs_err::read_to_string(file)?;
    // Refuse to replace the lockfile with something that can't be read back.
    Lockfile::from_string(&contents)
        .with_context(|| format!("`{}` is not a valid lockfile", file.user_display()))?;

    project.write_lockfile(&contents, line_ending)?;

    writeln!(
        printer.stderr(),
        "Wrote `{}`",
        project.lockfile_path().user_display()
    )?;
    Ok(ExitStatus::Success)
}
