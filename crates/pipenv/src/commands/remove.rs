use std::fmt::Write;

use anyhow::Result;
use owo_colors::OwoColorize;

use pipenv_pipfile::{PackageSection, PipfileMut};
use pipenv_project::ProjectOptions;
use pipenv_warnings::warn_user;

use crate::commands::{ExitStatus, discover};
use crate::printer::Printer;

/// Remove a package from the `Pipfile`.
pub(crate) fn remove(
    package: &str,
    dev: bool,
    options: &ProjectOptions,
    printer: Printer,
) -> Result<ExitStatus> {
    let mut project = discover(options)?;

    let section = PackageSection::from_dev(dev);
    let mut pipfile = PipfileMut::from_pipfile(project.pipfile());
    if !pipfile.remove_package(package, section)? {
        // Check if the package is declared in the other section.
        let other = PackageSection::from_dev(!dev);
        if PipfileMut::from_pipfile(project.pipfile()).remove_package(package, other)? {
            if dev {
                warn_user!(
                    "`{package}` is not a development package; \
                     try calling `pipenv remove` without the `--dev` flag"
                );
            } else {
                warn_user!(
                    "`{package}` is a development package; try calling `pipenv remove --dev`"
                );
            }
        }
        writeln!(
            printer.stderr(),
            "{}{} The package `{package}` could not be found in `[{section}]`",
            "error".red().bold(),
            ":".bold()
        )?;
        return Ok(ExitStatus::Failure);
    }
    project.write_pipfile(&pipfile, None)?;

    writeln!(printer.stderr(), "Removed `{package}` from `[{section}]`")?;
    Ok(ExitStatus::Success)
}
