use std::fmt::Write;

use anyhow::Result;
use owo_colors::OwoColorize;
use tracing::debug;

use pipenv_pipfile::{DetailedSpec, PackageSection, PackageSpec, PipfileError, PipfileMut};
use pipenv_project::ProjectOptions;

use crate::commands::{ExitStatus, discover};
use crate::printer::Printer;

/// Add a package to the `Pipfile`.
pub(crate) fn add(
    package: &str,
    specifier: &str,
    dev: bool,
    index: Option<String>,
    options: &ProjectOptions,
    printer: Printer,
) -> Result<ExitStatus> {
    let mut project = discover(options)?;

    let spec = match index {
        Some(index) => PackageSpec::Detailed(DetailedSpec {
            version: Some(specifier.to_string()),
            index: Some(index),
            ..DetailedSpec::default()
        }),
        None => PackageSpec::from(specifier),
    };
    debug!("Adding `{package} = {spec}`");

    let section = PackageSection::from_dev(dev);
    let mut pipfile = PipfileMut::from_pipfile(project.pipfile());
    match pipfile.add_package(package, &spec, section) {
        Ok(()) => {}
        Err(err @ PipfileError::UnknownIndex { .. }) => {
            writeln!(printer.stderr(), "{}{} {err}", "error".red().bold(), ":".bold())?;
            return Ok(ExitStatus::Failure);
        }
        Err(err) => return Err(err.into()),
    }
    project.write_pipfile(&pipfile, None)?;

    writeln!(printer.stderr(), "Added `{package}` to `[{section}]`")?;
    Ok(ExitStatus::Success)
}
