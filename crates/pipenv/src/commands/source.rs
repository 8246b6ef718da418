use std::fmt::Write;

use anyhow::Result;
use owo_colors::OwoColorize;

use pipenv_pipfile::{Source, SourceSelector};
use pipenv_project::ProjectOptions;

use crate::commands::{ExitStatus, discover};
use crate::printer::Printer;

/// List the sources of the project, one per line.
pub(crate) fn sources(options: &ProjectOptions, printer: Printer) -> Result<ExitStatus> {
    let project = discover(options)?;

    for source in project.sources()? {
        if source.verify_ssl {
            writeln!(printer.stdout(), "{} {}", source.name.bold(), source.url)?;
        } else {
            writeln!(
                printer.stdout(),
                "{} {} {}",
                source.name.bold(),
                source.url,
                "(verify_ssl = false)".dimmed()
            )?;
        }
    }

    Ok(ExitStatus::Success)
}

/// Show the source with exactly the given name or URL.
pub(crate) fn source_get(
    name: Option<&str>,
    url: Option<&str>,
    options: &ProjectOptions,
    printer: Printer,
) -> Result<ExitStatus> {
    let selector = SourceSelector::from_parts(name, url)?;
    let project = discover(options)?;
    show(&project.get_source(selector)?, printer)
}

/// Show the source with the given name, or else with the given URL.
pub(crate) fn source_find(
    name_or_url: &str,
    options: &ProjectOptions,
    printer: Printer,
) -> Result<ExitStatus> {
    let project = discover(options)?;
    show(&project.find_source(name_or_url)?, printer)
}

fn show(source: &Source, printer: Printer) -> Result<ExitStatus> {
    writeln!(
        printer.stdout(),
        "{}",
        serde_json::to_string_pretty(&source.to_map())?
    )?;
    Ok(ExitStatus::Success)
}
