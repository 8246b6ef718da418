use std::process::ExitCode;

use anyhow::{Context, Result};

use pipenv_project::{Project, ProjectOptions};

pub(crate) use add::add;
pub(crate) use check::check;
pub(crate) use init::init;
pub(crate) use remove::remove;
pub(crate) use source::{source_find, source_get, sources};
pub(crate) use write_lock::write_lock;

mod add;
mod check;
mod init;
mod remove;
mod source;
mod write_lock;

#[derive(Copy, Clone)]
pub(crate) enum ExitStatus {
    /// The command succeeded.
    Success,

    /// The command failed due to an error in the user input.
    Failure,

    /// The command failed with an unexpected error.
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Self::from(0),
            ExitStatus::Failure => Self::from(1),
            ExitStatus::Error => Self::from(2),
        }
    }
}

/// Find and load the project for the current working directory.
pub(crate) fn discover(options: &ProjectOptions) -> Result<Project> {
    let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
    Ok(Project::discover(&cwd, options)?)
}
