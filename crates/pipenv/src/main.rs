use std::process::ExitCode;

use anstream::eprint;
use anyhow::Result;
use clap::Parser;
use owo_colors::AnsiColors;
use tracing::debug;

use pipenv_pipfile::Environment;
use pipenv_project::{ProjectError, ProjectOptions};
use pipenv_static::EnvVars;
use pipenv_warnings::write_error_chain;

use crate::cli::{Cli, ColorChoice, Commands, SourceCommand};
use crate::commands::ExitStatus;
use crate::printer::Printer;

mod cli;
mod commands;
mod logging;
mod printer;

fn run() -> Result<ExitStatus> {
    let cli = Cli::parse();
    let globals = cli.global_args;

    // Configure the colors of user-facing output before anything is written.
    let env = Environment::from_process();
    let color = if env.get(EnvVars::NO_COLOR).is_some_and(|value| !value.is_empty()) {
        ColorChoice::Never
    } else if env.get(EnvVars::FORCE_COLOR).is_some_and(|value| !value.is_empty()) {
        ColorChoice::Always
    } else {
        globals.color
    };
    anstream::ColorChoice::write_global(color.into());

    // Configure the `tracing` crate, which controls internal logging.
    logging::setup_logging(logging::Level::from_verbosity(globals.verbose))?;

    // Configure the `Printer`, which controls user-facing output in the CLI.
    let printer = Printer::from_flags(globals.quiet, globals.verbose);

    // Configure the `warn!` macros, which control user-facing warnings in the CLI.
    if globals.quiet {
        pipenv_warnings::disable();
    } else {
        pipenv_warnings::enable();
    }

    // Command-line flags take precedence over the environment.
    let mut options = ProjectOptions::from_env(env);
    if let Some(pipfile) = globals.pipfile {
        options.pipfile = Some(pipfile);
    }
    if let Some(max_depth) = globals.max_depth {
        options.max_depth = max_depth;
    }
    match &options.pipfile {
        Some(pipfile) => debug!("Using `Pipfile` from: `{}`", pipfile.display()),
        None => debug!(
            "Searching for a `Pipfile` in up to {} parent directories",
            options.max_depth
        ),
    }

    match cli.command {
        Commands::Init => commands::init(&options, printer),
        Commands::Sources => commands::sources(&options, printer),
        Commands::Source(namespace) => match namespace.command {
            SourceCommand::Get(args) => commands::source_get(
                args.name.as_deref(),
                args.url.as_deref(),
                &options,
                printer,
            ),
            SourceCommand::Find(args) => {
                commands::source_find(&args.name_or_url, &options, printer)
            }
        },
        Commands::Add(args) => commands::add(
            &args.package,
            &args.specifier,
            args.dev,
            args.index,
            &options,
            printer,
        ),
        Commands::Remove(args) => commands::remove(&args.package, args.dev, &options, printer),
        Commands::WriteLock(args) => {
            commands::write_lock(&args.file, args.line_ending, &options, printer)
        }
        Commands::Check => commands::check(&options, printer),
    }
}

#[allow(clippy::print_stderr)]
fn main() -> ExitCode {
    match run() {
        Ok(code) => code.into(),
        Err(err) => {
            // A missing `Pipfile` is expected, and easily fixed.
            let missing_pipfile = matches!(
                err.downcast_ref::<ProjectError>(),
                Some(ProjectError::MissingPipfile(_))
            );
            let hints = if missing_pipfile {
                &["Run `pipenv init` to create one"][..]
            } else {
                &[]
            };

            let mut message = String::new();
            let _ = write_error_chain(
                err.as_ref(),
                &mut message,
                "error",
                AnsiColors::Red,
                hints.iter().copied(),
            );
            eprint!("{message}");

            if missing_pipfile {
                ExitStatus::Failure.into()
            } else {
                ExitStatus::Error.into()
            }
        }
    }
}
