use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Args, Parser, Subcommand};

use pipenv_fs::LineEnding;
use pipenv_static::EnvVars;

// Configures Clap v3-style help menu colors
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser)]
#[command(name = "pipenv", author, version, about)]
#[command(propagate_version = true, styles = STYLES)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    #[command(flatten)]
    pub(crate) global_args: GlobalArgs,
}

#[derive(Args, Debug)]
pub(crate) struct GlobalArgs {
    /// Do not print any output.
    #[arg(global = true, long, short, conflicts_with = "verbose")]
    pub(crate) quiet: bool,

    /// Use verbose output.
    ///
    /// Repeat for more detail (e.g., `-vv`). Overridden by `RUST_LOG`.
    #[arg(global = true, action = clap::ArgAction::Count, long, short, conflicts_with = "quiet")]
    pub(crate) verbose: u8,

    /// Control colors in output.
    #[arg(global = true, long, value_enum, default_value = "auto")]
    pub(crate) color: ColorChoice,

    /// The path to the `Pipfile`, instead of searching the working directory and its parents.
    #[arg(global = true, long, env = EnvVars::PIPENV_PIPFILE, value_name = "PATH")]
    pub(crate) pipfile: Option<PathBuf>,

    /// The number of parent directories to search for a `Pipfile`.
    ///
    /// Defaults to the value of `PIPENV_MAX_DEPTH`, or 3.
    #[arg(global = true, long, value_name = "DEPTH")]
    pub(crate) max_depth: Option<usize>,
}

#[derive(Debug, Copy, Clone, clap::ValueEnum)]
pub(crate) enum ColorChoice {
    /// Enables colored output only when the output is going to a terminal or TTY with support.
    Auto,

    /// Enables colored output regardless of the detected environment.
    Always,

    /// Disables colored output.
    Never,
}

impl From<ColorChoice> for anstream::ColorChoice {
    fn from(value: ColorChoice) -> Self {
        match value {
            ColorChoice::Auto => Self::Auto,
            ColorChoice::Always => Self::Always,
            ColorChoice::Never => Self::Never,
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Create a `Pipfile` in the current directory.
    Init,
    /// List the sources packages are installed from.
    Sources,
    /// Look up a single source.
    Source(SourceNamespace),
    /// Add a package to the `Pipfile`.
    Add(AddArgs),
    /// Remove a package from the `Pipfile`.
    Remove(RemoveArgs),
    /// Write the contents of a file to `Pipfile.lock`.
    WriteLock(WriteLockArgs),
    /// Check whether `Pipfile.lock` is up to date with the `Pipfile`.
    Check,
}

#[derive(Args)]
pub(crate) struct SourceNamespace {
    #[command(subcommand)]
    pub(crate) command: SourceCommand,
}

#[derive(Subcommand)]
pub(crate) enum SourceCommand {
    /// Show the source with exactly the given name or URL.
    Get(SourceGetArgs),
    /// Show the source with the given name, or else with the given URL.
    Find(SourceFindArgs),
}

#[derive(Args)]
pub(crate) struct SourceGetArgs {
    /// The name of the source.
    #[arg(long)]
    pub(crate) name: Option<String>,

    /// The URL of the source, after expansion.
    #[arg(long)]
    pub(crate) url: Option<String>,
}

#[derive(Args)]
pub(crate) struct SourceFindArgs {
    /// The name or URL of the source.
    pub(crate) name_or_url: String,
}

#[derive(Args)]
pub(crate) struct AddArgs {
    /// The name of the package.
    pub(crate) package: String,

    /// The version specifier, like `==1.0` or `>=2`.
    #[arg(default_value = "*")]
    pub(crate) specifier: String,

    /// Add the package to `[dev-packages]`.
    #[arg(long)]
    pub(crate) dev: bool,

    /// The name of the source to install the package from.
    #[arg(long)]
    pub(crate) index: Option<String>,
}

#[derive(Args)]
pub(crate) struct RemoveArgs {
    /// The name of the package.
    pub(crate) package: String,

    /// Remove the package from `[dev-packages]`.
    #[arg(long)]
    pub(crate) dev: bool,
}

#[derive(Args)]
pub(crate) struct WriteLockArgs {
    /// The file containing the lockfile contents.
    pub(crate) file: PathBuf,

    /// The line ending to write, instead of the one used by the existing lockfile.
    #[arg(long, value_name = "LINE_ENDING")]
    pub(crate) line_ending: Option<LineEnding>,
}
