use std::fmt;

use anstream::{eprint, print};

/// Where user-facing output goes, as selected by `--quiet` and `--verbose`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Printer {
    /// Print results to stdout and status messages to stderr.
    Default,
    /// Print nothing.
    Quiet,
    /// Print everything, alongside the debug logs.
    Verbose,
}

impl Printer {
    pub(crate) fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose > 0 {
            Self::Verbose
        } else {
            Self::Default
        }
    }

    /// The stream for command results, like the sources of a project.
    pub(crate) fn stdout(self) -> Stream {
        Stream {
            target: Target::Stdout,
            enabled: self != Self::Quiet,
        }
    }

    /// The stream for status messages, like the path of a written file.
    pub(crate) fn stderr(self) -> Stream {
        Stream {
            target: Target::Stderr,
            enabled: self != Self::Quiet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Stream {
    target: Target,
    enabled: bool,
}

impl fmt::Write for Stream {
    #[allow(clippy::print_stdout, clippy::print_stderr)]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.enabled {
            match self.target {
                Target::Stdout => print!("{s}"),
                Target::Stderr => eprint!("{s}"),
            }
        }
        Ok(())
    }
}
