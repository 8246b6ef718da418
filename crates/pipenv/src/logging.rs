use std::fmt;
use std::str::FromStr;

use anstream::ColorChoice;
use anyhow::Context;
use jiff::Timestamp;
use owo_colors::{AnsiColors, OwoColorize};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use pipenv_static::EnvVars;

/// The amount of internal logging requested on the command line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
    /// No logs unless `RUST_LOG` asks for them.
    #[default]
    Default,
    /// Debug logs from the `pipenv` crates (`-v`).
    Verbose,
    /// Trace logs from the `pipenv` crates, with timestamps and targets (`-vv`).
    ExtraVerbose,
}

impl Level {
    pub(crate) fn from_verbosity(verbose: u8) -> Self {
        match verbose {
            0 => Self::Default,
            1 => Self::Verbose,
            _ => Self::ExtraVerbose,
        }
    }

    fn directive(self) -> anyhow::Result<Directive> {
        Ok(match self {
            Self::Default => LevelFilter::OFF.into(),
            Self::Verbose => Directive::from_str("pipenv=debug")?,
            Self::ExtraVerbose => Directive::from_str("pipenv=trace")?,
        })
    }
}

/// Formats events as `[timestamp] LEVEL [target:] message`.
struct PipenvFormat {
    timestamps: bool,
    /// Show the module an event came from, like `pipenv_project::project`.
    targets: bool,
}

impl<S, N> FormatEvent<S, N> for PipenvFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();

        if self.timestamps {
            let now = Timestamp::now();
            if ansi {
                write!(writer, "{} ", now.dimmed())?;
            } else {
                write!(writer, "{now} ")?;
            }
        }

        let level = meta.level();
        if ansi {
            let color = match *level {
                tracing::Level::TRACE => AnsiColors::Magenta,
                tracing::Level::DEBUG => AnsiColors::Blue,
                tracing::Level::INFO => AnsiColors::Green,
                tracing::Level::WARN => AnsiColors::Yellow,
                tracing::Level::ERROR => AnsiColors::Red,
            };
            write!(writer, "{} ", level.color(color))?;
        } else {
            write!(writer, "{level} ")?;
        }

        if self.targets {
            if ansi {
                write!(writer, "{}: ", meta.target().dimmed())?;
            } else {
                write!(writer, "{}: ", meta.target())?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the directive implied by `level`.
pub(crate) fn setup_logging(level: Level) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.directive()?)
        .with_env_var(EnvVars::RUST_LOG)
        .from_env()
        .context("Invalid RUST_LOG directives")?;

    let format = PipenvFormat {
        timestamps: level == Level::ExtraVerbose,
        targets: level == Level::ExtraVerbose,
    };
    // `choice` resolves `Auto` against the terminal.
    let ansi = !matches!(
        anstream::Stderr::choice(&std::io::stderr()),
        ColorChoice::Never | ColorChoice::Auto
    );

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(std::io::stderr)
                .with_ansi(ansi)
                .with_filter(filter),
        )
        .init();

    Ok(())
}
