/// The environment variables read by `pipenv` and its crates.
pub struct EnvVars;

impl EnvVars {
    /// The path to a `Pipfile` to use instead of discovering one from the working directory.
    ///
    /// When set, discovery is skipped entirely and the lockfile is expected next to the given
    /// file (e.g., `PIPENV_PIPFILE=/srv/app/Pipfile` uses `/srv/app/Pipfile.lock`).
    pub const PIPENV_PIPFILE: &'static str = "PIPENV_PIPFILE";

    /// The number of parent directories to search when looking for a `Pipfile`.
    ///
    /// Defaults to `3`. The working directory itself is always searched.
    pub const PIPENV_MAX_DEPTH: &'static str = "PIPENV_MAX_DEPTH";

    /// The URL of a package index used by the test harness in place of PyPI.
    ///
    /// Only read by tests; the engine itself never consults it.
    pub const PIPENV_TEST_INDEX: &'static str = "PIPENV_TEST_INDEX";

    /// Disables colored output when non-empty. Takes precedence over `FORCE_COLOR`.
    pub const NO_COLOR: &'static str = "NO_COLOR";

    /// Forces colored output when non-empty, even if stderr is not a terminal.
    pub const FORCE_COLOR: &'static str = "FORCE_COLOR";

    /// Log filter directives for the internal `tracing` output, overriding `--verbose`.
    ///
    /// `RUST_LOG=pipenv_project=debug` shows only the discovery and source lookups, while
    /// `RUST_LOG=pipenv=trace` shows everything the `pipenv` crates log.
    pub const RUST_LOG: &'static str = "RUST_LOG";
}
