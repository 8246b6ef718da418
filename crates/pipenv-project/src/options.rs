use std::path::PathBuf;

use tracing::debug;

use pipenv_pipfile::Environment;
use pipenv_static::EnvVars;
use pipenv_warnings::warn_user;

/// The number of parent directories searched for a `Pipfile` by default.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Options controlling how a [`crate::Project`] is located and loaded.
#[derive(Debug, Clone)]
pub struct ProjectOptions {
    /// An explicit `Pipfile` to use instead of searching for one.
    pub pipfile: Option<PathBuf>,
    /// The number of parent directories to search for a `Pipfile`.
    pub max_depth: usize,
    /// The environment used to expand placeholders in the `Pipfile`.
    pub env: Environment,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            pipfile: None,
            max_depth: DEFAULT_MAX_DEPTH,
            env: Environment::default(),
        }
    }
}

impl ProjectOptions {
    /// Read the options from an environment snapshot, which is also used for expansion.
    pub fn from_env(env: Environment) -> Self {
        let pipfile = env
            .get(EnvVars::PIPENV_PIPFILE)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let max_depth = match env.get(EnvVars::PIPENV_MAX_DEPTH) {
            None => DEFAULT_MAX_DEPTH,
            Some(value) => value.parse::<usize>().unwrap_or_else(|_| {
                warn_user!(
                    "Ignoring invalid value for `{}`: `{value}` (expected a non-negative integer)",
                    EnvVars::PIPENV_MAX_DEPTH
                );
                DEFAULT_MAX_DEPTH
            }),
        };

        debug!("Using `Pipfile` search depth of {max_depth}");
        Self {
            pipfile,
            max_depth,
            env,
        }
    }
}
