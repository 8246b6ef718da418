use std::cell::OnceCell;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

use pipenv_fs::{LineEnding, Simplified};
use pipenv_lock::{Lockfile, LockfileError};
use pipenv_pipfile::{
    Environment, Pipfile, PipfileError, PipfileMut, Source, SourceIndex, SourceLookupError,
    SourceSelector, expand_env_vars,
};
use pipenv_warnings::warn_user_once;

use crate::ProjectOptions;

/// The file name of the manifest.
pub const PIPFILE_NAME: &str = "Pipfile";

/// The file name of the lockfile, which lives next to the manifest.
pub const LOCKFILE_NAME: &str = "Pipfile.lock";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("No `Pipfile` found at `{}` or in its parent directories", _0.user_display())]
    MissingPipfile(PathBuf),
    #[error("A `Pipfile` already exists at: `{}`", _0.user_display())]
    PipfileExists(PathBuf),
    #[error("Failed to parse: `{}`", _0.user_display())]
    Pipfile(PathBuf, #[source] PipfileError),
    #[error("Failed to parse: `{}`", _0.user_display())]
    Lockfile(PathBuf, #[source] LockfileError),
    #[error("Failed to serialize `Pipfile.lock`")]
    SerializeLockfile(#[source] LockfileError),
    #[error(transparent)]
    Lookup(#[from] SourceLookupError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A lockfile, along with the line ending it was written with.
#[derive(Debug)]
struct LoadedLockfile {
    lockfile: Lockfile,
    line_ending: LineEnding,
}

/// A project, consisting of a `Pipfile` and an optional `Pipfile.lock` next to it.
///
/// The `Pipfile` is read and expanded when the project is loaded; the lockfile is read the first
/// time it's needed. Expansion uses the environment snapshot from [`ProjectOptions`], and only
/// runs again on [`Project::reload`].
#[derive(Debug)]
pub struct Project {
    /// The directory containing the `Pipfile`.
    root: PathBuf,
    pipfile_path: PathBuf,
    /// The expanded `Pipfile`. Its raw text is the unexpanded contents on disk.
    pipfile: Pipfile,
    pipfile_line_ending: LineEnding,
    /// The lockfile, or `None` if the project has no lockfile.
    lockfile: OnceCell<Option<LoadedLockfile>>,
    env: Environment,
}

impl Project {
    /// Find the `Pipfile` for `cwd` and load the project.
    ///
    /// An explicit [`ProjectOptions::pipfile`] is used as-is. Otherwise, `cwd` and up to
    /// [`ProjectOptions::max_depth`] of its parents are searched.
    pub fn discover(cwd: &Path, options: &ProjectOptions) -> Result<Self, ProjectError> {
        if let Some(pipfile) = &options.pipfile {
            let path = cwd.join(pipfile);
            debug!("Using `Pipfile` at: `{}`", path.user_display());
            return Self::from_pipfile(&path, options);
        }

        let Some(path) = cwd
            .ancestors()
            .take(options.max_depth.saturating_add(1))
            .map(|dir| dir.join(PIPFILE_NAME))
            .inspect(|path| trace!("Checking for `Pipfile` at: `{}`", path.user_display()))
            .find(|path| path.is_file())
        else {
            return Err(ProjectError::MissingPipfile(cwd.to_path_buf()));
        };
        debug!("Found `Pipfile` at: `{}`", path.user_display());
        Self::from_pipfile(&path, options)
    }

    /// Load the project whose `Pipfile` is at `path`.
    pub fn from_pipfile(path: &Path, options: &ProjectOptions) -> Result<Self, ProjectError> {
        let path = std::path::absolute(path)?;
        let (pipfile, pipfile_line_ending) = load_pipfile(&path, &options.env)?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| ProjectError::MissingPipfile(path.clone()))?;
        Ok(Self {
            root,
            pipfile_path: path,
            pipfile,
            pipfile_line_ending,
            lockfile: OnceCell::new(),
            env: options.env.clone(),
        })
    }

    /// Create a `Pipfile` declaring the default source in `dir`, and load the project.
    pub fn init(dir: &Path, options: &ProjectOptions) -> Result<Self, ProjectError> {
        let path = dir.join(PIPFILE_NAME);
        if path.exists() {
            return Err(ProjectError::PipfileExists(path));
        }
        let contents = PipfileMut::default_pipfile().to_string();
        pipenv_fs::write_with_line_ending(&path, &contents, LineEnding::default())?;
        debug!("Created `Pipfile` at: `{}`", path.user_display());
        Self::from_pipfile(&path, options)
    }

    /// Read the `Pipfile` again and expand it with `env`, dropping the cached lockfile.
    pub fn reload(&mut self, env: Environment) -> Result<(), ProjectError> {
        let (pipfile, pipfile_line_ending) = load_pipfile(&self.pipfile_path, &env)?;
        self.pipfile = pipfile;
        self.pipfile_line_ending = pipfile_line_ending;
        self.lockfile = OnceCell::new();
        self.env = env;
        Ok(())
    }

    pub fn pipfile_path(&self) -> &Path {
        &self.pipfile_path
    }

    /// The path of `Pipfile.lock`, next to the `Pipfile`.
    pub fn lockfile_path(&self) -> PathBuf {
        self.root.join(LOCKFILE_NAME)
    }

    /// The expanded `Pipfile`.
    pub fn pipfile(&self) -> &Pipfile {
        &self.pipfile
    }

    /// The line ending used by the `Pipfile` on disk.
    pub fn pipfile_line_ending(&self) -> LineEnding {
        self.pipfile_line_ending
    }

    /// Return the lockfile, reading it on first access. Returns `None` if there is no lockfile.
    pub fn lockfile(&self) -> Result<Option<&Lockfile>, ProjectError> {
        Ok(self.loaded_lockfile()?.map(|loaded| &loaded.lockfile))
    }

    /// The line ending used by the lockfile on disk, if there is one.
    pub fn lockfile_line_ending(&self) -> Result<Option<LineEnding>, ProjectError> {
        Ok(self.loaded_lockfile()?.map(|loaded| loaded.line_ending))
    }

    fn loaded_lockfile(&self) -> Result<Option<&LoadedLockfile>, ProjectError> {
        if let Some(loaded) = self.lockfile.get() {
            return Ok(loaded.as_ref());
        }

        let path = self.lockfile_path();
        let loaded = match pipenv_fs::read_with_line_ending(&path) {
            Ok((contents, line_ending)) => {
                let lockfile = Lockfile::from_string(&contents)
                    .map_err(|err| ProjectError::Lockfile(path.clone(), err))?;
                debug!("Loaded lockfile from: `{}`", path.user_display());
                Some(LoadedLockfile {
                    lockfile,
                    line_ending,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No lockfile found at: `{}`", path.user_display());
                None
            }
            Err(err) => return Err(err.into()),
        };
        Ok(self.lockfile.get_or_init(|| loaded).as_ref())
    }

    /// The sources packages are installed from, expanded.
    ///
    /// The sources recorded in the lockfile take precedence over those in the `Pipfile`.
    pub fn sources(&self) -> Result<Vec<Source>, ProjectError> {
        if let Some(lockfile) = self.lockfile()? {
            if !lockfile.sources().is_empty() {
                trace!("Using sources from the lockfile");
                return Ok(lockfile
                    .sources()
                    .iter()
                    .map(|source| self.expand_source(source))
                    .collect());
            }
        }
        Ok(self.pipfile_sources())
    }

    /// The sources declared in the `Pipfile`, expanded, or the default `pypi` source if none
    /// are.
    pub fn pipfile_sources(&self) -> Vec<Source> {
        self.pipfile.sources()
    }

    /// Return the source matching `selector` exactly.
    ///
    /// The sources from [`Project::sources`] are searched first, then those from
    /// [`Project::pipfile_sources`].
    pub fn get_source(&self, selector: SourceSelector<'_>) -> Result<Source, ProjectError> {
        self.lookup(|index| index.get(selector))
    }

    /// Return the source named `name_or_url`, or else the source with the URL `name_or_url`.
    ///
    /// A value that is the name of one source and the URL of another resolves to the source
    /// with that name.
    pub fn find_source(&self, name_or_url: &str) -> Result<Source, ProjectError> {
        self.lookup(|index| index.find(name_or_url))
    }

    fn lookup(
        &self,
        query: impl Fn(&SourceIndex) -> Result<Source, SourceLookupError>,
    ) -> Result<Source, ProjectError> {
        match query(&SourceIndex::new(self.sources()?)) {
            Err(SourceLookupError::NotFound(_)) => {
                Ok(query(&SourceIndex::new(self.pipfile_sources()))?)
            }
            result => Ok(result?),
        }
    }

    fn expand_source(&self, source: &Source) -> Source {
        Source {
            name: expand_env_vars(&source.name, &self.env).into_owned(),
            url: expand_env_vars(&source.url, &self.env).into_owned(),
            verify_ssl: source.verify_ssl,
        }
    }

    /// Return `true` if a lockfile exists and was generated from the current `Pipfile`.
    pub fn is_lockfile_up_to_date(&self) -> Result<bool, ProjectError> {
        Ok(self
            .lockfile()?
            .is_some_and(|lockfile| lockfile.matches(&self.pipfile)))
    }

    /// Write `contents` to the lockfile, atomically.
    ///
    /// Line breaks are written as `line_ending` if given, or else as in the existing lockfile,
    /// or else as `\n`.
    pub fn write_lockfile(
        &mut self,
        contents: &str,
        line_ending: Option<LineEnding>,
    ) -> Result<(), ProjectError> {
        let path = self.lockfile_path();
        let line_ending = match line_ending {
            Some(line_ending) => line_ending,
            None => match self.lockfile.get() {
                Some(Some(loaded)) => loaded.line_ending,
                _ => pipenv_fs::detect_line_ending(&path)?.unwrap_or_default(),
            },
        };
        pipenv_fs::write_with_line_ending(&path, contents, line_ending)?;
        self.lockfile = OnceCell::new();
        Ok(())
    }

    /// Serialize `lockfile` and write it with [`Project::write_lockfile`].
    pub fn write_lock(
        &mut self,
        lockfile: &Lockfile,
        line_ending: Option<LineEnding>,
    ) -> Result<(), ProjectError> {
        let contents = lockfile.to_json().map_err(ProjectError::SerializeLockfile)?;
        self.write_lockfile(&contents, line_ending)
    }

    /// Write an edited `Pipfile`, atomically, and reload the project.
    ///
    /// Line breaks are written as `line_ending` if given, or else as in the existing `Pipfile`.
    pub fn write_pipfile(
        &mut self,
        pipfile: &PipfileMut,
        line_ending: Option<LineEnding>,
    ) -> Result<(), ProjectError> {
        let line_ending = line_ending.unwrap_or(self.pipfile_line_ending);
        pipenv_fs::write_with_line_ending(&self.pipfile_path, &pipfile.to_string(), line_ending)?;
        self.reload(self.env.clone())
    }
}

/// Read the `Pipfile` at `path` and expand it with `env`.
fn load_pipfile(path: &Path, env: &Environment) -> Result<(Pipfile, LineEnding), ProjectError> {
    let (contents, line_ending) = match pipenv_fs::read_with_line_ending(path) {
        Ok(read) => read,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ProjectError::MissingPipfile(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    let pipfile = Pipfile::from_string(contents)
        .and_then(|pipfile| pipfile.expand(env))
        .map_err(|err| ProjectError::Pipfile(path.to_path_buf(), err))?;
    for name in pipfile.missing_vars() {
        warn_user_once!(
            "Environment variable `{name}` is referenced in `{}` but not set; \
             leaving it unexpanded",
            path.user_display()
        );
    }
    Ok((pipfile, line_ending))
}
