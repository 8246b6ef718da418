pub use crate::options::{DEFAULT_MAX_DEPTH, ProjectOptions};
pub use crate::project::{LOCKFILE_NAME, PIPFILE_NAME, Project, ProjectError};

mod options;
mod project;
