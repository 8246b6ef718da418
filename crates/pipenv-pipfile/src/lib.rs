pub use crate::expand::{
    Environment, ExpandedDocument, expand_document, expand_env_vars, has_placeholder,
    unexpanded_vars,
};
pub use crate::index::{SourceIndex, SourceLookupError, SourceSelector};
pub use crate::pipfile::{Pipfile, PipfileError, Requires};
pub use crate::pipfile_mut::{PackageSection, PipfileMut};
pub use crate::requirement::{DetailedSpec, PackageSpec, normalize_package_name};
pub use crate::source::{DEFAULT_SOURCE_NAME, DEFAULT_SOURCE_URL, Source};

mod expand;
mod index;
mod pipfile;
mod pipfile_mut;
mod requirement;
mod source;
