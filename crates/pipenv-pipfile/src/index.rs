use std::fmt::{Display, Formatter};

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::trace;

use crate::Source;

/// Selects a [`Source`] by exactly one of its name or URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelector<'a> {
    Name(&'a str),
    Url(&'a str),
}

impl<'a> SourceSelector<'a> {
    /// Build a selector from an optional name and an optional URL.
    ///
    /// Exactly one of the two must be provided.
    pub fn from_parts(
        name: Option<&'a str>,
        url: Option<&'a str>,
    ) -> Result<Self, SourceLookupError> {
        match (name, url) {
            (Some(name), None) => Ok(Self::Name(name)),
            (None, Some(url)) => Ok(Self::Url(url)),
            (Some(_), Some(_)) | (None, None) => Err(SourceLookupError::InvalidSelector),
        }
    }
}

impl Display for SourceSelector<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name `{name}`"),
            Self::Url(url) => write!(f, "URL `{url}`"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceLookupError {
    #[error("No source found with {0}")]
    NotFound(String),
    #[error("Exactly one of a source name or URL must be provided")]
    InvalidSelector,
}

/// Lookup tables over an ordered list of sources.
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    sources: Vec<Source>,
    by_name: FxHashMap<String, usize>,
    by_url: FxHashMap<String, usize>,
}

impl SourceIndex {
    /// Index the given sources.
    ///
    /// If two sources share a name or a URL, the first one declared wins.
    pub fn new(sources: impl IntoIterator<Item = Source>) -> Self {
        let sources: Vec<Source> = sources.into_iter().collect();
        let mut by_name = FxHashMap::default();
        let mut by_url = FxHashMap::default();
        for (position, source) in sources.iter().enumerate() {
            by_name.entry(source.name.clone()).or_insert(position);
            by_url.entry(source.url.clone()).or_insert(position);
        }
        Self {
            sources,
            by_name,
            by_url,
        }
    }

    /// Return the source that exactly matches `selector`.
    pub fn get(&self, selector: SourceSelector<'_>) -> Result<Source, SourceLookupError> {
        self.lookup(selector)
            .cloned()
            .ok_or_else(|| SourceLookupError::NotFound(selector.to_string()))
    }

    /// Return the source whose name is `name_or_url`, or failing that, whose URL is
    /// `name_or_url`.
    ///
    /// A value that is both the name of one source and the URL of another resolves to the
    /// source with that name.
    pub fn find(&self, name_or_url: &str) -> Result<Source, SourceLookupError> {
        self.lookup(SourceSelector::Name(name_or_url))
            .or_else(|| self.lookup(SourceSelector::Url(name_or_url)))
            .cloned()
            .ok_or_else(|| SourceLookupError::NotFound(format!("name or URL `{name_or_url}`")))
    }

    fn lookup(&self, selector: SourceSelector<'_>) -> Option<&Source> {
        let position = match selector {
            SourceSelector::Name(name) => self.by_name.get(name),
            SourceSelector::Url(url) => self.by_url.get(url),
        };
        trace!("Looking up source by {selector}: {position:?}");
        position.map(|&position| &self.sources[position])
    }
}
