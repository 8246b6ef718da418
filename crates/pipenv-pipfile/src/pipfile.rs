use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use toml_edit::{ArrayOfTables, DocumentMut, Item, Table, value};
use tracing::{debug, trace};

use crate::expand::{Environment, expand_document, has_placeholder};
use crate::{PackageSpec, Source};

#[derive(Debug, Error)]
pub enum PipfileError {
    #[error("Failed to parse `Pipfile` at line {line}, column {column}")]
    Parse {
        line: usize,
        column: usize,
        #[source]
        err: Box<toml_edit::TomlError>,
    },
    #[error("Failed to parse `Pipfile`")]
    Schema(#[source] Box<toml_edit::de::Error>),
    #[error("Source `{0}` is declared more than once")]
    DuplicateSource(String),
    #[error("Source `{name}` has an invalid URL")]
    InvalidUrl {
        name: String,
        #[source]
        err: url::ParseError,
    },
    #[error("Package `{package}` references an unknown source: `{index}`")]
    UnknownIndex { package: String, index: String },
    #[error("Expected `{0}` to be a table")]
    NonTable(&'static str),
    #[error("Expected `source` to be an array of tables")]
    NonArraySources,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipfileError {
    /// Build a [`PipfileError::Parse`], locating the error within `raw`.
    fn parse(raw: &str, err: toml_edit::TomlError) -> Self {
        let offset = err.span().map(|span| span.start).unwrap_or(0).min(raw.len());
        let (line, column) = line_column(raw, offset);
        Self::Parse {
            line,
            column,
            err: Box::new(err),
        }
    }
}

/// Return the one-based line and column of the byte `offset` in `raw`.
fn line_column(raw: &str, offset: usize) -> (usize, usize) {
    let before = raw.get(..offset).unwrap_or(raw);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|index| index + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// The `[requires]` section of a `Pipfile`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requires {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python_full_version: Option<String>,
}

impl Requires {
    pub fn is_empty(&self) -> bool {
        self.python_version.is_none() && self.python_full_version.is_none()
    }
}

/// The typed view of a `Pipfile`. Unknown sections (like `[scripts]`) are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PipfileWire {
    #[serde(default)]
    source: Vec<Source>,
    #[serde(default)]
    packages: IndexMap<String, PackageSpec>,
    #[serde(default)]
    dev_packages: IndexMap<String, PackageSpec>,
    #[serde(default)]
    requires: Requires,
}

/// The sections of a `Pipfile` that feed into its hash, kept as untyped values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct HashedSections {
    #[serde(default)]
    source: Vec<serde_json::Value>,
    #[serde(default)]
    packages: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    dev_packages: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    requires: BTreeMap<String, serde_json::Value>,
}

/// A `Pipfile`, as parsed from disk.
///
/// A `Pipfile` keeps the exact text it was parsed from. [`Pipfile::expand`] substitutes
/// `${NAME}` placeholders in the typed view only, so [`Pipfile::raw`] never contains an expanded
/// value.
#[derive(Debug, Clone)]
pub struct Pipfile {
    sources: Vec<Source>,
    /// The sources as declared, before expansion.
    raw_sources: Vec<Source>,
    packages: IndexMap<String, PackageSpec>,
    dev_packages: IndexMap<String, PackageSpec>,
    requires: Requires,
    /// The variables referenced by the `Pipfile` that were unset when it was expanded.
    missing: Vec<String>,
    hash: String,
    /// The unexpanded document.
    document: DocumentMut,
    /// The unexpanded text.
    raw: String,
}

impl Pipfile {
    /// Parse a `Pipfile` from its contents. Placeholders are left unexpanded.
    pub fn from_string(raw: String) -> Result<Self, PipfileError> {
        let document = DocumentMut::from_str(&raw).map_err(|err| PipfileError::parse(&raw, err))?;
        let wire = deserialize(&raw)?;
        let hash = hash(&raw)?;
        let pipfile = Self {
            raw_sources: wire.source.clone(),
            sources: wire.source,
            packages: wire.packages,
            dev_packages: wire.dev_packages,
            requires: wire.requires,
            missing: Vec::new(),
            hash,
            document,
            raw,
        };
        pipfile.validate()?;
        Ok(pipfile)
    }

    /// Read and parse the `Pipfile` at `path`. Placeholders are left unexpanded.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipfileError> {
        let raw = fs_err::read_to_string(path.as_ref())?;
        Self::from_string(raw)
    }

    /// Return a copy of this `Pipfile` with every `${NAME}` placeholder expanded using `env`.
    ///
    /// The raw text and document of the returned `Pipfile` are the unexpanded ones.
    pub fn expand(&self, env: &Environment) -> Result<Self, PipfileError> {
        let expanded = expand_document(&self.document, env);
        for name in &expanded.missing {
            debug!("Environment variable `{name}` is referenced by the `Pipfile` but not set");
        }
        let wire = deserialize(&expanded.document.to_string())?;
        // Only the URLs stay unexpanded, since they may carry credentials.
        let raw_sources = wire
            .source
            .iter()
            .zip(&self.raw_sources)
            .map(|(expanded, raw)| Source {
                url: raw.url.clone(),
                ..expanded.clone()
            })
            .collect();
        let pipfile = Self {
            sources: wire.source,
            raw_sources,
            packages: wire.packages,
            dev_packages: wire.dev_packages,
            requires: wire.requires,
            missing: expanded.missing,
            hash: self.hash.clone(),
            document: self.document.clone(),
            raw: self.raw.clone(),
        };
        pipfile.validate()?;
        Ok(pipfile)
    }

    fn validate(&self) -> Result<(), PipfileError> {
        let mut names = FxHashSet::default();
        for source in &self.sources {
            if !names.insert(source.name.as_str()) {
                return Err(PipfileError::DuplicateSource(source.name.clone()));
            }
            if !has_placeholder(&source.url) {
                url::Url::parse(&source.url).map_err(|err| PipfileError::InvalidUrl {
                    name: source.name.clone(),
                    err,
                })?;
            }
        }

        let sources = self.sources();
        for (package, spec) in self.packages.iter().chain(&self.dev_packages) {
            if let Some(index) = spec.index().filter(|index| !has_placeholder(index)) {
                if !sources.iter().any(|source| source.name == index) {
                    return Err(PipfileError::UnknownIndex {
                        package: package.clone(),
                        index: index.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// The sources declared in the `Pipfile`, or the default `pypi` source if none are.
    pub fn sources(&self) -> Vec<Source> {
        if self.sources.is_empty() {
            vec![Source::pypi()]
        } else {
            self.sources.clone()
        }
    }

    /// The sources with their URLs unexpanded, or the default `pypi` source if none are
    /// declared.
    ///
    /// These are the sources recorded in `Pipfile.lock`.
    pub fn raw_sources(&self) -> Vec<Source> {
        if self.raw_sources.is_empty() {
            vec![Source::pypi()]
        } else {
            self.raw_sources.clone()
        }
    }

    /// The sources declared in the `Pipfile`, without the default.
    pub fn declared_sources(&self) -> &[Source] {
        &self.sources
    }

    /// The `[packages]` section, in declaration order.
    pub fn packages(&self) -> &IndexMap<String, PackageSpec> {
        &self.packages
    }

    /// The `[dev-packages]` section, in declaration order.
    pub fn dev_packages(&self) -> &IndexMap<String, PackageSpec> {
        &self.dev_packages
    }

    pub fn requires(&self) -> &Requires {
        &self.requires
    }

    /// The variables that were referenced but unset when this `Pipfile` was expanded.
    pub fn missing_vars(&self) -> &[String] {
        &self.missing
    }

    /// The SHA-256 digest of the unexpanded `Pipfile`, as recorded in `Pipfile.lock`.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The exact, unexpanded text the `Pipfile` was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The unexpanded, format-preserving document.
    pub fn document(&self) -> &DocumentMut {
        &self.document
    }

    /// Render the typed view as TOML, with the sections ordered `source`, `packages`,
    /// `dev-packages` and `requires`.
    ///
    /// Comments and formatting are not preserved; use [`Pipfile::raw`] for that.
    pub fn to_toml(&self) -> String {
        let mut document = DocumentMut::new();

        let mut sources = ArrayOfTables::new();
        for (position, source) in self.sources().iter().enumerate() {
            let mut table = Table::new();
            if position > 0 {
                table.decor_mut().set_prefix("\n");
            }
            table.insert("url", value(source.url.as_str()));
            table.insert("verify_ssl", value(source.verify_ssl));
            table.insert("name", value(source.name.as_str()));
            sources.push(table);
        }
        document.insert("source", Item::ArrayOfTables(sources));

        for (section, packages) in [
            ("packages", &self.packages),
            ("dev-packages", &self.dev_packages),
        ] {
            let mut table = Table::new();
            table.decor_mut().set_prefix("\n");
            for (name, spec) in packages {
                table.insert(name.as_str(), Item::Value(spec.to_toml_value()));
            }
            document.insert(section, Item::Table(table));
        }

        if !self.requires.is_empty() {
            let mut table = Table::new();
            table.decor_mut().set_prefix("\n");
            if let Some(python_version) = &self.requires.python_version {
                table.insert("python_version", value(python_version.as_str()));
            }
            if let Some(python_full_version) = &self.requires.python_full_version {
                table.insert("python_full_version", value(python_full_version.as_str()));
            }
            document.insert("requires", Item::Table(table));
        }

        document.to_string()
    }
}

fn deserialize(raw: &str) -> Result<PipfileWire, PipfileError> {
    toml_edit::de::from_str(raw).map_err(|err| PipfileError::Schema(Box::new(err)))
}

/// Compute the digest of the unexpanded `Pipfile`.
///
/// The digest covers the sources, the `[requires]` section and both package sections, rendered
/// as compact JSON with sorted keys.
fn hash(raw: &str) -> Result<String, PipfileError> {
    let sections: HashedSections =
        toml_edit::de::from_str(raw).map_err(|err| PipfileError::Schema(Box::new(err)))?;
    let sources = if sections.source.is_empty() {
        vec![serde_json::Value::Object(
            Source::pypi()
                .to_map()
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )]
    } else {
        sections.source
    };
    let content = serde_json::json!({
        "_meta": {
            "requires": sections.requires,
            "sources": sources,
        },
        "default": sections.packages,
        "develop": sections.dev_packages,
    });
    let digest = Sha256::digest(content.to_string().as_bytes());
    let hash = hex::encode(digest);
    trace!("Computed `Pipfile` hash: {hash}");
    Ok(hash)
}
