use std::fmt;

use toml_edit::{ArrayOfTables, DocumentMut, Item, Table, value};
use tracing::debug;

use crate::requirement::normalize_package_name;
use crate::{DEFAULT_SOURCE_NAME, PackageSpec, Pipfile, PipfileError, Source};

/// Raw and mutable representation of a `Pipfile`.
///
/// Edits preserve comments and formatting, and operate on the unexpanded document, so
/// placeholders stay placeholders when the `Pipfile` is written back.
#[derive(Debug, Clone)]
pub struct PipfileMut {
    doc: DocumentMut,
}

/// A package section of a `Pipfile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageSection {
    Packages,
    DevPackages,
}

impl PackageSection {
    pub fn from_dev(dev: bool) -> Self {
        if dev { Self::DevPackages } else { Self::Packages }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Packages => "packages",
            Self::DevPackages => "dev-packages",
        }
    }
}

impl fmt::Display for PackageSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PipfileMut {
    /// Initialize a `PipfileMut` from a parsed [`Pipfile`].
    pub fn from_pipfile(pipfile: &Pipfile) -> Self {
        Self {
            doc: pipfile.document().clone(),
        }
    }

    /// Initialize a `PipfileMut` from the contents of a `Pipfile`.
    pub fn from_string(raw: &str) -> Result<Self, PipfileError> {
        // Run the full validation, so edits never start from a broken `Pipfile`.
        let pipfile = Pipfile::from_string(raw.to_string())?;
        Ok(Self::from_pipfile(&pipfile))
    }

    /// A `Pipfile` declaring the default source and empty package sections.
    pub fn default_pipfile() -> Self {
        let mut doc = DocumentMut::new();

        let source = Source::pypi();
        let mut table = Table::new();
        table.insert("url", value(source.url.as_str()));
        table.insert("verify_ssl", value(source.verify_ssl));
        table.insert("name", value(source.name.as_str()));
        let mut sources = ArrayOfTables::new();
        sources.push(table);
        doc.insert("source", Item::ArrayOfTables(sources));

        for section in [PackageSection::Packages, PackageSection::DevPackages] {
            let mut table = Table::new();
            table.decor_mut().set_prefix("\n");
            doc.insert(section.as_str(), Item::Table(table));
        }

        Self { doc }
    }

    /// Add `name` to `section`, replacing any existing entry for the same package.
    ///
    /// Existing entries are matched by normalized name, and keep their original spelling.
    pub fn add_package(
        &mut self,
        name: &str,
        spec: &PackageSpec,
        section: PackageSection,
    ) -> Result<(), PipfileError> {
        if let Some(index) = spec.index() {
            if !self.source_names()?.iter().any(|name| name == index) {
                return Err(PipfileError::UnknownIndex {
                    package: name.to_string(),
                    index: index.to_string(),
                });
            }
        }

        let table = self.section_mut(section)?;
        let mut new_value = spec.to_toml_value();
        match find_package(table, name) {
            Some(key) => {
                debug!("Replacing `{key}` in `[{section}]`");
                if let Some(existing) = table.get_mut(&key) {
                    if let Some(existing) = existing.as_value() {
                        *new_value.decor_mut() = existing.decor().clone();
                    }
                    *existing = Item::Value(new_value);
                }
            }
            None => {
                debug!("Adding `{name}` to `[{section}]`");
                table.insert(name, Item::Value(new_value));
            }
        }
        Ok(())
    }

    /// Remove `name` from `section`, returning `true` if it was present.
    pub fn remove_package(
        &mut self,
        name: &str,
        section: PackageSection,
    ) -> Result<bool, PipfileError> {
        let Some(table) = self.doc.get_mut(section.as_str()) else {
            return Ok(false);
        };
        let table = table
            .as_table_mut()
            .ok_or(PipfileError::NonTable(section.as_str()))?;
        let Some(key) = find_package(table, name) else {
            return Ok(false);
        };
        debug!("Removing `{key}` from `[{section}]`");
        Ok(table.remove(&key).is_some())
    }

    /// Append a `[[source]]` table.
    pub fn add_source(&mut self, source: &Source) -> Result<(), PipfileError> {
        if self.source_names()?.contains(&source.name) {
            return Err(PipfileError::DuplicateSource(source.name.clone()));
        }

        let has_content = !self.doc.as_table().is_empty();
        let sources = self
            .doc
            .entry("source")
            .or_insert(Item::ArrayOfTables(ArrayOfTables::new()))
            .as_array_of_tables_mut()
            .ok_or(PipfileError::NonArraySources)?;

        let mut table = Table::new();
        if has_content {
            table.decor_mut().set_prefix("\n");
        }
        table.insert("url", value(source.url.as_str()));
        table.insert("verify_ssl", value(source.verify_ssl));
        table.insert("name", value(source.name.as_str()));
        sources.push(table);
        debug!("Added source `{source}`");
        Ok(())
    }

    /// The names of the declared sources, or of the default source if none are declared.
    fn source_names(&self) -> Result<Vec<String>, PipfileError> {
        let Some(sources) = self.doc.get("source") else {
            return Ok(vec![DEFAULT_SOURCE_NAME.to_string()]);
        };
        let sources = sources
            .as_array_of_tables()
            .ok_or(PipfileError::NonArraySources)?;
        if sources.is_empty() {
            return Ok(vec![DEFAULT_SOURCE_NAME.to_string()]);
        }
        Ok(sources
            .iter()
            .filter_map(|table| table.get("name").and_then(Item::as_str))
            .map(ToString::to_string)
            .collect())
    }

    /// Get or create the table for `section`.
    fn section_mut(&mut self, section: PackageSection) -> Result<&mut Table, PipfileError> {
        self.doc
            .entry(section.as_str())
            .or_insert_with(|| {
                let mut table = Table::new();
                table.decor_mut().set_prefix("\n");
                Item::Table(table)
            })
            .as_table_mut()
            .ok_or(PipfileError::NonTable(section.as_str()))
    }
}

/// Return the key of the entry in `table` matching the package `name`, if any.
fn find_package(table: &Table, name: &str) -> Option<String> {
    let normalized = normalize_package_name(name);
    table
        .iter()
        .map(|(key, _)| key)
        .find(|key| normalize_package_name(key) == normalized)
        .map(ToString::to_string)
}

impl fmt::Display for PipfileMut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.doc)
    }
}
