use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use pipenv_pipfile::{Pipfile, Requires, Source};

/// The version of the lockfile format written by [`Lockfile::to_json`].
pub const PIPFILE_SPEC: u32 = 6;

#[derive(Debug, Error)]
pub enum LockfileError {
    #[error("Failed to parse `Pipfile.lock` at line {line}, column {column}")]
    Parse {
        line: usize,
        column: usize,
        #[source]
        err: serde_json::Error,
    },
    #[error("Failed to serialize `Pipfile.lock`")]
    Serialize(#[source] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A `Pipfile.lock`.
///
/// The packages are computed by a resolver; this type only reads, builds and renders the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(rename = "_meta")]
    pub meta: Meta,
    #[serde(default)]
    pub default: BTreeMap<String, LockedPackage>,
    #[serde(default)]
    pub develop: BTreeMap<String, LockedPackage>,
}

/// The `_meta` section of a `Pipfile.lock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub hash: LockHash,
    #[serde(rename = "pipfile-spec", default = "default_pipfile_spec")]
    pub pipfile_spec: u32,
    #[serde(default)]
    pub requires: Requires,
    /// The sources the packages were resolved against, unexpanded.
    #[serde(default)]
    pub sources: Vec<Source>,
}

fn default_pipfile_spec() -> u32 {
    PIPFILE_SPEC
}

/// The digest of the `Pipfile` a lockfile was generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHash {
    pub sha256: String,
}

/// A pinned package.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedPackage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Vec<String>>,
    /// Any other keys (e.g., `editable`, `git`, `ref`), kept verbatim.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl Lockfile {
    /// Build a lockfile for `pipfile` from already-resolved packages.
    pub fn new(
        pipfile: &Pipfile,
        default: BTreeMap<String, LockedPackage>,
        develop: BTreeMap<String, LockedPackage>,
    ) -> Self {
        Self {
            meta: Meta {
                hash: LockHash {
                    sha256: pipfile.hash().to_string(),
                },
                pipfile_spec: PIPFILE_SPEC,
                requires: pipfile.requires().clone(),
                sources: pipfile.raw_sources(),
            },
            default,
            develop,
        }
    }

    /// Parse a lockfile from its contents.
    pub fn from_string(contents: &str) -> Result<Self, LockfileError> {
        serde_json::from_str(contents).map_err(|err| LockfileError::Parse {
            line: err.line(),
            column: err.column(),
            err,
        })
    }

    /// Read and parse the lockfile at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LockfileError> {
        let path = path.as_ref();
        let contents = fs_err::read_to_string(path)?;
        let lockfile = Self::from_string(&contents)?;
        debug!(
            "Read lockfile with {} default and {} develop packages",
            lockfile.default.len(),
            lockfile.develop.len()
        );
        Ok(lockfile)
    }

    /// Render the lockfile as JSON, with sorted keys, four-space indentation and a trailing
    /// newline.
    pub fn to_json(&self) -> Result<String, LockfileError> {
        // Round-trip through `serde_json::Value` to sort the keys of flattened maps too.
        let value = serde_json::to_value(self).map_err(LockfileError::Serialize)?;
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        value
            .serialize(&mut serializer)
            .map_err(LockfileError::Serialize)?;
        let mut json = String::from_utf8_lossy(&buffer).into_owned();
        json.push('\n');
        Ok(json)
    }

    /// The digest of the `Pipfile` this lockfile was generated from.
    pub fn hash(&self) -> &str {
        &self.meta.hash.sha256
    }

    /// The sources recorded in the lockfile, unexpanded.
    pub fn sources(&self) -> &[Source] {
        &self.meta.sources
    }

    pub fn packages(&self) -> &BTreeMap<String, LockedPackage> {
        &self.default
    }

    pub fn dev_packages(&self) -> &BTreeMap<String, LockedPackage> {
        &self.develop
    }

    /// Return `true` if this lockfile was generated from a `Pipfile` with the same contents.
    pub fn matches(&self, pipfile: &Pipfile) -> bool {
        self.hash() == pipfile.hash()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    const LOCKFILE: &str = indoc! {r#"
        {
            "_meta": {
                "hash": {
                    "sha256": "5f1b2b7d1c8f9e0a"
                },
                "pipfile-spec": 6,
                "requires": {
                    "python_version": "3.12"
                },
                "sources": [
                    {
                        "name": "pypi",
                        "url": "https://pypi.org/simple",
                        "verify_ssl": true
                    },
                    {
                        "name": "testindex",
                        "url": "https://${TEST_HOST}/simple",
                        "verify_ssl": false
                    }
                ]
            },
            "default": {
                "six": {
                    "hashes": [
                        "sha256:1e61c37477a1626458e36f7b1d82aa5c9b094fa4802892072e49de9c60c4c926"
                    ],
                    "index": "pypi",
                    "markers": "python_version >= '2.7'",
                    "version": "==1.16.0"
                }
            },
            "develop": {
                "mypackage": {
                    "editable": true,
                    "path": "."
                }
            }
        }
    "#};

    #[test]
    fn parse() {
        let lockfile = Lockfile::from_string(LOCKFILE).unwrap();
        assert_eq!(lockfile.hash(), "5f1b2b7d1c8f9e0a");
        assert_eq!(lockfile.sources()[1].url, "https://${TEST_HOST}/simple");
        assert!(!lockfile.sources()[1].verify_ssl);
        assert_eq!(lockfile.packages()["six"].version.as_deref(), Some("==1.16.0"));
        assert_eq!(
            lockfile.dev_packages()["mypackage"].other["editable"],
            serde_json::Value::Bool(true)
        );
    }

    #[test]
    fn render_is_stable() {
        let lockfile = Lockfile::from_string(LOCKFILE).unwrap();
        assert_eq!(lockfile.to_json().unwrap(), LOCKFILE);
    }

    #[test]
    fn parse_error_position() {
        let err = Lockfile::from_string("{\n    \"_meta\": {\n        \"hash\": ,\n").unwrap_err();
        let LockfileError::Parse { line, .. } = &err else {
            panic!("expected a parse error: {err:?}");
        };
        assert_eq!(*line, 3);
    }

    #[test]
    fn from_pipfile() {
        let pipfile = Pipfile::from_string(
            indoc! {r#"
                [[source]]
                url = "https://${TEST_HOST}/simple"
                name = "testindex"

                [packages]
                six = "*"
            "#}
            .to_string(),
        )
        .unwrap();
        let expanded = pipfile
            .expand(&pipenv_pipfile::Environment::from_iter([("TEST_HOST", "localhost:5000")]))
            .unwrap();

        let lockfile = Lockfile::new(&expanded, BTreeMap::new(), BTreeMap::new());

        assert!(lockfile.matches(&pipfile));
        // Expanded values are never written to the lockfile.
        insta::assert_snapshot!(lockfile.to_json().unwrap().replace(pipfile.hash(), "[HASH]"), @r#"
        {
            "_meta": {
                "hash": {
                    "sha256": "[HASH]"
                },
                "pipfile-spec": 6,
                "requires": {},
                "sources": [
                    {
                        "name": "testindex",
                        "url": "https://${TEST_HOST}/simple",
                        "verify_ssl": true
                    }
                ]
            },
            "default": {},
            "develop": {}
        }
        "#);
    }
}
