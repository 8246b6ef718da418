use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

use crate::expand::has_placeholder;

/// The name of the source used when a `Pipfile` declares none.
pub const DEFAULT_SOURCE_NAME: &str = "pypi";

/// The URL of the source used when a `Pipfile` declares none.
pub const DEFAULT_SOURCE_URL: &str = "https://pypi.org/simple";

/// A package index declared in a `[[source]]` table.
///
/// ```toml
/// [[source]]
/// url = "https://${INDEX_HOST}/simple"
/// verify_ssl = true
/// name = "internal"
/// ```
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// The name of the source, unique within a `Pipfile`.
    ///
    /// Packages pin themselves to a source by name, as in
    /// `six = { version = "*", index = "pypi" }`.
    pub name: String,
    /// The URL of the source.
    ///
    /// May contain `${NAME}` placeholders until the `Pipfile` is expanded.
    pub url: String,
    /// Whether TLS certificates are verified when talking to the source.
    ///
    /// Accepts either a boolean or one of the strings `"true"` and `"false"`. A `${NAME}`
    /// placeholder reads as `true` until the `Pipfile` is expanded.
    #[serde(default = "default_verify_ssl", deserialize_with = "deserialize_verify_ssl")]
    pub verify_ssl: bool,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>, verify_ssl: bool) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            verify_ssl,
        }
    }

    /// The source used when a `Pipfile` declares none.
    pub fn pypi() -> Self {
        Self::new(DEFAULT_SOURCE_NAME, DEFAULT_SOURCE_URL, true)
    }

    /// Return the source as a mapping from field name to value.
    pub fn to_map(&self) -> BTreeMap<&'static str, serde_json::Value> {
        BTreeMap::from([
            ("name", serde_json::Value::from(self.name.as_str())),
            ("url", serde_json::Value::from(self.url.as_str())),
            ("verify_ssl", serde_json::Value::from(self.verify_ssl)),
        ])
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

fn default_verify_ssl() -> bool {
    true
}

/// Deserialize `verify_ssl`, which older `Pipfile`s write as a string.
fn deserialize_verify_ssl<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(value) => Ok(value),
        BoolOrString::String(value) if value.eq_ignore_ascii_case("true") => Ok(true),
        BoolOrString::String(value) if value.eq_ignore_ascii_case("false") => Ok(false),
        // Resolved once the `Pipfile` is expanded. An unset variable keeps the default.
        BoolOrString::String(value) if has_placeholder(&value) => Ok(default_verify_ssl()),
        BoolOrString::String(value) => Err(serde::de::Error::custom(format!(
            "`verify_ssl` must be `true` or `false`, found: `{value}`"
        ))),
    }
}
