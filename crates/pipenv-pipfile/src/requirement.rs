use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use toml_edit::{Array, InlineTable, Value};

/// A package entry in `[packages]` or `[dev-packages]`.
///
/// Either a plain version specifier:
///
/// ```toml
/// pytz = "*"
/// ```
///
/// Or a table:
///
/// ```toml
/// six = { version = "*", index = "pypi" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackageSpec {
    Version(String),
    Detailed(DetailedSpec),
}

/// The table form of a [`PackageSpec`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The name of the source the package must be installed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<String>,
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Any other keys (e.g., `os_name`, `sys_platform`), kept verbatim.
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl PackageSpec {
    /// The version specifier, where `*` means any version.
    pub fn version(&self) -> &str {
        match self {
            Self::Version(version) => version,
            Self::Detailed(spec) => spec.version.as_deref().unwrap_or("*"),
        }
    }

    /// The name of the source the package is pinned to, if any.
    pub fn index(&self) -> Option<&str> {
        match self {
            Self::Version(_) => None,
            Self::Detailed(spec) => spec.index.as_deref(),
        }
    }

    /// Render the specifier as a TOML value, as it would appear in a `Pipfile`.
    pub fn to_toml_value(&self) -> Value {
        match self {
            Self::Version(version) => Value::from(version.as_str()),
            Self::Detailed(spec) => {
                let mut table = InlineTable::new();
                if let Some(version) = &spec.version {
                    table.insert("version", Value::from(version.as_str()));
                }
                if let Some(index) = &spec.index {
                    table.insert("index", Value::from(index.as_str()));
                }
                if let Some(extras) = &spec.extras {
                    table.insert(
                        "extras",
                        Value::Array(extras.iter().map(String::as_str).collect::<Array>()),
                    );
                }
                if let Some(markers) = &spec.markers {
                    table.insert("markers", Value::from(markers.as_str()));
                }
                if let Some(editable) = spec.editable {
                    table.insert("editable", Value::from(editable));
                }
                if let Some(path) = &spec.path {
                    table.insert("path", Value::from(path.as_str()));
                }
                if let Some(git) = &spec.git {
                    table.insert("git", Value::from(git.as_str()));
                }
                if let Some(reference) = &spec.reference {
                    table.insert("ref", Value::from(reference.as_str()));
                }
                for (key, value) in &spec.other {
                    if let Some(value) = json_to_toml(value) {
                        table.insert(key.as_str(), value);
                    }
                }
                Value::InlineTable(table)
            }
        }
    }
}

impl From<&str> for PackageSpec {
    fn from(version: &str) -> Self {
        Self::Version(version.to_string())
    }
}

impl Display for PackageSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_toml_value().to_string().trim())
    }
}

/// Convert a JSON value to TOML. `null` has no TOML equivalent and is dropped.
fn json_to_toml(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(value) => Some(Value::from(*value)),
        serde_json::Value::Number(number) => number
            .as_i64()
            .map(Value::from)
            .or_else(|| number.as_f64().map(Value::from)),
        serde_json::Value::String(value) => Some(Value::from(value.as_str())),
        serde_json::Value::Array(values) => Some(Value::Array(
            values.iter().filter_map(json_to_toml).collect::<Array>(),
        )),
        serde_json::Value::Object(map) => {
            let mut table = InlineTable::new();
            for (key, value) in map {
                if let Some(value) = json_to_toml(value) {
                    table.insert(key.as_str(), value);
                }
            }
            Some(Value::InlineTable(table))
        }
    }
}

/// Normalize a package name for comparison, as in PEP 503.
///
/// Runs of `-`, `_` and `.` collapse to a single `-`, and the result is lowercased.
pub fn normalize_package_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_separator {
                normalized.push('-');
            }
            last_separator = true;
        } else {
            normalized.push(c.to_ascii_lowercase());
            last_separator = false;
        }
    }
    normalized
}
