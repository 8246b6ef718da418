//! Expansion of `${NAME}` placeholders in `Pipfile` string values.
//!
//! Expansion always produces a new value and never touches its input, so the raw, unexpanded
//! `Pipfile` is what gets written back to disk.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use toml_edit::{DocumentMut, Formatted, Item, Table, Value};
use tracing::trace;

/// Matches `${NAME}`, where `NAME` follows the POSIX rules for variable names.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<var>\$\{(?P<name>[A-Za-z_][A-Za-z0-9_]*)\})")
        .expect("placeholder pattern is valid")
});

/// A snapshot of environment variables used to expand placeholders.
///
/// Expansion reads from an explicit snapshot rather than the process environment, so callers
/// decide when the environment is captured.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Environment(FxHashMap<String, String>);

impl Environment {
    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        Self(
            std::env::vars_os()
                .filter_map(|(key, value)| {
                    Some((key.into_string().ok()?, value.into_string().ok()?))
                })
                .collect(),
        )
    }

    /// Return the value of the variable `name`, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Expand all `${NAME}` placeholders in `s` using `env`.
///
/// Placeholders naming a variable that isn't set are left in place, verbatim. Only the braced
/// form is recognized, so a bare `$` is never expanded.
pub fn expand_env_vars<'a>(s: &'a str, env: &Environment) -> Cow<'a, str> {
    PLACEHOLDER.replace_all(s, |caps: &regex::Captures<'_>| match env.get(&caps["name"]) {
        Some(value) => value.to_string(),
        None => caps["var"].to_string(),
    })
}

/// Return the names of the variables referenced by `s` that aren't set in `env`.
pub fn unexpanded_vars<'a>(s: &'a str, env: &Environment) -> Vec<&'a str> {
    PLACEHOLDER
        .captures_iter(s)
        .filter_map(|caps| caps.name("name"))
        .map(|name| name.as_str())
        .filter(|name| env.get(name).is_none())
        .collect()
}

/// Return `true` if `s` still contains a `${NAME}` placeholder.
pub fn has_placeholder(s: &str) -> bool {
    PLACEHOLDER.is_match(s)
}

/// The result of expanding a TOML document.
#[derive(Debug, Clone)]
pub struct ExpandedDocument {
    /// The document, with every string value expanded.
    pub document: DocumentMut,
    /// The variables that were referenced but not set, in order of first appearance.
    pub missing: Vec<String>,
}

/// Expand every string value reachable in `document`, returning a new document.
///
/// Strings nested in arrays, inline tables, tables and arrays of tables are all expanded. Keys
/// are not.
pub fn expand_document(document: &DocumentMut, env: &Environment) -> ExpandedDocument {
    let mut expanded = document.clone();
    let mut expander = Expander {
        env,
        missing: Vec::new(),
        seen: FxHashSet::default(),
    };
    expander.table(expanded.as_table_mut());
    ExpandedDocument {
        document: expanded,
        missing: expander.missing,
    }
}

struct Expander<'env> {
    env: &'env Environment,
    missing: Vec<String>,
    seen: FxHashSet<String>,
}

impl Expander<'_> {
    fn table(&mut self, table: &mut Table) {
        for (_, item) in table.iter_mut() {
            self.item(item);
        }
    }

    fn item(&mut self, item: &mut Item) {
        match item {
            Item::None => {}
            Item::Value(value) => self.value(value),
            Item::Table(table) => self.table(table),
            Item::ArrayOfTables(tables) => {
                for table in tables.iter_mut() {
                    self.table(table);
                }
            }
        }
    }

    fn value(&mut self, value: &mut Value) {
        match value {
            Value::String(string) => {
                for name in unexpanded_vars(string.value(), self.env) {
                    if self.seen.insert(name.to_string()) {
                        self.missing.push(name.to_string());
                    }
                }
                if let Cow::Owned(expanded) = expand_env_vars(string.value(), self.env) {
                    trace!("Expanded `{}`", string.value());
                    let decor = string.decor().clone();
                    *string = Formatted::new(expanded);
                    *string.decor_mut() = decor;
                }
            }
            Value::Array(array) => {
                for value in array.iter_mut() {
                    self.value(value);
                }
            }
            Value::InlineTable(table) => {
                for (_, value) in table.iter_mut() {
                    self.value(value);
                }
            }
            Value::Integer(_)
            | Value::Float(_)
            | Value::Boolean(_)
            | Value::Datetime(_) => {}
        }
    }
}
