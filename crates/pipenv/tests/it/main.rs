use std::collections::BTreeMap;

use assert_cmd::Command;
use assert_fs::prelude::*;
use indoc::indoc;
use predicates::prelude::*;

use pipenv_lock::Lockfile;
use pipenv_pipfile::Pipfile;
use pipenv_static::EnvVars;

const TWO_SOURCES: &str = indoc! {r#"
    [[source]]
    url = "https://pypi.org/simple"
    verify_ssl = true
    name = "pypi"

    [[source]]
    url = "http://localhost:8080/simple"
    verify_ssl = false
    name = "testindex"

    [packages]
    six = { version = "*", index = "pypi" }

    [dev-packages]
"#};

const TESTINDEX_JSON: &str = indoc! {r#"
    {
      "name": "testindex",
      "url": "http://localhost:8080/simple",
      "verify_ssl": false
    }
"#};

struct TestContext {
    temp_dir: assert_fs::TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().unwrap(),
        }
    }

    fn with_pipfile(contents: &str) -> Self {
        let context = Self::new();
        context.temp_dir.child("Pipfile").write_str(contents).unwrap();
        context
    }

    /// A `pipenv` command running in the temporary directory, isolated from the outer
    /// environment.
    fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_pipenv"));
        command
            .current_dir(self.temp_dir.path())
            .env_remove(EnvVars::PIPENV_PIPFILE)
            .env_remove(EnvVars::PIPENV_MAX_DEPTH)
            .env_remove(EnvVars::RUST_LOG)
            .env_remove(EnvVars::FORCE_COLOR)
            .env(EnvVars::NO_COLOR, "1");
        command
    }

    fn read(&self, name: &str) -> String {
        fs_err::read_to_string(self.temp_dir.child(name).path()).unwrap()
    }
}

#[test]
fn sources_expand_environment() {
    let context = TestContext::with_pipfile(indoc! {r#"
        [[source]]
        url = 'https://${TEST_HOST}/simple'
        verify_ssl = true
        name = "pypi"
    "#});

    context
        .command()
        .arg("sources")
        .env("TEST_HOST", "localhost:5000")
        .assert()
        .success()
        .stdout("pypi https://localhost:5000/simple\n");

    // The expanded value is never written back.
    assert!(!context.read("Pipfile").contains("localhost:5000"));
}

#[test]
fn sources_warn_on_unset_variable() {
    let context = TestContext::with_pipfile(indoc! {r#"
        [[source]]
        url = "https://${PIPENV_IT_UNSET_HOST}/simple"
        verify_ssl = false
        name = "internal"
    "#});

    context
        .command()
        .arg("sources")
        .env_remove("PIPENV_IT_UNSET_HOST")
        .assert()
        .success()
        .stdout("internal https://${PIPENV_IT_UNSET_HOST}/simple (verify_ssl = false)\n")
        .stderr(predicate::str::contains(
            "warning: Environment variable `PIPENV_IT_UNSET_HOST` is referenced in",
        ));
}

#[test]
fn source_get_and_find_agree() {
    let context = TestContext::with_pipfile(TWO_SOURCES);

    for args in [
        &["source", "get", "--name", "testindex"][..],
        &["source", "get", "--url", "http://localhost:8080/simple"][..],
        &["source", "find", "testindex"][..],
        &["source", "find", "http://localhost:8080/simple"][..],
    ] {
        context
            .command()
            .args(args)
            .assert()
            .success()
            .stdout(TESTINDEX_JSON);
    }
}

#[test]
fn source_get_requires_one_selector() {
    let context = TestContext::with_pipfile(TWO_SOURCES);

    for args in [
        &["source", "get"][..],
        &["source", "get", "--name", "pypi", "--url", "https://pypi.org/simple"][..],
    ] {
        context
            .command()
            .args(args)
            .assert()
            .code(2)
            .stderr("error: Exactly one of a source name or URL must be provided\n");
    }
}

#[test]
fn source_not_found() {
    let context = TestContext::with_pipfile(TWO_SOURCES);

    context
        .command()
        .args(["source", "find", "internal"])
        .assert()
        .code(2)
        .stderr("error: No source found with name or URL `internal`\n");
}

#[test]
fn missing_pipfile() {
    let context = TestContext::new();

    context
        .command()
        .arg("sources")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No `Pipfile` found"))
        .stderr(predicate::str::contains("hint: Run `pipenv init` to create one"));
}

#[test]
fn explicit_pipfile() {
    let context = TestContext::new();
    context
        .temp_dir
        .child("config")
        .child("Pipfile")
        .write_str(TWO_SOURCES)
        .unwrap();

    context
        .command()
        .args(["source", "find", "testindex"])
        .env(EnvVars::PIPENV_PIPFILE, "config/Pipfile")
        .assert()
        .success()
        .stdout(TESTINDEX_JSON);
}

#[test]
fn init_add_remove() {
    let context = TestContext::new();

    context
        .command()
        .arg("init")
        .assert()
        .success()
        .stderr("Created `Pipfile`\n");
    context
        .command()
        .arg("init")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("A `Pipfile` already exists"));

    context
        .command()
        .args(["add", "requests", "==2.31.0", "--index", "pypi"])
        .assert()
        .success()
        .stderr("Added `requests` to `[packages]`\n");
    context
        .command()
        .args(["add", "pytest", "--dev"])
        .assert()
        .success()
        .stderr("Added `pytest` to `[dev-packages]`\n");

    insta::assert_snapshot!(context.read("Pipfile"), @r#"
    [[source]]
    url = "https://pypi.org/simple"
    verify_ssl = true
    name = "pypi"

    [packages]
    requests = { version = "==2.31.0", index = "pypi" }

    [dev-packages]
    pytest = "*"
    "#);

    context
        .command()
        .args(["remove", "pytest"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "error: The package `pytest` could not be found in `[packages]`",
        ))
        .stderr(predicate::str::contains("`pytest` is a development package"));
    context
        .command()
        .args(["remove", "pytest", "--dev"])
        .assert()
        .success()
        .stderr("Removed `pytest` from `[dev-packages]`\n");
    assert!(!context.read("Pipfile").contains("pytest"));
}

#[test]
fn add_unknown_index() {
    let context = TestContext::with_pipfile(TWO_SOURCES);

    context
        .command()
        .args(["add", "requests", "--index", "internal"])
        .assert()
        .code(1)
        .stderr("error: Package `requests` references an unknown source: `internal`\n");
    assert_eq!(context.read("Pipfile"), TWO_SOURCES);
}

#[test]
fn add_preserves_crlf() {
    let context = TestContext::with_pipfile(&TWO_SOURCES.replace('\n', "\r\n"));

    context.command().args(["add", "pytz"]).assert().success();

    let pipfile = context.read("Pipfile");
    assert!(pipfile.contains("pytz = \"*\"\r\n"));
    assert_eq!(pipfile.matches('\n').count(), pipfile.matches("\r\n").count());
}

const LOCKFILE: &str = indoc! {r#"
    {
        "_meta": {
            "hash": {
                "sha256": "0000"
            },
            "pipfile-spec": 6,
            "requires": {},
            "sources": []
        },
        "default": {},
        "develop": {}
    }
"#};

#[test]
fn write_lock_preserves_crlf() {
    let context = TestContext::with_pipfile(TWO_SOURCES);
    context
        .temp_dir
        .child("Pipfile.lock")
        .write_str(&LOCKFILE.replace('\n', "\r\n"))
        .unwrap();
    context.temp_dir.child("lock.json").write_str(LOCKFILE).unwrap();

    context
        .command()
        .args(["write-lock", "lock.json"])
        .assert()
        .success()
        .stderr("Wrote `Pipfile.lock`\n");
    assert_eq!(context.read("Pipfile.lock"), LOCKFILE.replace('\n', "\r\n"));

    context
        .command()
        .args(["write-lock", "lock.json", "--line-ending", "lf"])
        .assert()
        .success();
    assert_eq!(context.read("Pipfile.lock"), LOCKFILE);
}

#[test]
fn write_lock_rejects_invalid_contents() {
    let context = TestContext::with_pipfile(TWO_SOURCES);
    context.temp_dir.child("Pipfile.lock").write_str(LOCKFILE).unwrap();
    context.temp_dir.child("lock.json").write_str("{\n").unwrap();

    context
        .command()
        .args(["write-lock", "lock.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("`lock.json` is not a valid lockfile"));
    assert_eq!(context.read("Pipfile.lock"), LOCKFILE);
}

#[test]
fn check() {
    let context = TestContext::with_pipfile(TWO_SOURCES);

    context
        .command()
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No `Pipfile.lock` found"));

    context.temp_dir.child("Pipfile.lock").write_str(LOCKFILE).unwrap();
    context
        .command()
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("`Pipfile.lock` is out of date"));

    let pipfile = Pipfile::from_string(TWO_SOURCES.to_string()).unwrap();
    let lockfile = Lockfile::new(&pipfile, BTreeMap::new(), BTreeMap::new());
    context
        .temp_dir
        .child("lock.json")
        .write_str(&lockfile.to_json().unwrap())
        .unwrap();
    context
        .command()
        .args(["write-lock", "lock.json"])
        .assert()
        .success();
    context
        .command()
        .arg("check")
        .assert()
        .success()
        .stderr("`Pipfile.lock` is up to date\n");
}

#[test]
fn sources_prefer_lockfile() {
    let context = TestContext::with_pipfile(TWO_SOURCES);
    context
        .temp_dir
        .child("Pipfile.lock")
        .write_str(&LOCKFILE.replace(
            "\"sources\": []",
            "\"sources\": [{\"name\": \"mirror\", \"url\": \"https://${MIRROR}/simple\", \"verify_ssl\": true}]",
        ))
        .unwrap();

    context
        .command()
        .arg("sources")
        .env("MIRROR", "mirror.local")
        .assert()
        .success()
        .stdout("mirror https://mirror.local/simple\n");
}

#[test]
fn test_index_override() {
    let context = TestContext::with_pipfile(indoc! {r#"
        [[source]]
        url = "${PIPENV_TEST_INDEX}"
        verify_ssl = false
        name = "testindex"
    "#});

    context
        .command()
        .args(["source", "get", "--url", "http://localhost:8080/simple"])
        .env(EnvVars::PIPENV_TEST_INDEX, "http://localhost:8080/simple")
        .assert()
        .success()
        .stdout(TESTINDEX_JSON);
}
