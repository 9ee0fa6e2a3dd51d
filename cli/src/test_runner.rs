use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use codespan_reporting::term::termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use serde::Deserialize;
use tracing::{debug, warn};
use transpiler::RenderConfig;

use btml::{Parser, Warning};

const FIXTURE_SUFFIX: &str = ".test.btml";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning must be reported on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// How to render the source before comparing output.
    #[serde(default)]
    pub render: RenderConfig,

    /// Expected HTML (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// If true, the fixture expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Expected parse error; its message must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Expected warnings. If present (even empty), count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

impl FixtureConfig {
    fn expects_failure(&self) -> bool {
        self.expect_parse_error || self.expect_error.is_some()
    }
}

/// Split a fixture into its TOML frontmatter and BTML source.
fn split_fixture(content: &str) -> Result<(FixtureConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let body = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);

    // Byte offset of the closing `---`, which may open the body directly.
    let close = if body.starts_with("---") {
        Some(0)
    } else {
        body.find("\n---").map(|i| i + 1)
    }
    .ok_or("missing closing --- frontmatter delimiter")?;
    let frontmatter = body[..close].trim_end_matches(['\r', '\n']);

    let rest = &body[close + "---".len()..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: FixtureConfig =
        toml::from_str(frontmatter).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum Outcome {
    Pass,
    Fail(String),
}

pub struct FixtureResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: Outcome,
}

impl FixtureResult {
    fn label(&self) -> &str {
        self.description
            .as_deref()
            .or_else(|| self.path.file_name().and_then(|s| s.to_str()))
            .unwrap_or("?")
    }
}

fn run_fixture(path: &Path) -> FixtureResult {
    let (description, outcome) = match std::fs::read_to_string(path) {
        Err(e) => (None, Err(format!("cannot read file: {}", e))),
        Ok(content) => match split_fixture(&content) {
            Err(e) => (None, Err(format!("frontmatter error: {}", e))),
            Ok((config, source)) => (config.description.clone(), check_fixture(&config, source)),
        },
    };

    FixtureResult {
        path: path.to_path_buf(),
        description,
        outcome: match outcome {
            Ok(()) => Outcome::Pass,
            Err(reason) => Outcome::Fail(reason),
        },
    }
}

/// Run one fixture's source against its expectations.
fn check_fixture(config: &FixtureConfig, source: &str) -> Result<(), String> {
    let parsed = Parser::new(source.to_string(), 0).parse_with_warnings();

    if config.expects_failure() {
        return match parsed {
            Ok(_) => Err("expected parse error, but parsing succeeded".into()),
            Err(err) => match &config.expect_error {
                Some(expected) if !err.to_string().contains(expected.as_str()) => Err(format!(
                    "expected error containing \"{}\", got: {}",
                    expected, err
                )),
                _ => Ok(()),
            },
        };
    }

    let (document, warnings) = parsed.map_err(|e| format!("unexpected parse error: {}", e))?;

    if let Some(expected) = &config.expect_output {
        let actual = transpiler::render(&document, &config.render);
        if actual.trim() != expected.trim() {
            return Err(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected.trim(),
                actual.trim()
            ));
        }
    }

    match &config.expect_warnings {
        Some(expected) => check_warnings(&warnings, expected),
        None => Ok(()),
    }
}

fn check_warnings(actual: &[Warning], expected: &[ExpectedWarning]) -> Result<(), String> {
    if actual.len() != expected.len() {
        let listed = if actual.is_empty() {
            "    (none)".to_string()
        } else {
            actual
                .iter()
                .map(|w| format!("  - {}", w))
                .collect::<Vec<_>>()
                .join("\n")
        };
        return Err(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual.len(),
            listed
        ));
    }

    for (i, (warning, expected)) in actual.iter().zip(expected).enumerate() {
        let message = warning.kind.to_string();
        if !message.contains(&expected.contains) {
            return Err(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, message
            ));
        }
        if let Some(line) = expected.line {
            if warning.position.line != line {
                return Err(format!(
                    "warning[{}]: expected on line {}, but reported on line {}",
                    i, line, warning.position.line
                ));
            }
        }
    }

    Ok(())
}

/// Fixtures grouped by category (subfolder relative to `root`, "" for the
/// root itself), sorted.
fn discover(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    if root.is_file() {
        categories.insert(String::new(), vec![root.to_path_buf()]);
        return categories;
    }
    collect_fixtures(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_fixtures(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_fixtures(&path, root, out);
            continue;
        }
        let is_fixture = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(FIXTURE_SUFFIX));
        if is_fixture {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given fixture path.
pub fn list_categories(path: &Path) {
    let categories = discover(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// Keep only the requested categories (and their subcategories).
fn select<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&format!("{}/", request)) {
                selected.insert(category.as_str(), files);
            }
        }
        if selected.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

fn write_colored(out: &mut StandardStream, text: &str, color: Color, bold: bool) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
    write!(out, "{}", text)?;
    out.reset()
}

/// Run all fixtures under `path` (or a single fixture file).
/// Returns the process exit code: 0 when everything passed, 1 otherwise.
pub fn run_tests(path: &Path, color: ColorChoice, categories: &[String]) -> io::Result<i32> {
    let mut out = StandardStream::stderr(color);

    let all = discover(path);
    if all.is_empty() {
        writeln!(out, "no {} files found in {}", FIXTURE_SUFFIX, path.display())?;
        return Ok(1);
    }

    let selected = select(&all, categories);
    if selected.is_empty() {
        writeln!(out, "no matching categories found")?;
        return Ok(1);
    }

    let mut passed = 0usize;
    let mut failures: Vec<FixtureResult> = Vec::new();

    for (category, files) in &selected {
        writeln!(out)?;
        out.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(out, "{}", category_label(category))?;
        out.reset()?;

        for file in *files {
            let result = run_fixture(file);
            debug!(path = %file.display(), passed = matches!(result.outcome, Outcome::Pass), "ran fixture");
            write!(out, "  ")?;
            match result.outcome {
                Outcome::Pass => {
                    write_colored(&mut out, "PASS", Color::Green, false)?;
                    writeln!(out, "  {}", result.label())?;
                    passed += 1;
                }
                Outcome::Fail(_) => {
                    write_colored(&mut out, "FAIL", Color::Red, false)?;
                    writeln!(out, "  {}", result.label())?;
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "failures:")?;
        for failure in &failures {
            writeln!(out)?;
            writeln!(out, "  --- {} ---", failure.path.display())?;
            if let Outcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    writeln!(out, "  {}", line)?;
                }
            }
        }
    }

    writeln!(out)?;
    write!(out, "test result: ")?;
    if failures.is_empty() {
        write_colored(&mut out, "ok", Color::Green, true)?;
        writeln!(out, ". {} passed, 0 failed", passed)?;
        Ok(0)
    } else {
        write_colored(&mut out, "FAILED", Color::Red, true)?;
        writeln!(
            out,
            ". {} passed, {} failed (of {})",
            passed,
            failures.len(),
            passed + failures.len()
        )?;
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
        dir
    }

    fn check(content: &str) -> Result<(), String> {
        let (config, source) = split_fixture(content)?;
        check_fixture(&config, source)
    }

    #[test]
    fn splits_frontmatter() {
        let (config, source) =
            split_fixture("---\ndescription = \"x\"\n---\np \"hi\"\n").unwrap();
        assert_eq!(config.description.as_deref(), Some("x"));
        assert_eq!(source, "p \"hi\"\n");
        assert!(!config.render.pretty);
    }

    #[test]
    fn rejects_missing_delimiters() {
        assert!(split_fixture("p \"hi\"").is_err());
        assert!(split_fixture("---\ndescription = \"x\"\np \"hi\"").is_err());
        assert!(split_fixture("---\nunknown_key = 1\n---\np \"hi\"").is_err());
    }

    #[test]
    fn output_expectations() {
        assert!(check("---\nexpect_output = \"<p>hi</p>\"\n---\np \"hi\"").is_ok());
        let err = check("---\nexpect_output = \"<p>no</p>\"\n---\np \"hi\"").unwrap_err();
        assert!(err.starts_with("output mismatch"));
    }

    #[test]
    fn render_options_apply() {
        let fixture = "---\nrender = { pretty = true, indent_width = 1 }\nexpect_output = '''\n<ul>\n <li>a</li>\n</ul>\n'''\n---\nul { li \"a\" }";
        assert_eq!(check(fixture), Ok(()));
    }

    #[test]
    fn error_expectations() {
        assert!(check("---\nexpect_parse_error = true\n---\ndiv {").is_ok());
        assert!(check("---\nexpect_error = \"unclosed block\"\n---\ndiv {").is_ok());
        let err = check("---\nexpect_error = \"no body\"\n---\ndiv {").unwrap_err();
        assert!(err.contains("got: unclosed block"));
        let err = check("---\nexpect_parse_error = true\n---\ndiv { }").unwrap_err();
        assert_eq!(err, "expected parse error, but parsing succeeded");
        let err = check("---\n---\ndiv {").unwrap_err();
        assert!(err.starts_with("unexpected parse error"));
    }

    #[test]
    fn warning_expectations() {
        let fixture = "---\nexpect_warnings = [{ contains = \"duplicate attribute\", line = 2 }]\n---\ndiv {\n  p[id=\"a\", id=\"b\"] \"x\"\n}";
        assert_eq!(check(fixture), Ok(()));

        let wrong_line = fixture.replace("line = 2", "line = 1");
        assert!(check(&wrong_line).unwrap_err().contains("expected on line 1"));

        let none_expected = "---\nexpect_warnings = []\n---\ndiv.";
        assert!(check(none_expected).unwrap_err().starts_with("expected 0 warning(s), got 1"));
    }

    #[test]
    fn discovers_categories() {
        let dir = fixture_dir(&[
            ("top.test.btml", "---\n---\np \"x\""),
            ("a/one.test.btml", "---\n---\np \"x\""),
            ("a/b/two.test.btml", "---\n---\np \"x\""),
            ("a/notes.txt", "ignored"),
        ]);
        let found = discover(dir.path());
        let keys: Vec<&str> = found.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["", "a", "a/b"]);

        let picked = select(&found, &["a".to_string()]);
        let keys: Vec<&str> = picked.keys().copied().collect();
        assert_eq!(keys, vec!["a", "a/b"]);
    }

    #[test]
    fn exit_codes() {
        let passing = fixture_dir(&[("ok.test.btml", "---\nexpect_output = \"<br />\"\n---\nbr.")]);
        assert_eq!(run_tests(passing.path(), ColorChoice::Never, &[]).unwrap(), 0);

        let failing = fixture_dir(&[("bad.test.btml", "---\nexpect_output = \"<hr />\"\n---\nbr.")]);
        assert_eq!(run_tests(failing.path(), ColorChoice::Never, &[]).unwrap(), 1);

        let single = failing.path().join("bad.test.btml");
        assert_eq!(run_tests(&single, ColorChoice::Never, &[]).unwrap(), 1);

        let empty = fixture_dir(&[]);
        assert_eq!(run_tests(empty.path(), ColorChoice::Never, &[]).unwrap(), 1);
    }

    #[test]
    fn bundled_fixtures_pass() {
        let cases = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/cases");
        assert_eq!(run_tests(&cases, ColorChoice::Never, &[]).unwrap(), 0);
    }
}
