//! Golden-file runner: expands every case in `fixtures/manifest.json` and
//! diffs the result against its `.expected.swift` file.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use codable_gen::codegen::Codegen;
use codable_gen::expand::expand_source;
use codable_gen::path_de::from_str_with_path;
use colored::Colorize;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    name: String,
    input: PathBuf,
    expected: PathBuf,
    #[serde(default)]
    indent_width: Option<usize>,
    #[serde(default)]
    warnings: usize,
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn load_manifest(dir: &Path) -> Result<Manifest, String> {
    let path = dir.join("manifest.json");
    let src = std::fs::read_to_string(&path).map_err(|e| format!("{}: {e}", path.display()))?;
    from_str_with_path(&src).map_err(|err| format!("{}: {err}", path.display()))
}

fn run_case(dir: &Path, case: &Case) -> Result<(), String> {
    let read = |p: &Path| {
        std::fs::read_to_string(dir.join(p)).map_err(|e| format!("{}: {e}", p.display()))
    };
    let input = read(&case.input)?;
    let expected = read(&case.expected)?;

    let codegen = case.indent_width.map_or_else(Codegen::new, Codegen::with_indent_width);
    let actual = expand_source(&input, &codegen).map_err(|e| e.to_string())?;

    if actual.diagnostics.len() != case.warnings {
        return Err(format!(
            "expected {} warning(s), got {}: {:#?}",
            case.warnings,
            actual.diagnostics.len(),
            actual.diagnostics
        ));
    }
    if actual.source != expected {
        return Err(first_difference(&expected, &actual.source));
    }
    Ok(())
}

fn first_difference(expected: &str, actual: &str) -> String {
    let mut expected_lines = expected.lines();
    let mut actual_lines = actual.lines();
    for line_no in 1.. {
        match (expected_lines.next(), actual_lines.next()) {
            (Some(e), Some(a)) if e == a => continue,
            (None, None) => break,
            (e, a) => {
                return format!(
                    "line {line_no}:\n  {} {}\n  {} {}",
                    "expected".green(),
                    e.unwrap_or("<eof>"),
                    "actual  ".red(),
                    a.unwrap_or("<eof>")
                );
            }
        }
    }
    "outputs differ in trailing whitespace".to_string()
}

fn main() -> ExitCode {
    let dir = fixtures_dir();
    let manifest = match load_manifest(&dir) {
        Ok(manifest) => manifest,
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0usize;
    for case in &manifest.cases {
        match run_case(&dir, case) {
            Ok(()) => println!("{} {}", "PASS".green().bold(), case.name),
            Err(reason) => {
                failed += 1;
                println!("{} {}\n{reason}", "FAIL".red().bold(), case.name);
            }
        }
    }

    println!("\n{} passed, {} failed", manifest.cases.len() - failed, failed);
    if failed > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
