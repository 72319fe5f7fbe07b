//! Minimal CLI: swift sources → (expanded sources | field model)
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::Settings;
use crate::error::Error;
use crate::expand::{self, Diagnostic, ExpandedSource};
use crate::ir::TypeModel;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// expand `@Codable` classes into CodingKeys / init(from:) / encode(to:) boilerplate
#[derive(Parser, Debug)]
#[command(name = "codable-gen", version)]
pub struct CommandLineInterface {
    /// more logging (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// expand annotated declarations and print or write the result
    Expand(ExpandOut),
    /// print the extracted field model of every annotated class as JSON
    Model(ModelOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// spaces per indentation level (overrides the settings file)
    #[arg(long)]
    indent_width: Option<usize>,
}

#[derive(clap::Parser, Debug)]
struct ExpandOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// compare with the files in --out instead of writing them
    #[arg(long, requires = "out")]
    check: bool,

    /// exit with an error when any warning was reported
    #[arg(long)]
    deny_warnings: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ModelOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(Debug, Serialize)]
struct ModelEntry {
    path: String,
    #[serde(flatten)]
    model: TypeModel,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(width) = self.indent_width {
            settings.indent_width = width;
        }
        Ok(settings)
    }

    fn load_sources(&self) -> anyhow::Result<Vec<(PathBuf, String)>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        source_paths
            .into_iter()
            .map(|path| -> anyhow::Result<(PathBuf, String)> {
                let source = std::fs::read_to_string(&path)
                    .map_err(|source| Error::Read { path: path.clone(), source })?;
                Ok((path, source))
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Expand(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.run()
            }
            Command::Model(target) => {
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.run()
            }
        }
    }
}

impl ExpandOut {
    fn run(&self) -> anyhow::Result<()> {
        let settings = self.input_settings.settings()?;
        let codegen = settings.codegen();
        let sources = self.input_settings.load_sources()?;

        // files are independent; collect keeps input order
        let expanded = sources
            .par_iter()
            .map(|(path, source)| {
                expand::expand_source(source, &codegen)
                    .map(|result| (path.as_path(), result))
                    .map_err(|source| Error::Parse { path: path.clone(), source })
            })
            .collect::<Result<Vec<(&Path, ExpandedSource)>, Error>>()?;

        let mut warnings = 0usize;
        let mut drifted = Vec::new();
        for (path, result) in &expanded {
            warnings += report_diagnostics(path, &result.diagnostics);
            tracing::info!(path = %path.display(), declarations = result.expanded, "expanded");

            let Some(out_dir) = &self.out else {
                print!("{}", result.source);
                if !result.source.ends_with('\n') {
                    println!();
                }
                continue;
            };
            let out_path = settings.output_path(out_dir, path);
            if self.check {
                let current = read_existing(&out_path)?;
                if current.as_deref() != Some(result.source.as_str()) {
                    drifted.push(out_path);
                }
                continue;
            }
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|source| Error::Write { path: parent.to_path_buf(), source })?;
            }
            std::fs::write(&out_path, &result.source)
                .map_err(|source| Error::Write { path: out_path.clone(), source })?;
            tracing::debug!(path = %out_path.display(), "written");
        }

        if !drifted.is_empty() {
            for path in &drifted {
                eprintln!("{} {} is out of date", "stale:".red().bold(), path.display());
            }
            bail!("{} generated file(s) out of date", drifted.len());
        }
        if self.deny_warnings && warnings > 0 {
            bail!("{warnings} warning(s) treated as errors");
        }
        Ok(())
    }
}

impl ModelOut {
    fn run(&self) -> anyhow::Result<()> {
        let sources = self.input_settings.load_sources()?;
        let mut entries = Vec::new();
        for (path, source) in &sources {
            let file = crate::syntax::parse_source(source)
                .map_err(|source| Error::Parse { path: path.clone(), source })?;
            for (type_name, decl) in expand::annotated_declarations(&file) {
                match crate::lower::extract_as(decl, &type_name) {
                    Ok(model) => entries.push(ModelEntry { path: path.display().to_string(), model }),
                    Err(error) => tracing::warn!(path = %path.display(), %error, "skipped"),
                }
            }
        }

        let json = serde_json::to_string_pretty(&entries)?;
        match &self.out {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|source| Error::Write { path: parent.to_path_buf(), source })?;
                }
                std::fs::write(out, &json)
                    .map_err(|source| Error::Write { path: out.clone(), source })?;
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report_diagnostics(path: &Path, diagnostics: &[Diagnostic]) -> usize {
    for diagnostic in diagnostics {
        eprintln!(
            "{} {}:{}:{}: {}",
            "warning:".yellow().bold(),
            path.display(),
            diagnostic.line,
            diagnostic.column,
            diagnostic.message
        );
    }
    diagnostics.len()
}

/// `None` when nothing has been generated at `path` yet.
fn read_existing(path: &Path) -> Result<Option<String>, Error> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::Read { path: path.to_path_buf(), source }),
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // Treat as a glob pattern
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "@Codable\npublic class User {\n    let id: Int\n    let nickname: String?\n}\n";

    fn run(args: &[&str]) -> anyhow::Result<()> {
        let argv = std::iter::once("codable-gen").chain(args.iter().copied());
        CommandLineInterface::try_parse_from(argv)?.run()
    }

    #[test]
    fn expand_writes_into_out_dir_with_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("User.swift");
        std::fs::write(&input, SOURCE).unwrap();
        let config = dir.path().join("settings.json");
        std::fs::write(&config, r#"{ "output_suffix": "+Codable", "indent_width": 2 }"#).unwrap();
        let out = dir.path().join("gen");

        run(&[
            "expand",
            "--input",
            input.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .unwrap();

        let written = std::fs::read_to_string(out.join("User+Codable.swift")).unwrap();
        assert!(written.starts_with("public class User {"));
        assert!(written.contains("\n  public required init(from decoder: Decoder) throws {\n"));
        assert!(written.contains("nickname = try container.decodeIfPresent(String.self, forKey: .nickname)"));
        assert!(written.ends_with("extension User: Codable {\n}\n"));
    }

    #[test]
    fn check_detects_stale_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("User.swift");
        std::fs::write(&input, SOURCE).unwrap();
        let out = dir.path().join("gen");
        let args = ["expand", "--input", input.to_str().unwrap(), "--out", out.to_str().unwrap()];

        assert!(run(&[&args[..], &["--check"][..]].concat()).is_err(), "nothing generated yet");
        run(&args).unwrap();
        run(&[&args[..], &["--check"][..]].concat()).unwrap();

        std::fs::write(&input, SOURCE.replace("let id: Int", "let id: UInt")).unwrap();
        assert!(run(&[&args[..], &["--check"][..]].concat()).is_err());
    }

    #[test]
    fn check_surfaces_unreadable_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("User.swift");
        std::fs::write(&input, SOURCE).unwrap();
        let out = dir.path().join("gen");
        // a directory where the generated file should be
        std::fs::create_dir_all(out.join("User.swift")).unwrap();

        let err = run(&["expand", "--input", input.to_str().unwrap(), "--out", out.to_str().unwrap(), "--check"])
            .unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::Read { path, .. }) => assert_eq!(path, &out.join("User.swift")),
            other => panic!("expected a read error, got {other:?} ({err:#})"),
        }
    }

    #[test]
    fn read_existing_distinguishes_missing_from_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.swift");
        assert!(read_existing(&path).unwrap().is_none());
        std::fs::write(&path, "class A {}\n").unwrap();
        assert_eq!(read_existing(&path).unwrap().as_deref(), Some("class A {}\n"));
    }

    #[test]
    fn deny_warnings_fails_on_unsupported_declarations() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Point.swift");
        std::fs::write(&input, "@Codable\nstruct Point {\n    let x: Int\n}\n").unwrap();
        let out = dir.path().join("gen");
        let base = ["expand", "--input", input.to_str().unwrap(), "--out", out.to_str().unwrap()];
        run(&base).unwrap();
        assert!(run(&[&base[..], &["--deny-warnings"][..]].concat()).is_err());
    }

    #[test]
    fn model_lists_annotated_classes_as_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.swift"), SOURCE).unwrap();
        std::fs::write(dir.path().join("b.swift"), "class Plain { let a: Int }\n").unwrap();
        let pattern = format!("{}/*.swift", dir.path().display());
        let out = dir.path().join("model.json");

        run(&["model", "--input", &pattern, "--out", out.to_str().unwrap()]).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["type_name"], "User");
        assert_eq!(entries[0]["modifier"], "public");
        assert_eq!(entries[0]["fields"][1]["declared_type"], "String?");
        assert_eq!(entries[0]["fields"][1]["is_optional"], true);
    }

    #[test]
    fn glob_without_matches_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.swift", dir.path().display());
        assert!(resolve_file_path_patterns([pattern]).is_err());
    }

    #[test]
    fn check_requires_out() {
        assert!(CommandLineInterface::try_parse_from(["codable-gen", "expand", "-i", "a.swift", "--check"]).is_err());
    }
}
