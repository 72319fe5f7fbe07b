//! Error types shared by the front end, the expander and the CLI.
use std::path::PathBuf;
use thiserror::Error;

use crate::path_de::JsonPathError;
use crate::syntax::DeclKind;

/// Failure to read Swift source text. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("{line}:{column}: expected {expected}, found {found}")]
    Unexpected {
        expected: String,
        found: String,
        line: u32,
        column: u32,
    },
    #[error("{line}:{column}: expected {expected}, found end of input")]
    UnexpectedEof {
        expected: String,
        line: u32,
        column: u32,
    },
    #[error("{line}:{column}: unterminated string literal")]
    UnterminatedString { line: u32, column: u32 },
    #[error("{line}:{column}: unterminated block comment")]
    UnterminatedComment { line: u32, column: u32 },
}

/// The declaration can't carry the synthesized members at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("`{name}` is a {kind}; only classes are supported")]
    UnsupportedDeclarationShape { name: String, kind: DeclKind },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: JsonPathError,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
