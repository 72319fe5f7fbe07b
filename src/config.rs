//! Generator settings, read from an optional JSON file.
//!
//! ```json
//! { "indent_width": 4, "output_suffix": "+Codable" }
//! ```
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codegen::Codegen;
use crate::error::{Error, Result};
use crate::path_de::JsonPathError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Spaces per indentation level in generated members.
    pub indent_width: usize,
    /// Inserted between file stem and extension when writing to `--out`.
    pub output_suffix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self { indent_width: Codegen::DEFAULT_INDENT_WIDTH, output_suffix: String::new() }
    }
}

impl Settings {
    pub fn from_json(src: &str) -> std::result::Result<Self, JsonPathError> {
        crate::path_de::from_str_with_path(src)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
        Self::from_json(&src).map_err(|source| Error::Config { path: path.to_path_buf(), source })
    }

    pub fn codegen(&self) -> Codegen {
        Codegen::with_indent_width(self.indent_width)
    }

    /// `Models/User.swift` → `<out_dir>/User<suffix>.swift`
    pub fn output_path(&self, out_dir: &Path, input: &Path) -> PathBuf {
        let stem = input.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
        let mut name = format!("{stem}{}", self.output_suffix);
        if let Some(ext) = input.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }
        out_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = Settings::from_json(r#"{ "output_suffix": "+Codable" }"#).unwrap();
        assert_eq!(settings.indent_width, 4);
        assert_eq!(settings.output_suffix, "+Codable");
    }

    #[test]
    fn errors_carry_the_json_path() {
        let err = Settings::from_json(r#"{ "indent_width": "wide" }"#).unwrap_err();
        assert_eq!(err.json_path, "indent_width");
        let err = Settings::from_json(r#"{ "indent": 2 }"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"), "{err}");
    }

    #[test]
    fn output_path_keeps_extension() {
        let settings = Settings { output_suffix: "+Codable".into(), ..Settings::default() };
        let out = settings.output_path(Path::new("gen"), Path::new("Sources/Model/User.swift"));
        assert_eq!(out, Path::new("gen/User+Codable.swift"));
        let plain = Settings::default().output_path(Path::new("gen"), Path::new("Makefile"));
        assert_eq!(plain, Path::new("gen/Makefile"));
    }

    #[test]
    fn load_wraps_json_errors_with_the_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "output_suffix": 7 }"#).unwrap();
        match Settings::load(&path).unwrap_err() {
            Error::Config { path: reported, source } => {
                assert_eq!(reported, path);
                assert_eq!(source.json_path, "output_suffix");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Settings::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
