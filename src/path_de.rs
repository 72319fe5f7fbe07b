//! JSON deserialization that reports where in the document it failed.
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("at JSON path {json_path} → {source}")]
pub struct JsonPathError {
    /// Dotted location of the failing value, `.` for the document root.
    pub json_path: String,
    #[source]
    pub source: serde_json::Error,
}

pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, JsonPathError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize(de).map_err(|err| JsonPathError {
        json_path: err.path().to_string(),
        source: err.into_inner(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Outer {
        #[allow(dead_code)]
        cases: Vec<Inner>,
    }

    #[derive(Debug, Deserialize)]
    struct Inner {
        #[allow(dead_code)]
        width: usize,
    }

    #[test]
    fn nested_failures_name_their_location() {
        let err = from_str_with_path::<Outer>(r#"{ "cases": [{ "width": 1 }, { "width": -1 }] }"#)
            .unwrap_err();
        assert_eq!(err.json_path, "cases[1].width");
        assert!(err.to_string().starts_with("at JSON path cases[1].width → "), "{err}");
    }

    #[test]
    fn syntax_errors_keep_the_serde_json_source() {
        let err = from_str_with_path::<Outer>("{ \"cases\": [").unwrap_err();
        assert!(err.source.is_eof());
    }
}
