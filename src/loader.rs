//! Document loading from files and strings.
//!
//! A JSON:API document is always an object at the top level, so anything
//! else is refused here rather than surfacing later as a schema violation.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::types::json_type_name;

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// `LoadError::InvalidJson` if the file isn't valid JSON, or
/// `LoadError::NotAnObject` if its top level is not an object.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_document_str(&content)
}

/// Load a JSON:API document from a string.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson` if the string isn't valid JSON, or
/// `LoadError::NotAnObject` for arrays, scalars and `null`.
pub fn load_document_str(content: &str) -> Result<Value, LoadError> {
    let document: Value =
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?;

    if !document.is_object() {
        return Err(LoadError::NotAnObject {
            actual: json_type_name(&document).to_string(),
        });
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn load_from_string() {
        let value = load_document_str(r#"{"data": []}"#).unwrap();
        assert_eq!(value, json!({ "data": [] }));
    }

    #[test]
    fn load_invalid_string() {
        assert!(matches!(
            load_document_str("{\"data\":"),
            Err(LoadError::InvalidJson { .. })
        ));
    }

    #[test]
    fn top_level_must_be_an_object() {
        for (content, actual) in [
            ("[]", "array"),
            ("null", "null"),
            (r#""data""#, "string"),
            ("42", "number"),
        ] {
            match load_document_str(content) {
                Err(LoadError::NotAnObject { actual: found }) => assert_eq!(found, actual),
                other => panic!("expected NotAnObject for {content}, got {other:?}"),
            }
        }
    }

    #[test]
    fn array_file_is_refused() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"type": "t", "id": "1"}}]"#).unwrap();

        let result = load_document(file.path());
        assert!(matches!(result, Err(LoadError::NotAnObject { .. })));
    }

    #[test]
    fn load_missing_file() {
        let result = load_document(Path::new("/nonexistent/document.json"));
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"data": {{"type": "t", "id": "1"}}}}"#).unwrap();

        let value = load_document(file.path()).unwrap();
        assert_eq!(value["data"]["id"], json!("1"));
    }
}
