//! The JSON documents the sync stages read and write.

pub mod canonical;
pub mod diff;
pub mod flat;
pub mod template;

use std::path::Path;

use serde_json::{
    Map,
    Value,
};

use crate::error::{
    DocumentError,
    SyncError,
};

pub use canonical::{
    CanonicalDocument,
    CanonicalStore,
};
pub use diff::DiffDocument;
pub use flat::ExternalFlatRecord;

/// Parses `text` as a JSON object.
///
/// # Errors
/// `DocumentError::Json` for invalid JSON, `NotAnObject` for any other top-level value.
pub fn parse_object(text: &str) -> Result<Map<String, Value>, DocumentError> {
    match serde_json::from_str(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(DocumentError::NotAnObject),
    }
}

/// Two-space indented JSON with a trailing newline.
///
/// # Errors
/// Serialization failure.
pub fn to_pretty_json(value: &impl serde::Serialize) -> Result<String, DocumentError> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

pub(crate) fn read_file(path: &Path) -> Result<String, SyncError> {
    std::fs::read_to_string(path).map_err(|error| SyncError::io(path, error))
}

/// Replaces the whole file, going through a sibling temp file so readers never see half of it.
pub(crate) fn write_file(path: &Path, contents: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|error| SyncError::io(parent, error))?;
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = Path::new(&temp);
    std::fs::write(temp, contents).map_err(|error| SyncError::io(temp, error))?;
    std::fs::rename(temp, path).map_err(|error| SyncError::io(path, error))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    #[case::array("[]")]
    #[case::string("\"x\"")]
    fn parse_object_rejects_non_objects(#[case] text: &str) {
        assert!(matches!(parse_object(text), Err(DocumentError::NotAnObject)));
    }

    #[rstest]
    fn parse_object_rejects_invalid_json() {
        assert!(matches!(parse_object("{\"a\": }"), Err(DocumentError::Json(_))));
    }

    #[rstest]
    fn write_file_creates_parents_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out.json");

        write_file(&path, "first").unwrap();
        write_file(&path, "second").unwrap();

        assert_that!(read_file(&path).unwrap(), eq("second"));
        assert_that!(dir.path().join("nested/out.json.tmp").exists(), eq(false));
    }

    #[rstest]
    fn read_file_missing_is_io_error() {
        let dir = TempDir::new().unwrap();

        let result = read_file(&dir.path().join("absent.json"));

        assert!(matches!(result, Err(SyncError::Io { .. })));
    }
}
