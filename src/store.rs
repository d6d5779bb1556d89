//! JSON mapping files used as resumable progress stores.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Reads a file holding a JSON object, keeping key order.
pub fn load_mapping(path: &Path) -> Result<Map<String, Value>> {
    let text = fs::read_to_string(path)?;
    match serde_json::from_str(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::NotAMapping(path.to_path_buf())),
    }
}

/// Creates `path` holding an empty mapping if it does not exist yet.
/// Returns whether a file was created.
pub fn ensure_mapping(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, "{}")?;
    info!(path = %path.display(), "Created empty store");
    Ok(true)
}

/// Sets `key` to `value` in the mapping stored at `path`, overwriting any
/// previous value, and rewrites the whole file.
///
/// The new content is written next to the target and renamed over it, so the
/// file holds either the old or the new mapping. Concurrent writers still lose
/// updates.
pub fn merge_entry<V: Serialize + ?Sized>(key: &str, value: &V, path: &Path) -> Result<()> {
    let mut map = load_mapping(path)?;
    map.insert(key.to_string(), serde_json::to_value(value)?);

    let tmp = tmp_path(path);
    {
        let mut file = fs::File::create(&tmp)?;
        let mut ser = Serializer::with_formatter(&mut file, PrettyFormatter::with_indent(b"    "));
        map.serialize(&mut ser)?;
        file.flush()?;
    }
    fs::rename(&tmp, path)?;

    debug!(key, path = %path.display(), entries = map.len(), "Merged entry");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("store.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn merge_sets_key_and_keeps_others() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_with(&dir, r#"{"marvel": ["a"], "disney": ["b"]}"#);

        merge_entry("marvel", &vec!["x", "y"], &path).unwrap();

        let map = load_mapping(&path).unwrap();
        assert_eq!(map["marvel"], json!(["x", "y"]));
        assert_eq!(map["disney"], json!(["b"]));
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["marvel", "disney"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_with(&dir, r#"{"other": 1}"#);

        merge_entry("k", &json!({"v": [1, 2]}), &path).unwrap();
        let once = fs::read_to_string(&path).unwrap();
        merge_entry("k", &json!({"v": [1, 2]}), &path).unwrap();
        let twice = fs::read_to_string(&path).unwrap();

        assert_eq!(once, twice);
        assert_eq!(load_mapping(&path).unwrap().len(), 2);
    }

    #[test]
    fn output_is_four_space_indented_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_with(&dir, "{}");

        merge_entry("k", "v", &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n    \"k\": \"v\"\n}");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn non_object_content_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_with(&dir, "[1, 2]");
        assert!(matches!(merge_entry("k", &1, &path), Err(Error::NotAMapping(_))));
    }

    #[test]
    fn truncated_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_with(&dir, r#"{"k": ["#);
        assert!(matches!(load_mapping(&path), Err(Error::Json(_))));
    }

    #[test]
    fn ensure_mapping_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("links.json");

        assert!(ensure_mapping(&path).unwrap());
        merge_entry("k", &1, &path).unwrap();
        assert!(!ensure_mapping(&path).unwrap());
        assert_eq!(load_mapping(&path).unwrap()["k"], json!(1));
    }
}
