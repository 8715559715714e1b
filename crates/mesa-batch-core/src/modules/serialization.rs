use crate::domain::{BatchError, BatchResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> BatchResult<()> {
    ensure_parent_dir(path)?;
    fs::write(path, normalize_text_artifact(content)).map_err(|source| {
        BatchError::io_system(
            "IO.WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

pub fn read_text_artifact(path: &Path) -> BatchResult<String> {
    fs::read_to_string(path).map_err(|source| {
        BatchError::io_system(
            "IO.READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })
}

/// Pretty JSON with a trailing newline.
pub fn write_json_report<T: Serialize>(path: &Path, report: &T) -> BatchResult<()> {
    let json = serde_json::to_string_pretty(report).map_err(|source| {
        BatchError::internal(
            "INTERNAL.REPORT_ENCODE",
            format!("failed to encode report '{}': {}", path.display(), source),
        )
    })?;
    write_text_artifact(path, &json)
}

pub fn ensure_dir(path: &Path) -> BatchResult<()> {
    fs::create_dir_all(path).map_err(|source| {
        BatchError::io_system(
            "IO.CREATE_DIR",
            format!("failed to create directory '{}': {}", path.display(), source),
        )
    })
}

pub fn ensure_parent_dir(path: &Path) -> BatchResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_text_artifact, write_json_report, write_text_artifact};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn normalize_text_artifact_uses_canonical_line_endings() {
        let normalized = normalize_text_artifact("alpha\r\nbeta\rgamma");
        assert_eq!(normalized, "alpha\nbeta\ngamma\n");
        assert_eq!(normalize_text_artifact(""), "");
    }

    #[test]
    fn text_writes_create_parents_and_are_repeatable() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("nested/batch/inlist_M1_Z0.02_noovs.inp");

        write_text_artifact(&path, "&controls\r\n/").expect("first write should succeed");
        let first = fs::read(&path).expect("artifact should be readable");
        write_text_artifact(&path, "&controls\r\n/").expect("second write should succeed");
        let second = fs::read(&path).expect("artifact should be readable");

        assert_eq!(first, second);
        assert_eq!(second, b"&controls\n/\n");
    }

    #[test]
    fn json_reports_end_with_newline() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("report.json");
        write_json_report(&path, &serde_json::json!({ "created": 2 }))
            .expect("report should be written");

        let text = fs::read_to_string(&path).expect("report should be readable");
        assert!(text.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(value["created"], 2);
    }
}
