//! Removal of generated intermediate artifacts.
//!
//! Every intermediate filename is a deterministic function of its producing
//! step and target, so cleanup is an enumerated, idempotent operation: the
//! same call at the start of a run makes re-entry safe, and at the end of a
//! run removes transient state.

use std::fs;
use std::path::Path;

use tracing::warn;
use walkdir::WalkDir;

use crate::errors::{SipError, SipResult};

/// Filename suffixes of per-step intermediate artifacts.
pub const DEFAULT_CLEAN_ENDINGS: &[&str] = &[
    "-premis-object-amd.json",
    "-mix-amd.json",
    "-audiomd-amd.json",
    "-videomd-amd.json",
    "-tabular-amd.json",
    "-premis-event-amd.json",
    "-agents.json",
    "-dmdsec.json",
    "-scraper.json",
    "-md-references.jsonl",
];

/// Exact filenames of compiled artifacts.
pub const DEFAULT_CLEAN_NAMES: &[&str] = &[
    "filesec.json",
    "structmap.json",
    "manifest.json",
    "signature.sig",
];

/// Remove generated files under `root`.
///
/// With both `endings` and `names` unset, the default artifact set is
/// removed. A caller-supplied set replaces the defaults entirely. Directory
/// removal is attempted only when `delete_path` is set and only succeeds for
/// a directory left empty; failure is reported, not fatal.
pub fn clean_temp_files(
    root: &Path,
    endings: Option<&[&str]>,
    names: Option<&[&str]>,
    delete_path: bool,
) -> SipResult<()> {
    let (endings, names): (&[&str], &[&str]) = match (endings, names) {
        (None, None) => (DEFAULT_CLEAN_ENDINGS, DEFAULT_CLEAN_NAMES),
        (e, n) => (e.unwrap_or(&[]), n.unwrap_or(&[])),
    };

    if root.exists() {
        for entry in WalkDir::new(root) {
            let entry = entry
                .map_err(|e| SipError::stage("cleanup", format!("cannot walk {}: {e}", root.display())))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            let matches = endings.iter().any(|ending| file_name.ends_with(ending))
                || names.iter().any(|name| file_name == *name);
            if matches {
                fs::remove_file(entry.path())?;
            }
        }
    }

    if delete_path {
        if let Err(err) = fs::remove_dir(root) {
            warn!(
                "could not remove directory {}: {err}",
                root.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[test]
    fn default_set_removes_all_intermediates() {
        let dir = tempfile::tempdir().unwrap();
        let temp_files = [
            "foo-premis-object-amd.json",
            "foo-mix-amd.json",
            "foo-agents.json",
            "technical-md-references.jsonl",
            "provenance-md-references.jsonl",
            "descriptive-md-references.jsonl",
            "foo-scraper.json",
            "foo-dmdsec.json",
            "filesec.json",
            "structmap.json",
            "manifest.json",
            "signature.sig",
        ];
        touch(dir.path(), &temp_files);
        touch(dir.path(), &["kept___metadata.csv", "kept.wav"]);

        clean_temp_files(dir.path(), None, None, false).unwrap();

        for name in temp_files {
            assert!(!dir.path().join(name).exists(), "{name} should be removed");
        }
        assert!(dir.path().join("kept___metadata.csv").exists());
        assert!(dir.path().join("kept.wav").exists());
    }

    #[test]
    fn supplied_endings_replace_the_defaults() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["foo-matching-ending", "foo-another-match", "manifest.json"],
        );

        clean_temp_files(
            dir.path(),
            Some(&["matching-ending", "another-match"]),
            None,
            false,
        )
        .unwrap();

        assert!(!dir.path().join("foo-matching-ending").exists());
        assert!(!dir.path().join("foo-another-match").exists());
        // defaults no longer apply
        assert!(dir.path().join("manifest.json").exists());
    }

    #[test]
    fn supplied_names_replace_the_defaults() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["foo-matching-file", "manifest.json"]);

        clean_temp_files(dir.path(), None, Some(&["foo-matching-file"]), false).unwrap();

        assert!(!dir.path().join("foo-matching-file").exists());
        assert!(dir.path().join("manifest.json").exists());
    }

    #[test]
    fn nonempty_directory_removal_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["kept.wav"]);
        clean_temp_files(dir.path(), None, None, true).unwrap();
        assert!(dir.path().exists());

        let empty = tempfile::tempdir().unwrap();
        let path = empty.path().to_path_buf();
        clean_temp_files(&path, None, None, true).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn missing_root_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("never-created");
        clean_temp_files(&missing, None, None, false).unwrap();
    }
}
