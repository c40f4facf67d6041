//! Example resource type built with `concourse_tools`.
//!
//! `file-set` watches a directory and emits a new version whenever the
//! names or sizes of its files change. `in` writes the tracked set to
//! `files.json`; `out` is not supported.
//!
//! ```yaml
//! resource_types:
//! - name: file-set
//!   type: registry-image
//!   source: {repository: example/file-set}
//!
//! resources:
//! - name: reports
//!   type: file-set
//!   source:
//!     directory: /mnt/reports
//!     suffix: .csv
//! ```

use concourse_resource::ResourceError;
use concourse_resource::patterns::{MultiVersionResource, MultiVersioned};
use concourse_version::{SortableVersion, Version, version_key};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One file in the watched directory.
#[derive(Debug, Clone, PartialOrd, Ord, Version)]
pub struct FileEntry {
    /// The file name, relative to the directory.
    pub name: String,
    /// The size in bytes.
    pub size: u64,
}

impl SortableVersion for FileEntry {}

version_key!(pub Files = "files");

/// Source configuration of a `file-set` resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSet {
    /// The directory to watch. Subdirectories are ignored.
    pub directory: PathBuf,
    /// Only track files whose name ends with this suffix.
    #[serde(default)]
    pub suffix: Option<String>,
}

/// The complete resource: the file set tracked as one multi-version.
pub type FileSetResource = MultiVersioned<FileSet>;

impl FileSet {
    fn tracks(&self, name: &str) -> bool {
        self.suffix
            .as_deref()
            .is_none_or(|suffix| name.ends_with(suffix))
    }
}

impl MultiVersionResource for FileSet {
    type SubVersion = FileEntry;
    type Key = Files;

    fn fetch_latest_sub_versions(&self) -> Result<HashSet<FileEntry>, ResourceError> {
        let mut entries = HashSet::new();
        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(name) => {
                    warn!(?name, "skipping file with a non UTF-8 name");
                    continue;
                }
            };
            if self.tracks(&name) {
                entries.insert(FileEntry {
                    name,
                    size: metadata.len(),
                });
            }
        }
        debug!(
            directory = %self.directory.display(),
            files = entries.len(),
            "listed directory"
        );
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concourse_resource::{DispatchError, Dispatcher, ResourceClass};
    use std::path::Path;

    fn dispatcher() -> Dispatcher {
        Dispatcher::with_env([
            ("BUILD_ID", "12345678"),
            ("BUILD_TEAM_NAME", "my-team"),
            ("ATC_EXTERNAL_URL", "https://ci.myconcourse.com"),
        ])
    }

    fn check_payload(directory: &Path, version: Option<&str>) -> String {
        let mut payload = serde_json::json!({
            "source": {"directory": directory, "suffix": ".csv"},
        });
        if let Some(version) = version {
            payload["version"] = serde_json::json!({"files": version});
        }
        payload.to_string()
    }

    #[test]
    fn check_lists_matching_files() {
        let watched = tempfile::tempdir().unwrap();
        fs::write(watched.path().join("b.csv"), "1,2").unwrap();
        fs::write(watched.path().join("a.csv"), "1").unwrap();
        fs::write(watched.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(watched.path().join("nested.csv")).unwrap();

        let output = dispatcher()
            .check(
                &ResourceClass::<FileSetResource>::new(),
                &check_payload(watched.path(), None),
            )
            .unwrap();
        assert_eq!(
            output,
            r#"[{"files": "[{\"name\": \"a.csv\", \"size\": \"1\"}, {\"name\": \"b.csv\", \"size\": \"3\"}]"}]"#
        );
    }

    #[test]
    fn unchanged_directory_keeps_the_version() {
        let watched = tempfile::tempdir().unwrap();
        fs::write(watched.path().join("a.csv"), "1").unwrap();
        let previous = r#"[{"name": "a.csv", "size": "1"}]"#;

        let output = dispatcher()
            .check(
                &ResourceClass::<FileSetResource>::new(),
                &check_payload(watched.path(), Some(previous)),
            )
            .unwrap();
        assert_eq!(output, r#"[{"files": "[{\"name\": \"a.csv\", \"size\": \"1\"}]"}]"#);
    }

    #[test]
    fn resized_file_is_a_new_version() {
        let watched = tempfile::tempdir().unwrap();
        fs::write(watched.path().join("a.csv"), "1,2,3").unwrap();
        let previous = r#"[{"name": "a.csv", "size": "1"}]"#;

        let output = dispatcher()
            .check(
                &ResourceClass::<FileSetResource>::new(),
                &check_payload(watched.path(), Some(previous)),
            )
            .unwrap();
        let versions: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();
        assert_eq!(versions.len(), 2);
    }

    #[test]
    fn in_writes_the_file_list() {
        let destination = tempfile::tempdir().unwrap();
        let payload = r#"{
            "source": {"directory": "/unused"},
            "version": {"files": "[{\"name\": \"a.csv\", \"size\": \"1\"}]"},
            "params": {"file_name": "reports"}
        }"#;

        dispatcher()
            .download(
                &ResourceClass::<FileSetResource>::new(),
                payload,
                Some(destination.path()),
            )
            .unwrap();
        let written = fs::read_to_string(destination.path().join("reports.json")).unwrap();
        assert_eq!(written, r#"[{"name": "a.csv", "size": "1"}]"#);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let result = dispatcher().check(
            &ResourceClass::<FileSetResource>::new(),
            r#"{"source": {"directory": "/does/not/exist"}}"#,
        );
        assert!(matches!(
            result,
            Err(DispatchError::Resource(ResourceError::Io(_)))
        ));
    }
}
