//! End-to-end runs of `check`, `in` and `out` through the dispatcher.

use concourse_resource::{
    BuildMetadata, ConfigError, DispatchError, Dispatcher, Metadata, MetadataError, Operation,
    ParseError, Resource, ResourceClass, ResourceError,
};
use concourse_version::Version;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

// ─────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Version)]
struct TestVersion {
    r#ref: String,
}

impl TestVersion {
    fn new(reference: &str) -> Self {
        Self {
            r#ref: reference.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TestResource {
    uri: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DownloadParams {
    #[serde(default)]
    file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PublishParams {
    repo: String,
}

impl Resource for TestResource {
    type Version = TestVersion;
    type DownloadParams = DownloadParams;
    type PublishParams = PublishParams;

    fn fetch_new_versions(
        &self,
        previous: Option<TestVersion>,
    ) -> Result<Vec<TestVersion>, ResourceError> {
        // Anything written to stdout here must not reach the protocol
        // channel when run as a script.
        println!("checking {}", self.uri);
        match previous {
            Some(_) => Ok(vec![TestVersion::new("7154fe")]),
            None => Ok(vec![TestVersion::new("61cbef")]),
        }
    }

    fn download_version(
        &self,
        version: TestVersion,
        destination_dir: &Path,
        build_metadata: &BuildMetadata,
        params: DownloadParams,
    ) -> Result<(TestVersion, Metadata), ResourceError> {
        if version.r#ref == "000000" {
            return Err(ResourceError::version_not_found("ref 000000 was deleted"));
        }
        let file_name = params.file_name.unwrap_or_else(|| "README.txt".to_owned());
        fs::write(
            destination_dir.join(file_name),
            format!("Downloaded README for ref {}.\n", version.r#ref),
        )?;
        let metadata = Metadata::from([("team_name".to_owned(), build_metadata.team_name.clone())]);
        Ok((version, metadata))
    }

    fn publish_new_version(
        &self,
        sources_dir: &Path,
        build_metadata: &BuildMetadata,
        params: PublishParams,
    ) -> Result<(TestVersion, Metadata), ResourceError> {
        let reference = fs::read_to_string(sources_dir.join(&params.repo).join("ref.txt"))?;
        let metadata = Metadata::from([
            ("build".to_owned(), build_metadata.build_url().map_err(ResourceError::other)?),
            ("café".to_owned(), "☕".to_owned()),
        ]);
        Ok((TestVersion::new(reference.trim()), metadata))
    }
}

const RESOURCE: ResourceClass<TestResource> = ResourceClass::new();

fn pipeline_env() -> Vec<(&'static str, &'static str)> {
    vec![
        ("BUILD_ID", "12345678"),
        ("BUILD_NAME", "42"),
        ("BUILD_TEAM_NAME", "my-team"),
        ("ATC_EXTERNAL_URL", "https://ci.myconcourse.com"),
        ("BUILD_JOB_NAME", "my-job"),
        ("BUILD_PIPELINE_NAME", "my-pipeline"),
    ]
}

fn dispatcher() -> Dispatcher {
    Dispatcher::with_env(pipeline_env())
}

// ─────────────────────────────────────────────────────────────────────
// check
// ─────────────────────────────────────────────────────────────────────

#[test]
fn check_writes_exactly_the_new_versions() {
    let payload = r#"{"source": {"uri": "git://x"}, "version": {"ref": "61cbef"}}"#;
    let output = dispatcher().check(&RESOURCE, payload).unwrap();
    assert_eq!(output, r#"[{"ref": "7154fe"}]"#);
}

#[test]
fn check_without_previous_version_is_a_first_run() {
    let output = dispatcher()
        .check(&RESOURCE, r#"{"source": {"uri": "git://x"}}"#)
        .unwrap();
    assert_eq!(output, r#"[{"ref": "61cbef"}]"#);

    let output = dispatcher()
        .check(&RESOURCE, r#"{"source": {"uri": "git://x"}, "version": null}"#)
        .unwrap();
    assert_eq!(output, r#"[{"ref": "61cbef"}]"#);
}

#[test]
fn check_does_not_need_build_metadata() {
    let output = Dispatcher::with_env(Vec::<(String, String)>::new())
        .check(&RESOURCE, r#"{"source": {"uri": "git://x"}}"#)
        .unwrap();
    assert_eq!(output, r#"[{"ref": "61cbef"}]"#);
}

#[test]
fn check_stringifies_version_values() {
    let payload = r#"{"source": {"uri": "git://x"}, "version": {"ref": 61}}"#;
    let output = dispatcher().check(&RESOURCE, payload).unwrap();
    assert_eq!(output, r#"[{"ref": "7154fe"}]"#);
}

#[test]
fn missing_source_is_a_parse_error() {
    let result = dispatcher().check(&RESOURCE, r#"{"version": {"ref": "61cbef"}}"#);
    assert!(matches!(result, Err(DispatchError::Parse(ParseError::MissingSource))));

    let result = dispatcher().check(&RESOURCE, "not json");
    assert!(matches!(result, Err(DispatchError::Parse(ParseError::InvalidJson(_)))));
}

#[test]
fn bad_source_is_a_config_error() {
    let result = dispatcher().check(
        &RESOURCE,
        r#"{"source": {"uri": "git://x", "branch": "main"}}"#,
    );
    assert!(matches!(
        result,
        Err(DispatchError::Config(ConfigError::InvalidSource { .. }))
    ));
}

#[test]
fn unexpected_version_field_is_a_version_error() {
    let payload = r#"{"source": {"uri": "git://x"}, "version": {"ref": "61cbef", "tag": "v1"}}"#;
    let result = dispatcher().check(&RESOURCE, payload);
    assert!(matches!(result, Err(DispatchError::Version(_))));
}

// ─────────────────────────────────────────────────────────────────────
// in
// ─────────────────────────────────────────────────────────────────────

#[test]
fn download_writes_files_and_metadata() {
    let directory = tempfile::tempdir().unwrap();
    let payload = r#"{"source": {"uri": "git://x"}, "version": {"ref": "61cbef"}}"#;
    let output = dispatcher()
        .download(&RESOURCE, payload, Some(directory.path()))
        .unwrap();

    assert_eq!(
        output,
        r#"{"version": {"ref": "61cbef"}, "metadata": [{"name": "team_name", "value": "my-team"}]}"#
    );
    let readme = fs::read_to_string(directory.path().join("README.txt")).unwrap();
    assert_eq!(readme, "Downloaded README for ref 61cbef.\n");
}

#[test]
fn download_passes_step_params() {
    let directory = tempfile::tempdir().unwrap();
    let payload = json!({
        "source": {"uri": "git://x"},
        "version": {"ref": "61cbef"},
        "params": {"file_name": "NOTES.md"},
    });
    dispatcher()
        .download(&RESOURCE, &payload.to_string(), Some(directory.path()))
        .unwrap();
    assert!(directory.path().join("NOTES.md").exists());
}

#[test]
fn download_rejects_unknown_params() {
    let directory = tempfile::tempdir().unwrap();
    let payload = json!({
        "source": {"uri": "git://x"},
        "version": {"ref": "61cbef"},
        "params": {"depth": 1},
    });
    let result = dispatcher().download(&RESOURCE, &payload.to_string(), Some(directory.path()));
    assert!(matches!(result, Err(DispatchError::Params(_))));
}

#[test]
fn download_requires_a_version() {
    let directory = tempfile::tempdir().unwrap();
    let result = dispatcher().download(
        &RESOURCE,
        r#"{"source": {"uri": "git://x"}}"#,
        Some(directory.path()),
    );
    assert!(matches!(result, Err(DispatchError::Parse(ParseError::MissingVersion))));
}

#[test]
fn download_requires_a_directory() {
    let payload = r#"{"source": {"uri": "git://x"}, "version": {"ref": "61cbef"}}"#;
    let result = dispatcher().download(&RESOURCE, payload, None);
    assert!(matches!(result, Err(DispatchError::Usage(_))));
}

#[test]
fn download_requires_build_metadata() {
    let directory = tempfile::tempdir().unwrap();
    let payload = r#"{"source": {"uri": "git://x"}, "version": {"ref": "61cbef"}}"#;
    let result = Dispatcher::with_env([("BUILD_ID", "1")]).download(
        &RESOURCE,
        payload,
        Some(directory.path()),
    );
    assert!(matches!(
        result,
        Err(DispatchError::Metadata(MetadataError::MissingVariable("BUILD_TEAM_NAME")))
    ));
}

#[test]
fn missing_upstream_version_fails_loudly() {
    let directory = tempfile::tempdir().unwrap();
    let payload = r#"{"source": {"uri": "git://x"}, "version": {"ref": "000000"}}"#;
    let result = dispatcher().download(&RESOURCE, payload, Some(directory.path()));
    assert!(matches!(
        result,
        Err(DispatchError::Resource(ResourceError::VersionNotFound(_)))
    ));
}

// ─────────────────────────────────────────────────────────────────────
// out
// ─────────────────────────────────────────────────────────────────────

#[test]
fn publish_reads_sources_and_escapes_metadata() {
    let sources = tempfile::tempdir().unwrap();
    fs::create_dir(sources.path().join("repo")).unwrap();
    fs::write(sources.path().join("repo").join("ref.txt"), "a1b2c3\n").unwrap();

    let payload = r#"{"source": {"uri": "git://x"}, "params": {"repo": "repo"}}"#;
    let output = dispatcher()
        .publish(&RESOURCE, payload, Some(sources.path()))
        .unwrap();

    let expected = concat!(
        r#"{"version": {"ref": "a1b2c3"}, "metadata": ["#,
        r#"{"name": "build", "value": "https://ci.myconcourse.com/teams/my-team/pipelines/my-pipeline/jobs/my-job/builds/42"}, "#,
        r#"{"name": "caf\u00e9", "value": "\u2615"}]}"#,
    );
    assert_eq!(output, expected);

    let parsed: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["metadata"][1]["name"], "café");
}

#[test]
fn publish_with_missing_params_fails_on_params() {
    let sources = tempfile::tempdir().unwrap();
    let result = dispatcher().publish(
        &RESOURCE,
        r#"{"source": {"uri": "git://x"}}"#,
        Some(sources.path()),
    );
    assert!(matches!(result, Err(DispatchError::Params(_))));
}

#[test]
fn publish_failures_propagate() {
    let sources = tempfile::tempdir().unwrap();
    let payload = r#"{"source": {"uri": "git://x"}, "params": {"repo": "missing"}}"#;
    let result = dispatcher().publish(&RESOURCE, payload, Some(sources.path()));
    assert!(matches!(result, Err(DispatchError::Resource(ResourceError::Io(_)))));
}

#[test]
fn dispatch_routes_by_operation() {
    let directory = tempfile::tempdir().unwrap();
    let payload = r#"{"source": {"uri": "git://x"}, "version": {"ref": "61cbef"}}"#;

    let check = dispatcher()
        .dispatch(&RESOURCE, Operation::Check, payload, None)
        .unwrap();
    assert_eq!(check, r#"[{"ref": "7154fe"}]"#);

    let download = dispatcher()
        .dispatch(&RESOURCE, Operation::In, payload, Some(directory.path()))
        .unwrap();
    assert!(download.starts_with(r#"{"version": {"ref": "61cbef"}"#));
}
