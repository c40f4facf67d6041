//! Build metadata: the environment of the running build.
//!
//! Concourse passes build metadata to `in` and `out` through environment
//! variables. It is deliberately never available to `check`.

use crate::error::MetadataError;
use crate::template;
use crate::wire;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Information about the running build.
///
/// `build_id`, `team_name` and `atc_external_url` are always present; the
/// rest are absent in one-off builds started with `fly execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetadata {
    /// `BUILD_ID`: the internal identifier for the build.
    pub build_id: String,
    /// `BUILD_TEAM_NAME`: the team that the build belongs to.
    pub team_name: String,
    /// `ATC_EXTERNAL_URL`: the public URL of the Concourse web node.
    pub atc_external_url: String,
    /// `BUILD_NAME`: the build number within its job.
    pub build_name: Option<String>,
    /// `BUILD_JOB_NAME`: the name of the build's job.
    pub job_name: Option<String>,
    /// `BUILD_PIPELINE_NAME`: the pipeline the job lives in.
    pub pipeline_name: Option<String>,
    /// `BUILD_PIPELINE_INSTANCE_VARS`: instance vars serialized as JSON.
    pub pipeline_instance_vars: Option<String>,
    created_by: Option<String>,
}

impl BuildMetadata {
    /// Creates metadata for a one-off build.
    pub fn new(
        build_id: impl Into<String>,
        team_name: impl Into<String>,
        atc_external_url: impl Into<String>,
    ) -> Self {
        Self {
            build_id: build_id.into(),
            team_name: team_name.into(),
            atc_external_url: atc_external_url.into(),
            build_name: None,
            job_name: None,
            pipeline_name: None,
            pipeline_instance_vars: None,
            created_by: None,
        }
    }

    /// Reads metadata from the process environment.
    pub fn from_env() -> Result<Self, MetadataError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads metadata through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MetadataError> {
        let required = |key: &'static str| lookup(key).ok_or(MetadataError::MissingVariable(key));
        Ok(Self {
            build_id: required("BUILD_ID")?,
            team_name: required("BUILD_TEAM_NAME")?,
            atc_external_url: required("ATC_EXTERNAL_URL")?,
            build_name: lookup("BUILD_NAME"),
            job_name: lookup("BUILD_JOB_NAME"),
            pipeline_name: lookup("BUILD_PIPELINE_NAME"),
            pipeline_instance_vars: lookup("BUILD_PIPELINE_INSTANCE_VARS"),
            created_by: lookup("BUILD_CREATED_BY"),
        })
    }

    /// Sets the user that created the build.
    #[must_use]
    pub fn with_created_by(mut self, user: impl Into<String>) -> Self {
        self.created_by = Some(user.into());
        self
    }

    /// `BUILD_CREATED_BY`: the user that created the build.
    ///
    /// Only available when the resource enables `expose_build_created_by`.
    pub fn created_by(&self) -> Result<&str, MetadataError> {
        self.created_by.as_deref().ok_or(MetadataError::NotExposed)
    }

    /// Whether this is a one-off build.
    ///
    /// Decided by the absence of the job name, the pipeline name and the
    /// instance vars. `BUILD_NAME` is set even for one-off builds.
    #[must_use]
    pub fn is_one_off_build(&self) -> bool {
        self.job_name.is_none()
            && self.pipeline_name.is_none()
            && self.pipeline_instance_vars.is_none()
    }

    /// Whether the build belongs to an instanced pipeline.
    #[must_use]
    pub fn is_instanced_pipeline(&self) -> bool {
        self.pipeline_instance_vars.is_some()
    }

    /// The pipeline's instance vars, or an empty mapping when the pipeline
    /// is not instanced.
    pub fn instance_vars(&self) -> Result<Map<String, Value>, MetadataError> {
        let Some(raw) = &self.pipeline_instance_vars else {
            return Ok(Map::new());
        };
        match serde_json::from_str(raw) {
            Ok(Value::Object(vars)) => Ok(vars),
            Ok(_) => Err(MetadataError::InvalidInstanceVars(raw.clone())),
            Err(err) => Err(MetadataError::InvalidInstanceVars(err.to_string())),
        }
    }

    /// The URL of the build in the web UI.
    ///
    /// Pipeline builds link to their job; one-off builds link by id.
    /// Instanced pipelines carry their vars in the query string.
    pub fn build_url(&self) -> Result<String, MetadataError> {
        let path = if self.is_one_off_build() {
            format!("builds/{}", self.build_id)
        } else {
            format!(
                "teams/{}/pipelines/{}/jobs/{}/builds/{}",
                self.team_name,
                self.pipeline_name.as_deref().unwrap_or_default(),
                self.job_name.as_deref().unwrap_or_default(),
                self.build_name.as_deref().unwrap_or_default(),
            )
        };
        let path = quote(&path);

        let mut url = format!("{}/{path}", self.atc_external_url);
        if self.is_instanced_pipeline() {
            let mut flattened = Vec::new();
            flatten_vars(String::new(), &self.instance_vars()?, &mut flattened);
            let query = flattened
                .iter()
                .map(|(key, value)| format!("vars.{key}={}", quote(&wire::encode(value))))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }

    /// Interpolates build metadata into `template`.
    ///
    /// Only a fixed set of variables is available: the documented build
    /// variables, `BUILD_URL`, `BUILD_CREATED_BY` when exposed, and anything
    /// in `additional`. Absent optional variables interpolate as empty
    /// strings. Placeholders are written `$NAME` or `${NAME}`, and `$$` is
    /// a literal `$`.
    ///
    /// With `ignore_missing`, unknown placeholders are left untouched
    /// instead of failing.
    pub fn format_string(
        &self,
        template: &str,
        additional: Option<&IndexMap<String, String>>,
        ignore_missing: bool,
    ) -> Result<String, MetadataError> {
        let optional = |value: &Option<String>| value.clone().unwrap_or_default();
        let mut values = IndexMap::from([
            ("BUILD_ID".to_owned(), self.build_id.clone()),
            ("BUILD_TEAM_NAME".to_owned(), self.team_name.clone()),
            ("BUILD_NAME".to_owned(), optional(&self.build_name)),
            ("BUILD_JOB_NAME".to_owned(), optional(&self.job_name)),
            ("BUILD_PIPELINE_NAME".to_owned(), optional(&self.pipeline_name)),
            (
                "BUILD_PIPELINE_INSTANCE_VARS".to_owned(),
                optional(&self.pipeline_instance_vars),
            ),
            ("ATC_EXTERNAL_URL".to_owned(), self.atc_external_url.clone()),
            ("BUILD_URL".to_owned(), self.build_url()?),
        ]);
        if let Some(additional) = additional {
            values.extend(additional.iter().map(|(key, value)| (key.clone(), value.clone())));
        }
        if let Ok(user) = self.created_by() {
            values.insert("BUILD_CREATED_BY".to_owned(), user.to_owned());
        }
        template::substitute(template, &values, ignore_missing)
    }

    /// Metadata as environment variables, the inverse of
    /// [`from_lookup`](Self::from_lookup).
    #[must_use]
    pub fn to_env(&self) -> IndexMap<String, String> {
        let mut env = IndexMap::from([
            ("BUILD_ID".to_owned(), self.build_id.clone()),
            ("BUILD_TEAM_NAME".to_owned(), self.team_name.clone()),
            ("ATC_EXTERNAL_URL".to_owned(), self.atc_external_url.clone()),
        ]);
        let optional = [
            ("BUILD_NAME", &self.build_name),
            ("BUILD_JOB_NAME", &self.job_name),
            ("BUILD_PIPELINE_NAME", &self.pipeline_name),
            ("BUILD_PIPELINE_INSTANCE_VARS", &self.pipeline_instance_vars),
            ("BUILD_CREATED_BY", &self.created_by),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                env.insert(key.to_owned(), value.clone());
            }
        }
        env
    }
}

/// Percent-encodes `text`, leaving `/` intact.
fn quote(text: &str) -> String {
    urlencoding::encode(text).replace("%2F", "/")
}

/// Flattens nested objects into dotted keys, depth first.
fn flatten_vars(prefix: String, vars: &Map<String, Value>, into: &mut Vec<(String, Value)>) {
    for (key, value) in vars {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(nested) => flatten_vars(key, nested, into),
            other => into.push((key, other.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn pipeline_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("BUILD_ID", "12345678"),
            ("BUILD_NAME", "42"),
            ("BUILD_TEAM_NAME", "my-team"),
            ("ATC_EXTERNAL_URL", "https://ci.myconcourse.com"),
            ("BUILD_JOB_NAME", "my-job"),
            ("BUILD_PIPELINE_NAME", "my-pipeline"),
        ])
    }

    fn metadata(env: &HashMap<&'static str, &'static str>) -> BuildMetadata {
        BuildMetadata::from_lookup(|key| env.get(key).map(|value| (*value).to_owned())).unwrap()
    }

    #[test]
    fn missing_required_variable_is_reported() {
        let mut env = pipeline_env();
        env.remove("BUILD_TEAM_NAME");
        let result =
            BuildMetadata::from_lookup(|key| env.get(key).map(|value| (*value).to_owned()));
        assert!(matches!(result, Err(MetadataError::MissingVariable("BUILD_TEAM_NAME"))));
    }

    #[test]
    fn pipeline_build_url() {
        let metadata = metadata(&pipeline_env());
        assert!(!metadata.is_one_off_build());
        assert_eq!(
            metadata.build_url().unwrap(),
            "https://ci.myconcourse.com/teams/my-team/pipelines/my-pipeline/jobs/my-job/builds/42"
        );
    }

    #[test]
    fn one_off_build_url() {
        let mut env = pipeline_env();
        env.remove("BUILD_JOB_NAME");
        env.remove("BUILD_PIPELINE_NAME");
        let metadata = metadata(&env);
        assert!(metadata.is_one_off_build());
        assert_eq!(
            metadata.build_url().unwrap(),
            "https://ci.myconcourse.com/builds/12345678"
        );
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let mut env = pipeline_env();
        env.insert("BUILD_JOB_NAME", "my job");
        let url = metadata(&env).build_url().unwrap();
        assert!(url.ends_with("/jobs/my%20job/builds/42"), "{url}");
    }

    #[test]
    fn instanced_pipeline_url_carries_vars() {
        let mut env = pipeline_env();
        env.insert(
            "BUILD_PIPELINE_INSTANCE_VARS",
            r#"{"env": "prod", "branches": {"from": "develop", "to": "main"}, "n": 1}"#,
        );
        let metadata = metadata(&env);
        assert!(metadata.is_instanced_pipeline());
        assert_eq!(
            metadata.build_url().unwrap(),
            "https://ci.myconcourse.com/teams/my-team/pipelines/my-pipeline/jobs/my-job/builds/42\
             ?vars.env=%22prod%22&vars.branches.from=%22develop%22&vars.branches.to=%22main%22&vars.n=1"
        );
    }

    #[test]
    fn instance_vars_default_to_empty() {
        assert!(metadata(&pipeline_env()).instance_vars().unwrap().is_empty());
    }

    #[test]
    fn malformed_instance_vars_are_reported() {
        let mut env = pipeline_env();
        env.insert("BUILD_PIPELINE_INSTANCE_VARS", "[1, 2]");
        assert!(matches!(
            metadata(&env).instance_vars(),
            Err(MetadataError::InvalidInstanceVars(_))
        ));
    }

    #[test]
    fn created_by_needs_to_be_exposed() {
        let metadata = metadata(&pipeline_env());
        assert!(matches!(metadata.created_by(), Err(MetadataError::NotExposed)));
        assert_eq!(metadata.with_created_by("admin").created_by().unwrap(), "admin");
    }

    #[test]
    fn format_string_uses_safe_variables() {
        let metadata = metadata(&pipeline_env()).with_created_by("admin");
        let formatted = metadata
            .format_string("Build $BUILD_ID by $BUILD_CREATED_BY: $BUILD_URL", None, false)
            .unwrap();
        assert_eq!(
            formatted,
            "Build 12345678 by admin: \
             https://ci.myconcourse.com/teams/my-team/pipelines/my-pipeline/jobs/my-job/builds/42"
        );
    }

    #[test]
    fn format_string_accepts_additional_values() {
        let metadata = metadata(&pipeline_env());
        let additional = IndexMap::from([("STATUS".to_owned(), "green".to_owned())]);
        let formatted = metadata
            .format_string("${BUILD_JOB_NAME} is $STATUS", Some(&additional), false)
            .unwrap();
        assert_eq!(formatted, "my-job is green");
    }

    #[test]
    fn format_string_rejects_unknown_variables() {
        let metadata = metadata(&pipeline_env());
        assert!(matches!(
            metadata.format_string("$HOME", None, false),
            Err(MetadataError::UnknownTemplateVariable(_))
        ));
        assert_eq!(metadata.format_string("$HOME", None, true).unwrap(), "$HOME");
    }

    #[test]
    fn env_round_trips() {
        let original = metadata(&pipeline_env()).with_created_by("admin");
        let env = original.to_env();
        let rebuilt = BuildMetadata::from_lookup(|key| env.get(key).cloned()).unwrap();
        assert_eq!(rebuilt, original);
    }
}
