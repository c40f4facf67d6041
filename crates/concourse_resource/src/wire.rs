//! The three JSON payload shapes Concourse exchanges with a resource.
//!
//! | Script | stdin | stdout |
//! |--------|-------|--------|
//! | `check` | `{"source": {...}, "version": {...}?}` | `[{...}, ...]` |
//! | `in` | `{"source": {...}, "version": {...}, "params": {...}?}` | `{"version": {...}, "metadata": [...]}` |
//! | `out` | `{"source": {...}, "params": {...}?}` | `{"version": {...}, "metadata": [...]}` |
//!
//! Parsing is strict about structure and lenient about values: version
//! values that are not strings are stringified rather than rejected.
//! Output uses `", "` and `": "` separators and escapes non-ASCII text, so
//! it reads the same as the payloads Concourse's own tooling produces.

use crate::error::ParseError;
use concourse_version::VersionConfig;
pub use concourse_version::json::encode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `source` section of a payload.
pub type ResourceConfig = Map<String, Value>;

/// The `params` section of a payload.
pub type Params = Map<String, Value>;

/// Metadata returned from `in` and `out`, in display order.
pub type Metadata = IndexMap<String, String>;

/// One entry of the `metadata` list in `in`/`out` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPair {
    /// The label shown in the Concourse UI.
    pub name: String,
    /// The value shown next to it.
    pub value: String,
}

// ─────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────

/// Parses a `check` payload into the source and the previous version.
///
/// An absent or `null` version means the resource has never been checked.
pub fn parse_check_payload(
    raw: &str,
) -> Result<(ResourceConfig, Option<VersionConfig>), ParseError> {
    let mut payload = parse_payload(raw)?;
    let source = extract_source(&mut payload)?;
    let version = extract_version(&mut payload)?;
    Ok((source, version))
}

/// Parses an `in` payload into the source, the requested version and the
/// step params.
pub fn parse_in_payload(raw: &str) -> Result<(ResourceConfig, VersionConfig, Params), ParseError> {
    let mut payload = parse_payload(raw)?;
    let source = extract_source(&mut payload)?;
    let params = extract_params(&mut payload)?;
    let version = extract_version(&mut payload)?.ok_or(ParseError::MissingVersion)?;
    Ok((source, version, params))
}

/// Parses an `out` payload into the source and the step params.
pub fn parse_out_payload(raw: &str) -> Result<(ResourceConfig, Params), ParseError> {
    let mut payload = parse_payload(raw)?;
    let source = extract_source(&mut payload)?;
    let params = extract_params(&mut payload)?;
    Ok((source, params))
}

/// Converts a metadata list back to a mapping.
#[must_use]
pub fn parse_metadata(pairs: &[MetadataPair]) -> Metadata {
    pairs
        .iter()
        .map(|pair| (pair.name.clone(), pair.value.clone()))
        .collect()
}

fn parse_payload(raw: &str) -> Result<Map<String, Value>, ParseError> {
    match serde_json::from_str(raw)? {
        Value::Object(payload) => Ok(payload),
        other => Err(ParseError::NotAnObject {
            section: "payload",
            found: json_type(&other),
        }),
    }
}

fn extract_source(payload: &mut Map<String, Value>) -> Result<ResourceConfig, ParseError> {
    match payload.remove("source") {
        None => Err(ParseError::MissingSource),
        Some(Value::Null) => Ok(ResourceConfig::new()),
        Some(Value::Object(source)) => Ok(source),
        Some(other) => Err(ParseError::NotAnObject {
            section: "source",
            found: json_type(&other),
        }),
    }
}

fn extract_version(payload: &mut Map<String, Value>) -> Result<Option<VersionConfig>, ParseError> {
    match payload.remove("version") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(version)) => Ok(Some(
            version
                .into_iter()
                .map(|(key, value)| (key, to_wire_string(&value)))
                .collect(),
        )),
        Some(other) => Err(ParseError::NotAnObject {
            section: "version",
            found: json_type(&other),
        }),
    }
}

fn extract_params(payload: &mut Map<String, Value>) -> Result<Params, ParseError> {
    match payload.remove("params") {
        None | Some(Value::Null) => Ok(Params::new()),
        Some(Value::Object(params)) => Ok(params),
        Some(other) => Err(ParseError::NotAnObject {
            section: "params",
            found: json_type(&other),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─────────────────────────────────────────────────────────────────────
// Formatting
// ─────────────────────────────────────────────────────────────────────

/// Formats `check` output: a list of versions, oldest first.
#[must_use]
pub fn format_check_output(versions: &[VersionConfig]) -> String {
    let versions = versions.iter().map(version_value).collect();
    encode(&Value::Array(versions))
}

/// Formats `in` or `out` output.
#[must_use]
pub fn format_in_out_output(version: &VersionConfig, metadata: &Metadata) -> String {
    let mut output = Map::new();
    output.insert("version".to_owned(), version_value(version));
    output.insert("metadata".to_owned(), metadata_value(metadata));
    encode(&Value::Object(output))
}

/// Converts a metadata mapping to the list Concourse expects.
#[must_use]
pub fn format_metadata(metadata: &Metadata) -> Vec<MetadataPair> {
    metadata
        .iter()
        .map(|(name, value)| MetadataPair {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

/// Formats a `check` payload, as Concourse would send it.
#[must_use]
pub fn format_check_input(source: &ResourceConfig, version: Option<&VersionConfig>) -> String {
    let mut payload = Map::new();
    payload.insert("source".to_owned(), Value::Object(source.clone()));
    if let Some(version) = version {
        payload.insert("version".to_owned(), version_value(version));
    }
    encode(&Value::Object(payload))
}

/// Formats an `in` payload, as Concourse would send it.
#[must_use]
pub fn format_in_input(
    source: &ResourceConfig,
    version: &VersionConfig,
    params: Option<&Params>,
) -> String {
    let mut payload = Map::new();
    payload.insert("source".to_owned(), Value::Object(source.clone()));
    payload.insert("version".to_owned(), version_value(version));
    if let Some(params) = params {
        payload.insert("params".to_owned(), Value::Object(params.clone()));
    }
    encode(&Value::Object(payload))
}

/// Formats an `out` payload, as Concourse would send it.
#[must_use]
pub fn format_out_input(source: &ResourceConfig, params: Option<&Params>) -> String {
    let mut payload = Map::new();
    payload.insert("source".to_owned(), Value::Object(source.clone()));
    if let Some(params) = params {
        payload.insert("params".to_owned(), Value::Object(params.clone()));
    }
    encode(&Value::Object(payload))
}

/// Renders a JSON value as a version string.
///
/// Strings pass through unchanged. Booleans become `"True"`/`"False"` and
/// `null` becomes `"None"`, matching the flat encoding of those values.
/// Anything else is rendered as JSON.
#[must_use]
pub fn to_wire_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(true) => "True".to_owned(),
        Value::Bool(false) => "False".to_owned(),
        Value::Null => "None".to_owned(),
        other => encode(other),
    }
}

fn version_value(version: &VersionConfig) -> Value {
    Value::Object(
        version
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect(),
    )
}

fn metadata_value(metadata: &Metadata) -> Value {
    Value::Array(
        format_metadata(metadata)
            .into_iter()
            .map(|pair| {
                let mut entry = Map::new();
                entry.insert("name".to_owned(), Value::String(pair.name));
                entry.insert("value".to_owned(), Value::String(pair.value));
                Value::Object(entry)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn check_payload_without_version() {
        let (source, version) = parse_check_payload(r#"{"source": {"uri": "git://x"}}"#).unwrap();
        assert_eq!(source["uri"], "git://x");
        assert_eq!(version, None);
    }

    #[test]
    fn check_payload_stringifies_version_values() {
        let raw = r#"{"source": {}, "version": {"ref": "61cbef", "build": 42, "ok": true}}"#;
        let (_, version) = parse_check_payload(raw).unwrap();
        let version = version.unwrap();
        assert_eq!(version["ref"], "61cbef");
        assert_eq!(version["build"], "42");
        assert_eq!(version["ok"], "True");
    }

    #[test]
    fn null_source_is_empty() {
        let (source, _) = parse_out_payload(r#"{"source": null}"#).unwrap();
        assert!(source.is_empty());
    }

    #[test]
    fn missing_source_is_an_error() {
        assert!(matches!(
            parse_check_payload(r#"{"version": {"ref": "1"}}"#),
            Err(ParseError::MissingSource)
        ));
    }

    #[test]
    fn in_payload_requires_a_version() {
        assert!(matches!(
            parse_in_payload(r#"{"source": {}}"#),
            Err(ParseError::MissingVersion)
        ));
    }

    #[test]
    fn missing_params_default_to_empty() {
        let (_, _, params) =
            parse_in_payload(r#"{"source": {}, "version": {"ref": "1"}}"#).unwrap();
        assert!(params.is_empty());
        let (_, params) = parse_out_payload(r#"{"source": {}, "params": null}"#).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn wrong_section_type_is_reported() {
        assert!(matches!(
            parse_out_payload(r#"{"source": [1, 2]}"#),
            Err(ParseError::NotAnObject { section: "source", found: "an array" })
        ));
        assert!(matches!(
            parse_check_payload("not json"),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn check_output_uses_spaced_separators() {
        let versions = vec![VersionConfig::from([("ref".to_owned(), "7154fe".to_owned())])];
        assert_eq!(format_check_output(&versions), r#"[{"ref": "7154fe"}]"#);
        assert_eq!(format_check_output(&[]), "[]");
    }

    #[test]
    fn in_out_output_lists_metadata_in_order() {
        let version = VersionConfig::from([("ref".to_owned(), "61cbef".to_owned())]);
        let metadata = Metadata::from([
            ("commit".to_owned(), "61cbef".to_owned()),
            ("author".to_owned(), "Hulk Hogan".to_owned()),
        ]);
        assert_eq!(
            format_in_out_output(&version, &metadata),
            r#"{"version": {"ref": "61cbef"}, "metadata": [{"name": "commit", "value": "61cbef"}, {"name": "author", "value": "Hulk Hogan"}]}"#
        );
    }

    #[test]
    fn non_ascii_text_is_escaped() {
        assert_eq!(encode(&json!("café ☕")), r#""caf\u00e9 \u2615""#);
        assert_eq!(encode(&json!("🚀")), r#""\ud83d\ude80""#);
    }

    #[test]
    fn input_formatting_round_trips_through_parsing() {
        let source = object(json!({"uri": "git://x", "depth": 1}));
        let version = VersionConfig::from([("ref".to_owned(), "61cbef".to_owned())]);
        let params = object(json!({"skip_download": true}));

        let (parsed_source, parsed_version, parsed_params) =
            parse_in_payload(&format_in_input(&source, &version, Some(&params))).unwrap();
        assert_eq!(parsed_source, source);
        assert_eq!(parsed_version, version);
        assert_eq!(parsed_params, params);

        let (_, parsed_version) = parse_check_payload(&format_check_input(&source, None)).unwrap();
        assert_eq!(parsed_version, None);

        let (_, parsed_params) = parse_out_payload(&format_out_input(&source, None)).unwrap();
        assert!(parsed_params.is_empty());
    }

    #[test]
    fn metadata_pairs_round_trip() {
        let metadata = Metadata::from([("a".to_owned(), "1".to_owned())]);
        assert_eq!(parse_metadata(&format_metadata(&metadata)), metadata);
    }
}
