//! Bundle wire model and JSON/YAML boundary helpers.
//!
//! A bundle is the serialised container of every resource belonging to one document, each
//! addressed by its `fullUrl`. This module only knows the container's *shape*; ordering and
//! deduplication rules are enforced by whoever builds the entry list.

use crate::resource::Resource;
use crate::{FhirError, ResourceId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const RESOURCE_TYPE: &str = "Bundle";

/// Purpose of a bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    /// A set of resources collected into a single package.
    Collection,
    /// A document: the first entry is a Composition.
    Document,
}

impl BundleType {
    /// Parses a bundle type from its wire string.
    pub fn parse(s: &str) -> Result<Self, FhirError> {
        match s.trim().to_lowercase().as_str() {
            "collection" => Ok(Self::Collection),
            "document" => Ok(Self::Document),
            _ => Err(FhirError::InvalidInput(format!("Invalid bundle type: {s}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Document => "document",
        }
    }
}

/// Top-level container of a clinical document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Bundle {
    pub resource_type: String,

    pub id: ResourceId,

    #[serde(rename = "type")]
    pub type_: BundleType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

/// One addressed resource inside a bundle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BundleEntry {
    pub full_url: String,
    pub resource: Resource,
}

impl Bundle {
    /// Creates a bundle around an already ordered entry list.
    pub fn new(
        id: ResourceId,
        type_: BundleType,
        timestamp: Option<String>,
        entry: Vec<BundleEntry>,
    ) -> Self {
        Self {
            resource_type: RESOURCE_TYPE.to_string(),
            id,
            type_,
            timestamp,
            entry,
        }
    }

    /// Render the bundle as pretty-printed JSON (two-space indent).
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if serialisation fails.
    pub fn render_json(&self) -> Result<String, FhirError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise bundle: {e}")))
    }

    /// Render the bundle as YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if serialisation fails.
    pub fn render_yaml(&self) -> Result<String, FhirError> {
        serde_yaml::to_string(self)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise bundle: {e}")))
    }

    /// Parse a bundle from JSON text.
    ///
    /// This uses `serde_path_to_error` to surface the path (e.g. `entry[2].resource.status`)
    /// of the failing field when the JSON does not match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not represent a bundle,
    /// - any field has an unexpected type or any unknown key is present,
    /// - resourceType is not "Bundle".
    pub fn parse_json(json_text: &str) -> Result<Self, FhirError> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);
        let bundle: Bundle = deserialize_with_path(&mut deserializer, "Bundle")?;
        bundle.validate_resource_type()
    }

    /// Parse a bundle from YAML text. See [`Bundle::parse_json`].
    pub fn parse_yaml(yaml_text: &str) -> Result<Self, FhirError> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let bundle: Bundle = deserialize_with_path(deserializer, "Bundle")?;
        bundle.validate_resource_type()
    }

    fn validate_resource_type(self) -> Result<Self, FhirError> {
        if self.resource_type != RESOURCE_TYPE {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Bundle', got '{}'",
                self.resource_type
            )));
        }
        Ok(self)
    }
}

/// Deserialise `T`, reporting the failing field path in the error message.
///
/// `what` names the thing being parsed, for the message only.
pub fn deserialize_with_path<'de, D, T>(deserializer: D, what: &str) -> Result<T, FhirError>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    serde_path_to_error::deserialize::<_, T>(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        FhirError::Translation(format!("{what} schema mismatch at {path}: {source}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::HumanName;
    use crate::parties::Patient;

    fn sample_bundle() -> Bundle {
        let patient_id = ResourceId::parse("550e8400-e29b-41d4-a716-446655440000").expect("id");
        let bundle_id = ResourceId::parse("550e8400-e29b-41d4-a716-446655440001").expect("id");
        Bundle::new(
            bundle_id,
            BundleType::Collection,
            Some("2021-10-10".into()),
            vec![BundleEntry {
                full_url: format!("urn:uuid:{patient_id}"),
                resource: Resource::Patient(Patient {
                    id: patient_id,
                    meta: None,
                    identifier: vec![],
                    name: vec![HumanName {
                        text: "John Doe".into(),
                    }],
                    gender: Some("male".into()),
                    telecom: vec![],
                }),
            }],
        )
    }

    #[test]
    fn renders_json_with_fhir_field_names() {
        let json = sample_bundle().render_json().expect("render json");
        assert!(json.contains("\"resourceType\": \"Bundle\""));
        assert!(json.contains("\"type\": \"collection\""));
        assert!(json.contains("\"fullUrl\": \"urn:uuid:550e8400-e29b-41d4-a716-446655440000\""));
        assert!(json.contains("\"resourceType\": \"Patient\""));
        // two-space indent
        assert!(json.contains("\n  \"id\""));
    }

    #[test]
    fn round_trips_json_and_yaml() {
        let bundle = sample_bundle();

        let json = bundle.render_json().expect("render json");
        assert_eq!(Bundle::parse_json(&json).expect("parse json"), bundle);

        let yaml = bundle.render_yaml().expect("render yaml");
        assert_eq!(Bundle::parse_yaml(&yaml).expect("parse yaml"), bundle);
    }

    #[test]
    fn rejects_wrong_resource_type() {
        let json = sample_bundle()
            .render_json()
            .expect("render")
            .replacen("\"Bundle\"", "\"Parameters\"", 1);

        match Bundle::parse_json(&json).expect_err("should reject") {
            FhirError::InvalidInput(msg) => {
                assert!(msg.contains("Bundle"));
                assert!(msg.contains("Parameters"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn reports_path_of_bad_field() {
        let json = r#"{
  "resourceType": "Bundle",
  "id": "550e8400-e29b-41d4-a716-446655440001",
  "type": "collection",
  "entry": [
    { "fullUrl": "urn:uuid:x", "resource": { "resourceType": "Patient", "id": "NOT-AN-ID" } }
  ]
}"#;

        match Bundle::parse_json(json).expect_err("should reject bad id") {
            FhirError::Translation(msg) => {
                assert!(msg.contains("entry[0]"), "unexpected message: {msg}");
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_bundle_keys() {
        let json = r#"{
  "resourceType": "Bundle",
  "id": "550e8400-e29b-41d4-a716-446655440001",
  "type": "collection",
  "unexpected_key": true
}"#;

        match Bundle::parse_json(json).expect_err("should reject unknown key") {
            FhirError::Translation(msg) => assert!(msg.contains("unexpected_key")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn parses_bundle_type() {
        assert_eq!(BundleType::parse("Document").expect("valid"), BundleType::Document);
        assert_eq!(BundleType::parse(" collection ").expect("valid"), BundleType::Collection);
        assert!(BundleType::parse("searchset").is_err());
    }
}
