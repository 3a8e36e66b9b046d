//! Input records.
//!
//! Each document type reads one nested record (JSON or YAML). The blocks shared between
//! document types live here; the per-document top-level records live with their templates.
//! Unknown keys are ignored. Type mismatches fail with the path of the offending field.

use crate::entity::{OrganizationFields, PatientFields, PractitionerFields};
use crate::{AssemblyError, AssemblyResult};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::str::FromStr;

/// Text format of input records and rendered documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DocumentFormat {
    #[default]
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Infers the format from a file extension: `.yaml`/`.yml` is YAML, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(AssemblyError::InvalidInput(format!(
                "unsupported format '{other}', expected 'json' or 'yaml'"
            ))),
        }
    }
}

/// Parse an input record of type `T` from `text`.
///
/// This uses `serde_path_to_error` so that a mismatch reports where it happened
/// (e.g. `observations[1].ref_low`). `what` names the record, for the message only.
///
/// # Errors
///
/// Returns `AssemblyError::InvalidInput` if the text is not valid JSON/YAML or does not match
/// the record shape.
pub fn parse_record<T>(text: &str, format: DocumentFormat, what: &str) -> AssemblyResult<T>
where
    T: DeserializeOwned,
{
    match format {
        DocumentFormat::Json => {
            let mut deserializer = serde_json::Deserializer::from_str(text);
            serde_path_to_error::deserialize::<_, T>(&mut deserializer)
                .map_err(|err| mismatch(what, err.path().to_string(), err.into_inner()))
        }
        DocumentFormat::Yaml => {
            let deserializer = serde_yaml::Deserializer::from_str(text);
            serde_path_to_error::deserialize::<_, T>(deserializer)
                .map_err(|err| mismatch(what, err.path().to_string(), err.into_inner()))
        }
    }
}

fn mismatch(what: &str, path: String, source: impl std::fmt::Display) -> AssemblyError {
    let path = if path.is_empty() || path == "." {
        "<root>".to_string()
    } else {
        path
    };
    AssemblyError::InvalidInput(format!("{what} input mismatch at {path}: {source}"))
}

/// Subject block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PatientInfo {
    pub name: Option<String>,
    #[serde(alias = "patient_id")]
    pub subject_id: Option<String>,
    pub gender: Option<String>,
    pub abha_no: Option<String>,
    #[serde(alias = "telephone_number", alias = "phone")]
    pub telephone: Option<String>,
}

impl From<PatientInfo> for PatientFields {
    fn from(info: PatientInfo) -> Self {
        Self {
            name: info.name,
            subject_id: info.subject_id,
            gender: info.gender,
            abha_no: info.abha_no,
            telephone: info.telephone,
        }
    }
}

/// Author block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PractitionerInfo {
    pub name: Option<String>,
    pub practitioner_id: Option<String>,
    #[serde(alias = "telephone_number", alias = "phone")]
    pub telephone: Option<String>,
}

impl From<PractitionerInfo> for PractitionerFields {
    fn from(info: PractitionerInfo) -> Self {
        Self {
            name: info.name,
            practitioner_id: info.practitioner_id,
            telephone: info.telephone,
        }
    }
}

/// Performing organisation block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct OrganizationInfo {
    pub name: Option<String>,
    pub organization_id: Option<String>,
}

impl From<OrganizationInfo> for OrganizationFields {
    fn from(info: OrganizationInfo) -> Self {
        Self {
            name: info.name,
            organization_id: info.organization_id,
        }
    }
}

/// Free text per clinical section, keyed by the logical section name.
///
/// The CamelCase aliases are the keys used by consult records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ClinicalSections {
    #[serde(alias = "ChiefComplaints")]
    pub chief_complaints: Option<String>,
    #[serde(alias = "PhysicalExamination")]
    pub physical_examination: Option<String>,
    #[serde(alias = "Allergies")]
    pub allergies: Option<String>,
    #[serde(alias = "MedicalHistory")]
    pub medical_history: Option<String>,
    #[serde(alias = "FamilyHistory")]
    pub family_history: Option<String>,
    #[serde(alias = "InvestigationAdvice")]
    pub investigation_advice: Option<String>,
    #[serde(alias = "Medications")]
    pub medications: Option<String>,
    #[serde(alias = "FollowUp")]
    pub follow_up: Option<String>,
    #[serde(alias = "Procedure")]
    pub procedure: Option<String>,
    #[serde(alias = "Referral")]
    pub referral: Option<String>,
    #[serde(alias = "OtherObservations")]
    pub other_observations: Option<String>,
    #[serde(alias = "DocumentReference")]
    pub document_reference: Option<String>,
}

impl ClinicalSections {
    /// Non-blank text for the section named `key`, if any.
    pub fn text(&self, key: &str) -> Option<&str> {
        let value = match key {
            "chief_complaints" => &self.chief_complaints,
            "physical_examination" => &self.physical_examination,
            "allergies" => &self.allergies,
            "medical_history" => &self.medical_history,
            "family_history" => &self.family_history,
            "investigation_advice" => &self.investigation_advice,
            "medications" => &self.medications,
            "follow_up" => &self.follow_up,
            "procedure" => &self.procedure,
            "referral" => &self.referral,
            "other_observations" => &self.other_observations,
            "document_reference" => &self.document_reference,
            _ => return None,
        };
        value.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Fill every section without text in `self` from `fallback`.
    pub fn or(self, fallback: ClinicalSections) -> ClinicalSections {
        fn pick(primary: Option<String>, fallback: Option<String>) -> Option<String> {
            primary.filter(|t| !t.trim().is_empty()).or(fallback)
        }

        ClinicalSections {
            chief_complaints: pick(self.chief_complaints, fallback.chief_complaints),
            physical_examination: pick(self.physical_examination, fallback.physical_examination),
            allergies: pick(self.allergies, fallback.allergies),
            medical_history: pick(self.medical_history, fallback.medical_history),
            family_history: pick(self.family_history, fallback.family_history),
            investigation_advice: pick(self.investigation_advice, fallback.investigation_advice),
            medications: pick(self.medications, fallback.medications),
            follow_up: pick(self.follow_up, fallback.follow_up),
            procedure: pick(self.procedure, fallback.procedure),
            referral: pick(self.referral, fallback.referral),
            other_observations: pick(self.other_observations, fallback.other_observations),
            document_reference: pick(self.document_reference, fallback.document_reference),
        }
    }
}

/// Deserialises an optional number given either as a number or as a numeric string.
///
/// Blank strings count as absent.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    let n = match Option::<Raw>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Raw::Number(n)) => n,
        Some(Raw::Text(s)) if s.trim().is_empty() => return Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("expected a number, got '{s}'")))?,
    };

    // FHIR decimals have no NaN or infinity.
    if !n.is_finite() {
        return Err(D::Error::custom(format!("expected a finite number, got '{n}'")));
    }
    Ok(Some(n))
}
