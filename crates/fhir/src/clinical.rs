//! Clinical findings recorded against the subject.

use crate::datatypes::{Annotation, CodeableConcept, Narrative, Quantity, Reference, ReferenceRange};
use crate::ResourceId;
use serde::{Deserialize, Serialize};

/// A measurement or simple assertion about the subject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: ResourceId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    /// registered | preliminary | final | amended
    pub status: String,

    pub code: CodeableConcept,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performer: Vec<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_range: Vec<ReferenceRange>,
}

/// A problem, diagnosis, or complaint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: ResourceId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    pub code: CodeableConcept,

    pub subject: Reference,
}

/// A recorded allergy or intolerance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyIntolerance {
    pub id: ResourceId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    pub code: CodeableConcept,

    pub patient: Reference,
}

/// An action performed on the subject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub id: ResourceId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    /// preparation | in-progress | not-done | on-hold | stopped | completed | entered-in-error | unknown
    pub status: String,

    pub code: CodeableConcept,

    pub subject: Reference,
}

/// Health history of a relative, as reported for the subject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMemberHistory {
    pub id: ResourceId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    /// partial | completed | entered-in-error | health-unknown
    pub status: String,

    pub patient: Reference,

    pub relationship: CodeableConcept,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub condition: Vec<FamilyMemberHistoryCondition>,
}

/// A condition suffered by the relative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMemberHistoryCondition {
    pub code: CodeableConcept,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,
}
