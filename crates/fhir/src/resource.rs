//! The closed set of resource kinds a clinical document can contain.
//!
//! [`Resource`] is serialised with its `resourceType` tag inline, which is the standard FHIR
//! JSON shape. The inspection helpers here are read-only: they never change a body.

use crate::clinical::{AllergyIntolerance, Condition, FamilyMemberHistory, Observation, Procedure};
use crate::composition::Composition;
use crate::datatypes::Reference;
use crate::diagnostics::{DiagnosticReport, Media};
use crate::orders::{MedicationRequest, ServiceRequest};
use crate::parties::{Organization, Patient, Practitioner};
use crate::ResourceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of [`Resource`], usable without a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Patient,
    Practitioner,
    Organization,
    Observation,
    Condition,
    AllergyIntolerance,
    Procedure,
    FamilyMemberHistory,
    MedicationRequest,
    ServiceRequest,
    DiagnosticReport,
    Media,
    Composition,
}

impl ResourceKind {
    /// The FHIR `resourceType` string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Practitioner => "Practitioner",
            Self::Organization => "Organization",
            Self::Observation => "Observation",
            Self::Condition => "Condition",
            Self::AllergyIntolerance => "AllergyIntolerance",
            Self::Procedure => "Procedure",
            Self::FamilyMemberHistory => "FamilyMemberHistory",
            Self::MedicationRequest => "MedicationRequest",
            Self::ServiceRequest => "ServiceRequest",
            Self::DiagnosticReport => "DiagnosticReport",
            Self::Media => "Media",
            Self::Composition => "Composition",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed clinical resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(Patient),
    Practitioner(Practitioner),
    Organization(Organization),
    Observation(Observation),
    Condition(Condition),
    AllergyIntolerance(AllergyIntolerance),
    Procedure(Procedure),
    FamilyMemberHistory(FamilyMemberHistory),
    MedicationRequest(MedicationRequest),
    ServiceRequest(ServiceRequest),
    DiagnosticReport(DiagnosticReport),
    Media(Media),
    Composition(Composition),
}

impl Resource {
    pub fn id(&self) -> ResourceId {
        match self {
            Self::Patient(r) => r.id,
            Self::Practitioner(r) => r.id,
            Self::Organization(r) => r.id,
            Self::Observation(r) => r.id,
            Self::Condition(r) => r.id,
            Self::AllergyIntolerance(r) => r.id,
            Self::Procedure(r) => r.id,
            Self::FamilyMemberHistory(r) => r.id,
            Self::MedicationRequest(r) => r.id,
            Self::ServiceRequest(r) => r.id,
            Self::DiagnosticReport(r) => r.id,
            Self::Media(r) => r.id,
            Self::Composition(r) => r.id,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Patient(_) => ResourceKind::Patient,
            Self::Practitioner(_) => ResourceKind::Practitioner,
            Self::Organization(_) => ResourceKind::Organization,
            Self::Observation(_) => ResourceKind::Observation,
            Self::Condition(_) => ResourceKind::Condition,
            Self::AllergyIntolerance(_) => ResourceKind::AllergyIntolerance,
            Self::Procedure(_) => ResourceKind::Procedure,
            Self::FamilyMemberHistory(_) => ResourceKind::FamilyMemberHistory,
            Self::MedicationRequest(_) => ResourceKind::MedicationRequest,
            Self::ServiceRequest(_) => ResourceKind::ServiceRequest,
            Self::DiagnosticReport(_) => ResourceKind::DiagnosticReport,
            Self::Media(_) => ResourceKind::Media,
            Self::Composition(_) => ResourceKind::Composition,
        }
    }

    /// The resource's primary human-readable name, if it has one.
    ///
    /// Persons use their first name entry, organisations their name, compositions their title,
    /// and coded resources the text of their main concept. Family history uses its first
    /// condition, falling back to the relationship. Media has no label.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Patient(r) => r.name.first().map(|n| n.text.as_str()),
            Self::Practitioner(r) => r.name.first().map(|n| n.text.as_str()),
            Self::Organization(r) => r.name.as_deref(),
            Self::Observation(r) => r.code.text.as_deref(),
            Self::Condition(r) => r.code.text.as_deref(),
            Self::AllergyIntolerance(r) => r.code.text.as_deref(),
            Self::Procedure(r) => r.code.text.as_deref(),
            Self::FamilyMemberHistory(r) => r
                .condition
                .first()
                .and_then(|c| c.code.text.as_deref())
                .or(r.relationship.text.as_deref()),
            Self::MedicationRequest(r) => r.medication_codeable_concept.text.as_deref(),
            Self::ServiceRequest(r) => r.code.text.as_deref(),
            Self::DiagnosticReport(r) => r.code.text.as_deref(),
            Self::Media(_) => None,
            Self::Composition(r) => Some(r.title.as_str()),
        }
    }

    /// Every outgoing reference carried by this body, in field order.
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            Self::Patient(_) | Self::Practitioner(_) | Self::Organization(_) | Self::Media(_) => {
                Vec::new()
            }
            Self::Observation(r) => r.subject.iter().chain(r.performer.iter()).collect(),
            Self::Condition(r) => vec![&r.subject],
            Self::AllergyIntolerance(r) => vec![&r.patient],
            Self::Procedure(r) => vec![&r.subject],
            Self::FamilyMemberHistory(r) => vec![&r.patient],
            Self::MedicationRequest(r) => std::iter::once(&r.subject)
                .chain(r.requester.iter())
                .collect(),
            Self::ServiceRequest(r) => std::iter::once(&r.subject)
                .chain(r.requester.iter())
                .collect(),
            Self::DiagnosticReport(r) => r
                .based_on
                .iter()
                .chain(std::iter::once(&r.subject))
                .chain(r.performer.iter())
                .chain(r.results_interpreter.iter())
                .chain(r.result.iter())
                .chain(r.media.iter().map(|m| &m.link))
                .collect(),
            Self::Composition(r) => std::iter::once(&r.subject)
                .chain(r.author.iter())
                .chain(r.section.iter().flat_map(|s| s.entry.iter()))
                .collect(),
        }
    }

    /// Returns the composition body if this is a composition.
    pub fn as_composition(&self) -> Option<&Composition> {
        match self {
            Self::Composition(c) => Some(c),
            _ => None,
        }
    }
}

macro_rules! impl_from_body {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for Resource {
                fn from(body: $kind) -> Self {
                    Resource::$kind(body)
                }
            }
        )*
    };
}

impl_from_body!(
    Patient,
    Practitioner,
    Organization,
    Observation,
    Condition,
    AllergyIntolerance,
    Procedure,
    FamilyMemberHistory,
    MedicationRequest,
    ServiceRequest,
    DiagnosticReport,
    Media,
    Composition,
);
