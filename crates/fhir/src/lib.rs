//! FHIR resource shapes for clinical document bundles.
//!
//! This crate provides the **wire models** for the resources that make up a clinical document
//! (patients, practitioners, findings, orders, reports, the composition itself) and the
//! **bundle container** that carries them, together with JSON/YAML boundary helpers.
//!
//! This crate focuses on:
//! - stable FHIR field names and coded-concept structure
//! - serialisation/deserialisation of resources and bundles
//! - read-only inspection helpers used by the assembly engine (identity, label, references)
//!
//! It deliberately knows nothing about identity generation, section tables, or how a document
//! is put together. Those live in `clindoc-core`.

pub mod bundle;
pub mod clinical;
pub mod composition;
pub mod datatypes;
pub mod diagnostics;
pub mod narrative;
pub mod orders;
pub mod parties;
pub mod resource;

// Re-export facades
pub use bundle::{Bundle, BundleEntry, BundleType};
pub use composition::{Composition, CompositionSection};
pub use resource::{Resource, ResourceKind};

// Re-export public resource types
pub use clinical::{
    AllergyIntolerance, Condition, FamilyMemberHistory, FamilyMemberHistoryCondition, Observation,
    Procedure,
};
pub use datatypes::{
    Annotation, Attachment, CodeableConcept, Coding, ContactPoint, Dosage, HumanName, Identifier,
    Meta, Narrative, Quantity, Reference, ReferenceRange,
};
pub use diagnostics::{DiagnosticReport, DiagnosticReportMedia, Media};
pub use orders::{MedicationRequest, ServiceRequest};
pub use parties::{Organization, Patient, Practitioner};

// Re-export ResourceId from the clindoc_uuid crate
pub use clindoc_uuid::ResourceId;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
