//! Document templates.
//!
//! A template turns one input record into one assembled document. It decides which resources
//! exist and how they link; identity, references, sections and the bundle itself come from the
//! engine modules. Templates share a [`TemplateContext`] and never hold state of their own.

mod diagnostic_report;
mod discharge_summary;
mod op_consult;
mod prescription;

pub use diagnostic_report::{
    DiagnosticReportInput, DiagnosticReportTemplate, ImagingInput, ObservationInput,
    ServiceRequestInput,
};
pub use discharge_summary::{DischargeMeta, DischargeSummaryInput, DischargeSummaryTemplate};
pub use op_consult::{OpConsultInput, OpConsultTemplate};
pub use prescription::{MedicationInput, PrescriptionInput, PrescriptionTemplate};

use crate::assembler::{BundleAssembler, DocumentBundle};
use crate::config::AssemblyConfig;
use crate::constants::SNOMED_SYSTEM;
use crate::entity::{EntityConstructor, EntityFields};
use crate::input::{parse_record, DocumentFormat};
use crate::{AssemblyError, AssemblyResult};
use clindoc_uuid::IdentityGenerator;
use fhir::{CodeableConcept, Coding, Resource};
use std::fmt;
use std::str::FromStr;

/// The supported document types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    DiagnosticReport,
    DischargeSummary,
    OpConsult,
    Prescription,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        Self::DiagnosticReport,
        Self::DischargeSummary,
        Self::OpConsult,
        Self::Prescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiagnosticReport => "diagnostic-report",
            Self::DischargeSummary => "discharge-summary",
            Self::OpConsult => "op-consult",
            Self::Prescription => "prescription",
        }
    }

    /// Composition title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::DiagnosticReport => "Diagnostic Report",
            Self::DischargeSummary => "Discharge Summary",
            Self::OpConsult => "OP Consult Record",
            Self::Prescription => "Prescription record",
        }
    }

    /// Composition type concept.
    pub fn type_concept(&self) -> CodeableConcept {
        let (text, code, display) = match self {
            Self::DiagnosticReport => (
                "Diagnostic Report- Lab",
                "721981007",
                "Diagnostic studies report",
            ),
            Self::DischargeSummary => (
                "Discharge Summary",
                "371530004",
                "Clinical consultation report",
            ),
            Self::OpConsult => (
                "OP Consult Record",
                "371530004",
                "Clinical consultation report",
            ),
            Self::Prescription => ("Prescription record", "440545006", "Prescription record"),
        };
        CodeableConcept::coded(text, Coding::new(SNOMED_SYSTEM, code, display))
    }

    /// Human readable name, used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::DiagnosticReport => "diagnostic report",
            Self::DischargeSummary => "discharge summary",
            Self::OpConsult => "OP consult record",
            Self::Prescription => "prescription",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalised)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|k| k.as_str()).collect();
                AssemblyError::InvalidInput(format!(
                    "unknown document kind '{s}', expected one of: {}",
                    known.join(", ")
                ))
            })
    }
}

/// What a template needs from its caller: configuration and an identity source.
#[derive(Clone, Copy)]
pub struct TemplateContext<'a> {
    config: &'a AssemblyConfig,
    ids: &'a dyn IdentityGenerator,
}

impl<'a> TemplateContext<'a> {
    pub fn new(config: &'a AssemblyConfig, ids: &'a dyn IdentityGenerator) -> Self {
        Self { config, ids }
    }

    pub fn config(&self) -> &'a AssemblyConfig {
        self.config
    }

    /// Construct a resource with a fresh identity.
    pub fn construct(&self, fields: EntityFields) -> Resource {
        EntityConstructor::new(self.config).construct(fields, self.ids.next_id())
    }

    pub fn assembler(&self) -> BundleAssembler<'a> {
        BundleAssembler::new(self.config, self.ids)
    }
}

/// One document type.
pub trait DocumentTemplate {
    /// The input record this template reads.
    type Input: serde::de::DeserializeOwned;

    const KIND: DocumentKind;

    /// Build and assemble one document from `input`.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::MissingRequiredField` when a mandatory block is absent, or any
    /// assembly error from the bundle assembler.
    fn build(&self, ctx: &TemplateContext<'_>, input: Self::Input)
        -> AssemblyResult<DocumentBundle>;

    /// Parse `text` as this template's input record and build it.
    fn build_from_str(
        &self,
        ctx: &TemplateContext<'_>,
        text: &str,
        format: DocumentFormat,
    ) -> AssemblyResult<DocumentBundle> {
        let input = parse_record::<Self::Input>(text, format, Self::KIND.describe())?;
        self.build(ctx, input)
    }
}

/// Fails with `MissingRequiredField` when `value` is absent or blank.
pub(crate) fn required(
    value: Option<String>,
    kind: DocumentKind,
    field: &'static str,
) -> AssemblyResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(AssemblyError::MissingRequiredField {
            document: kind.describe(),
            field,
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::assembler::DocumentBundle;
    use crate::reference::target_id;
    use std::collections::HashSet;

    /// Asserts the document invariants every template must uphold.
    pub fn assert_document_invariants(bundle: &DocumentBundle) {
        let entries = bundle.entries();
        assert!(entries.len() >= 2, "bundle must have a head");

        let composition = bundle.composition().expect("first entry is the composition");
        assert_eq!(
            target_id(&composition.subject),
            Some(entries[1].resource.id()),
            "second entry must be the subject"
        );

        let ids: HashSet<_> = entries.iter().map(|e| e.resource.id()).collect();
        assert_eq!(ids.len(), entries.len(), "identities must be unique");

        for section in &composition.section {
            for reference in &section.entry {
                let id = target_id(reference).expect("canonical reference");
                assert!(ids.contains(&id), "section entry {} dangles", reference.reference);
            }
        }
        crate::assembler::verify_bundle(bundle.bundle()).expect("bundle verifies");
    }

    /// Replaces every identity in `rendered` by its first-appearance ordinal.
    pub fn canonicalise(bundle: &DocumentBundle, rendered: &str) -> String {
        let mut out = rendered.replace(&bundle.bundle().id.to_string(), "<bundle>");
        for (n, e) in bundle.entries().iter().enumerate() {
            out = out.replace(&e.resource.id().to_string(), &format!("<id-{n}>"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_their_names() {
        for kind in DocumentKind::ALL {
            assert_eq!(kind.as_str().parse::<DocumentKind>().expect("parse"), kind);
        }
        assert_eq!(
            "OP_CONSULT".parse::<DocumentKind>().expect("underscores"),
            DocumentKind::OpConsult
        );
    }

    #[test]
    fn unknown_kind_lists_known_ones() {
        match "referral-letter".parse::<DocumentKind>() {
            Err(AssemblyError::InvalidInput(msg)) => assert!(msg.contains("prescription")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn type_concepts_are_snomed_coded() {
        let concept = DocumentKind::DiagnosticReport.type_concept();
        assert_eq!(concept.text.as_deref(), Some("Diagnostic Report- Lab"));
        assert_eq!(concept.coding[0].code.as_deref(), Some("721981007"));
        assert_eq!(concept.coding[0].system.as_deref(), Some(SNOMED_SYSTEM));

        let concept = DocumentKind::OpConsult.type_concept();
        assert_eq!(concept.coding[0].code.as_deref(), Some("371530004"));
    }

    #[test]
    fn required_rejects_blank() {
        match required(Some("  ".into()), DocumentKind::OpConsult, "date") {
            Err(AssemblyError::MissingRequiredField { document, field }) => {
                assert_eq!(document, "OP consult record");
                assert_eq!(field, "date");
            }
            other => panic!("expected MissingRequiredField, got {other:?}"),
        }
        assert_eq!(
            required(Some("2021-06-01".into()), DocumentKind::OpConsult, "date").expect("ok"),
            "2021-06-01"
        );
    }
}
