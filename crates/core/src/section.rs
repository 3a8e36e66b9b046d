//! Section composer and the per-document section tables.
//!
//! A section groups a coded concept, a title, optional narrative text and an ordered list of
//! references into one `Composition.section` element. The tables mapping a logical section
//! name to its title and SNOMED CT concept are process-wide constant data; templates hold a
//! [`SectionTable`] handle to one of them and never modify it.

use crate::constants::SNOMED_SYSTEM;
use crate::reference::reference_to;
use crate::{AssemblyError, AssemblyResult};
use fhir::narrative::xhtml_div;
use fhir::{CodeableConcept, Coding, CompositionSection, Resource};

/// A composed section, ready to be placed in a composition.
pub type Section = CompositionSection;

/// Title and coded concept for one logical section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionCode {
    /// Logical name used by templates and input records (e.g. `chief_complaints`).
    pub key: &'static str,
    pub title: &'static str,
    pub code: &'static str,
    pub display: &'static str,
    pub system: &'static str,
}

impl SectionCode {
    const fn snomed(
        key: &'static str,
        title: &'static str,
        code: &'static str,
        display: &'static str,
    ) -> Self {
        Self {
            key,
            title,
            code,
            display,
            system: SNOMED_SYSTEM,
        }
    }

    /// The section concept: the display as text plus one coding.
    pub fn concept(&self) -> CodeableConcept {
        CodeableConcept::coded(
            self.display,
            Coding::new(self.system, self.code, self.display),
        )
    }
}

const CLINICAL_SECTIONS: &[SectionCode] = &[
    SectionCode::snomed(
        "chief_complaints",
        "Chief Complaints",
        "422843007",
        "Chief complaint section",
    ),
    SectionCode::snomed(
        "physical_examination",
        "Physical Examination",
        "425044008",
        "Physical Examination section",
    ),
    SectionCode::snomed("allergies", "Allergies", "722446000", "Allergy record"),
    SectionCode::snomed(
        "medical_history",
        "Medical History",
        "371529009",
        "History and physical report",
    ),
    SectionCode::snomed(
        "family_history",
        "Family History",
        "422432008",
        "Family history section",
    ),
    SectionCode::snomed(
        "investigation_advice",
        "Investigation Advice",
        "721963009",
        "Order document",
    ),
    SectionCode::snomed(
        "medications",
        "Medications",
        "721912009",
        "Medication summary document",
    ),
    SectionCode::snomed("follow_up", "Follow Up", "390906007", "Follow-up encounter"),
    SectionCode::snomed("procedure", "Procedure", "371525003", "Procedure report"),
    SectionCode::snomed("referral", "Referral", "306206005", "Clinical procedure report"),
    SectionCode::snomed(
        "other_observations",
        "Other Observations",
        "404684003",
        "Clinical finding",
    ),
    SectionCode::snomed(
        "document_reference",
        "Document Reference",
        "371530004",
        "Clinical consultation report",
    ),
];

const PRESCRIPTION_SECTIONS: &[SectionCode] = &[SectionCode::snomed(
    "prescription_record",
    "Prescription record",
    "440545006",
    "Prescription record",
)];

const DIAGNOSTIC_REPORT_SECTIONS: &[SectionCode] = &[SectionCode::snomed(
    "diagnostic_report",
    "Diagnostic Report",
    "721981007",
    "Diagnostic studies report",
)];

/// Immutable, ordered mapping from logical section name to [`SectionCode`].
#[derive(Clone, Copy, Debug)]
pub struct SectionTable(&'static [SectionCode]);

impl SectionTable {
    /// The twelve clinical sections shared by discharge summaries and OP consult records.
    pub fn clinical() -> Self {
        Self(CLINICAL_SECTIONS)
    }

    pub fn prescription() -> Self {
        Self(PRESCRIPTION_SECTIONS)
    }

    pub fn diagnostic_report() -> Self {
        Self(DIAGNOSTIC_REPORT_SECTIONS)
    }

    pub fn get(&self, key: &str) -> Option<&'static SectionCode> {
        self.0.iter().find(|s| s.key == key)
    }

    /// Like [`SectionTable::get`], failing with `AssemblyError::UnknownSection`.
    pub fn require(&self, key: &str) -> AssemblyResult<&'static SectionCode> {
        self.get(key)
            .ok_or_else(|| AssemblyError::UnknownSection(key.to_string()))
    }

    /// Entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'static SectionCode> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Composes one section.
///
/// Absent entries are dropped; every surviving resource becomes a reference, in caller order,
/// with no deduplication. A section with no surviving entries is still returned (with an empty
/// entry list). Blank `narrative_text` produces no narrative.
pub fn compose_section<'a, I>(
    title: &str,
    code: &SectionCode,
    narrative_text: Option<&str>,
    entries: I,
) -> Section
where
    I: IntoIterator<Item = Option<&'a Resource>>,
{
    let text = narrative_text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(xhtml_div);

    Section {
        title: title.to_string(),
        code: code.concept(),
        text,
        entry: entries
            .into_iter()
            .flatten()
            .map(|resource| reference_to(resource, None))
            .collect(),
    }
}
