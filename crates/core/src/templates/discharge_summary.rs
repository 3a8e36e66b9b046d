//! Discharge summary document.
//!
//! Each clinical section with text becomes one finding resource of the kind that section
//! records, plus a section linking it. Sections without text are left out.

use super::{required, DocumentKind, DocumentTemplate, TemplateContext};
use crate::assembler::DocumentBundle;
use crate::entity::{
    CompositionFields, EntityFields, FindingFields, MedicationRequestFields, ObservationFields,
};
use crate::input::{ClinicalSections, PatientInfo, PractitionerInfo};
use crate::reference::reference_to;
use crate::section::{compose_section, SectionTable};
use crate::AssemblyResult;
use fhir::Reference;
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DischargeSummaryInput {
    #[serde(default, alias = "subject")]
    pub patient: PatientInfo,
    pub practitioner: Option<PractitionerInfo>,
    #[serde(default)]
    pub meta: DischargeMeta,
    #[serde(default, alias = "sections")]
    pub section: ClinicalSections,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DischargeMeta {
    pub discharge_date: Option<String>,
    /// Composition status; `final` when absent.
    pub status: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Finding {
    Condition,
    Observation,
    Allergy,
    FamilyHistory,
    Procedure,
    Medication,
}

/// The finding kind recorded under a clinical section, if the section has one.
fn finding_for(section: &str) -> Option<Finding> {
    match section {
        "chief_complaints" | "medical_history" => Some(Finding::Condition),
        "physical_examination" | "other_observations" => Some(Finding::Observation),
        "allergies" => Some(Finding::Allergy),
        "family_history" => Some(Finding::FamilyHistory),
        "procedure" => Some(Finding::Procedure),
        "medications" => Some(Finding::Medication),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DischargeSummaryTemplate;

impl DischargeSummaryTemplate {
    fn finding_fields(
        finding: Finding,
        text: &str,
        subject: &Reference,
        author: Option<&Reference>,
        date: &str,
    ) -> EntityFields {
        let finding_fields = || FindingFields {
            text: text.to_string(),
            subject: subject.clone(),
        };
        match finding {
            Finding::Condition => EntityFields::Condition(finding_fields()),
            Finding::Allergy => EntityFields::AllergyIntolerance(finding_fields()),
            Finding::FamilyHistory => EntityFields::FamilyMemberHistory(finding_fields()),
            Finding::Procedure => EntityFields::Procedure(finding_fields()),
            Finding::Observation => EntityFields::Observation(ObservationFields {
                name: Some(text.to_string()),
                narrative: Some(text.to_string()),
                subject: Some(subject.clone()),
                ..Default::default()
            }),
            Finding::Medication => EntityFields::MedicationRequest(MedicationRequestFields {
                medication_name: Some(text.to_string()),
                dosage_instruction: None,
                subject: subject.clone(),
                requester: author.cloned(),
                authored_on: Some(date.to_string()),
            }),
        }
    }
}

impl DocumentTemplate for DischargeSummaryTemplate {
    type Input = DischargeSummaryInput;

    const KIND: DocumentKind = DocumentKind::DischargeSummary;

    fn build(
        &self,
        ctx: &TemplateContext<'_>,
        input: Self::Input,
    ) -> AssemblyResult<DocumentBundle> {
        let date = required(input.meta.discharge_date, Self::KIND, "meta.discharge_date")?;

        let patient = ctx.construct(EntityFields::Patient(input.patient.into()));
        let patient_ref = reference_to(&patient, None);

        let practitioner = input
            .practitioner
            .map(|info| ctx.construct(EntityFields::Practitioner(info.into())));
        let practitioner_ref = practitioner.as_ref().map(|p| reference_to(p, None));

        let mut sections = Vec::new();
        let mut additional: Vec<_> = practitioner.into_iter().collect();

        for code in SectionTable::clinical().iter() {
            let Some(text) = input.section.text(code.key) else {
                continue;
            };

            let finding = finding_for(code.key).map(|finding| {
                ctx.construct(Self::finding_fields(
                    finding,
                    text,
                    &patient_ref,
                    practitioner_ref.as_ref(),
                    &date,
                ))
            });

            sections.push(compose_section(
                code.title,
                code,
                Some(text),
                [finding.as_ref()],
            ));
            additional.extend(finding);
        }

        let composition = ctx.construct(EntityFields::Composition(CompositionFields {
            title: Self::KIND.title().to_string(),
            type_: Self::KIND.type_concept(),
            date,
            status: input.meta.status,
            subject: patient_ref,
            authors: practitioner_ref.into_iter().collect(),
            sections,
        }));

        ctx.assembler().assemble(composition, patient, additional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssemblyConfig;
    use crate::input::DocumentFormat;
    use crate::templates::test_support::assert_document_invariants;
    use crate::AssemblyError;
    use clindoc_uuid::SequentialIdentity;
    use fhir::{Resource, ResourceKind};

    const SAMPLE_YAML: &str = r#"
patient:
  patient_id: "1234567890"
  name: Aman
  gender: Male
  phone: "9999999999"
practitioner:
  name: Dr. Rao
section:
  chief_complaints: Fever for three days
  physical_examination: Pulse regular
  allergies: null
  medical_history: ""
  family_history: Diabetes in father
  medications: Paracetamol 500mg
  follow_up: Review in one week
meta:
  discharge_date: "2020-07-09T15:32:26.605+05:30"
  status: final
"#;

    fn build(text: &str, format: DocumentFormat) -> AssemblyResult<DocumentBundle> {
        let config = AssemblyConfig::default();
        let ids = SequentialIdentity::default();
        let ctx = TemplateContext::new(&config, &ids);
        DischargeSummaryTemplate.build_from_str(&ctx, text, format)
    }

    #[test]
    fn sections_follow_table_order_and_skip_empty_text() {
        let bundle = build(SAMPLE_YAML, DocumentFormat::Yaml).expect("build");
        assert_document_invariants(&bundle);

        let composition = bundle.composition().expect("composition");
        let titles: Vec<_> = composition.section.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Chief Complaints",
                "Physical Examination",
                "Family History",
                "Medications",
                "Follow Up",
            ]
        );
        assert_eq!(composition.author.len(), 1);
        assert_eq!(composition.status, "final");
    }

    #[test]
    fn each_section_links_the_matching_finding_kind() {
        let bundle = build(SAMPLE_YAML, DocumentFormat::Yaml).expect("build");
        let composition = bundle.composition().expect("composition");

        let linked: Vec<Option<ResourceKind>> = composition
            .section
            .iter()
            .map(|s| {
                s.entry.first().map(|r| {
                    let id = crate::reference::target_id(r).expect("canonical");
                    bundle.get(id).expect("resolves").kind()
                })
            })
            .collect();
        assert_eq!(
            linked,
            vec![
                Some(ResourceKind::Condition),
                Some(ResourceKind::Observation),
                Some(ResourceKind::FamilyMemberHistory),
                Some(ResourceKind::MedicationRequest),
                None,
            ]
        );
        assert!(composition.section[4].text.is_some());
    }

    #[test]
    fn findings_reference_the_subject() {
        let bundle = build(SAMPLE_YAML, DocumentFormat::Yaml).expect("build");
        let subject = &bundle.entries()[1].full_url;

        for e in &bundle.entries()[2..] {
            if let Resource::Practitioner(_) = e.resource {
                continue;
            }
            let refs = e.resource.references();
            assert_eq!(&refs[0].reference, subject, "{} should point at the subject", e.resource.kind());
        }
    }

    #[test]
    fn family_history_carries_the_text() {
        let bundle = build(SAMPLE_YAML, DocumentFormat::Yaml).expect("build");
        let history = bundle
            .entries()
            .iter()
            .find_map(|e| match &e.resource {
                Resource::FamilyMemberHistory(h) => Some(h),
                _ => None,
            })
            .expect("family history");
        assert_eq!(
            history.condition[0].code.text.as_deref(),
            Some("Diabetes in father")
        );
        assert_eq!(history.condition[0].note[0].text, "Diabetes in father");
    }

    #[test]
    fn works_without_practitioner() {
        let bundle = build(
            r#"{"patient": {"name": "Aman"},
                "meta": {"discharge_date": "2020-07-09"},
                "section": {"chief_complaints": "Fever"}}"#,
            DocumentFormat::Json,
        )
        .expect("build");
        assert_document_invariants(&bundle);
        assert_eq!(bundle.len(), 3);
        assert!(bundle.composition().expect("composition").author.is_empty());
    }

    #[test]
    fn no_sections_is_still_a_document() {
        let bundle = build(
            r#"{"meta": {"discharge_date": "2020-07-09"}}"#,
            DocumentFormat::Json,
        )
        .expect("build");
        assert_document_invariants(&bundle);
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.entries()[1].resource.label(), Some("No Name"));
    }

    #[test]
    fn discharge_date_is_required() {
        match build(r#"{"patient": {"name": "Aman"}}"#, DocumentFormat::Json) {
            Err(AssemblyError::MissingRequiredField { field, .. }) => {
                assert_eq!(field, "meta.discharge_date");
            }
            other => panic!("expected MissingRequiredField, got {other:?}"),
        }
    }
}
