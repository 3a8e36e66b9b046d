//! Prescription document: one medication request per prescribed medication, all linked from a
//! single section.

use super::{DocumentKind, DocumentTemplate, TemplateContext};
use crate::assembler::DocumentBundle;
use crate::entity::{CompositionFields, EntityFields, MedicationRequestFields};
use crate::input::{PatientInfo, PractitionerInfo};
use crate::reference::reference_to;
use crate::section::{compose_section, SectionTable};
use crate::AssemblyResult;
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PrescriptionInput {
    #[serde(default, alias = "subject")]
    pub patient: PatientInfo,
    #[serde(default)]
    pub practitioner: PractitionerInfo,
    /// Defaults to the current time (UTC, RFC 3339).
    pub prescription_date: Option<String>,
    #[serde(default)]
    pub medications: Vec<MedicationInput>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MedicationInput {
    #[serde(alias = "name")]
    pub medication_name: Option<String>,
    #[serde(alias = "dosage")]
    pub dosage_instruction: Option<String>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PrescriptionTemplate;

impl DocumentTemplate for PrescriptionTemplate {
    type Input = PrescriptionInput;

    const KIND: DocumentKind = DocumentKind::Prescription;

    fn build(
        &self,
        ctx: &TemplateContext<'_>,
        input: Self::Input,
    ) -> AssemblyResult<DocumentBundle> {
        let date = input
            .prescription_date
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

        let patient = ctx.construct(EntityFields::Patient(input.patient.into()));
        let practitioner = ctx.construct(EntityFields::Practitioner(input.practitioner.into()));
        let patient_ref = reference_to(&patient, None);
        let practitioner_ref = reference_to(&practitioner, None);

        let requests: Vec<_> = input
            .medications
            .into_iter()
            .map(|medication| {
                ctx.construct(EntityFields::MedicationRequest(MedicationRequestFields {
                    medication_name: medication.medication_name,
                    dosage_instruction: medication.dosage_instruction,
                    subject: patient_ref.clone(),
                    requester: Some(practitioner_ref.clone()),
                    authored_on: Some(date.clone()),
                }))
            })
            .collect();

        let code = SectionTable::prescription().require("prescription_record")?;
        let section = compose_section(
            code.title,
            code,
            Some(code.display),
            requests.iter().map(Some),
        );

        let composition = ctx.construct(EntityFields::Composition(CompositionFields {
            title: Self::KIND.title().to_string(),
            type_: Self::KIND.type_concept(),
            date,
            status: None,
            subject: patient_ref,
            authors: vec![practitioner_ref],
            sections: vec![section],
        }));

        let additional = std::iter::once(practitioner).chain(requests);
        ctx.assembler().assemble(composition, patient, additional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssemblyConfig, ReferenceCheck};
    use crate::input::DocumentFormat;
    use crate::reference::target_id;
    use crate::templates::test_support::assert_document_invariants;
    use clindoc_uuid::SequentialIdentity;
    use fhir::{Resource, ResourceKind};

    const SAMPLE: &str = r#"
patient:
  name: John Doe
  patient_id: somepatientid
practitioner:
  name: Dr. Smith
  practitioner_id: somepractitionerid
prescription_date: "2021-10-10"
medications:
  - medication_name: Aspirin
    dosage_instruction: Take 1 tablet daily
  - medication_name: Aspirin 2
    dosage_instruction: Take 2 tablet daily
  - dosage_instruction: As needed
"#;

    fn render(config: &AssemblyConfig) -> String {
        let ids = SequentialIdentity::default();
        let ctx = TemplateContext::new(config, &ids);
        PrescriptionTemplate
            .build_from_str(&ctx, SAMPLE, DocumentFormat::Yaml)
            .expect("build")
            .render(DocumentFormat::Json)
            .expect("render")
    }

    fn build() -> DocumentBundle {
        let config = AssemblyConfig::default();
        let ids = SequentialIdentity::default();
        let ctx = TemplateContext::new(&config, &ids);
        PrescriptionTemplate
            .build_from_str(&ctx, SAMPLE, DocumentFormat::Yaml)
            .expect("build")
    }

    #[test]
    fn one_request_per_medication_in_one_section() {
        let bundle = build();
        assert_document_invariants(&bundle);

        let requests: Vec<_> = bundle
            .entries()
            .iter()
            .filter(|e| e.resource.kind() == ResourceKind::MedicationRequest)
            .map(|e| e.resource.id())
            .collect();
        assert_eq!(requests.len(), 3);

        let composition = bundle.composition().expect("composition");
        assert_eq!(composition.section.len(), 1);
        let linked: Vec<_> = composition.section[0]
            .entry
            .iter()
            .map(|r| target_id(r).expect("canonical"))
            .collect();
        assert_eq!(linked, requests);
        assert_eq!(composition.date, "2021-10-10");
    }

    #[test]
    fn unnamed_medication_defaults() {
        let bundle = build();
        let names: Vec<_> = bundle
            .entries()
            .iter()
            .filter_map(|e| match &e.resource {
                Resource::MedicationRequest(r) => r.medication_codeable_concept.text.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["Aspirin", "Aspirin 2", "No Name"]);
    }

    #[test]
    fn requests_carry_date_and_requester() {
        let bundle = build();
        let practitioner = &bundle.entries()[2];
        assert_eq!(practitioner.resource.kind(), ResourceKind::Practitioner);

        for e in bundle.entries() {
            if let Resource::MedicationRequest(r) = &e.resource {
                assert_eq!(r.authored_on.as_deref(), Some("2021-10-10"));
                assert_eq!(
                    r.requester.as_ref().map(|q| q.reference.as_str()),
                    Some(practitioner.full_url.as_str())
                );
                assert_eq!(r.dosage_instruction.len(), 1);
            }
        }
    }

    #[test]
    fn sequential_identities_make_output_reproducible() {
        let config = AssemblyConfig::default();
        let first = render(&config);
        assert_eq!(first, render(&config));
        assert!(first.contains("\"fullUrl\": \"urn:uuid:636c696e-646f-6300-0000-000000000001\""));
    }

    #[test]
    fn missing_date_defaults_to_now() {
        let config = AssemblyConfig::default().with_reference_check(ReferenceCheck::Lenient);
        let ids = SequentialIdentity::default();
        let ctx = TemplateContext::new(&config, &ids);
        let bundle = PrescriptionTemplate
            .build_from_str(&ctx, r#"{"medications": []}"#, DocumentFormat::Json)
            .expect("build");

        let date = &bundle.composition().expect("composition").date;
        chrono::DateTime::parse_from_rfc3339(date).expect("rfc3339 date");
        assert_eq!(bundle.len(), 3);
        assert!(bundle.composition().expect("composition").section[0].entry.is_empty());
    }
}
