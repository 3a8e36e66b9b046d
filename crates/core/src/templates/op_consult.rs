//! Outpatient consult record.
//!
//! All twelve clinical sections are always present. They carry narrative only, so every
//! section has an empty entry list.

use super::{required, DocumentKind, DocumentTemplate, TemplateContext};
use crate::assembler::DocumentBundle;
use crate::entity::{CompositionFields, EntityFields};
use crate::input::{ClinicalSections, PatientInfo, PractitionerInfo};
use crate::reference::reference_to;
use crate::section::{compose_section, SectionTable};
use crate::AssemblyResult;
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OpConsultInput {
    #[serde(default, alias = "subject")]
    pub patient: PatientInfo,
    #[serde(default)]
    pub practitioner: PractitionerInfo,
    pub date: Option<String>,
    #[serde(default, alias = "section")]
    pub sections: ClinicalSections,
    /// Section text given at the top level of the record, e.g. `"ChiefComplaints"`.
    /// Text under `sections` takes precedence.
    #[serde(flatten)]
    pub top_level: ClinicalSections,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OpConsultTemplate;

impl DocumentTemplate for OpConsultTemplate {
    type Input = OpConsultInput;

    const KIND: DocumentKind = DocumentKind::OpConsult;

    fn build(
        &self,
        ctx: &TemplateContext<'_>,
        input: Self::Input,
    ) -> AssemblyResult<DocumentBundle> {
        let date = required(input.date, Self::KIND, "date")?;

        let patient = ctx.construct(EntityFields::Patient(input.patient.into()));
        let practitioner = ctx.construct(EntityFields::Practitioner(input.practitioner.into()));
        let practitioner_ref = reference_to(&practitioner, None);
        let texts = input.sections.or(input.top_level);

        let sections = SectionTable::clinical()
            .iter()
            .map(|code| {
                compose_section(
                    code.title,
                    code,
                    texts.text(code.key),
                    std::iter::empty(),
                )
            })
            .collect();

        let composition = ctx.construct(EntityFields::Composition(CompositionFields {
            title: Self::KIND.title().to_string(),
            type_: Self::KIND.type_concept(),
            date,
            status: None,
            subject: reference_to(&patient, None),
            authors: vec![practitioner_ref],
            sections,
        }));

        ctx.assembler().assemble(composition, patient, [practitioner])
    }
}
