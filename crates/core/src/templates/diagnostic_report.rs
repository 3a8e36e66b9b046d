//! Diagnostic report document.
//!
//! One service request, one observation per reported measurement, an optional imaging
//! attachment, and a report tying them together. The composition has a single section that
//! links the report.

use super::{required, DocumentKind, DocumentTemplate, TemplateContext};
use crate::assembler::DocumentBundle;
use crate::entity::{
    CompositionFields, DiagnosticReportFields, EntityFields, MediaFields, ObservationFields,
    ServiceRequestFields,
};
use crate::input::{lenient_number, OrganizationInfo, PatientInfo, PractitionerInfo};
use crate::reference::reference_to;
use crate::section::{compose_section, SectionTable};
use crate::{AssemblyError, AssemblyResult};
use serde::Deserialize;

const IMAGING_LABEL: &str = "Imaging data";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DiagnosticReportInput {
    #[serde(default, alias = "subject")]
    pub patient: PatientInfo,
    #[serde(default)]
    pub practitioner: PractitionerInfo,
    #[serde(default)]
    pub performer: OrganizationInfo,
    pub report_date: Option<String>,
    /// Mandatory.
    pub request: Option<ServiceRequestInput>,
    pub report_name: Option<String>,
    pub report_title: Option<String>,
    pub conclusion: Option<String>,
    #[serde(default, alias = "findings")]
    pub observations: Vec<ObservationInput>,
    pub imaging: Option<ImagingInput>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ServiceRequestInput {
    pub service_name: Option<String>,
    pub request_date: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ObservationInput {
    #[serde(alias = "name")]
    pub observation_name: Option<String>,
    #[serde(default, alias = "value", deserialize_with = "lenient_number")]
    pub observation_value: Option<f64>,
    #[serde(alias = "unit")]
    pub observation_unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub ref_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub ref_high: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImagingInput {
    #[serde(rename = "type", alias = "content_type")]
    pub content_type: String,
    pub data: String,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DiagnosticReportTemplate;

impl DocumentTemplate for DiagnosticReportTemplate {
    type Input = DiagnosticReportInput;

    const KIND: DocumentKind = DocumentKind::DiagnosticReport;

    fn build(
        &self,
        ctx: &TemplateContext<'_>,
        input: Self::Input,
    ) -> AssemblyResult<DocumentBundle> {
        let request = input
            .request
            .ok_or(AssemblyError::MissingRequiredField {
                document: Self::KIND.describe(),
                field: "request",
            })?;
        let report_date = required(input.report_date, Self::KIND, "report_date")?;

        let patient = ctx.construct(EntityFields::Patient(input.patient.into()));
        let practitioner = ctx.construct(EntityFields::Practitioner(input.practitioner.into()));
        let performer = ctx.construct(EntityFields::Organization(input.performer.into()));

        let patient_ref = reference_to(&patient, None);
        let practitioner_ref = reference_to(&practitioner, None);
        let performer_ref = reference_to(&performer, None);

        let service_request = ctx.construct(EntityFields::ServiceRequest(ServiceRequestFields {
            service_name: request.service_name,
            request_date: request.request_date,
            subject: patient_ref.clone(),
            requester: Some(practitioner_ref.clone()),
        }));

        let observations: Vec<_> = input
            .observations
            .into_iter()
            .map(|obs| {
                ctx.construct(EntityFields::Observation(ObservationFields {
                    name: obs.observation_name,
                    status: None,
                    value: obs.observation_value,
                    unit: obs.observation_unit,
                    ref_low: obs.ref_low,
                    ref_high: obs.ref_high,
                    narrative: None,
                    subject: Some(patient_ref.clone()),
                    performer: vec![performer_ref.clone()],
                    issued: Some(report_date.clone()),
                }))
            })
            .collect();

        let media = input.imaging.map(|imaging| {
            ctx.construct(EntityFields::Media(MediaFields {
                content_type: imaging.content_type,
                data: imaging.data,
            }))
        });

        let report = ctx.construct(EntityFields::DiagnosticReport(DiagnosticReportFields {
            report_name: input.report_name,
            conclusion: input.conclusion,
            subject: patient_ref.clone(),
            issued: Some(report_date.clone()),
            performer: vec![performer_ref],
            interpreter: vec![practitioner_ref.clone()],
            based_on: vec![reference_to(&service_request, None)],
            results: observations.iter().map(|o| reference_to(o, None)).collect(),
            media: media
                .iter()
                .map(|m| reference_to(m, Some(IMAGING_LABEL)))
                .collect(),
        }));

        let code = SectionTable::diagnostic_report().require("diagnostic_report")?;
        let title = input
            .report_title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| code.title.to_string());
        let section = compose_section(&title, code, None, [Some(&report)]);

        let composition = ctx.construct(EntityFields::Composition(CompositionFields {
            title: Self::KIND.title().to_string(),
            type_: Self::KIND.type_concept(),
            date: report_date,
            status: None,
            subject: patient_ref,
            authors: vec![practitioner_ref],
            sections: vec![section],
        }));

        let mut additional = vec![practitioner, performer.clone(), service_request];
        for observation in observations {
            // Each measurement carries its performer; the assembler keeps the first copy.
            additional.push(performer.clone());
            additional.push(observation);
        }
        additional.extend(media);
        additional.push(report);

        ctx.assembler().assemble(composition, patient, additional)
    }
}
