//! Entity constructor.
//!
//! Turns a per-kind field set plus an identity into a typed resource. Each kind has its own
//! field struct so that "which fields exist, which default, which are omitted" is explicit.
//!
//! Defaulting policy per kind:
//!
//! | kind | defaulted when absent | omitted when absent | mandatory |
//! |---|---|---|---|
//! | Patient | name → "No Name" | subject_id, gender, abha_no, telephone | |
//! | Practitioner | name → "No Name" | practitioner_id, telephone | |
//! | Organization | name → "No Name", organization_id → "1234567890" | | |
//! | Observation | name → "No Name", status → "final" | value, unit, ref_low, ref_high, narrative, subject, issued | |
//! | Condition, AllergyIntolerance, Procedure, FamilyMemberHistory | | | text, subject |
//! | MedicationRequest | medication_name → "No Name" | dosage_instruction, requester, authored_on | subject |
//! | ServiceRequest | service_name → "No Name" | request_date, requester | subject |
//! | Media | | | content_type, data |
//! | DiagnosticReport | report_name → "No Name", conclusion → "No Conclusion" | issued | subject |
//! | Composition | status → "final" | | title, type, date, subject |
//!
//! Construction never fails and performs no I/O.

use crate::config::AssemblyConfig;
use crate::constants::{
    DEFAULT_COMPOSITION_STATUS, DEFAULT_FAMILY_RELATIONSHIP, DEFAULT_ORGANIZATION_ID,
    IDENTIFIER_TYPE_SYSTEM, NO_CONCLUSION, NO_NAME, PROFILE_BASE,
};
use crate::section::Section;
use clindoc_uuid::ResourceId;
use fhir::narrative::xhtml_div;
use fhir::{
    AllergyIntolerance, Annotation, Attachment, CodeableConcept, Coding, Composition, Condition,
    ContactPoint, DiagnosticReport, DiagnosticReportMedia, Dosage, FamilyMemberHistory,
    FamilyMemberHistoryCondition, HumanName, Identifier, Media, MedicationRequest, Meta,
    Observation, Organization, Patient, Practitioner, Procedure, Quantity, Reference,
    ReferenceRange, Resource, ResourceKind, ServiceRequest,
};

/// Identifier type codes (HL7 v2 table 0203) used on persons and organisations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentifierType {
    MedicalRecordNumber,
    ProviderNumber,
    AccountNumber,
}

impl IdentifierType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MedicalRecordNumber => "MR",
            Self::ProviderNumber => "PRN",
            Self::AccountNumber => "AN",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            Self::MedicalRecordNumber => "Medical record number",
            Self::ProviderNumber => "Provider number",
            Self::AccountNumber => "Account number",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientFields {
    pub name: Option<String>,
    /// Medical record number.
    pub subject_id: Option<String>,
    pub gender: Option<String>,
    /// Health account number.
    pub abha_no: Option<String>,
    pub telephone: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PractitionerFields {
    pub name: Option<String>,
    pub practitioner_id: Option<String>,
    pub telephone: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrganizationFields {
    pub name: Option<String>,
    pub organization_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObservationFields {
    pub name: Option<String>,
    pub status: Option<String>,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub ref_low: Option<f64>,
    pub ref_high: Option<f64>,
    /// Free text rendered as the resource narrative.
    pub narrative: Option<String>,
    pub subject: Option<Reference>,
    pub performer: Vec<Reference>,
    pub issued: Option<String>,
}

/// Fields for the free-text finding kinds (condition, allergy, procedure, family history).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindingFields {
    pub text: String,
    pub subject: Reference,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MedicationRequestFields {
    pub medication_name: Option<String>,
    pub dosage_instruction: Option<String>,
    pub subject: Reference,
    pub requester: Option<Reference>,
    pub authored_on: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceRequestFields {
    pub service_name: Option<String>,
    pub request_date: Option<String>,
    pub subject: Reference,
    pub requester: Option<Reference>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaFields {
    pub content_type: String,
    pub data: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticReportFields {
    pub report_name: Option<String>,
    pub conclusion: Option<String>,
    pub subject: Reference,
    pub issued: Option<String>,
    pub performer: Vec<Reference>,
    pub interpreter: Vec<Reference>,
    pub based_on: Vec<Reference>,
    pub results: Vec<Reference>,
    pub media: Vec<Reference>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompositionFields {
    pub title: String,
    pub type_: CodeableConcept,
    pub date: String,
    pub status: Option<String>,
    pub subject: Reference,
    pub authors: Vec<Reference>,
    pub sections: Vec<Section>,
}

/// Field set for one resource, tagged by kind.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityFields {
    Patient(PatientFields),
    Practitioner(PractitionerFields),
    Organization(OrganizationFields),
    Observation(ObservationFields),
    Condition(FindingFields),
    AllergyIntolerance(FindingFields),
    Procedure(FindingFields),
    FamilyMemberHistory(FindingFields),
    MedicationRequest(MedicationRequestFields),
    ServiceRequest(ServiceRequestFields),
    Media(MediaFields),
    DiagnosticReport(DiagnosticReportFields),
    Composition(CompositionFields),
}

impl EntityFields {
    /// The kind of resource these fields construct.
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
            Self::Media(_) => ResourceKind::Media,
            Self::DiagnosticReport(_) => ResourceKind::DiagnosticReport,
            Self::Composition(_) => ResourceKind::Composition,
        }
    }
}

/// Builds typed resources from [`EntityFields`], applying the defaulting policy.
///
/// Holds only the identifier authorities from [`AssemblyConfig`]; cheap to create per document.
#[derive(Clone, Copy, Debug)]
pub struct EntityConstructor<'a> {
    config: &'a AssemblyConfig,
}

impl<'a> EntityConstructor<'a> {
    pub fn new(config: &'a AssemblyConfig) -> Self {
        Self { config }
    }

    /// Constructs the resource described by `fields`, carrying identity `id`.
    pub fn construct(&self, fields: EntityFields, id: ResourceId) -> Resource {
        tracing::trace!(kind = %fields.kind(), %id, "constructing resource");

        match fields {
            EntityFields::Patient(f) => self.patient(f, id).into(),
            EntityFields::Practitioner(f) => self.practitioner(f, id).into(),
            EntityFields::Organization(f) => self.organization(f, id).into(),
            EntityFields::Observation(f) => observation(f, id).into(),
            EntityFields::Condition(f) => Condition {
                id,
                text: Some(xhtml_div(&f.text)),
                code: CodeableConcept::text(f.text),
                subject: f.subject,
            }
            .into(),
            EntityFields::AllergyIntolerance(f) => AllergyIntolerance {
                id,
                text: Some(xhtml_div(&f.text)),
                code: CodeableConcept::text(f.text),
                patient: f.subject,
            }
            .into(),
            EntityFields::Procedure(f) => Procedure {
                id,
                text: Some(xhtml_div(&f.text)),
                status: "completed".to_string(),
                code: CodeableConcept::text(f.text),
                subject: f.subject,
            }
            .into(),
            EntityFields::FamilyMemberHistory(f) => FamilyMemberHistory {
                id,
                text: Some(xhtml_div(&f.text)),
                status: "completed".to_string(),
                patient: f.subject,
                relationship: CodeableConcept::text(DEFAULT_FAMILY_RELATIONSHIP),
                condition: vec![FamilyMemberHistoryCondition {
                    code: CodeableConcept::text(f.text.clone()),
                    note: vec![Annotation { text: f.text }],
                }],
            }
            .into(),
            EntityFields::MedicationRequest(f) => MedicationRequest {
                id,
                status: "active".to_string(),
                intent: "order".to_string(),
                medication_codeable_concept: CodeableConcept::text(or_no_name(f.medication_name)),
                subject: f.subject,
                authored_on: f.authored_on,
                requester: f.requester,
                dosage_instruction: non_blank(f.dosage_instruction)
                    .map(|text| vec![Dosage { text }])
                    .unwrap_or_default(),
            }
            .into(),
            EntityFields::ServiceRequest(f) => ServiceRequest {
                id,
                status: "active".to_string(),
                intent: "original-order".to_string(),
                code: CodeableConcept::text(or_no_name(f.service_name)),
                subject: f.subject,
                requester: f.requester,
                occurrence_date_time: f.request_date,
            }
            .into(),
            EntityFields::Media(f) => Media {
                id,
                status: "completed".to_string(),
                content: Attachment {
                    content_type: f.content_type,
                    data: f.data,
                },
            }
            .into(),
            EntityFields::DiagnosticReport(f) => DiagnosticReport {
                id,
                status: "final".to_string(),
                based_on: f.based_on,
                code: CodeableConcept::text(or_no_name(f.report_name)),
                subject: f.subject,
                issued: f.issued,
                performer: f.performer,
                results_interpreter: f.interpreter,
                result: f.results,
                media: f
                    .media
                    .into_iter()
                    .map(|link| DiagnosticReportMedia { link })
                    .collect(),
                conclusion: Some(
                    non_blank(f.conclusion).unwrap_or_else(|| NO_CONCLUSION.to_string()),
                ),
            }
            .into(),
            EntityFields::Composition(f) => Composition {
                id,
                status: non_blank(f.status)
                    .unwrap_or_else(|| DEFAULT_COMPOSITION_STATUS.to_string()),
                type_: f.type_,
                subject: f.subject,
                date: f.date,
                author: f.authors,
                title: f.title,
                section: f.sections,
            }
            .into(),
        }
    }

    fn patient(&self, f: PatientFields, id: ResourceId) -> Patient {
        let system = self.config.person_identifier_system();
        let identifier = [
            (IdentifierType::MedicalRecordNumber, f.subject_id),
            (IdentifierType::AccountNumber, f.abha_no),
        ]
        .into_iter()
        .filter_map(|(kind, value)| non_blank(value).map(|v| identifier(kind, system, v)))
        .collect();

        Patient {
            id,
            meta: Some(profile(ResourceKind::Patient)),
            identifier,
            name: vec![HumanName {
                text: or_no_name(f.name),
            }],
            gender: non_blank(f.gender).map(|g| g.to_lowercase()),
            telecom: mobile(f.telephone),
        }
    }

    fn practitioner(&self, f: PractitionerFields, id: ResourceId) -> Practitioner {
        let system = self.config.person_identifier_system();
        Practitioner {
            id,
            meta: Some(profile(ResourceKind::Practitioner)),
            identifier: non_blank(f.practitioner_id)
                .map(|v| vec![identifier(IdentifierType::ProviderNumber, system, v)])
                .unwrap_or_default(),
            name: vec![HumanName {
                text: or_no_name(f.name),
            }],
            telecom: mobile(f.telephone),
        }
    }

    fn organization(&self, f: OrganizationFields, id: ResourceId) -> Organization {
        let value = non_blank(f.organization_id).unwrap_or_else(|| DEFAULT_ORGANIZATION_ID.into());
        Organization {
            id,
            meta: Some(profile(ResourceKind::Organization)),
            identifier: vec![identifier(
                IdentifierType::ProviderNumber,
                self.config.facility_identifier_system(),
                value,
            )],
            name: Some(or_no_name(f.name)),
        }
    }
}

fn observation(f: ObservationFields, id: ResourceId) -> Observation {
    let value_quantity = (f.value.is_some() || f.unit.is_some()).then(|| Quantity {
        value: f.value,
        unit: f.unit.clone(),
    });

    let bound = |value: Option<f64>| {
        value.map(|v| Quantity {
            value: Some(v),
            unit: f.unit.clone(),
        })
    };
    let reference_range = if f.ref_low.is_some() || f.ref_high.is_some() {
        vec![ReferenceRange {
            low: bound(f.ref_low),
            high: bound(f.ref_high),
        }]
    } else {
        Vec::new()
    };

    Observation {
        id,
        text: non_blank(f.narrative).map(|t| xhtml_div(&t)),
        status: non_blank(f.status).unwrap_or_else(|| "final".to_string()),
        code: CodeableConcept::text(or_no_name(f.name)),
        subject: f.subject,
        issued: f.issued,
        performer: f.performer,
        value_quantity,
        reference_range,
    }
}

fn identifier(kind: IdentifierType, system: &str, value: String) -> Identifier {
    Identifier {
        type_: Some(CodeableConcept {
            text: None,
            coding: vec![Coding::new(IDENTIFIER_TYPE_SYSTEM, kind.code(), kind.display())],
        }),
        system: Some(system.to_string()),
        value: Some(value),
    }
}

fn profile(kind: ResourceKind) -> Meta {
    Meta {
        profile: vec![format!("{PROFILE_BASE}/{kind}")],
    }
}

fn mobile(telephone: Option<String>) -> Vec<ContactPoint> {
    non_blank(telephone)
        .map(|value| {
            vec![ContactPoint {
                system: Some("phone".to_string()),
                value: Some(value),
                use_type: Some("mobile".to_string()),
            }]
        })
        .unwrap_or_default()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn or_no_name(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| NO_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::reference_to;

    fn construct(fields: EntityFields) -> Resource {
        let config = AssemblyConfig::default();
        EntityConstructor::new(&config).construct(fields, ResourceId::new())
    }

    fn subject() -> Reference {
        Reference {
            reference: "urn:uuid:550e8400-e29b-41d4-a716-446655440000".into(),
            display: Some("John Doe".into()),
        }
    }

    #[test]
    fn carries_the_given_identity() {
        let config = AssemblyConfig::default();
        let id = ResourceId::new();
        let resource = EntityConstructor::new(&config)
            .construct(EntityFields::Patient(PatientFields::default()), id);
        assert_eq!(resource.id(), id);
        assert_eq!(resource.kind(), ResourceKind::Patient);
    }

    #[test]
    fn patient_without_name_gets_placeholder() {
        let resource = construct(EntityFields::Patient(PatientFields {
            subject_id: Some("X1".into()),
            ..Default::default()
        }));

        let Resource::Patient(patient) = &resource else {
            panic!("expected patient, got {resource:?}");
        };
        assert_eq!(patient.name[0].text, "No Name");
        assert_eq!(resource.label(), Some("No Name"));
        assert!(patient.telecom.is_empty());
        assert!(patient.gender.is_none());
    }

    #[test]
    fn patient_identifiers_use_configured_authority() {
        let resource = construct(EntityFields::Patient(PatientFields {
            name: Some("John Doe".into()),
            subject_id: Some("X1".into()),
            abha_no: Some("91-1234".into()),
            gender: Some("Male".into()),
            telephone: Some("9999999999".into()),
        }));

        let Resource::Patient(patient) = resource else {
            panic!("expected patient");
        };
        assert_eq!(patient.identifier.len(), 2);

        let mr = &patient.identifier[0];
        assert_eq!(mr.system.as_deref(), Some("https://healthid.ndhm.gov.in"));
        assert_eq!(mr.value.as_deref(), Some("X1"));
        let coding = &mr.type_.as_ref().expect("type").coding[0];
        assert_eq!(coding.code.as_deref(), Some("MR"));
        assert_eq!(coding.display.as_deref(), Some("Medical record number"));

        let an = &patient.identifier[1];
        assert_eq!(an.type_.as_ref().expect("type").coding[0].code.as_deref(), Some("AN"));

        assert_eq!(patient.gender.as_deref(), Some("male"));
        assert_eq!(patient.telecom[0].use_type.as_deref(), Some("mobile"));
        assert_eq!(
            patient.meta.expect("meta").profile,
            vec!["https://nrces.in/ndhm/fhir/r4/StructureDefinition/Patient".to_string()]
        );
    }

    #[test]
    fn blank_identifier_is_omitted() {
        let resource = construct(EntityFields::Practitioner(PractitionerFields {
            name: Some("Dr. Smith".into()),
            practitioner_id: Some("   ".into()),
            telephone: None,
        }));
        let Resource::Practitioner(practitioner) = resource else {
            panic!("expected practitioner");
        };
        assert!(practitioner.identifier.is_empty());
        assert_eq!(practitioner.name[0].text, "Dr. Smith");
    }

    #[test]
    fn organization_defaults_name_and_identifier() {
        let resource = construct(EntityFields::Organization(OrganizationFields::default()));
        let Resource::Organization(org) = resource else {
            panic!("expected organization");
        };
        assert_eq!(org.name.as_deref(), Some("No Name"));
        assert_eq!(org.identifier[0].value.as_deref(), Some("1234567890"));
        assert_eq!(
            org.identifier[0].system.as_deref(),
            Some("https://facility.ndhm.gov.in")
        );
        assert_eq!(
            org.identifier[0].type_.as_ref().expect("type").coding[0].code.as_deref(),
            Some("PRN")
        );
    }

    #[test]
    fn observation_omits_absent_measurements() {
        let resource = construct(EntityFields::Observation(ObservationFields {
            name: Some("Pulse regular".into()),
            narrative: Some("Pulse regular".into()),
            subject: Some(subject()),
            ..Default::default()
        }));
        let Resource::Observation(obs) = resource else {
            panic!("expected observation");
        };
        assert_eq!(obs.status, "final");
        assert!(obs.value_quantity.is_none());
        assert!(obs.reference_range.is_empty());
        assert!(obs.text.is_some());
    }

    #[test]
    fn observation_range_shares_unit() {
        let resource = construct(EntityFields::Observation(ObservationFields {
            name: Some("RBC".into()),
            value: Some(100.0),
            unit: Some("mg/dL".into()),
            ref_low: Some(50.0),
            ref_high: Some(150.0),
            subject: Some(subject()),
            ..Default::default()
        }));
        let Resource::Observation(obs) = resource else {
            panic!("expected observation");
        };
        let quantity = obs.value_quantity.expect("value");
        assert_eq!(quantity.value, Some(100.0));
        let range = &obs.reference_range[0];
        assert_eq!(range.low.as_ref().and_then(|q| q.unit.as_deref()), Some("mg/dL"));
        assert_eq!(range.high.as_ref().and_then(|q| q.value), Some(150.0));
    }

    #[test]
    fn finding_kinds_link_subject() {
        let kinds = [
            EntityFields::Condition(FindingFields {
                text: "Fever".into(),
                subject: subject(),
            }),
            EntityFields::AllergyIntolerance(FindingFields {
                text: "Penicillin".into(),
                subject: subject(),
            }),
            EntityFields::Procedure(FindingFields {
                text: "Appendectomy".into(),
                subject: subject(),
            }),
            EntityFields::FamilyMemberHistory(FindingFields {
                text: "Diabetes".into(),
                subject: subject(),
            }),
        ];

        for fields in kinds {
            let expected = fields.kind();
            let resource = construct(fields);
            assert_eq!(resource.kind(), expected);
            let refs = resource.references();
            assert_eq!(refs.len(), 1, "{expected} should reference only the subject");
            assert_eq!(refs[0], &subject());
        }
    }

    #[test]
    fn medication_request_defaults() {
        let resource = construct(EntityFields::MedicationRequest(MedicationRequestFields {
            medication_name: None,
            dosage_instruction: None,
            subject: subject(),
            requester: None,
            authored_on: None,
        }));
        let Resource::MedicationRequest(request) = resource else {
            panic!("expected medication request");
        };
        assert_eq!(request.medication_codeable_concept.text.as_deref(), Some("No Name"));
        assert_eq!(request.status, "active");
        assert_eq!(request.intent, "order");
        assert!(request.dosage_instruction.is_empty());
    }

    #[test]
    fn diagnostic_report_defaults_conclusion() {
        let media = construct(EntityFields::Media(MediaFields {
            content_type: "image/jpeg".into(),
            data: "AAAA".into(),
        }));
        let resource = construct(EntityFields::DiagnosticReport(DiagnosticReportFields {
            report_name: Some("Blood Test Report".into()),
            conclusion: None,
            subject: subject(),
            issued: Some("2021-10-10".into()),
            performer: vec![],
            interpreter: vec![],
            based_on: vec![],
            results: vec![],
            media: vec![reference_to(&media, Some("Imaging data"))],
        }));
        let Resource::DiagnosticReport(report) = resource else {
            panic!("expected report");
        };
        assert_eq!(report.conclusion.as_deref(), Some("No Conclusion"));
        assert_eq!(report.status, "final");
        assert_eq!(report.media[0].link.display.as_deref(), Some("Imaging data"));
    }

    #[test]
    fn composition_defaults_status() {
        let resource = construct(EntityFields::Composition(CompositionFields {
            title: "Prescription record".into(),
            type_: CodeableConcept::text("Prescription record"),
            date: "2021-10-10".into(),
            status: None,
            subject: subject(),
            authors: vec![],
            sections: vec![],
        }));
        let composition = resource.as_composition().expect("composition");
        assert_eq!(composition.status, "final");
        assert_eq!(resource.label(), Some("Prescription record"));
    }
}
