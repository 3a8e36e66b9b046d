//! Constants used throughout the clindoc core crate.
//!
//! Terminology systems, identifier authorities, profile locations and the placeholders
//! substituted for absent optional fields.

/// Scheme prefix of every bundle locator and reference literal.
pub const URN_UUID_PREFIX: &str = "urn:uuid:";

/// SNOMED CT.
pub const SNOMED_SYSTEM: &str = "http://snomed.info/sct";

/// HL7 v2 table 0203 (identifier type codes).
pub const IDENTIFIER_TYPE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0203";

/// Default authority for patient and practitioner identifiers.
pub const DEFAULT_PERSON_IDENTIFIER_SYSTEM: &str = "https://healthid.ndhm.gov.in";

/// Default authority for organisation identifiers.
pub const DEFAULT_FACILITY_IDENTIFIER_SYSTEM: &str = "https://facility.ndhm.gov.in";

/// Base URL of the structure definitions claimed in `meta.profile`.
pub const PROFILE_BASE: &str = "https://nrces.in/ndhm/fhir/r4/StructureDefinition";

/// Placeholder for an absent display name.
pub const NO_NAME: &str = "No Name";

/// Placeholder for an absent report conclusion.
pub const NO_CONCLUSION: &str = "No Conclusion";

/// Placeholder organisation identifier value.
pub const DEFAULT_ORGANIZATION_ID: &str = "1234567890";

/// Relationship recorded on family history built from free text.
pub const DEFAULT_FAMILY_RELATIONSHIP: &str = "Family member";

/// Composition status when the input does not give one.
pub const DEFAULT_COMPOSITION_STATUS: &str = "final";
