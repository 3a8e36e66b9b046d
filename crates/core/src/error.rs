use clindoc_uuid::{ResourceId, UuidError};
use fhir::FhirError;

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{document}: missing required field '{field}'")]
    MissingRequiredField {
        document: &'static str,
        field: &'static str,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown section '{0}'")]
    UnknownSection(String),

    #[error("invalid bundle head: {0}")]
    InvalidHead(String),
    #[error("duplicate identity in bundle: {0}")]
    DuplicateIdentity(ResourceId),
    #[error("entry locator '{full_url}' does not match resource identity {id}")]
    LocatorMismatch { full_url: String, id: ResourceId },
    #[error("broken reference graph: dangling reference(s) {}", .dangling.join(", "))]
    BrokenReferenceGraph { dangling: Vec<String> },

    #[error("FHIR error: {0}")]
    Fhir(#[from] FhirError),
    #[error("identity error: {0}")]
    Identity(#[from] UuidError),
}

pub type AssemblyResult<T> = std::result::Result<T, AssemblyError>;
