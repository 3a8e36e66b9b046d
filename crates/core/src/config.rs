//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the document templates. The core never reads environment variables itself; the
//! `*_from_env_value` helpers let a wrapper turn raw environment strings into typed settings.

use crate::constants::{DEFAULT_FACILITY_IDENTIFIER_SYSTEM, DEFAULT_PERSON_IDENTIFIER_SYSTEM};
use crate::validation::validate_identifier_system;
use crate::{AssemblyError, AssemblyResult};
use fhir::BundleType;
use std::str::FromStr;

/// What the bundle assembler does when a reference reachable from the composition points at a
/// resource that is not in the bundle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReferenceCheck {
    /// Fail the whole assembly with `AssemblyError::BrokenReferenceGraph`.
    #[default]
    Strict,
    /// Log each dangling reference at `warn` and emit the document anyway.
    Lenient,
}

impl ReferenceCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl FromStr for ReferenceCheck {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(AssemblyError::InvalidConfig(format!(
                "reference check must be 'strict' or 'lenient', got '{other}'"
            ))),
        }
    }
}

/// Assembly configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct AssemblyConfig {
    reference_check: ReferenceCheck,
    bundle_type: BundleType,
    person_identifier_system: String,
    facility_identifier_system: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            reference_check: ReferenceCheck::Strict,
            bundle_type: BundleType::Collection,
            person_identifier_system: DEFAULT_PERSON_IDENTIFIER_SYSTEM.to_string(),
            facility_identifier_system: DEFAULT_FACILITY_IDENTIFIER_SYSTEM.to_string(),
        }
    }
}

impl AssemblyConfig {
    /// Create a new `AssemblyConfig`.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::InvalidConfig` if either identifier system is not an absolute URI.
    pub fn new(
        reference_check: ReferenceCheck,
        bundle_type: BundleType,
        person_identifier_system: String,
        facility_identifier_system: String,
    ) -> AssemblyResult<Self> {
        validate_identifier_system(&person_identifier_system)?;
        validate_identifier_system(&facility_identifier_system)?;

        Ok(Self {
            reference_check,
            bundle_type,
            person_identifier_system,
            facility_identifier_system,
        })
    }

    /// Returns a copy with a different reference check policy.
    pub fn with_reference_check(mut self, reference_check: ReferenceCheck) -> Self {
        self.reference_check = reference_check;
        self
    }

    pub fn reference_check(&self) -> ReferenceCheck {
        self.reference_check
    }

    pub fn bundle_type(&self) -> BundleType {
        self.bundle_type
    }

    pub fn person_identifier_system(&self) -> &str {
        &self.person_identifier_system
    }

    pub fn facility_identifier_system(&self) -> &str {
        &self.facility_identifier_system
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the reference check policy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`ReferenceCheck::Strict`].
pub fn reference_check_from_env_value(value: Option<String>) -> AssemblyResult<ReferenceCheck> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<ReferenceCheck>())
        .transpose()?;
    Ok(parsed.unwrap_or_default())
}

/// Parse the bundle type from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`BundleType::Collection`].
pub fn bundle_type_from_env_value(value: Option<String>) -> AssemblyResult<BundleType> {
    let parsed = non_blank(value)
        .map(|v| BundleType::parse(&v))
        .transpose()?;
    Ok(parsed.unwrap_or(BundleType::Collection))
}

/// Resolve an identifier system from an optional string value, falling back to `default`.
pub fn identifier_system_from_env_value(value: Option<String>, default: &str) -> String {
    non_blank(value).unwrap_or_else(|| default.to_string())
}
