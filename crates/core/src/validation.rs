//! Input validation utilities.
//!
//! Checks applied to configuration values before they are embedded into rendered resources.

use crate::{AssemblyError, AssemblyResult};

/// Validates that an identifier authority is a plausible absolute URI.
///
/// The value is copied verbatim into `Identifier.system` on every person and organisation, so
/// it is rejected early rather than producing a bundle full of malformed identifiers:
/// - Rejects empty or whitespace-only strings
/// - Bounds the length
/// - Requires an `http://`, `https://` or `urn:` scheme
/// - Requires ASCII with no whitespace or control characters
///
/// # Errors
///
/// Returns `AssemblyError::InvalidConfig` if the system is invalid.
pub fn validate_identifier_system(system: &str) -> AssemblyResult<()> {
    const MAX_SYSTEM_LEN: usize = 2048;

    if system.trim().is_empty() {
        return Err(AssemblyError::InvalidConfig(
            "identifier system cannot be empty".into(),
        ));
    }

    if system.len() > MAX_SYSTEM_LEN {
        return Err(AssemblyError::InvalidConfig(format!(
            "identifier system exceeds maximum length of {} characters",
            MAX_SYSTEM_LEN
        )));
    }

    if !system.is_ascii() {
        return Err(AssemblyError::InvalidConfig(
            "identifier system must contain only ASCII characters".into(),
        ));
    }

    if system.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(AssemblyError::InvalidConfig(
            "identifier system must not contain whitespace or control characters".into(),
        ));
    }

    let has_scheme = ["http://", "https://", "urn:"]
        .iter()
        .any(|scheme| system.starts_with(scheme) && system.len() > scheme.len());

    if !has_scheme {
        return Err(AssemblyError::InvalidConfig(format!(
            "identifier system '{system}' must be an absolute http(s) or urn URI"
        )));
    }

    Ok(())
}
