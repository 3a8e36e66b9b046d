//! Resource identity utilities.
//!
//! Every resource placed in a clinical document carries an identity that is unique across the
//! lifetime of the process. The same identity is used to derive the resource's bundle locator
//! (`urn:uuid:<id>`), so its text form must be stable and unambiguous.
//!
//! clindoc uses a *canonical* representation for identities: the **lowercase, hyphenated**
//! RFC 4122 form.
//!
//! This crate provides:
//! - A wrapper type ([`ResourceId`]) that *guarantees* the canonical format once constructed.
//! - The [`IdentityGenerator`] seam used by document templates to draw fresh identities, with a
//!   random implementation ([`RandomIdentity`]) for production use and a counter-based one
//!   ([`SequentialIdentity`]) for reproducible output.
//!
//! ## Canonical form
//! - Length: 36
//! - Hyphens at positions 8, 13, 18 and 23
//! - All other characters: `0-9` and `a-f` only
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! Non-canonical values (uppercase, braced, unhyphenated, wrong length, non-hex) are rejected by
//! [`ResourceId::parse`].

mod identity;

// Re-export public types
pub use identity::{IdentityGenerator, RandomIdentity, ResourceId, SequentialIdentity, Uuid};

/// Error type for identity operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identity operations.
pub type UuidResult<T> = Result<T, UuidError>;
