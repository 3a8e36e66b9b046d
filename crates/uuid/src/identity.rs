//! Internal implementation of resource identities.
//!
//! This module contains the canonical identity wrapper and the generators that issue fresh
//! identities to the entity constructor.

use crate::{UuidError, UuidResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// clindoc's canonical resource identity (lowercase, hyphenated UUID).
///
/// This wrapper type guarantees that once constructed, the contained UUID renders in the
/// canonical form. Locators and reference literals are derived from this text, so two
/// identities compare equal exactly when their locators do.
///
/// # Construction
/// - [`ResourceId::new`] generates a new random identity.
/// - [`ResourceId::parse`] validates an externally supplied identifier (for example, when a
///   rendered bundle is read back).
/// - [`IdentityGenerator::next_id`] is what document templates use.
///
/// # Errors
/// [`ResourceId::parse`] returns [`UuidError::InvalidInput`] if the input is not already
/// canonical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(Uuid);

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceId {
    /// Generates a new random (version 4) identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    ///
    /// Any UUID value is acceptable; only its *text* form is constrained, and that is produced
    /// by this type.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Validates and parses an identity string that must already be in canonical form.
    ///
    /// This does **not** normalise other common UUID forms (uppercase, braced, simple).
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "identity must be a lowercase hyphenated UUID, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("invalid identity '{input}': {e}")))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical identity form.
    ///
    /// This is a purely syntactic check: 36 bytes, hyphens at 8/13/18/23, lowercase hex
    /// everywhere else.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 36
            && input.bytes().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => b == b'-',
                _ => matches!(b, b'0'..=b'9' | b'a'..=b'f'),
            })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ResourceId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Source of fresh resource identities.
///
/// Implementations must be safe to share between threads: independent callers may assemble
/// documents concurrently from the same generator without producing colliding identities.
pub trait IdentityGenerator: Send + Sync {
    /// Issues an identity that has not been issued before by this generator.
    fn next_id(&self) -> ResourceId;
}

/// Random (version 4) identities. The production default.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdentity;

impl IdentityGenerator for RandomIdentity {
    fn next_id(&self) -> ResourceId {
        ResourceId::new()
    }
}

/// Counter-based identities under a fixed 64-bit namespace.
///
/// The high 64 bits of every issued UUID are the namespace and the low 64 bits are a counter
/// starting at 1. Two generators created with the same namespace issue the same sequence, which
/// makes rendered documents reproducible.
#[derive(Debug)]
pub struct SequentialIdentity {
    namespace: u64,
    counter: AtomicU64,
}

impl SequentialIdentity {
    /// Namespace used by [`SequentialIdentity::default`].
    pub const DEFAULT_NAMESPACE: u64 = 0x636c_696e_646f_6300;

    pub fn new(namespace: u64) -> Self {
        Self {
            namespace,
            counter: AtomicU64::new(0),
        }
    }

    /// Number of identities issued so far.
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for SequentialIdentity {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAMESPACE)
    }
}

impl IdentityGenerator for SequentialIdentity {
    fn next_id(&self) -> ResourceId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let value = (u128::from(self.namespace) << 64) | u128::from(n);
        ResourceId(Uuid::from_u128(value))
    }
}
