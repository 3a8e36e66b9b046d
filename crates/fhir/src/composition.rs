//! The document root.

use crate::datatypes::{CodeableConcept, Narrative, Reference};
use crate::ResourceId;
use serde::{Deserialize, Serialize};

/// Root resource of a clinical document: who it is about, who wrote it, and the titled
/// sections that organise its content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub id: ResourceId,

    /// preliminary | final | amended | entered-in-error
    pub status: String,

    #[serde(rename = "type")]
    pub type_: CodeableConcept,

    pub subject: Reference,

    pub date: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<Reference>,

    pub title: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub section: Vec<CompositionSection>,
}

/// A titled, coded grouping of references within a composition.
///
/// `entry` is always rendered, even when empty, so that a section with no linked resources is
/// still visibly present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSection {
    pub title: String,

    pub code: CodeableConcept,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    #[serde(default)]
    pub entry: Vec<Reference>,
}
