//! Reference resolver.
//!
//! Resources link to each other by identity, never by embedding. Every link and every bundle
//! locator uses the same scheme, `urn:uuid:<identity>`, so a reference resolves exactly when
//! its literal equals some entry's `fullUrl`.

use crate::constants::URN_UUID_PREFIX;
use clindoc_uuid::ResourceId;
use fhir::{Reference, Resource};

/// The bundle locator of the resource with identity `id`.
pub fn locator(id: ResourceId) -> String {
    format!("{URN_UUID_PREFIX}{id}")
}

/// Builds a reference to `resource`.
///
/// The display label is `label` when given, otherwise the resource's primary label (its name,
/// title, or main concept text). Resources without a label get a bare reference.
pub fn reference_to(resource: &Resource, label: Option<&str>) -> Reference {
    Reference {
        reference: locator(resource.id()),
        display: label.or_else(|| resource.label()).map(str::to_string),
    }
}

/// The identity a reference points at, if it uses the canonical locator scheme.
///
/// Literals with another scheme, an extra path segment (`urn:uuid:/…`), or a non-canonical id
/// yield `None`; the assembler treats those as dangling.
pub fn target_id(reference: &Reference) -> Option<ResourceId> {
    reference
        .reference
        .strip_prefix(URN_UUID_PREFIX)
        .and_then(|id| ResourceId::parse(id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::{HumanName, Media, Patient};

    fn patient(name: Option<&str>) -> Resource {
        Resource::Patient(Patient {
            id: ResourceId::parse("550e8400-e29b-41d4-a716-446655440000").expect("id"),
            meta: None,
            identifier: vec![],
            name: name
                .map(|n| vec![HumanName { text: n.into() }])
                .unwrap_or_default(),
            gender: None,
            telecom: vec![],
        })
    }

    #[test]
    fn locator_uses_urn_uuid_scheme() {
        let id = ResourceId::parse("550e8400-e29b-41d4-a716-446655440000").expect("id");
        assert_eq!(locator(id), "urn:uuid:550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn reference_defaults_display_to_primary_label() {
        let reference = reference_to(&patient(Some("John Doe")), None);
        assert_eq!(
            reference.reference,
            "urn:uuid:550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(reference.display.as_deref(), Some("John Doe"));
    }

    #[test]
    fn explicit_label_wins() {
        let reference = reference_to(&patient(Some("John Doe")), Some("Imaging data"));
        assert_eq!(reference.display.as_deref(), Some("Imaging data"));
    }

    #[test]
    fn unlabelled_resource_gets_bare_reference() {
        let media = Resource::Media(Media {
            id: ResourceId::new(),
            status: "completed".into(),
            content: fhir::Attachment {
                content_type: "image/png".into(),
                data: "AA==".into(),
            },
        });
        assert!(reference_to(&media, None).display.is_none());
        assert!(reference_to(&patient(None), None).display.is_none());
    }

    #[test]
    fn target_id_round_trips_and_rejects_other_schemes() {
        let resource = patient(Some("John Doe"));
        let reference = reference_to(&resource, None);
        assert_eq!(target_id(&reference), Some(resource.id()));

        let slashed = Reference {
            reference: "urn:uuid:/550e8400-e29b-41d4-a716-446655440000".into(),
            display: None,
        };
        assert_eq!(target_id(&slashed), None);

        let relative = Reference {
            reference: "Patient/550e8400-e29b-41d4-a716-446655440000".into(),
            display: None,
        };
        assert_eq!(target_id(&relative), None);
    }
}
