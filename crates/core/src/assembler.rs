//! Bundle assembler.
//!
//! Collects every resource produced for one document into an ordered, deduplicated bundle:
//!
//! 1. The composition and then the subject always occupy the first two entries.
//! 2. `additional` is walked in caller order; a resource whose identity is already placed is
//!    skipped, so a resource linked from several places is stored once, at its first position.
//! 3. Entries are never removed or moved once placed.
//!
//! Before a bundle is returned, every reference reachable from the composition is resolved
//! against the entries. What happens to an unresolved reference depends on
//! [`ReferenceCheck`].

use crate::config::{AssemblyConfig, ReferenceCheck};
use crate::input::DocumentFormat;
use crate::reference::{locator, target_id};
use crate::{AssemblyError, AssemblyResult};
use clindoc_uuid::{IdentityGenerator, ResourceId};
use fhir::{Bundle, BundleEntry, Composition, Resource};
use std::collections::{HashMap, HashSet, VecDeque};

/// An assembled document: a bundle whose head is (composition, subject).
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentBundle {
    bundle: Bundle,
}

impl DocumentBundle {
    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn into_bundle(self) -> Bundle {
        self.bundle
    }

    pub fn entries(&self) -> &[BundleEntry] {
        &self.bundle.entry
    }

    pub fn len(&self) -> usize {
        self.bundle.entry.len()
    }

    /// Pairs with [`len`](Self::len). Never true once assembled: the head holds two entries.
    pub fn is_empty(&self) -> bool {
        self.bundle.entry.is_empty()
    }

    /// The document root.
    pub fn composition(&self) -> Option<&Composition> {
        self.bundle
            .entry
            .first()
            .and_then(|e| e.resource.as_composition())
    }

    /// The resource whose identity is `id`, if it is in the bundle.
    pub fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.bundle
            .entry
            .iter()
            .map(|e| &e.resource)
            .find(|r| r.id() == id)
    }

    /// Render the document in `format`.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::Fhir` if serialisation fails.
    pub fn render(&self, format: DocumentFormat) -> AssemblyResult<String> {
        let text = match format {
            DocumentFormat::Json => self.bundle.render_json()?,
            DocumentFormat::Yaml => self.bundle.render_yaml()?,
        };
        Ok(text)
    }
}

/// Assembles bundles under one configuration.
///
/// The identity generator issues the bundle's own identity.
pub struct BundleAssembler<'a> {
    config: &'a AssemblyConfig,
    ids: &'a dyn IdentityGenerator,
}

impl<'a> BundleAssembler<'a> {
    pub fn new(config: &'a AssemblyConfig, ids: &'a dyn IdentityGenerator) -> Self {
        Self { config, ids }
    }

    /// Assemble one document.
    ///
    /// The bundle timestamp is the composition date.
    ///
    /// # Errors
    ///
    /// - `AssemblyError::InvalidHead` if `composition` is not a composition, or its subject
    ///   reference does not point at `subject`.
    /// - `AssemblyError::DuplicateIdentity` if `composition` and `subject` share an identity.
    /// - `AssemblyError::BrokenReferenceGraph` under [`ReferenceCheck::Strict`] if any
    ///   reference reachable from the composition does not resolve to an entry.
    pub fn assemble<I>(
        &self,
        composition: Resource,
        subject: Resource,
        additional: I,
    ) -> AssemblyResult<DocumentBundle>
    where
        I: IntoIterator<Item = Resource>,
    {
        let (title, date) = {
            let head = composition.as_composition().ok_or_else(|| {
                AssemblyError::InvalidHead(format!(
                    "expected a Composition as the first entry, got {}",
                    composition.kind()
                ))
            })?;

            if target_id(&head.subject) != Some(subject.id()) {
                return Err(AssemblyError::InvalidHead(format!(
                    "composition subject '{}' does not point at the subject entry {}",
                    head.subject.reference,
                    subject.id()
                )));
            }

            (head.title.clone(), head.date.clone())
        };

        if composition.id() == subject.id() {
            return Err(AssemblyError::DuplicateIdentity(subject.id()));
        }

        let mut seen: HashSet<ResourceId> = HashSet::from([composition.id(), subject.id()]);
        let mut entries = vec![entry(composition), entry(subject)];
        let mut skipped = 0usize;

        for resource in additional {
            if seen.insert(resource.id()) {
                entries.push(entry(resource));
            } else {
                skipped += 1;
            }
        }

        let dangling = dangling_references(&entries);
        if !dangling.is_empty() {
            match self.config.reference_check() {
                ReferenceCheck::Strict => {
                    return Err(AssemblyError::BrokenReferenceGraph { dangling });
                }
                ReferenceCheck::Lenient => {
                    for reference in &dangling {
                        tracing::warn!(document = %title, %reference, "dangling reference");
                    }
                }
            }
        }

        let bundle = Bundle::new(
            self.ids.next_id(),
            self.config.bundle_type(),
            Some(date),
            entries,
        );

        tracing::debug!(
            document = %title,
            entries = bundle.entry.len(),
            duplicates_skipped = skipped,
            "assembled bundle"
        );

        Ok(DocumentBundle { bundle })
    }
}

fn entry(resource: Resource) -> BundleEntry {
    BundleEntry {
        full_url: locator(resource.id()),
        resource,
    }
}

/// Reference literals reachable from the first entry that do not resolve to any entry.
///
/// Walks breadth first from the head through resolved targets. Each literal is reported once,
/// in the order it was first met.
fn dangling_references(entries: &[BundleEntry]) -> Vec<String> {
    let index: HashMap<ResourceId, &Resource> = entries
        .iter()
        .map(|e| (e.resource.id(), &e.resource))
        .collect();

    let mut dangling = Vec::new();
    let mut reported = HashSet::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    if let Some(head) = entries.first() {
        visited.insert(head.resource.id());
        queue.push_back(&head.resource);
    }

    while let Some(resource) = queue.pop_front() {
        for reference in resource.references() {
            match target_id(reference).and_then(|id| index.get(&id).copied()) {
                Some(target) => {
                    if visited.insert(target.id()) {
                        queue.push_back(target);
                    }
                }
                None => {
                    if reported.insert(reference.reference.as_str()) {
                        dangling.push(reference.reference.clone());
                    }
                }
            }
        }
    }

    dangling
}

/// Check an existing bundle (for example one read back from disk) against the document
/// invariants.
///
/// The checks are: the head is (composition, subject); every locator is derived from its
/// resource's identity; no identity appears twice; every reference reachable from the
/// composition resolves. The closure check is always strict here.
///
/// # Errors
///
/// Returns the first violated invariant as `InvalidHead`, `LocatorMismatch`,
/// `DuplicateIdentity` or `BrokenReferenceGraph`.
pub fn verify_bundle(bundle: &Bundle) -> AssemblyResult<()> {
    let composition = bundle
        .entry
        .first()
        .ok_or_else(|| AssemblyError::InvalidHead("bundle has no entries".into()))?
        .resource
        .as_composition()
        .ok_or_else(|| {
            AssemblyError::InvalidHead("first entry is not a Composition".into())
        })?;

    let subject = bundle.entry.get(1).ok_or_else(|| {
        AssemblyError::InvalidHead("bundle has no subject entry".into())
    })?;
    if target_id(&composition.subject) != Some(subject.resource.id()) {
        return Err(AssemblyError::InvalidHead(format!(
            "second entry {} is not the composition subject '{}'",
            subject.resource.id(),
            composition.subject.reference
        )));
    }

    let mut seen = HashSet::new();
    for e in &bundle.entry {
        let id = e.resource.id();
        if e.full_url != locator(id) {
            return Err(AssemblyError::LocatorMismatch {
                full_url: e.full_url.clone(),
                id,
            });
        }
        if !seen.insert(id) {
            return Err(AssemblyError::DuplicateIdentity(id));
        }
    }

    let dangling = dangling_references(&bundle.entry);
    if !dangling.is_empty() {
        return Err(AssemblyError::BrokenReferenceGraph { dangling });
    }

    Ok(())
}
