//! # clindoc Core
//!
//! Assembly engine for clinical documents.
//!
//! A document is a graph of typed resources (subject, authors, findings, orders, reports)
//! linked by identity and wrapped in one bundle whose head is the composition and then the
//! subject. This crate owns everything that is common to every document type:
//! - entity construction with per-kind defaults ([`entity`])
//! - reference construction ([`reference`])
//! - section composition over immutable section tables ([`section`])
//! - deduplicating, order-preserving bundle assembly with a reference closure check
//!   ([`assembler`])
//! - the four document templates ([`templates`])
//!
//! **No I/O**: reading input files, environment variables and writing output belong in the
//! CLI. Configuration is resolved once by the caller and passed in as [`AssemblyConfig`].

pub mod assembler;
pub mod config;
pub mod constants;
pub mod entity;
pub mod input;
pub mod reference;
pub mod section;
pub mod templates;

mod error;
mod validation;

pub use assembler::{verify_bundle, BundleAssembler, DocumentBundle};
pub use config::{AssemblyConfig, ReferenceCheck};
pub use error::{AssemblyError, AssemblyResult};
pub use input::DocumentFormat;
pub use templates::{
    DiagnosticReportInput, DiagnosticReportTemplate, DischargeSummaryInput,
    DischargeSummaryTemplate, DocumentKind, DocumentTemplate, OpConsultInput, OpConsultTemplate,
    PrescriptionInput, PrescriptionTemplate, TemplateContext,
};

pub use clindoc_uuid::{IdentityGenerator, RandomIdentity, ResourceId, SequentialIdentity};

use std::sync::Arc;

/// Builds documents of every supported kind under one configuration.
///
/// Cheap to clone; clones share the identity generator. Independent callers may build
/// documents concurrently from the same service.
#[derive(Clone)]
pub struct DocumentService {
    config: Arc<AssemblyConfig>,
    ids: Arc<dyn IdentityGenerator>,
}

impl DocumentService {
    /// Creates a service that issues random identities.
    pub fn new(config: AssemblyConfig) -> Self {
        Self::with_identity_generator(config, Arc::new(RandomIdentity))
    }

    pub fn with_identity_generator(
        config: AssemblyConfig,
        ids: Arc<dyn IdentityGenerator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            ids,
        }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    fn context(&self) -> TemplateContext<'_> {
        TemplateContext::new(&self.config, self.ids.as_ref())
    }

    /// Parse `text` as the input record of `kind` and build the document.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::InvalidInput` if the record does not parse, or any error of the
    /// selected template.
    pub fn build(
        &self,
        kind: DocumentKind,
        text: &str,
        format: DocumentFormat,
    ) -> AssemblyResult<DocumentBundle> {
        let ctx = self.context();
        let bundle = match kind {
            DocumentKind::DiagnosticReport => {
                DiagnosticReportTemplate.build_from_str(&ctx, text, format)
            }
            DocumentKind::DischargeSummary => {
                DischargeSummaryTemplate.build_from_str(&ctx, text, format)
            }
            DocumentKind::OpConsult => OpConsultTemplate.build_from_str(&ctx, text, format),
            DocumentKind::Prescription => PrescriptionTemplate.build_from_str(&ctx, text, format),
        }?;

        tracing::debug!(kind = %kind, entries = bundle.len(), "built document");
        Ok(bundle)
    }

    pub fn diagnostic_report(&self, input: DiagnosticReportInput) -> AssemblyResult<DocumentBundle> {
        DiagnosticReportTemplate.build(&self.context(), input)
    }

    pub fn discharge_summary(
        &self,
        input: DischargeSummaryInput,
    ) -> AssemblyResult<DocumentBundle> {
        DischargeSummaryTemplate.build(&self.context(), input)
    }

    pub fn op_consult(&self, input: OpConsultInput) -> AssemblyResult<DocumentBundle> {
        OpConsultTemplate.build(&self.context(), input)
    }

    pub fn prescription(&self, input: PrescriptionInput) -> AssemblyResult<DocumentBundle> {
        PrescriptionTemplate.build(&self.context(), input)
    }
}
