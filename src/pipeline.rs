//! Extract → redact facade
//!
//! A [`Pipeline`] is built once at startup from [`RedactrConfig`] and the
//! process-wide entity recognizer, then shared read-only across requests.

use crate::config::RedactrConfig;
use crate::detectors::{AddressDetector, Detector, EmailDetector, PersonDetector, PhoneDetector};
use crate::error::Result;
use crate::extract::TextExtractor;
use crate::ner::EntityRecognizer;
use crate::redaction::{EntityKind, Redaction, RedactionEngine, RedactionMode};
use std::sync::Arc;

/// PDF text extraction followed by multi-pass redaction
pub struct Pipeline {
    extractor: TextExtractor,
    engine: RedactionEngine,
    model_name: String,
}

impl Pipeline {
    pub fn new(extractor: TextExtractor, engine: RedactionEngine, model_name: impl Into<String>) -> Self {
        Self {
            extractor,
            engine,
            model_name: model_name.into(),
        }
    }

    /// Build the detectors enabled in `config` around `recognizer`
    pub fn from_config(config: &RedactrConfig, recognizer: Arc<dyn EntityRecognizer>) -> Result<Self> {
        config.validate()?;
        let redaction = &config.redaction;
        let model_name = recognizer.name().to_string();

        let mut detectors: Vec<Box<dyn Detector>> = Vec::new();
        for kind in EntityKind::ALL {
            if !redaction.is_enabled(kind) {
                continue;
            }
            let detector: Box<dyn Detector> = match kind {
                EntityKind::Person => Box::new(PersonDetector::new(recognizer.clone())),
                EntityKind::Email => Box::new(EmailDetector::new()?),
                EntityKind::Phone => Box::new(PhoneDetector::with_leniency(
                    redaction.phone_leniency,
                    redaction.phone_regions.clone(),
                )?),
                EntityKind::Address => Box::new(AddressDetector::with_countries(
                    redaction.address_countries.clone(),
                    redaction.title_case_variant,
                )?),
            };
            detectors.push(detector);
        }

        let engine = RedactionEngine::new(detectors, redaction.mode)?;
        tracing::info!(
            mode = %redaction.mode,
            kinds = ?engine.kinds(),
            model = %model_name,
            "Redaction pipeline ready"
        );

        Ok(Self::new(
            TextExtractor::from_config(&config.extractor),
            engine,
            model_name,
        ))
    }

    /// Name of the entity recognizer in use
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn max_bytes(&self) -> usize {
        self.extractor.max_bytes()
    }

    pub fn default_mode(&self) -> RedactionMode {
        self.engine.mode()
    }

    /// Extract the text of `pdf` and redact it.
    ///
    /// A PDF without extractable text yields an empty [`Redaction`] with no
    /// passes, not an error.
    pub fn redact_pdf(&self, pdf: &[u8], mode: Option<RedactionMode>) -> Result<Redaction> {
        let document = self.extractor.extract(pdf)?;
        tracing::debug!(
            pages = document.page_count(),
            skipped = document.skipped_pages(),
            "Text extracted"
        );
        if document.is_empty() {
            tracing::info!("No extractable text, nothing to redact");
            return Ok(Redaction::default());
        }
        self.redact_text(document.text(), mode)
    }

    /// Redact already extracted text
    pub fn redact_text(&self, text: &str, mode: Option<RedactionMode>) -> Result<Redaction> {
        let mode = mode.unwrap_or_else(|| self.engine.mode());
        let redaction = self.engine.redact_with(text, mode)?;
        tracing::info!(
            mode = %mode,
            replacements = redaction.replacement_count(),
            passes = redaction.passes.len(),
            "Redaction complete"
        );
        Ok(redaction)
    }
}
