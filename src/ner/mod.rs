//! Named-entity recognition
//!
//! The person detector only consumes the [`EntityRecognizer`] trait. The
//! shipped model is a lexicon model ([`LexiconModel`]) loaded from a model
//! directory by [`ModelStore`], which installs the model on first use when it
//! is missing locally.
//!
//! The loaded model is read-only and is shared across requests as
//! `Arc<dyn EntityRecognizer>`.

pub mod lexicon;
pub mod store;

pub use lexicon::LexiconModel;
pub use store::{ModelManifest, ModelStore};

use crate::error::Result;

/// Semantic label attached to a recognized entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityLabel {
    /// A person's name
    Person,
    /// Any other label a model may produce
    Other(String),
}

/// An entity found by a recognizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntity {
    pub label: EntityLabel,
    /// Entity text exactly as it appears in the input
    pub text: String,
    /// Start byte offset in the input
    pub start: usize,
    /// End byte offset in the input (exclusive)
    pub end: usize,
}

/// Named-entity recognition capability.
pub trait EntityRecognizer: Send + Sync {
    /// Recognize entities in `text`, in text order.
    fn recognize(&self, text: &str) -> Result<Vec<NamedEntity>>;

    /// Model name (used in logs and the health endpoint).
    fn name(&self) -> &str;
}
