//! Redactr - resume PDF text extraction with PII redaction
//!
//! Redactr extracts the text of an uploaded resume PDF and strips personal
//! information (person names, email addresses, phone numbers and postal
//! addresses) before the text is handed to an external language model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────────────────────────────────┐
//! │  PDF bytes   │──►│ TextExtractor (pdf-extract + normalization)   │
//! └──────────────┘   └───────────────────────┬───────────────────────┘
//!                                            │ Document
//!                    ┌───────────────────────▼───────────────────────┐
//!                    │ RedactionEngine                               │
//!                    │  Person ─► Email ─► Phone ─► Address          │
//!                    │  (one snapshot and one rewrite per pass)      │
//!                    └───────────────────────┬───────────────────────┘
//!                                            │ Redaction
//!                                            ▼
//!                      sanitized text + placeholder map + counts
//! ```
//!
//! ## Modules
//!
//! - [`extract`]: PDF text extraction and whitespace normalization
//! - [`detectors`]: Person, email, phone and address detectors
//! - [`ner`]: Named-entity model, loader and installer
//! - [`redaction`]: Multi-pass engine, placeholders and the redact endpoint
//! - [`pipeline`]: Extract → redact facade
//! - [`api`]: HTTP application
//! - [`config`]: Configuration management

pub mod api;
pub mod config;
pub mod detectors;
pub mod error;
pub mod extract;
pub mod ner;
pub mod pipeline;
pub mod redaction;

pub use config::RedactrConfig;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use redaction::{EntityKind, Redaction, RedactionMode};
