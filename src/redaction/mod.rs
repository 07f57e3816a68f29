//! Redaction engine, placeholder bookkeeping and HTTP surface
//!
//! ```text
//! text ─► person pass ─► email pass ─► phone pass ─► address pass ─► sanitized text
//!              │              │             │              │
//!              └──────────────┴─────┬───────┴──────────────┘
//!                                   ▼
//!                           ReplacementMap (replace mode)
//! ```

pub mod engine;
pub mod handler;
pub mod replacements;
pub mod span;

pub use engine::{PassReport, Redaction, RedactionEngine, RedactionMode};
pub use handler::{redact_router, RedactState};
pub use replacements::{Replacement, ReplacementMap};
pub use span::{EntityKind, Span};
