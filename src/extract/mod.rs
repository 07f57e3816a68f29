//! PDF text extraction and whitespace normalization
//!
//! Extraction never fails on bad input: a corrupt PDF or one without a text
//! layer is logged and yields an empty [`Document`], which callers treat as
//! "nothing to redact". Only oversized input is rejected with an error.

use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use std::panic::{self, AssertUnwindSafe};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Per-page PDF text capability
pub trait PdfBackend: Send + Sync {
    /// Text of every page in order; `None` for pages without a text layer.
    fn pages(&self, pdf: &[u8]) -> Result<Vec<Option<String>>>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// `PdfBackend` on the `pdf-extract` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractBackend;

impl PdfBackend for PdfExtractBackend {
    fn pages(&self, pdf: &[u8]) -> Result<Vec<Option<String>>> {
        // pdf-extract panics on some malformed documents
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(pdf)
        }))
        .map_err(|_| Error::Extraction("PDF parser panicked".to_string()))?;

        let pages = outcome.map_err(|e| Error::Extraction(format!("Unreadable PDF: {}", e)))?;
        Ok(pages
            .into_iter()
            .map(|page| if page.trim().is_empty() { None } else { Some(page) })
            .collect())
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}

/// Normalized text of one uploaded PDF.
///
/// The buffer is wiped when the document is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Document {
    text: String,
    page_count: usize,
    skipped_pages: usize,
}

impl Document {
    fn empty() -> Self {
        Self {
            text: String::new(),
            page_count: 0,
            skipped_pages: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Pages reported by the PDF backend
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Pages with no text after normalization
    pub fn skipped_pages(&self) -> usize {
        self.skipped_pages
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("chars", &self.text.chars().count())
            .field("page_count", &self.page_count)
            .field("skipped_pages", &self.skipped_pages)
            .finish()
    }
}

/// Turns PDF bytes into one normalized string
pub struct TextExtractor {
    backend: Box<dyn PdfBackend>,
    max_bytes: usize,
}

impl TextExtractor {
    pub fn new(backend: Box<dyn PdfBackend>, max_bytes: usize) -> Self {
        Self { backend, max_bytes }
    }

    /// Extractor using `pdf-extract`
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(Box::new(PdfExtractBackend), config.max_bytes)
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Extract and normalize the text of `pdf`.
    ///
    /// Pages are normalized one by one, empty pages are skipped and the rest
    /// are joined with a single space.
    pub fn extract(&self, pdf: &[u8]) -> Result<Document> {
        if pdf.len() > self.max_bytes {
            return Err(Error::Extraction(format!(
                "PDF is {} bytes, limit is {}",
                pdf.len(),
                self.max_bytes
            )));
        }

        let mut raw_pages = match self.backend.pages(pdf) {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "PDF text extraction failed, treating as empty"
                );
                return Ok(Document::empty());
            }
        };

        let page_count = raw_pages.len();
        let mut pages: Vec<String> = raw_pages
            .iter()
            .flatten()
            .map(|raw| normalize_page(raw))
            .filter(|page| !page.is_empty())
            .collect();
        raw_pages.zeroize();

        let skipped_pages = page_count - pages.len();
        let text = pages.join(" ");
        pages.zeroize();

        tracing::info!(
            backend = self.backend.name(),
            pages = page_count,
            skipped = skipped_pages,
            chars = text.chars().count(),
            "PDF text extracted"
        );

        Ok(Document {
            text,
            page_count,
            skipped_pages,
        })
    }
}

/// Normalize the whitespace of one page of extracted text.
///
/// - `\r\n` and `\r` become `\n`; trailing spaces and tabs on a line go
/// - runs of newlines collapse to one
/// - a newline becomes a space when the previous line does not end in
///   `. ! ? :` and the next line starts with a lowercase letter
/// - runs of spaces collapse to one and the page is trimmed
pub fn normalize_page(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines = unified
        .split('\n')
        .map(|line| line.trim_end_matches([' ', '\t']))
        .filter(|line| !line.is_empty());

    let mut joined = String::with_capacity(unified.len());
    for line in lines {
        if let Some(prev) = joined.chars().next_back() {
            let soft_break = !matches!(prev, '.' | '!' | '?' | ':')
                && line.chars().next().is_some_and(char::is_lowercase);
            joined.push(if soft_break { ' ' } else { '\n' });
        }
        joined.push_str(line);
    }

    let mut out = String::with_capacity(joined.len());
    for c in joined.chars() {
        if c == ' ' && out.ends_with(' ') {
            continue;
        }
        out.push(c);
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeBackend(Vec<Option<&'static str>>);

    impl PdfBackend for FakeBackend {
        fn pages(&self, _pdf: &[u8]) -> Result<Vec<Option<String>>> {
            Ok(self.0.iter().map(|p| p.map(str::to_string)).collect())
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    struct FailingBackend;

    impl PdfBackend for FailingBackend {
        fn pages(&self, _pdf: &[u8]) -> Result<Vec<Option<String>>> {
            Err(Error::Extraction("xref table missing".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn extractor(pages: Vec<Option<&'static str>>) -> TextExtractor {
        TextExtractor::new(Box::new(FakeBackend(pages)), 1024)
    }

    #[test]
    fn test_soft_line_breaks_joined() {
        assert_eq!(
            normalize_page("Led a team of five\nengineers.\nShipped v2"),
            "Led a team of five engineers.\nShipped v2"
        );
    }

    #[test]
    fn test_terminal_punctuation_keeps_break() {
        assert_eq!(normalize_page("Skills:\nrust, go"), "Skills:\nrust, go");
        assert_eq!(normalize_page("Done!\nnext"), "Done!\nnext");
    }

    #[test]
    fn test_newline_runs_collapse() {
        assert_eq!(normalize_page("EXPERIENCE\n\n\n\nAcme"), "EXPERIENCE\nAcme");
        assert_eq!(normalize_page("A\n  \n\nB"), "A\nB");
    }

    #[test]
    fn test_space_runs_collapse() {
        assert_eq!(normalize_page("  Jane    Doe   "), "Jane Doe");
    }

    #[test]
    fn test_carriage_returns() {
        assert_eq!(normalize_page("Title\r\n\r\nBody\rmore"), "Title\nBody more");
    }

    #[test]
    fn test_no_double_newline_survives() {
        let out = normalize_page("a\n\n\nb\n \n\tc\n\n");
        assert!(!out.contains("\n\n"));
    }

    #[test]
    fn test_pages_joined_and_empty_skipped() {
        let doc = extractor(vec![Some("  First page\n"), None, Some("   "), Some("Second")])
            .extract(b"%PDF")
            .unwrap();
        assert_eq!(doc.text(), "First page Second");
        assert_eq!(doc.page_count(), 4);
        assert_eq!(doc.skipped_pages(), 2);
    }

    #[test]
    fn test_backend_failure_yields_empty_document() {
        let doc = TextExtractor::new(Box::new(FailingBackend), 1024)
            .extract(b"garbage")
            .unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn test_image_only_pdf_is_empty() {
        let doc = extractor(vec![None, None]).extract(b"%PDF").unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.skipped_pages(), 2);
    }

    #[test]
    fn test_oversized_input_rejected() {
        let big = vec![0u8; 2048];
        assert!(matches!(
            extractor(vec![Some("x")]).extract(&big),
            Err(Error::Extraction(_))
        ));
    }

    #[test]
    fn test_real_backend_rejects_garbage() {
        let result = PdfExtractBackend.pages(b"definitely not a pdf");
        assert!(matches!(result, Err(Error::Extraction(_))));
    }

    #[test]
    fn test_debug_hides_text() {
        let doc = extractor(vec![Some("Jane Doe")]).extract(b"%PDF").unwrap();
        assert!(!format!("{:?}", doc).contains("Jane"));
    }
}
