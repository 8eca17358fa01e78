//! PDF document parser using pdf-extract
//!
//! Extracts the text of every page and concatenates it. No layout or
//! structure is preserved; downstream matching works on the flat text.

use crate::{DocumentParser, FileType, ParsedDocument, ParserError, Result};

/// PDF document parser
#[derive(Debug, Clone, Default)]
pub struct PdfParser;

impl PdfParser {
    /// Create a new PDF parser
    pub fn new() -> Self {
        Self
    }

    /// Extract text from PDF bytes
    ///
    /// The backend can panic on malformed input; panics are reported as
    /// `PdfError` so a bad upload never takes the caller down with it.
    fn extract_text(&self, bytes: &[u8]) -> Result<(String, Option<u32>)> {
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| ParserError::PdfError("PDF backend panicked on malformed input".into()))?
            .map_err(|e| ParserError::PdfError(e.to_string()))?;

        // Rough page count from form feeds between pages
        let breaks = text.matches('\x0C').count() as u32;
        let page_count = if breaks > 0 { Some(breaks + 1) } else { None };

        Ok((text, page_count))
    }
}

impl DocumentParser for PdfParser {
    fn parse_bytes(&self, bytes: &[u8], file_name: &str) -> Result<ParsedDocument> {
        let (text, page_count) = self.extract_text(bytes)?;

        let mut doc = ParsedDocument::new(file_name, FileType::Pdf).with_content(text);
        doc.metadata.page_count = page_count;
        doc.metadata.byte_size = bytes.len();

        tracing::debug!(
            file = file_name,
            chars = doc.char_count(),
            pages = ?page_count,
            "Extracted PDF text"
        );

        Ok(doc)
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::Pdf]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_types() {
        let parser = PdfParser::new();
        assert!(parser.can_parse(FileType::Pdf));
        assert!(!parser.can_parse(FileType::Csv));
    }

    #[test]
    fn test_non_pdf_bytes_are_an_error() {
        let parser = PdfParser::new();
        let err = parser
            .parse_bytes(b"this is definitely not a pdf", "fake.pdf")
            .unwrap_err();
        assert!(matches!(err, ParserError::PdfError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let parser = PdfParser::new();
        let err = parser
            .parse(std::path::Path::new("/nonexistent/report.pdf"))
            .unwrap_err();
        assert!(matches!(err, ParserError::IoError { .. }));
    }
}
