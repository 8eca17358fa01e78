//! Gluco Parser - Raw input acquisition
//!
//! Supports parsing of:
//! - PDF documents (page text)
//! - CSV datasets (header + rows, Latin-1 decoded)
//! - Plain text files
//!
//! Each parser implements the `DocumentParser` trait and produces a
//! `ParsedDocument` holding either extracted text or a `Table`. Parsers only
//! acquire content; mapping it onto the feature schema is the extractor's job.

pub mod csv;
pub mod pdf;

pub use crate::csv::CsvParser;
pub use crate::pdf::PdfParser;

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during document parsing
#[derive(Error, Debug)]
pub enum ParserError {
    /// File format is not supported
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// IO error while reading the file
    #[error("IO error reading file: {path}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// PDF parsing error
    #[error("PDF parsing error: {0}")]
    PdfError(String),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    CsvError(String),
}

pub type Result<T> = std::result::Result<T, ParserError>;

// ============================================================================
// Parsed Document Types
// ============================================================================

/// A parsed document with extracted content
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Original file name or path
    pub file_name: String,

    /// Detected file type
    pub file_type: FileType,

    /// Extracted text content (empty for tabular inputs)
    pub content: String,

    /// Tabular content (CSV inputs only)
    pub table: Option<Table>,

    /// Metadata extracted from the document
    pub metadata: DocumentParseMetadata,
}

impl ParsedDocument {
    /// Create a new parsed document
    pub fn new(file_name: impl Into<String>, file_type: FileType) -> Self {
        Self {
            file_name: file_name.into(),
            file_type,
            content: String::new(),
            table: None,
            metadata: DocumentParseMetadata::default(),
        }
    }

    /// Set content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self.metadata.char_count = self.content.chars().count();
        self
    }

    /// Set table
    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    /// Get total character count
    pub fn char_count(&self) -> usize {
        self.metadata.char_count
    }

    /// Whether the text holds at least `min_chars` non-whitespace-trimmed characters
    pub fn is_readable(&self, min_chars: usize) -> bool {
        self.content.trim().chars().count() >= min_chars
    }

    /// Leading slice of the content for log previews
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.content[..idx],
            None => &self.content,
        }
    }
}

/// Supported file types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Csv,
    PlainText,
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "csv" => Self::Csv,
            "txt" | "text" => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Detect file type from an uploaded file name
    pub fn from_file_name(name: &str) -> Self {
        Self::from_path(Path::new(name))
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Csv => write!(f, "csv"),
            Self::PlainText => write!(f, "text"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A column-oriented dataset
///
/// Cells are `None` when empty or holding a null marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column headers
    pub headers: Vec<String>,

    /// Table rows
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Create a new table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add headers
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = headers;
        self
    }

    /// Add a row
    pub fn add_row(&mut self, row: Vec<Option<String>>) {
        self.rows.push(row);
    }

    /// Position of a column by exact header name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell value; ragged rows read as empty past their end
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .and_then(|c| c.as_deref())
    }

    /// Get number of columns
    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    /// Get number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Metadata extracted during parsing
#[derive(Debug, Clone, Default)]
pub struct DocumentParseMetadata {
    /// Number of pages
    pub page_count: Option<u32>,

    /// Characters of extracted text
    pub char_count: usize,

    /// Byte size of the raw input
    pub byte_size: usize,
}

// ============================================================================
// Parser Trait
// ============================================================================

/// Trait for document parsers
pub trait DocumentParser: Send + Sync {
    /// Parse a document already held in memory
    fn parse_bytes(&self, bytes: &[u8], file_name: &str) -> Result<ParsedDocument>;

    /// Parse a document from a file path
    fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let bytes = std::fs::read(path).map_err(|e| ParserError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        self.parse_bytes(&bytes, &path.display().to_string())
    }

    /// Get supported file types
    fn supported_types(&self) -> &[FileType];

    /// Check if this parser can handle a file type
    fn can_parse(&self, file_type: FileType) -> bool {
        self.supported_types().contains(&file_type)
    }
}

// ============================================================================
// Parser Registry
// ============================================================================

/// Registry of available parsers
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Registry with the PDF, CSV and plain-text parsers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PdfParser::new());
        registry.register(CsvParser::new());
        registry.register(PlainTextParser);
        registry
    }

    /// Register a parser
    pub fn register<P: DocumentParser + 'static>(&mut self, parser: P) {
        self.parsers.push(Box::new(parser));
    }

    /// Find a parser for a file type
    pub fn find_parser(&self, file_type: FileType) -> Option<&dyn DocumentParser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(file_type))
            .map(|p| p.as_ref())
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path) -> Result<ParsedDocument> {
        let file_type = FileType::from_path(path);

        if file_type == FileType::Unknown {
            return Err(ParserError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("none")
                    .to_string(),
            ));
        }

        let parser = self
            .find_parser(file_type)
            .ok_or_else(|| ParserError::UnsupportedFormat(file_type.to_string()))?;

        tracing::debug!(path = %path.display(), %file_type, "Parsing document");
        parser.parse(path)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain text parser
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub struct PlainTextParser;

impl DocumentParser for PlainTextParser {
    fn parse_bytes(&self, bytes: &[u8], file_name: &str) -> Result<ParsedDocument> {
        let content = String::from_utf8_lossy(bytes);
        let mut doc = ParsedDocument::new(file_name, FileType::PlainText).with_content(content);
        doc.metadata.byte_size = bytes.len();
        Ok(doc)
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::PlainText]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_extension("pdf"), FileType::Pdf);
        assert_eq!(FileType::from_extension("PDF"), FileType::Pdf);
        assert_eq!(FileType::from_extension("csv"), FileType::Csv);
        assert_eq!(FileType::from_extension("txt"), FileType::PlainText);
        assert_eq!(FileType::from_extension("xlsx"), FileType::Unknown);
        assert_eq!(FileType::from_file_name("Report.Final.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_file_name("noextension"), FileType::Unknown);
    }

    #[test]
    fn test_readability_threshold() {
        let doc = ParsedDocument::new("a.txt", FileType::PlainText).with_content("   short  \n");
        assert!(!doc.is_readable(10));
        assert!(doc.is_readable(5));

        let doc = ParsedDocument::new("a.txt", FileType::PlainText).with_content("");
        assert!(!doc.is_readable(1));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let doc = ParsedDocument::new("a.txt", FileType::PlainText).with_content("héllo wörld");
        assert_eq!(doc.preview(2), "hé");
        assert_eq!(doc.preview(100), "héllo wörld");
    }

    #[test]
    fn test_table_cells() {
        let mut table = Table::new().with_headers(vec!["A".to_string(), "B".to_string()]);
        table.add_row(vec![Some("1".to_string()), None]);
        table.add_row(vec![Some("3".to_string())]);

        assert_eq!(table.column_index("B"), Some(1));
        assert_eq!(table.column_index("b"), None);
        assert_eq!(table.cell(0, 0), Some("1"));
        assert_eq!(table.cell(0, 1), None);
        assert_eq!(table.cell(1, 1), None);
        assert_eq!(table.num_rows(), 2);
    }

    #[test]
    fn test_registry_dispatches_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Glucose: 120").unwrap();

        let registry = ParserRegistry::with_defaults();
        let doc = registry.parse(file.path()).unwrap();
        assert_eq!(doc.file_type, FileType::PlainText);
        assert_eq!(doc.content, "Glucose: 120");
    }

    #[test]
    fn test_registry_rejects_unknown_types() {
        let registry = ParserRegistry::with_defaults();
        let err = registry.parse(Path::new("notes.docx")).unwrap_err();
        assert!(matches!(err, ParserError::UnsupportedFormat(ext) if ext == "docx"));
    }
}
