//! CSV dataset parser
//!
//! Uploaded CSV files arrive in whatever encoding the user's tool produced.
//! Bytes are decoded as ISO-8859-1 (Latin-1), where every byte is exactly one
//! character, so decoding can never fail. Non-ASCII UTF-8 text comes out as
//! mojibake, which is harmless for the numeric columns we read.

use crate::{DocumentParser, FileType, ParsedDocument, ParserError, Result, Table};

/// Cell contents read as null, compared case-insensitively
const NULL_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "#n/a"];

/// Latin-1 decoding of a UTF-8 byte order mark
const LATIN1_BOM: &str = "\u{ef}\u{bb}\u{bf}";

/// CSV dataset parser
#[derive(Debug, Clone)]
pub struct CsvParser {
    /// Field delimiter
    pub delimiter: u8,
}

impl CsvParser {
    /// Create a new comma-delimited parser
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Use a different delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read a header row and data rows into a table
    pub fn read_table(&self, bytes: &[u8]) -> Result<Table> {
        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = reader
            .byte_headers()
            .map_err(|e| ParserError::CsvError(e.to_string()))?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let name = decode_latin1(h);
                let name = if i == 0 {
                    name.trim_start_matches(LATIN1_BOM).to_string()
                } else {
                    name
                };
                name.trim().to_string()
            })
            .collect();

        let mut table = Table::new().with_headers(headers);

        for record in reader.byte_records() {
            let record = record.map_err(|e| ParserError::CsvError(e.to_string()))?;
            table.add_row(record.iter().map(decode_cell).collect());
        }

        Ok(table)
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode ISO-8859-1 bytes; each byte maps to the code point of equal value
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn decode_cell(bytes: &[u8]) -> Option<String> {
    let text = decode_latin1(bytes);
    let trimmed = text.trim();
    if NULL_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl DocumentParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8], file_name: &str) -> Result<ParsedDocument> {
        let table = self.read_table(bytes)?;

        tracing::debug!(
            file = file_name,
            columns = table.num_columns(),
            rows = table.num_rows(),
            "Parsed CSV dataset"
        );

        let mut doc = ParsedDocument::new(file_name, FileType::Csv).with_table(table);
        doc.metadata.byte_size = bytes.len();
        Ok(doc)
    }

    fn supported_types(&self) -> &[FileType] {
        &[FileType::Csv]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_never_fails() {
        // 0xE9 alone is invalid UTF-8
        assert_eq!(decode_latin1(&[b'c', b'a', b'f', 0xE9]), "café");
        let all: Vec<u8> = (0..=255).collect();
        assert_eq!(decode_latin1(&all).chars().count(), 256);
    }

    #[test]
    fn test_reads_headers_and_rows() {
        let data = b"Glucose,BMI,Age\n120,23.4,45\n99,,31\n";
        let table = CsvParser::new().read_table(data).unwrap();

        assert_eq!(table.headers, vec!["Glucose", "BMI", "Age"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.cell(0, 1), Some("23.4"));
        assert_eq!(table.cell(1, 1), None);
    }

    #[test]
    fn test_null_markers_become_empty_cells() {
        let data = b"A,B,C,D\nNA, nan ,NULL,7\n";
        let table = CsvParser::new().read_table(data).unwrap();
        assert_eq!(table.rows[0], vec![None, None, None, Some("7".to_string())]);
    }

    #[test]
    fn test_non_utf8_bytes_are_accepted() {
        let mut data = b"Name,Glucose\n".to_vec();
        data.extend_from_slice(&[0xC9, b'v', b'a', b',', b'1', b'1', b'0', b'\n']);

        let table = CsvParser::new().read_table(&data).unwrap();
        assert_eq!(table.cell(0, 0), Some("Éva"));
        assert_eq!(table.cell(0, 1), Some("110"));
    }

    #[test]
    fn test_bom_and_padding_stripped_from_headers() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"Pregnancies , Glucose\n1,2\n");

        let table = CsvParser::new().read_table(&data).unwrap();
        assert_eq!(table.headers, vec!["Pregnancies", "Glucose"]);
    }

    #[test]
    fn test_ragged_rows_are_tolerated() {
        let data = b"A,B,C\n1\n1,2,3,4\n";
        let table = CsvParser::new().read_table(data).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.cell(0, 2), None);
        assert_eq!(table.cell(1, 2), Some("3"));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let data = b"A;B\n1;2\n";
        let table = CsvParser::new().with_delimiter(b';').read_table(data).unwrap();
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.cell(0, 1), Some("2"));
    }

    #[test]
    fn test_empty_input_has_no_headers() {
        let table = CsvParser::new().read_table(b"").unwrap();
        assert!(table.headers.is_empty());
        assert_eq!(table.num_rows(), 0);
    }

    #[test]
    fn test_parse_bytes_produces_csv_document() {
        let doc = CsvParser::new()
            .parse_bytes(b"Age\n40\n", "batch.csv")
            .unwrap();
        assert_eq!(doc.file_type, FileType::Csv);
        assert_eq!(doc.table.unwrap().num_rows(), 1);
        assert_eq!(doc.metadata.byte_size, 7);
    }
}
