//! Delimited text tables with a header row.

use std::fs;
use std::io;
use std::path::Path;

/// Delimiters tried when sniffing, in tie-break order.
pub const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// An already-parsed table: ordered header names and ordered rows of cells.
///
/// Cells are stored untrimmed; rows are padded or truncated to the header width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from headers and rows, normalizing row widths.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Parse delimited text. With `delimiter == None` the delimiter is sniffed
    /// from the header line.
    ///
    /// Quoted fields may contain delimiters, `""` escapes and line breaks.
    /// Rows with only blank cells are skipped.
    pub fn parse(text: &str, delimiter: Option<char>) -> Result<Self, csv::Error> {
        let text = skip_blank_lines(text.strip_prefix('\u{feff}').unwrap_or(text));
        let Some(header_line) = text.lines().next() else {
            return Ok(Self::default());
        };
        let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(header_line));
        log::debug!("Parsing table with delimiter {:?}", delimiter);

        let mut reader = reader_builder(delimiter).from_reader(text.as_bytes());
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self::new(headers, rows))
    }

    /// Read and parse a delimited text file.
    pub fn from_path<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text, delimiter)?)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when there is no header or no data row.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }

    /// Cell at `(row, column)`.
    #[inline]
    pub fn cell(&self, row: usize, column: usize) -> &str {
        &self.rows[row][column]
    }
}

/// Pick the candidate delimiter that splits the header into the most fields.
pub fn sniff_delimiter(header_line: &str) -> char {
    let mut best = CANDIDATE_DELIMITERS[0];
    let mut best_fields = 1;
    for &candidate in &CANDIDATE_DELIMITERS {
        let mut reader = reader_builder(candidate)
            .has_headers(false)
            .from_reader(header_line.as_bytes());
        let fields = match reader.records().next() {
            Some(Ok(record)) => record.len(),
            _ => continue,
        };
        if fields > best_fields {
            best = candidate;
            best_fields = fields;
        }
    }
    best
}

/// Reader settings shared by sniffing and parsing. Rows may be ragged.
/// Non-ASCII delimiters fall back to a comma.
fn reader_builder(delimiter: char) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(if delimiter.is_ascii() { delimiter as u8 } else { b',' })
        .flexible(true);
    builder
}

/// Drop leading lines that hold only whitespace.
fn skip_blank_lines(mut text: &str) -> &str {
    while let Some((line, rest)) = text.split_once('\n') {
        if !line.trim().is_empty() {
            break;
        }
        text = rest;
    }
    if text.trim().is_empty() { "" } else { text }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, delimiter: Option<char>) -> RawTable {
        RawTable::parse(text, delimiter).unwrap()
    }

    #[test]
    fn test_sniff_comma_and_semicolon() {
        assert_eq!(sniff_delimiter("Time,N0x,N0y"), ',');
        assert_eq!(sniff_delimiter("Time;N0x;N0y"), ';');
        assert_eq!(sniff_delimiter("Time\tN0x\tN0y"), '\t');
        assert_eq!(sniff_delimiter("Time|N0x|N0y"), '|');
        assert_eq!(sniff_delimiter("Time"), ',');
    }

    #[test]
    fn test_sniff_ignores_quoted_delimiters() {
        assert_eq!(sniff_delimiter("\"a,b,c\";d;e"), ';');
    }

    #[test]
    fn test_semicolon_with_decimal_commas_in_quotes() {
        let table = parse("Time;N0x\n\"1,5\";2\n", None);
        assert_eq!(table.headers(), &["Time".to_string(), "N0x".to_string()]);
        assert_eq!(table.cell(0, 0), "1,5");
        assert_eq!(table.cell(0, 1), "2");
    }

    #[test]
    fn test_quotes_and_escapes() {
        let table = parse("a,b\n\"x,\"\"y\"\"\",z\n", Some(','));
        assert_eq!(table.cell(0, 0), "x,\"y\"");
        assert_eq!(table.cell(0, 1), "z");
    }

    #[test]
    fn test_line_break_inside_quoted_field() {
        let table = parse("a,b\n\"x\ny\",z\n1,2\n", None);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0], vec!["x\ny", "z"]);
        assert_eq!(table.rows()[1], vec!["1", "2"]);
    }

    #[test]
    fn test_short_rows_padded_blank_lines_skipped() {
        let table = parse("\u{feff}a,b,c\n\n1,2\r\n  \n4,5,6,7\n", None);
        assert_eq!(table.headers()[0], "a");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0], vec!["1", "2", ""]);
        assert_eq!(table.rows()[1], vec!["4", "5", "6"]);
    }

    #[test]
    fn test_leading_blank_lines_before_header() {
        let table = parse("\n   \nTime;N0x\n1;2\n", None);
        assert_eq!(table.headers(), &["Time".to_string(), "N0x".to_string()]);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_empty_tables() {
        assert!(parse("", None).is_empty());
        assert!(parse("   \n\n", None).is_empty());
        assert!(parse("Time,N0x\n", None).is_empty());
        assert!(!parse("Time,N0x\n1,2\n", None).is_empty());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "Time;N0x\n1;2\n").unwrap();
        let table = RawTable::from_path(&path, None).unwrap();
        assert_eq!(table.row_count(), 1);
        assert!(RawTable::from_path(dir.path().join("missing.csv"), None).is_err());
    }
}
