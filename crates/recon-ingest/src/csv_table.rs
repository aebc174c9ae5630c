use std::borrow::Cow;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use encoding_rs::SHIFT_JIS;
use recon_model::{Dataset, Side};
use tracing::{debug, warn};

use crate::error::{IngestError, Result};

const BOM: char = '\u{feff}';

/// Text encoding a file was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    ShiftJis,
}

impl SourceEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::ShiftJis => "Shift_JIS",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOptions {
    /// Stop after this many data rows.
    pub max_rows: Option<usize>,
}

impl IngestOptions {
    pub fn with_max_rows(max_rows: Option<usize>) -> Self {
        Self { max_rows }
    }
}

/// A parsed CSV file: one header row and rectangular data rows.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// True when `max_rows` cut the file short.
    pub truncated: bool,
    pub encoding: SourceEncoding,
}

impl CsvTable {
    /// Converts the table into a validated dataset for one side.
    pub fn into_dataset(self, side: Side) -> Result<Dataset> {
        let path = self.path;
        Dataset::from_rows(side, self.headers, &self.rows)
            .map_err(|source| IngestError::InvalidDataset { path, source })
    }
}

pub fn normalize_header(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|&ch| ch != BOM).collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn normalize_cell(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|&ch| ch != BOM).collect();
    cleaned.trim().to_string()
}

/// Decodes file bytes as UTF-8, falling back to Shift_JIS.
pub fn decode(bytes: &[u8]) -> (Cow<'_, str>, SourceEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (Cow::Borrowed(text), SourceEncoding::Utf8),
        Err(_) => {
            let (text, _, had_errors) = SHIFT_JIS.decode(bytes);
            if had_errors {
                warn!("input is neither valid UTF-8 nor Shift_JIS; undecodable bytes replaced");
            }
            (text, SourceEncoding::ShiftJis)
        }
    }
}

pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    read_csv_table_with_options(path, IngestOptions::default())
}

/// Reads a catalog CSV file.
///
/// The first non-blank row is the header row. Blank rows are skipped, data
/// rows are padded or cut to the header width, and byte-order marks are
/// stripped from every cell.
pub fn read_csv_table_with_options(path: &Path, options: IngestOptions) -> Result<CsvTable> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let (text, encoding) = decode(&bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut truncated = false;
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let mut row: Vec<String> = record.iter().map(normalize_cell).collect();
        if row.iter().all(String::is_empty) {
            continue;
        }
        let Some(columns) = headers.as_ref() else {
            headers = Some(record.iter().map(normalize_header).collect());
            continue;
        };
        if options.max_rows.is_some_and(|max| rows.len() >= max) {
            truncated = true;
            break;
        }
        row.resize(columns.len(), String::new());
        rows.push(row);
    }

    let Some(headers) = headers else {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    };
    debug!(
        path = %path.display(),
        encoding = encoding.as_str(),
        columns = headers.len(),
        rows = rows.len(),
        truncated,
        "csv loaded"
    );
    Ok(CsvTable {
        path: path.to_path_buf(),
        headers,
        rows,
        truncated,
        encoding,
    })
}
