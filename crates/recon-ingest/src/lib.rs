//! Loading catalog files into reconciliation datasets.

pub mod csv_table;
pub mod error;

pub use csv_table::{
    CsvTable, IngestOptions, SourceEncoding, decode, normalize_cell, normalize_header,
    read_csv_table, read_csv_table_with_options,
};
pub use error::{IngestError, Result};
