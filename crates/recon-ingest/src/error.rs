//! Error types for catalog ingestion.

use std::path::PathBuf;

use recon_model::ReconError;
use thiserror::Error;

/// Errors that can occur while loading a catalog file.
#[derive(Debug, Error)]
pub enum IngestError {
    /// CSV file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected a record.
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV file is empty or has only blank rows.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// The table does not form a valid dataset (duplicate headers and the like).
    #[error("invalid dataset in {path}: {source}")]
    InvalidDataset {
        path: PathBuf,
        #[source]
        source: ReconError,
    },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
