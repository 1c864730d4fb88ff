use std::path::PathBuf;
use thiserror::Error;

/// All errors surfaced by the NEM12 hourly pipeline.
///
/// Line-level and field-level problems in the input are absorbed by the
/// parser and never appear here.
#[derive(Error, Debug)]
pub enum Nem12Error {
    /// The input file could not be opened.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted settings document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The CSV writer failed while exporting the hourly table.
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A section name given on the command line is not a known category.
    #[error("Invalid section: {0}")]
    InvalidSection(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the nem12 crates.
pub type Result<T> = std::result::Result<T, Nem12Error>;
