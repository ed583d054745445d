use std::io;
use thiserror::Error;

/// Error type for varnoise-io operations.
#[derive(Error, Debug)]
pub enum GvcfError {
    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file ended before the `#CHROM` header line.
    #[error("No #CHROM header line found in {0}")]
    MissingHeader(String),

    /// The `#CHROM` line names no sample column.
    #[error("No sample column in the header of {0}")]
    NoSampleColumn(String),

    /// A data line could not be turned into an observation.
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
}

/// Result type alias for varnoise-io operations.
pub type Result<T> = std::result::Result<T, GvcfError>;
