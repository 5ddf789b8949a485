use thiserror::Error;

/// Structural TLE validation failure. Names the exact check that failed so
/// the API can report it back to the uploader.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("line {0} is empty")]
    EmptyLine(u8),
    #[error("line {line} must start with '{expected}'")]
    BadPrefix { line: u8, expected: char },
    #[error("line {line} must be exactly 69 characters, got {length}")]
    BadLength { line: u8, length: usize },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid tle: {0}")]
    Validation(#[from] ValidationError),
    #[error("unparsable orbital elements: {0}")]
    Elements(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
