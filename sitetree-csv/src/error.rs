use thiserror::Error;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("CSV file not found: {0}")]
    NotFound(String),

    #[error("CSV file has no valid headers")]
    NoHeaders,

    #[error("CSV parse error at line {line}: {message}")]
    Record { line: u64, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CsvError>;
