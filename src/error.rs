use thiserror::Error;

#[derive(Error, Debug)]
pub enum CashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "excel")]
    #[error("Could not read workbook: {0}")]
    Excel(String),

    #[error("Unsupported statement file: {0}")]
    UnsupportedFile(String),

    #[error("The statement file seems to be empty.")]
    EmptyStatement,

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("No valid rows after cleaning. Check your column mapping and try again.")]
    NoValidRows,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CashError>;
