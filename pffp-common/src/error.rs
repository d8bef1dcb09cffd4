//! Common error types for PFFP

use thiserror::Error;

/// Common result type for PFFP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the PFFP crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration file could not be parsed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Spreadsheet export could not be produced
    #[error("Export error: {0}")]
    Export(String),
}
