use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool builds records, assembles workbooks, or talks to the file system.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when an export is requested while the working list is empty.
    #[error("add at least one vehicle before exporting")]
    EmptyWorkingList,

    /// Raised when a draft lacks one or more required vehicle fields.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingRequiredFields(Vec<String>),

    /// Raised when a pricing term does not carry the registered number of
    /// rate tiers.
    #[error("pricing term {term} has {found} rate tiers, expected {expected}")]
    MalformedPricing {
        term: String,
        expected: usize,
        found: usize,
    },

    /// Raised when a value falls outside a closed enumeration.
    #[error("invalid value '{value}' for field {field}")]
    InvalidValue { field: String, value: String },

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when no record in the working list carries the identifier.
    #[error("no vehicle with id {0}")]
    RecordNotFound(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
