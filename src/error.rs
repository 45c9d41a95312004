use std::path::PathBuf;
use thiserror::Error;

/// Failures of the range extractor
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open source workbook {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("sheet '{0}' not found in source workbook")]
    MissingSheet(String),

    #[error("failed to read sheet '{sheet}': {source}")]
    Read {
        sheet: String,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("invalid row window {first}..={last}")]
    InvalidWindow { first: u32, last: u32 },

    #[error("invalid column '{0}'")]
    InvalidColumn(String),

    #[error("failed to write output workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
}

/// Failures while loading records from the extractor output
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Excel file not found at: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to open workbook: {0}")]
    Open(#[from] calamine::XlsxError),

    #[error("workbook contains no sheets")]
    NoSheets,

    #[error("sheet '{0}' not found")]
    MissingSheet(String),

    #[error("invalid column '{0}'")]
    InvalidColumn(String),

    #[error("column {column} is out of bounds: sheet has {available} columns")]
    MissingColumn { column: String, available: u32 },
}

/// A cell that could not be turned into a number
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("Could not convert value to number: {0}")]
    Unparsable(String),

    #[error("Error in clean_number: unsupported value, value: {value}, type: {kind}")]
    Unsupported { kind: &'static str, value: String },
}

/// Failures while building a dashboard section
#[derive(Debug, Error)]
pub enum SectionError {
    #[error("No data available")]
    NoData,

    #[error("failed to draw chart: {0}")]
    Chart(String),
}

/// Failures while projecting the depreciation timeline
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("no record found for object '{0}'")]
    UnknownObject(String),
}

/// Rejected grid edits
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("section '{0}' is read-only")]
    ReadOnly(String),

    #[error("section '{0}' is not part of this dashboard")]
    UnknownSection(String),

    #[error("table has not been initialized yet")]
    NotInitialized,

    #[error("row {row} is out of range (table has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("value for row {0} is not a finite number")]
    NotANumber(usize),
}

/// Invalid or unreadable dashboard configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
