use thiserror::Error;

/// Errors raised by the data layer and the chart preparation.
///
/// Each variant is recovered at the boundary nearest to where it occurs:
/// loader errors stop ingestion of the upload, `EmptyResult` stops only the
/// chart side it was computed for.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// The payload is neither delimited text nor a readable workbook.
    #[error("unsupported data format: {0}")]
    DataFormat(String),

    /// An expected column is absent from the parsed table.
    #[error("missing column '{0}'")]
    MissingColumn(String),

    /// Relative frequencies of an empty population are undefined.
    #[error("no rows with a '{0}' value to summarise")]
    EmptyResult(String),

    /// Serialising a table to bytes failed.
    #[error("export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

impl From<csv::Error> for DashboardError {
    fn from(e: csv::Error) -> Self {
        DashboardError::Export(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for DashboardError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        DashboardError::Export(e.to_string())
    }
}
