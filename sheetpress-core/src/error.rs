//! Error types for loading, session sequencing and backend transport

use thiserror::Error;

/// Failures while turning file bytes into sheet rows
#[derive(Error, Debug)]
pub enum IngestError {
    /// The bytes could not be parsed as a spreadsheet
    #[error("Failed to parse spreadsheet: {0}")]
    FileFormat(String),

    /// The named sheet is absent from the workbook or could not be read
    #[error("Failed to load sheet '{sheet}': {reason}")]
    SheetLoad { sheet: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<calamine::Error> for IngestError {
    fn from(err: calamine::Error) -> Self {
        IngestError::FileFormat(err.to_string())
    }
}

/// Out-of-order use of a preview session
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please select a file first")]
    NoFile,

    #[error("Please convert the file first")]
    NotConverted,

    #[error("Validation blocked conversion: {0} finding(s) must be fixed first")]
    Blocked(usize),

    #[error("A title is required to publish")]
    MissingTitle,
}

/// Failures of the two backend calls
#[cfg(feature = "backend")]
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, timeout or body read failure
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response, with the server's message when it sent one
    #[error("Backend returned status {status}{}", status_suffix(.message))]
    Status { status: u16, message: Option<String> },

    /// 2xx response whose body is not the expected JSON payload
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(feature = "backend")]
fn status_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {}", m),
        None => String::new(),
    }
}
