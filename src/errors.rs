/*!
 * Error types for the vttmerge application.
 *
 * This module contains custom error types for the different layers of the
 * application, using the thiserror crate for ergonomic error definitions.
 * Recoverable anomalies inside a caption document (bad timestamps, broken
 * timing lines) never become errors; they are absorbed by the parser.
 */

use thiserror::Error;

/// Errors surfaced by the caption parser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptionError {
    /// The document does not carry the WebVTT opening marker near its start
    #[error("Document is not a WebVTT caption track")]
    FormatMismatch,
}

/// Errors that can occur while retrieving a caption track
#[derive(Error, Debug)]
pub enum FetchError {
    /// The external retrieval tool is not installed or not on PATH
    #[error("Caption tool not found: {0}")]
    ToolNotFound(String),

    /// The external tool ran but exited unsuccessfully
    #[error("Caption tool failed ({status}): {stderr}")]
    ProcessFailed {
        /// Exit status as reported by the OS
        status: String,
        /// Filtered standard error output
        stderr: String,
    },

    /// The external tool did not finish in time
    #[error("Caption retrieval timed out after {0} seconds")]
    Timeout(u64),

    /// The tool's track listing could not be understood
    #[error("Failed to parse track listing: {0}")]
    ParseError(String),

    /// Reading or cleaning up the downloaded files failed
    #[error("I/O error during caption retrieval: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from caption retrieval
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from caption parsing
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// Error from the transcript store
    #[error("Store error: {0}")]
    Store(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Wrap a repository failure
    pub fn store(error: anyhow::Error) -> Self {
        Self::Store(format!("{:#}", error))
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
