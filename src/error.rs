//! # Error Types
//!
//! This module defines the error type used throughout the kabala library.
//!
//! Every variant belongs to one pipeline stage. The CLI prints
//! `"<stage>: <cause>"` as its single diagnostic line and exits with
//! [`KabalaError::exit_code`].

use thiserror::Error;

/// Main error type for kabala operations
#[derive(Debug, Error)]
pub enum KabalaError {
    /// Source image could not be decoded, or has zero width/height
    #[error("Image load error: {0}")]
    ImageLoad(String),

    /// Encoded bitmap length does not match `width_bytes * height_slices * 8`
    #[error("Encoding size mismatch: expected {expected} bytes, got {actual}")]
    EncodingSizeMismatch { expected: usize, actual: usize },

    /// A required marker is missing from a capture trace, or the trace is truncated
    #[error("Trace parse error: {0}")]
    TraceParse(String),

    /// The printer resource could not be opened
    #[error("Spool open error: {0}")]
    SpoolOpen(String),

    /// Writing the job to an opened printer resource failed
    #[error("Spool write error: {0}")]
    SpoolWrite(String),

    /// The assembled payload is empty; nothing was sent
    #[error("Empty job: {0}")]
    EmptyJob(String),

    /// Invalid command or parameter
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Configuration file or flag error
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KabalaError>;

impl KabalaError {
    /// Name of the pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ImageLoad(_) => "image",
            Self::EncodingSizeMismatch { .. } | Self::InvalidCommand(_) => "encode",
            Self::TraceParse(_) => "trace",
            Self::SpoolOpen(_) | Self::SpoolWrite(_) | Self::EmptyJob(_) => "transport",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }

    /// Process exit code for the CLI: 2 for transport failures, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SpoolOpen(_) | Self::SpoolWrite(_) => 2,
            _ => 1,
        }
    }
}

impl From<image::ImageError> for KabalaError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageLoad(e.to_string())
    }
}

impl From<serde_json::Error> for KabalaError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}
