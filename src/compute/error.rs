//! Error types for the normalization and windowing pipeline.

use chrono::{DateTime, Utc};

/// Input table could not be interpreted as wide-format trajectory data.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("CSV is empty")]
    EmptyTable,
    #[error("Missing required columns: {missing:?}. Found: {found:?}")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },
    #[error("Time value {value:?} in row {row} is neither a date-time nor epoch seconds")]
    UnparseableTime { row: usize, value: String },
}

/// Terminal pipeline failures. Nothing is animated once one of these occurs.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("No valid data")]
    NoValidData,
    #[error("No data in window {} to {}", .start.to_rfc3339(), .end.to_rfc3339())]
    EmptyWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("Frame index {index} out of range ({frame_count} frames)")]
    FrameOutOfRange { index: usize, frame_count: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True for the "nothing to animate" conditions.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::NoValidData | Self::EmptyWindow { .. })
    }
}
