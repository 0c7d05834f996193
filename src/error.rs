//! User-facing error taxonomy for the capture → analyze → commit workflow.
//!
//! Lower layers keep their own error enums (`CaptureError`, `ApiError`,
//! `ConfigError`). The workflow maps them into `WorkflowError`, which is what
//! ends up stored in workflow state and shown to the user. Every variant is
//! recoverable by a user action; none of them is fatal to the process.

use crate::workflow::Phase;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Camera permission denied or no camera present. Fall back to upload.
    #[error("Camera access denied. Please use file upload instead. ({0})")]
    DeviceUnavailable(String),

    /// Selected file is not a decodable image. Pick another file.
    #[error("Could not read the selected image: {0}")]
    UnreadableFile(String),

    /// Backend rejected the image, or the request itself failed.
    #[error("Error analyzing image: {0}")]
    AnalysisFailed(String),

    /// Backend rejected the entry, or the request itself failed.
    /// The analysis result is kept so the save can be retried.
    #[error("Error saving food: {0}")]
    CommitFailed(String),

    /// Operation is not allowed in the current state. State is untouched.
    #[error("cannot {action} while {from}")]
    InvalidTransition { from: Phase, action: &'static str },
}

impl WorkflowError {
    /// Short stable name, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::DeviceUnavailable(_) => "device_unavailable",
            WorkflowError::UnreadableFile(_) => "unreadable_file",
            WorkflowError::AnalysisFailed(_) => "analysis_failed",
            WorkflowError::CommitFailed(_) => "commit_failed",
            WorkflowError::InvalidTransition { .. } => "invalid_transition",
        }
    }
}
