//! Error types for the rotation service
//!
//! Provides error handling for:
//! - Cell address parsing
//! - Storage provider operations (sheets, files, permissions)
//! - Remote state service requests
//! - Rotation runs, tagged with the step that failed

use crate::types::{PermissionEntry, RotationStep};
use std::fmt;

/// Cell address errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Text is not a `LETTERS[DIGITS]` cell or a two-cell range
    #[error("malformed cell range: '{input}'")]
    MalformedRange { input: String },
}

impl AddressError {
    /// Create malformed-range error for input
    #[inline]
    pub fn malformed(input: impl Into<String>) -> Self {
        Self::MalformedRange {
            input: input.into(),
        }
    }
}

/// Storage provider errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Document has no sheet with grid properties
    #[error("the spreadsheet has no child sheets")]
    NoSheetsFound,

    /// Sheet reports no rows or no columns
    #[error("the sheet has no grid dimensions")]
    NoGridDimensions,

    /// Provider answered with a non-success status
    #[error("{operation} failed with status {status}: {body}")]
    RequestFailed {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Document has no containing folder
    #[error("spreadsheet {0} is not in a folder")]
    NotInFolder(String),

    /// Copy response carried no document id
    #[error("copied file does not have an id")]
    MissingId,

    /// One or more permission grants could not be created
    #[error("copying permissions failed:\n{}", PermissionFailure::join(.failures))]
    PermissionCopyFailed { failures: Vec<PermissionFailure> },

    /// Request never produced a response
    #[error("transport error during {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("could not decode {operation} response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    /// Credentials could not be loaded or refreshed
    #[error("authorization failed: {0}")]
    Auth(String),
}

impl ProviderError {
    /// Create request-failed error
    pub fn request_failed(operation: &'static str, status: u16, body: impl Into<String>) -> Self {
        Self::RequestFailed {
            operation,
            status,
            body: body.into(),
        }
    }
}

/// A permission that could not be replicated, with its cause
#[derive(Debug)]
pub struct PermissionFailure {
    /// The grant that was attempted
    pub entry: PermissionEntry,
    /// Why it failed
    pub error: ProviderError,
}

impl PermissionFailure {
    fn join(failures: &[PermissionFailure]) -> String {
        failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for PermissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "when adding permission {}, got error: {}",
            self.entry, self.error
        )
    }
}

/// Remote state service errors
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Non-success HTTP status
    #[error("failed to execute {operation}: status {status}")]
    RequestFailed { operation: String, status: u16 },

    /// Response carried an error list
    #[error("failed to execute {operation}: {}", .messages.join("; "))]
    ErrorResponse {
        operation: String,
        messages: Vec<String>,
    },

    /// Query response had no data
    #[error("{0} returned no data")]
    MissingData(String),

    /// Request never produced a response
    #[error("transport error during {operation}: {message}")]
    Transport { operation: String, message: String },

    /// Response body did not match the expected shape
    #[error("could not decode {operation} response: {message}")]
    Decode { operation: String, message: String },
}

/// Cause of a failed rotation step
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Storage provider failure
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Remote state failure
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// A rotation aborted at `step`; later steps were not attempted
#[derive(Debug, thiserror::Error)]
#[error("rotation failed at step '{step}': {source}")]
pub struct RotationError {
    /// Step that failed
    pub step: RotationStep,
    /// Underlying failure
    #[source]
    pub source: StepError,
}

impl RotationError {
    /// Tag a failure with its step
    pub fn at(step: RotationStep, source: impl Into<StepError>) -> Self {
        Self {
            step,
            source: source.into(),
        }
    }

    /// Whether the active pointer had already moved to the copy when the run
    /// aborted
    #[inline]
    #[must_use]
    pub fn pointer_committed(&self) -> bool {
        matches!(
            self.step,
            RotationStep::CopyPermissions
                | RotationStep::DeleteOld
                | RotationStep::Resync
                | RotationStep::ClearTransients
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display() {
        let err = AddressError::malformed("A1-B2");
        assert!(err.to_string().contains("A1-B2"));
    }

    #[test]
    fn permission_copy_failed_lists_every_failure() {
        let err = ProviderError::PermissionCopyFailed {
            failures: vec![
                PermissionFailure {
                    entry: PermissionEntry::new("writer", "user", Some("a@x.org".into())),
                    error: ProviderError::request_failed("create permission", 403, "denied"),
                },
                PermissionFailure {
                    entry: PermissionEntry::new("reader", "domain", Some("x.org".into())),
                    error: ProviderError::request_failed("create permission", 400, "bad"),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("a@x.org"));
        assert!(text.contains("x.org (reader)"));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn rotation_error_names_step() {
        let err = RotationError::at(RotationStep::DeleteOld, ProviderError::MissingId);
        assert!(err.to_string().contains("delete old spreadsheet"));
        assert!(err.pointer_committed());
        assert!(!RotationError::at(RotationStep::Duplicate, ProviderError::MissingId)
            .pointer_committed());
    }

    #[test]
    fn remote_error_joins_messages() {
        let err = RemoteError::ErrorResponse {
            operation: "GetSpreadsheetId".into(),
            messages: vec!["one".into(), "two".into()],
        };
        assert_eq!(err.to_string(), "failed to execute GetSpreadsheetId: one; two");
    }
}
