//! Error types for catalog synchronisation.
//!
//! Per-resource failures are values, not control flow: the engine records
//! them in the statistics and hands them to the error callback, then moves
//! on to the next draft. Errors are categorized so callers can decide what
//! to retry.

use crate::reference::ReferenceKey;
use std::fmt;
use thiserror::Error;

/// Categories of sync errors for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A referenced key has no counterpart on the platform
    Resolution,
    /// The draft itself is malformed
    Validation,
    /// The resource changed since it was fetched
    Conflict,
    /// The collaborator could not be reached
    Transport,
    /// The platform refused the submitted actions
    Rejected,
}

impl ErrorCategory {
    /// Whether running the same draft again may succeed without changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict | Self::Transport)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Resolution => "Unresolved reference",
            Self::Validation => "Invalid draft",
            Self::Conflict => "Concurrent modification",
            Self::Transport => "Catalog unreachable",
            Self::Rejected => "Update rejected",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Reasons a draft is refused before any collaborator call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("draft has no key")]
    MissingKey,

    /// Keys are 2 to 256 ASCII letters, digits, `_` or `-`; one-character
    /// and non-ASCII keys are refused
    #[error("key '{0}' does not match [A-Za-z0-9_-]{{2,256}}")]
    InvalidKey(String),

    #[error("key '{0}' appears more than once in the input")]
    DuplicateKey(String),

    /// Only reported when updating; variants are matched by key
    #[error("master variant has no key, so it cannot be matched to an existing variant")]
    MasterVariantWithoutKey,
}

/// Errors reported by catalog collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Optimistic concurrency check failed
    #[error("version mismatch: expected {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("resource {0} not found")]
    NotFound(String),

    /// The platform refused the request
    #[error("rejected: {0}")]
    Rejected(String),

    /// The request never reached the platform or the response was lost
    #[error("transport error: {0}")]
    Transport(String),

    /// The reference kind cannot be created on demand
    #[error("cannot create {0} references")]
    CreationUnsupported(String),
}

/// A per-resource failure, always tagged with the draft key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("{key}: unresolved references: {}", join(.missing))]
    Resolution {
        key: String,
        missing: Vec<ReferenceKey>,
    },

    #[error("{}: {reason}", .key.as_deref().unwrap_or("<no key>"))]
    Validation {
        key: Option<String>,
        reason: ValidationError,
    },

    #[error("{key}: version conflict (expected {expected}, found {actual})")]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    #[error("{key}: {message}")]
    Transport { key: String, message: String },

    #[error("{key}: update rejected: {message}")]
    Rejected { key: String, message: String },
}

fn join(keys: &[ReferenceKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl SyncError {
    /// Attach a draft key to a collaborator error
    pub fn from_catalog(key: &str, error: CatalogError) -> Self {
        let key = key.to_string();
        match error {
            CatalogError::Conflict { expected, actual } => Self::Conflict {
                key,
                expected,
                actual,
            },
            CatalogError::Transport(message) => Self::Transport { key, message },
            CatalogError::NotFound(_)
            | CatalogError::Rejected(_)
            | CatalogError::CreationUnsupported(_) => Self::Rejected {
                key,
                message: error.to_string(),
            },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Resolution { .. } => ErrorCategory::Resolution,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::Rejected { .. } => ErrorCategory::Rejected,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// The draft key, when the draft had one
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Validation { key, .. } => key.as_deref(),
            Self::Resolution { key, .. }
            | Self::Conflict { key, .. }
            | Self::Transport { key, .. }
            | Self::Rejected { key, .. } => Some(key.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceKind;

    #[test]
    fn test_conflict_is_retryable() {
        let err = SyncError::from_catalog(
            "p1",
            CatalogError::Conflict {
                expected: 3,
                actual: 4,
            },
        );
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "p1: version conflict (expected 3, found 4)");
    }

    #[test]
    fn test_rejected_is_not_retryable() {
        let err = SyncError::from_catalog("p1", CatalogError::Rejected("bad".into()));
        assert!(!err.is_retryable());
        assert_eq!(err.key(), Some("p1"));
    }

    #[test]
    fn test_resolution_message_lists_keys() {
        let err = SyncError::Resolution {
            key: "p1".into(),
            missing: vec![
                ReferenceKey::new(ReferenceKind::ProductType, "shirt"),
                ReferenceKey::new(ReferenceKind::Channel, "store"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "p1: unresolved references: product type 'shirt', channel 'store'"
        );
    }

    #[test]
    fn test_validation_without_key() {
        let err = SyncError::Validation {
            key: None,
            reason: ValidationError::MissingKey,
        };
        assert_eq!(err.key(), None);
        assert_eq!(err.to_string(), "<no key>: draft has no key");
    }
}
