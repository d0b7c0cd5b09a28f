//! Core error types.

use thiserror::Error;

/// Errors from model mutation, lookup and document mapping.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("state not found: {id}")]
    StateNotFound { id: String },

    #[error("region not found: {id}")]
    RegionNotFound { id: String },

    #[error("transition not found: {id}")]
    TransitionNotFound { id: String },

    #[error("{kind} action not found: {id}")]
    ActionNotFound { kind: String, id: String },

    #[error("{list} of {owner} has no reference to action {action}")]
    ActionRefNotFound {
        owner: String,
        list: String,
        action: String,
    },

    #[error("invalid reference: {reason}")]
    InvalidReference { reason: String },

    #[error("invalid operation: {reason}")]
    InvalidOperation { reason: String },

    #[error("{entity} {id} is referenced by transition {transition}")]
    InUse {
        entity: String,
        id: String,
        transition: String,
    },

    #[error("malformed document: {reason}")]
    Parse { reason: String },

    #[error("unsupported document version {found} (supported: {supported})")]
    UnsupportedVersion { found: String, supported: u32 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        ModelError::Parse {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_operation(reason: impl Into<String>) -> Self {
        ModelError::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// Returns true for any of the lookup failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ModelError::StateNotFound { .. }
                | ModelError::RegionNotFound { .. }
                | ModelError::TransitionNotFound { .. }
                | ModelError::ActionNotFound { .. }
                | ModelError::ActionRefNotFound { .. }
        )
    }

    /// Returns a stable error code suitable for tool output.
    pub fn error_code(&self) -> &'static str {
        match self {
            ModelError::StateNotFound { .. } => "NOT_FOUND",
            ModelError::RegionNotFound { .. } => "NOT_FOUND",
            ModelError::TransitionNotFound { .. } => "NOT_FOUND",
            ModelError::ActionNotFound { .. } => "NOT_FOUND",
            ModelError::ActionRefNotFound { .. } => "NOT_FOUND",
            ModelError::InvalidReference { .. } => "INVALID_REFERENCE",
            ModelError::InvalidOperation { .. } => "INVALID_OPERATION",
            ModelError::InUse { .. } => "IN_USE",
            ModelError::Parse { .. } => "PARSE_ERROR",
            ModelError::UnsupportedVersion { .. } => "VERSION_ERROR",
            ModelError::Json(_) => "PARSE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ModelError::ActionNotFound {
            kind: "entry".to_string(),
            id: "x".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.error_code(), "NOT_FOUND");

        let err = ModelError::UnsupportedVersion {
            found: "9".to_string(),
            supported: 1,
        };
        assert!(!err.is_not_found());
        assert_eq!(err.error_code(), "VERSION_ERROR");
        assert_eq!(
            err.to_string(),
            "unsupported document version 9 (supported: 1)"
        );
    }
}
