//! Error types for the sendmail domain.

use crate::render::RenderError;
use crate::sink::DeliveryError;
use crate::validation::Violations;
use strum::{AsRefStr, Display};
use thiserror::Error;

/// Result type for pipeline runs.
pub type SendMailResult<T> = Result<T, SendMailError>;

/// Outcome of a failed pipeline run.
#[derive(Debug, Error)]
pub enum SendMailError {
    /// The request is invalid or names a template that cannot be loaded.
    #[error("invalid request: {0}")]
    Input(Violations),

    /// The template produced a message that violates message invariants.
    #[error("invalid message: {0}")]
    Assembly(Violations),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Failures that are not attributable to a request field.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Failure classes used for logging, metrics and the requeue decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// The queue payload could not be decoded into a request.
    Malformed,
    Input,
    Assembly,
    Internal,
}

impl FailureKind {
    /// Only internal failures may succeed when tried again.
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::Internal)
    }
}

impl SendMailError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SendMailError::Input(_) => FailureKind::Input,
            SendMailError::Assembly(_) => FailureKind::Assembly,
            SendMailError::Internal(_) => FailureKind::Internal,
        }
    }

    /// Violations carried by input and assembly failures.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            SendMailError::Input(v) | SendMailError::Assembly(v) => Some(v),
            SendMailError::Internal(_) => None,
        }
    }
}

impl From<RenderError> for SendMailError {
    fn from(e: RenderError) -> Self {
        SendMailError::Internal(e.into())
    }
}

impl From<DeliveryError> for SendMailError {
    fn from(e: DeliveryError) -> Self {
        SendMailError::Internal(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Violation;

    #[test]
    fn test_kind_and_retryability() {
        let input = SendMailError::Input(Violation::new("", "missing recipients").into());
        assert_eq!(input.kind(), FailureKind::Input);
        assert!(!input.kind().is_retryable());
        assert!(input.violations().is_some());

        let internal = SendMailError::from(RenderError::Unclosed(3));
        assert_eq!(internal.kind(), FailureKind::Internal);
        assert!(internal.kind().is_retryable());
        assert!(internal.violations().is_none());
        assert_eq!(internal.to_string(), "render failed: unclosed action at byte 3");

        assert!(!FailureKind::Malformed.is_retryable());
        assert!(!FailureKind::Assembly.is_retryable());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(FailureKind::Malformed.as_ref(), "malformed");
        assert_eq!(FailureKind::Assembly.to_string(), "assembly");
    }
}
