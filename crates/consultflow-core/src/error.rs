use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::Stage;

pub type Result<T> = std::result::Result<T, ConsultError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationFailureKind {
    Transient,
    Fatal,
    Schema,
}

impl GenerationFailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Fatal => "fatal",
            Self::Schema => "schema",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConsultError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{stage} is not available: {reason}")]
    StageUnavailable { stage: Stage, reason: String },

    #[error("no pending candidate to resolve")]
    NoPendingCandidate,

    #[error("generation failed ({}): {message}", kind.as_str())]
    Generation {
        kind: GenerationFailureKind,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub operation: String,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl ConsultError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::StageUnavailable { .. } => "STAGE_UNAVAILABLE",
            Self::NoPendingCandidate => "NO_PENDING_CANDIDATE",
            Self::Generation { .. } => "GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn generation(kind: GenerationFailureKind, message: impl Into<String>) -> Self {
        Self::Generation {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(stage: Stage, reason: impl Into<String>) -> Self {
        Self::StageUnavailable {
            stage,
            reason: reason.into(),
        }
    }

    pub fn to_payload(&self, operation: impl Into<String>) -> ErrorPayload {
        let stage = match self {
            Self::StageUnavailable { stage, .. } => Some(stage.as_str().to_string()),
            _ => None,
        };
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            operation: operation.into(),
            trace_id: Uuid::new_v4().to_string(),
            stage,
        }
    }
}

pub fn generation_status_kind(status: reqwest::StatusCode) -> GenerationFailureKind {
    if status.is_server_error() || status.as_u16() == 429 {
        GenerationFailureKind::Transient
    } else {
        GenerationFailureKind::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_kind_treats_rate_limit_and_server_errors_as_transient() {
        assert_eq!(
            generation_status_kind(reqwest::StatusCode::TOO_MANY_REQUESTS),
            GenerationFailureKind::Transient
        );
        assert_eq!(
            generation_status_kind(reqwest::StatusCode::BAD_GATEWAY),
            GenerationFailureKind::Transient
        );
        assert_eq!(
            generation_status_kind(reqwest::StatusCode::UNAUTHORIZED),
            GenerationFailureKind::Fatal
        );
    }

    #[test]
    fn payload_carries_stage_for_unavailable_actions() {
        let err = ConsultError::unavailable(Stage::Review, "proposals are missing");
        let payload = err.to_payload("review");
        assert_eq!(payload.code, "STAGE_UNAVAILABLE");
        assert_eq!(payload.stage.as_deref(), Some("review"));
        assert!(payload.message.contains("proposals are missing"));
        assert!(!payload.trace_id.is_empty());
    }

    #[test]
    fn generation_error_message_names_failure_kind() {
        let err = ConsultError::generation(GenerationFailureKind::Transient, "timed out");
        assert_eq!(err.to_string(), "generation failed (transient): timed out");
    }
}
