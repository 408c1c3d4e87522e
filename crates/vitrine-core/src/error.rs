// ── Core error types ──
//
// Domain errors from vitrine-core. Callers never see reqwest errors or
// JSON parse failures directly; the `From<vitrine_api::Error>` impl
// translates transport-layer errors into these variants.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// Field-level form errors. Blocks submission; nothing was sent.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Operation rejected: {message}")]
    Rejected { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Server-specific error code (e.g. "validation.duplicate").
        code: Option<String>,
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Field errors, when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vitrine_api::Error> for CoreError {
    fn from(err: vitrine_api::Error) -> Self {
        match err {
            vitrine_api::Error::Authentication { status, message } => {
                CoreError::AuthenticationFailed {
                    message: format!("{message} (HTTP {status})"),
                }
            }
            vitrine_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            vitrine_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vitrine_api::Error::InvalidBaseUrl(url) => CoreError::Config {
                message: format!("Base URL cannot carry resource paths: {url}"),
            },
            vitrine_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            vitrine_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            vitrine_api::Error::Api {
                message,
                code,
                status: 404,
            } => CoreError::NotFound {
                entity_type: "Resource".into(),
                identifier: code.map_or(message.clone(), |c| format!("{message} ({c})")),
            },
            vitrine_api::Error::Api {
                message,
                code,
                status,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            vitrine_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_404_becomes_not_found() {
        let err: CoreError = vitrine_api::Error::Api {
            message: "no such record".into(),
            code: None,
            status: 404,
        }
        .into();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(err.to_string().contains("no such record"));
    }

    #[test]
    fn structured_api_error_keeps_code_and_status() {
        let err: CoreError = vitrine_api::Error::Api {
            message: "name already taken".into(),
            code: Some("validation.duplicate".into()),
            status: 422,
        }
        .into();
        match err {
            CoreError::Api { code, status, .. } => {
                assert_eq!(code.as_deref(), Some("validation.duplicate"));
                assert_eq!(status, Some(422));
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn auth_errors_map_to_authentication_failed() {
        let err: CoreError = vitrine_api::Error::Authentication {
            status: 401,
            message: "bad key".into(),
        }
        .into();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }
}
