//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use vitrine_config::ConfigError;
use vitrine_core::{CoreError, ValidationErrors};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to {url}")]
    #[diagnostic(
        code(vitrine::connection_failed),
        help(
            "Check that the admin API is running and reachable.\n\
             Reason: {reason}\n\
             Try --insecure (-k) for self-signed certificates, or --demo for offline data."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(vitrine::auth_failed),
        help(
            "Verify your API key.\n\
             Set it with: vitrine config set api_key <KEY>, or export VITRINE_API_KEY."
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(vitrine::no_credentials),
        help(
            "Configure credentials with: vitrine config init\n\
             Or set the VITRINE_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Records ──────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(vitrine::not_found),
        help("Run: vitrine list {view} to see available records")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        view: String,
    },

    #[error("{count} field(s) failed validation:\n{details}")]
    #[diagnostic(
        code(vitrine::invalid_record),
        help("Fix the listed fields and retry. Run: vitrine views show <view> for field rules.")
    )]
    InvalidRecord { count: usize, details: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error{}: {message}", code_suffix(.code.as_deref()))]
    #[diagnostic(code(vitrine::api_error))]
    ApiError {
        code: Option<String>,
        message: String,
    },

    #[error("Operation rejected: {message}")]
    #[diagnostic(code(vitrine::rejected))]
    Rejected { message: String },

    #[error("Operation '{operation}' is not enabled for this view")]
    #[diagnostic(
        code(vitrine::unsupported),
        help("Check the view's [features] and status settings with: vitrine views show <view>")
    )]
    Unsupported { operation: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vitrine::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vitrine::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vitrine config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No API configured")]
    #[diagnostic(
        code(vitrine::no_config),
        help(
            "Create a profile with: vitrine config init (expected at {path})\n\
             Or pass --api-url, or use --demo for built-in sample data."
        )
    )]
    NoConfig { path: String },

    #[error("Unknown view '{name}'")]
    #[diagnostic(code(vitrine::unknown_view), help("Available views: {available}"))]
    UnknownView { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(vitrine::config))]
    Config { message: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(vitrine::timeout),
        help("Increase timeout with --timeout or check the API's responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(vitrine::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. }
            | Self::InvalidRecord { .. }
            | Self::UnknownView { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            Self::Unsupported { .. } => exit_code::PERMISSION,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the view name used in "not found" help text.
    pub fn in_view(self, view_key: &str) -> Self {
        match self {
            Self::NotFound {
                resource_type,
                identifier,
                ..
            } => Self::NotFound {
                resource_type,
                identifier,
                view: view_key.to_owned(),
            },
            other => other,
        }
    }
}

fn code_suffix(code: Option<&str>) -> String {
    code.map(|c| format!(" ({c})")).unwrap_or_default()
}

fn field_details(errors: &ValidationErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("  {field}: {message}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },

            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                resource_type: entity_type,
                identifier,
                view: "<view>".into(),
            },

            CoreError::Validation(errors) => Self::InvalidRecord {
                count: errors.len(),
                details: field_details(&errors),
            },

            CoreError::Unsupported { operation } => Self::Unsupported { operation },

            CoreError::Rejected { message } => Self::Rejected { message },

            CoreError::Api { message, code, .. } => Self::ApiError { code, message },

            CoreError::Config { message } => Self::Config { message },

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<vitrine_api::Error> for CliError {
    fn from(err: vitrine_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::UnknownView { name, available } => Self::UnknownView { name, available },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
