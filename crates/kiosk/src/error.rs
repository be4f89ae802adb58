//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use kiosk_config::ConfigError;
use kiosk_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {target}")]
    #[diagnostic(
        code(kiosk::connection_failed),
        help(
            "{reason}\n\
             Check --api-url / --broker-url, or try --insecure for self-signed staging certs."
        )
    )]
    ConnectionFailed { target: String, reason: String },

    #[error("Gave up on the notification broker after {attempts} reconnect attempts")]
    #[diagnostic(
        code(kiosk::reconnect_exhausted),
        help("The display stopped receiving updates. Check the broker and start `kiosk run` again.")
    )]
    ReconnectExhausted { attempts: u32 },

    #[error("Broker protocol error: {message}")]
    #[diagnostic(code(kiosk::protocol))]
    Protocol { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(kiosk::auth_failed),
        help(
            "Verify the display API key.\n\
             Store a new one with: kiosk config set-key <KEY>"
        )
    )]
    AuthFailed { message: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(kiosk::no_credentials),
        help(
            "Pass --api-key, set KIOSK_API_KEY, or run: kiosk config set-key <KEY>"
        )
    )]
    NoCredentials { profile: String },

    // ── Display API ──────────────────────────────────────────────────
    #[error("No display found for this kiosk")]
    #[diagnostic(
        code(kiosk::not_found),
        help("Check --org, --parking and --kiosk against the backend.")
    )]
    DisplayNotFound,

    #[error("Display API error ({status}): {message}")]
    #[diagnostic(code(kiosk::api_error))]
    ApiError { status: String, message: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(kiosk::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(kiosk::validation))]
    Validation { field: String, reason: String },

    #[error("Missing {field} for profile '{profile}'")]
    #[diagnostic(
        code(kiosk::missing_route),
        help("Pass it as a flag, add it to the profile, or use --env development.")
    )]
    MissingRoute { field: String, profile: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(kiosk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: kiosk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("{0}")]
    #[diagnostic(code(kiosk::config))]
    Config(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid display JSON: {0}")]
    #[diagnostic(code(kiosk::json), help("The file must hold a display API response body."))]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    #[diagnostic(code(kiosk::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ReconnectExhausted { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::DisplayNotFound => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::MissingRoute { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { target, reason } => Self::ConnectionFailed { target, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Disconnected => Self::ConnectionFailed {
                target: "notification broker".into(),
                reason: "the connection was lost".into(),
            },
            CoreError::Protocol { message } => Self::Protocol { message },
            CoreError::Fetch {
                status: Some(404), ..
            } => Self::DisplayNotFound,
            CoreError::Fetch { message, status } => Self::ApiError {
                status: status.map_or_else(|| "payload".into(), |s| s.to_string()),
                message,
            },
            CoreError::Config { message } => Self::Config(message),
            CoreError::Internal(message) => Self::ApiError {
                status: "internal".into(),
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::MissingField { field, profile } => Self::MissingRoute { field, profile },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other.to_string()),
        }
    }
}
