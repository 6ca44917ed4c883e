//! Error types for repo-insight

use thiserror::Error;

/// Result type alias for repo-insight operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for repo-insight
///
/// Per-section fetch failures never surface here; they are carried by
/// [`ProviderError`] and folded into the report.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid repository URL: {0}")]
    ParseError(String),

    #[error("HTTP error: {status}{}", message_suffix(.message))]
    UpstreamError {
        status: u16,
        message: Option<String>,
    },

    #[error("Unexpected response shape: {0}")]
    ResponseError(String),

    #[error("Could not reach the repository data provider: {0}")]
    UnreachableError(String),

    #[error("Proxy error: {0}")]
    ProxyError(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Failure reported by a [`ResourceProvider`](crate::provider::ResourceProvider)
/// for a single resource kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The request never produced a response (DNS, connection, timeout)
    #[error("Request error: {0}")]
    Transport(String),

    /// Non-success status other than a rate limit
    #[error("HTTP error: {status}{}", message_suffix(.message))]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// Rate limit hit; `reset` is the epoch second at which the quota refills
    #[error("GitHub API rate limit exceeded{}", reset_suffix(.reset))]
    RateLimited { reset: Option<i64> },

    /// Error text relayed by an intermediary backend
    #[error("{0}")]
    Remote(String),
}

impl ProviderError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ProviderError::Transport(_))
    }
}

/// Render a rate-limit reset hint as a wall-clock time
pub fn format_reset_time(reset: i64) -> Option<String> {
    chrono::DateTime::<chrono::Utc>::from_timestamp(reset, 0).map(|dt| dt.format("%H:%M:%S UTC").to_string())
}

fn reset_suffix(reset: &Option<i64>) -> String {
    match reset.and_then(format_reset_time) {
        Some(time) => format!(". Try again after {}.", time),
        None => ". Please try again later or use a GitHub personal access token.".to_string(),
    }
}

fn message_suffix(message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!(" - {}", m),
        _ => String::new(),
    }
}
