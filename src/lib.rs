//! Storefront Crawler: per-site product extractors behind a task protocol
//!
//! Extractors never perform I/O. They classify one fetched page, emit
//! follow-up fetch tasks or finished product records through a sink, and
//! return. A controller executes the fetches (directly or through a proxy
//! gateway) and feeds responses back until every branch runs dry.

pub mod config;
pub mod controller;
pub mod extractor;
pub mod gateway;
pub mod output;
pub mod product;
pub mod sites;
pub mod state;
pub mod task;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No extractor accepts {url}")]
    NoExtractor { url: String },

    #[error("Unknown site: {0}")]
    UnknownSite(String),
}

/// Failures reported by an extractor for a single response
///
/// The extractor never retries on its own; the kind tells the controller
/// what to do next.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No page kind matches {url}")]
    UnsupportedPath { url: String },

    #[error("Extraction failed for {url}: {reason}")]
    ExtractionFailed { url: String, reason: String },

    #[error("Blocked by remote at {url} ({marker})")]
    BlockedByRemote { url: String, marker: String },

    #[error("Page gone at {url} (HTTP {status})")]
    Gone { url: String, status: u16 },

    #[error("Transport error: {0}")]
    Transport(#[from] FetchError),
}

/// Coarse failure classes, used for statistics and retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    UnsupportedPath,
    ExtractionFailed,
    BlockedByRemote,
    Gone,
    Transport,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedPath => "unsupported_path",
            Self::ExtractionFailed => "extraction_failed",
            Self::BlockedByRemote => "blocked_by_remote",
            Self::Gone => "gone",
            Self::Transport => "transport",
        }
    }
}

/// What the controller should do with a failed task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryHint {
    /// Not retryable as-is
    Abandon,
    /// Retry with headless rendering enabled
    EscalateRender,
    /// Retry with a fresh session and a more reliable proxy tier
    RotateIdentity,
    /// Retry unchanged after a delay
    Backoff,
}

impl ExtractError {
    /// Shorthand for an `ExtractionFailed` error
    pub fn failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnsupportedPath { .. } => FailureKind::UnsupportedPath,
            Self::ExtractionFailed { .. } => FailureKind::ExtractionFailed,
            Self::BlockedByRemote { .. } => FailureKind::BlockedByRemote,
            Self::Gone { .. } => FailureKind::Gone,
            Self::Transport(_) => FailureKind::Transport,
        }
    }

    pub fn retry_hint(&self) -> RetryHint {
        match self {
            Self::UnsupportedPath { .. } => RetryHint::Abandon,
            Self::ExtractionFailed { .. } => RetryHint::EscalateRender,
            Self::BlockedByRemote { .. } => RetryHint::RotateIdentity,
            Self::Gone { .. } => RetryHint::Abandon,
            Self::Transport(e) if e.is_retryable() => RetryHint::Backoff,
            Self::Transport(_) => RetryHint::Abandon,
        }
    }
}

/// Errors raised while executing a fetch task
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Gateway returned {status}: {message}")]
    Gateway { status: u16, message: String },

    #[error("Failed to decode response for {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    /// Builds a fetch error from a reqwest failure, classifying timeouts and
    /// connection errors
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            Self::Connect {
                url: url.to_string(),
                message: error.to_string(),
            }
        } else {
            Self::Http {
                url: url.to_string(),
                source: error,
            }
        }
    }

    /// Returns true if repeating the identical request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } | Self::Http { .. } => true,
            Self::Gateway { status, .. } => *status >= 500 || *status == 429,
            Self::Decode { .. } => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid route pattern '{pattern}': {message}")]
    InvalidRoute { pattern: String, message: String },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use extractor::{Extractor, PageKind};
pub use state::CrawlState;
pub use task::{FetchOptions, FetchTask, FetchedResponse, RecordTask, ReliabilityTier, Task};
