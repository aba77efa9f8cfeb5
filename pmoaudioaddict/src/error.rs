//! Error types for the AudioAddict client

/// Result type alias for AudioAddict operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using the AudioAddict client
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Service identifier is not part of the catalog
    #[error("Invalid service: {0}")]
    InvalidService(String),

    /// Stream tier is not valid for the selected service
    #[error("Invalid stream tier '{tier}' for service '{service}'")]
    InvalidTier { service: String, tier: String },

    /// A service-relative operation was called before `select_service`
    #[error("No service selected")]
    ServiceNotSelected,

    /// Channel key is not present in the cached channel list
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// Fetching or decoding an upstream response failed
    #[error("Upstream fetch failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// The API returned an empty source list for a channel
    #[error("No stream sources available for channel: {0}")]
    NoSourcesAvailable(String),

    /// The batch payload has no channel filter named "All"
    #[error("Batch response has no \"All\" channel filter")]
    MissingAllFilter,

    /// Track history is too short to report what is playing
    #[error("No playable history entry for channel: {0}")]
    HistoryUnavailable(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization of a cache or config file failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this error came from the network or response decoding
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Upstream(UpstreamError::Json(err))
    }
}

/// Network, status and decoding failures for a single request
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-2xx status
    #[error("API returned status {status} for {url}")]
    Status { url: String, status: u16 },

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Body could not be decompressed
    #[error("Failed to decode response body: {0}")]
    Decode(#[from] std::io::Error),

    /// Transport-specific failure (used by custom transports)
    #[error("{0}")]
    Transport(String),
}
