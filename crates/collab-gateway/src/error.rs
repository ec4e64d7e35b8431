use thiserror::Error;

/// Errors returned by the outbound service clients.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service kept answering 429 until the retry budget ran out.
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Non-OK status from a service whose callers only need to know it failed.
    #[error("{service} request failed: {status}")]
    RequestFailed { service: &'static str, status: u16 },

    /// Non-OK status with the upstream's own error message.
    #[error("{status} - {message}")]
    Upstream { status: u16, message: String },

    /// The search provider's quota is exhausted. Never retried.
    #[error("search provider is out of credits")]
    OutOfCredits,

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failure to recover a JSON value from generative-model text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("No response from AI")]
    Empty,

    #[error("Response was cut off. Please try again.")]
    Truncated,

    #[error("Could not parse results: {0}")]
    Malformed(String),
}
