use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::GatewayError;
use crate::quota;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Status and body of a completed exchange. Non-OK statuses other than 429
/// land here so callers can decide what they mean.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Upstream error text, or `"Unknown error"` when the body has none.
    #[must_use]
    pub fn error_message(&self) -> String {
        quota::error_message(&self.body).unwrap_or_else(|| "Unknown error".to_string())
    }

    /// Parse the body as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Deserialize`] tagged with `context`.
    pub fn json<T: DeserializeOwned>(&self, context: &str) -> Result<T, GatewayError> {
        serde_json::from_str(&self.body).map_err(|e| GatewayError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}

/// HTTP client plus the retry policy every proxied call goes through.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    retry: RetryPolicy,
}

impl Transport {
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        user_agent: &str,
        timeout: Option<Duration>,
        retry: RetryPolicy,
    ) -> Result<Self, GatewayError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent.to_string());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            retry,
        })
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Sends the request built by `build`, retrying 429s and network
    /// failures with back-off.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::OutOfCredits`] when a 429 carries the quota message.
    /// - [`GatewayError::RateLimited`] when every attempt was rate limited.
    /// - [`GatewayError::Http`] when the last attempt failed at the network level.
    pub async fn send<F>(&self, build: F) -> Result<RawResponse, GatewayError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        retry_with_backoff(self.retry, || {
            let build = &build;
            let client = &self.client;
            async move {
                let response = build(client).send().await?;
                let status = response.status();
                let body = response.text().await?;
                if status == StatusCode::TOO_MANY_REQUESTS {
                    if quota::is_out_of_credits(status, &body) {
                        return Err(GatewayError::OutOfCredits);
                    }
                    return Err(GatewayError::RateLimited { attempts: 1 });
                }
                Ok(RawResponse { status, body })
            }
        })
        .await
    }
}

/// Join a same-origin proxy path onto a base URL.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidUrl`] if the result does not parse.
pub fn endpoint_url(base_url: &str, path: &str) -> Result<reqwest::Url, GatewayError> {
    let joined = format!("{}{}", base_url.trim_end_matches('/'), path);
    reqwest::Url::parse(&joined).map_err(|e| GatewayError::InvalidUrl {
        url: joined.clone(),
        reason: e.to_string(),
    })
}
