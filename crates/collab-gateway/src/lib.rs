//! Clients for the three proxied services (generative model, search results,
//! page metadata) plus the retry transport and model-output repair they share.

pub mod error;
pub mod images;
pub mod json;
pub mod metadata;
pub mod model;
pub mod quota;
pub mod retry;
pub mod search;
pub mod transport;

use std::time::Duration;

use collab_core::AppConfig;

pub use error::{GatewayError, ParseError};
pub use images::{favicon_url, is_valid_image_url, resolve_url};
pub use json::parse_json_response;
pub use metadata::{MetadataFetcher, OpenGraphData};
pub use model::{GenerateRequest, GenerateResponse, GenerationConfig, GroundingChunk, ModelClient, WebSource};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use search::{OrganicResult, SearchEngine, SearchGateway, SerpResponse, ShoppingResult};
pub use transport::{RawResponse, Transport};

/// The three service clients a discovery run needs.
#[derive(Debug, Clone)]
pub struct Gateways {
    pub model: ModelClient,
    pub search: SearchGateway,
    pub metadata: MetadataFetcher,
}

impl Gateways {
    /// Build all clients against the configured proxy base URL.
    ///
    /// The model transport has no overall timeout; metadata requests are
    /// bounded by `metadata_timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if a client cannot be built or the base URL is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        let retry = RetryPolicy {
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        };
        let metadata_timeout = Duration::from_secs(config.metadata_timeout_secs);

        let model_transport = Transport::new(&config.user_agent, None, retry)?;
        let search_transport = Transport::new(&config.user_agent, Some(Duration::from_secs(30)), retry)?;
        let metadata_transport = Transport::new(&config.user_agent, Some(metadata_timeout), retry)?;

        Ok(Self {
            model: ModelClient::new(model_transport, &config.proxy_base_url)?,
            search: SearchGateway::new(search_transport, &config.proxy_base_url)?,
            metadata: MetadataFetcher::new(
                metadata_transport,
                &config.proxy_base_url,
                metadata_timeout,
            )?,
        })
    }
}
