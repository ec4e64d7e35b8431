use std::net::SocketAddr;
use std::path::PathBuf;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// What the product sourcer does with products already collected from
/// earlier brands when a later brand's search hits the provider quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfCreditsPolicy {
    /// Drop everything collected in the batch; the products phase ends empty.
    #[default]
    Discard,
    /// Keep products from brands that completed before the quota signal.
    KeepPartial,
}

/// The three third-party services reached through the proxy layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Gemini,
    Search,
    Metadata,
}

impl Upstream {
    /// Environment variable holding the server-side credential.
    #[must_use]
    pub fn credential_var(self) -> &'static str {
        match self {
            Upstream::Gemini => "GEMINI_API_KEY",
            Upstream::Search => "SERP_API_KEY",
            Upstream::Metadata => "OPENGRAPH_API_KEY",
        }
    }

    /// Same-origin proxy path the client calls.
    #[must_use]
    pub fn proxy_path(self) -> &'static str {
        match self {
            Upstream::Gemini => "/gemini-proxy",
            Upstream::Search => "/search-proxy",
            Upstream::Metadata => "/metadata-proxy",
        }
    }
}

impl std::fmt::Display for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Upstream::Gemini => write!(f, "gemini"),
            Upstream::Search => write!(f, "search"),
            Upstream::Metadata => write!(f, "metadata"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub proxy_base_url: String,
    pub state_dir: PathBuf,
    pub user_agent: String,
    pub metadata_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub sourcing_max_brands: usize,
    pub sourcing_products_per_brand: usize,
    pub sourcing_brand_delay_ms: u64,
    pub enrich_batch_size: usize,
    pub enrich_batch_delay_ms: u64,
    pub verify_batch_delay_ms: u64,
    pub out_of_credits_policy: OutOfCreditsPolicy,
    pub bind_addr: SocketAddr,
    pub gemini_model: String,
    pub gemini_api_key: Option<String>,
    pub serp_api_key: Option<String>,
    pub opengraph_api_key: Option<String>,
}

impl AppConfig {
    /// Returns the credential the proxy injects for `upstream`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when the key was not configured.
    pub fn upstream_key(&self, upstream: Upstream) -> Result<&str, ConfigError> {
        let key = match upstream {
            Upstream::Gemini => self.gemini_api_key.as_deref(),
            Upstream::Search => self.serp_api_key.as_deref(),
            Upstream::Metadata => self.opengraph_api_key.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(upstream.credential_var().to_string()))
    }

    /// Full URL of the same-origin proxy for `upstream`.
    #[must_use]
    pub fn proxy_url(&self, upstream: Upstream) -> String {
        format!(
            "{}{}",
            self.proxy_base_url.trim_end_matches('/'),
            upstream.proxy_path()
        )
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("proxy_base_url", &self.proxy_base_url)
            .field("state_dir", &self.state_dir)
            .field("user_agent", &self.user_agent)
            .field("metadata_timeout_secs", &self.metadata_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("sourcing_max_brands", &self.sourcing_max_brands)
            .field(
                "sourcing_products_per_brand",
                &self.sourcing_products_per_brand,
            )
            .field("sourcing_brand_delay_ms", &self.sourcing_brand_delay_ms)
            .field("enrich_batch_size", &self.enrich_batch_size)
            .field("enrich_batch_delay_ms", &self.enrich_batch_delay_ms)
            .field("verify_batch_delay_ms", &self.verify_batch_delay_ms)
            .field("out_of_credits_policy", &self.out_of_credits_policy)
            .field("bind_addr", &self.bind_addr)
            .field("gemini_model", &self.gemini_model)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "serp_api_key",
                &self.serp_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "opengraph_api_key",
                &self.opengraph_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
