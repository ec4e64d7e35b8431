//! Client for the search-results proxy.

use reqwest::Url;
use serde::Deserialize;

use crate::error::GatewayError;
use crate::quota;
use crate::transport::{endpoint_url, Transport};

const SEARCH_PATH: &str = "/search-proxy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEngine {
    Google,
    GoogleShopping,
}

impl SearchEngine {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SearchEngine::Google => "google",
            SearchEngine::GoogleShopping => "google_shopping",
        }
    }
}

impl std::fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrganicResult {
    pub title: Option<String>,
    pub link: Option<String>,
    pub snippet: Option<String>,
    pub thumbnail: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShoppingResult {
    pub title: Option<String>,
    pub link: Option<String>,
    pub product_link: Option<String>,
    pub source: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(deserialize_with = "price_text")]
    pub price: Option<String>,
    pub extracted_price: Option<f64>,
}

impl ShoppingResult {
    /// Product page link, preferring `product_link` over `link`.
    #[must_use]
    pub fn product_url(&self) -> Option<&str> {
        self.product_link
            .as_deref()
            .filter(|l| !l.is_empty())
            .or_else(|| self.link.as_deref().filter(|l| !l.is_empty()))
    }

    /// Numeric price when the provider extracted one, else its display text.
    #[must_use]
    pub fn display_price(&self) -> Option<String> {
        match self.extracted_price {
            Some(p) if p > 0.0 => Some(p.to_string()),
            _ => self.price.clone().filter(|p| !p.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SerpResponse {
    pub organic_results: Vec<OrganicResult>,
    pub shopping_results: Vec<ShoppingResult>,
}

fn price_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Issues queries through the search proxy; the proxy holds the provider key.
#[derive(Debug, Clone)]
pub struct SearchGateway {
    transport: Transport,
    endpoint: Url,
}

impl SearchGateway {
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] if `proxy_base_url` is not a URL.
    pub fn new(transport: Transport, proxy_base_url: &str) -> Result<Self, GatewayError> {
        Ok(Self {
            transport,
            endpoint: endpoint_url(proxy_base_url, SEARCH_PATH)?,
        })
    }

    fn build_url(&self, query: &str, engine: SearchEngine) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("engine", engine.as_str());
        url
    }

    /// Run one query on `engine`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::OutOfCredits`] when the provider reports an exhausted quota.
    /// - [`GatewayError::RequestFailed`] on any other non-OK status.
    /// - [`GatewayError::Deserialize`] if the body is not the expected shape.
    /// - Transport errors from [`Transport::send`].
    pub async fn search(
        &self,
        query: &str,
        engine: SearchEngine,
    ) -> Result<SerpResponse, GatewayError> {
        let url = self.build_url(query, engine);
        let raw = self
            .transport
            .send(|client| client.get(url.clone()))
            .await?;

        if quota::is_out_of_credits(raw.status, &raw.body) {
            tracing::warn!(query, engine = %engine, "search provider out of credits");
            return Err(GatewayError::OutOfCredits);
        }
        if !raw.is_success() {
            return Err(GatewayError::RequestFailed {
                service: "SerpAPI",
                status: raw.status.as_u16(),
            });
        }

        if let Some(err) = quota::error_message(&raw.body) {
            tracing::debug!(query, error = %err, "search provider returned an error payload");
        }
        raw.json(&format!("search(q={query}, engine={engine})"))
    }
}
