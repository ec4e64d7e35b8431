//! Client for the page-metadata proxy.

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use collab_core::extract_domain;

use crate::error::GatewayError;
use crate::images::{favicon_url, resolve_url, FAVICON_SIZE_LARGE};
use crate::transport::{endpoint_url, Transport};

const METADATA_PATH: &str = "/metadata-proxy";

/// Preview image and favicon for a page. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenGraphData {
    pub image_url: Option<String>,
    pub favicon_url: Option<String>,
}

impl OpenGraphData {
    /// Blank entries dropped and relative references resolved against `page_url`.
    fn cleaned(self, page_url: &str) -> Self {
        let resolve = |u: Option<String>| u.and_then(|u| resolve_url(u.trim(), page_url));
        Self {
            image_url: resolve(self.image_url),
            favicon_url: resolve(self.favicon_url),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    transport: Transport,
    endpoint: Url,
    timeout: Duration,
}

impl MetadataFetcher {
    /// `transport` should carry the metadata timeout; liveness checks reuse it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] if `proxy_base_url` is not a URL.
    pub fn new(
        transport: Transport,
        proxy_base_url: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            transport,
            endpoint: endpoint_url(proxy_base_url, METADATA_PATH)?,
            timeout,
        })
    }

    fn build_url(&self, target: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("url", target);
        url
    }

    /// Fetch preview metadata for `url`. Every failure collapses to empty data.
    pub async fn fetch_open_graph(&self, url: &str) -> OpenGraphData {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            tracing::debug!("metadata fetch skipped for empty URL");
            return OpenGraphData::default();
        }
        let full = if trimmed.starts_with("http") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        let request_url = self.build_url(&full);

        let raw = match self
            .transport
            .send(|client| client.get(request_url.clone()))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(url = %full, error = %e, "metadata fetch failed");
                return OpenGraphData::default();
            }
        };
        if !raw.is_success() {
            tracing::debug!(url = %full, status = raw.status.as_u16(), "metadata proxy returned error status");
            return OpenGraphData::default();
        }

        match raw.json::<OpenGraphData>(&format!("metadata(url={full})")) {
            Ok(data) => data.cleaned(&full),
            Err(e) => {
                tracing::debug!(url = %full, error = %e, "metadata response unreadable");
                OpenGraphData::default()
            }
        }
    }

    /// Preview image for `url`, falling back to a large favicon for its domain.
    pub async fn fetch_og_image_url(&self, url: &str) -> Option<String> {
        let data = self.fetch_open_graph(url).await;
        if let Some(image) = data.image_url {
            return Some(image);
        }
        let domain = extract_domain(url);
        if domain.is_empty() {
            return None;
        }
        Some(favicon_url(&domain, FAVICON_SIZE_LARGE))
    }

    /// Whether `url` resolves to a live page: the metadata proxy found an
    /// image or a favicon within the timeout. Single attempt, no retry.
    pub async fn url_exists(&self, url: &str) -> bool {
        if url.trim().is_empty() {
            return false;
        }
        let request_url = self.build_url(url);
        let response = match self
            .transport
            .client()
            .get(request_url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(url, error = %e, "liveness check failed");
                return false;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(url, status = response.status().as_u16(), "liveness check rejected");
            return false;
        }
        match response.json::<OpenGraphData>().await {
            Ok(data) => {
                let data = data.cleaned(url);
                data.image_url.is_some() || data.favicon_url.is_some()
            }
            Err(_) => false,
        }
    }
}
