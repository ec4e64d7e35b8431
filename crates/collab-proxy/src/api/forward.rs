//! The single signed forwarder behind every proxy route.
//!
//! Each route differs only in where the credential goes and how the
//! outbound URL is shaped; status mapping and JSON handling are shared.

use std::time::Duration;

use anyhow::Context;
use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use collab_core::{AppConfig, Upstream};
use collab_gateway::SearchEngine;
use reqwest::Url;
use serde_json::Value;

use crate::error::ProxyError;

const GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
const SEARCH_HOST: &str = "https://serpapi.com";
const METADATA_HOST: &str = "https://opengraph.io";

/// Model generations can take a while with search grounding enabled.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(120);

/// Fixed parameters added to every search.
const SEARCH_DEFAULTS: [(&str, &str); 3] = [("hl", "en"), ("gl", "us"), ("num", "10")];

/// Server-held API keys. Blank keys count as unset.
#[derive(Clone, Default)]
pub struct Credentials {
    pub gemini: Option<String>,
    pub search: Option<String>,
    pub metadata: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let key = |u| config.upstream_key(u).ok().map(str::to_string);
        Self {
            gemini: key(Upstream::Gemini),
            search: key(Upstream::Search),
            metadata: key(Upstream::Metadata),
        }
    }

    fn get(&self, upstream: Upstream) -> Option<&str> {
        match upstream {
            Upstream::Gemini => self.gemini.as_deref(),
            Upstream::Search => self.search.as_deref(),
            Upstream::Metadata => self.metadata.as_deref(),
        }
        .filter(|k| !k.trim().is_empty())
    }

    /// Upstreams that will answer 500 until their key is configured.
    #[must_use]
    pub fn missing(&self) -> Vec<Upstream> {
        [Upstream::Gemini, Upstream::Search, Upstream::Metadata]
            .into_iter()
            .filter(|u| self.get(*u).is_none())
            .collect()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = |k: &Option<String>| k.as_ref().map(|_| "[redacted]");
        f.debug_struct("Credentials")
            .field("gemini", &shown(&self.gemini))
            .field("search", &shown(&self.search))
            .field("metadata", &shown(&self.metadata))
            .finish()
    }
}

/// Base URLs of the third-party services.
#[derive(Debug, Clone)]
pub struct UpstreamHosts {
    gemini: Url,
    search: Url,
    metadata: Url,
}

impl UpstreamHosts {
    /// The public endpoints of the three providers.
    ///
    /// # Errors
    ///
    /// Never in practice; the hosts are constants.
    pub fn public() -> anyhow::Result<Self> {
        Self::new(GEMINI_HOST, SEARCH_HOST, METADATA_HOST)
    }

    /// Every upstream served from one base URL, e.g. a local mock.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` is not an absolute http(s) URL.
    #[cfg(test)]
    pub fn single(base: &str) -> anyhow::Result<Self> {
        Self::new(base, base, base)
    }

    fn new(gemini: &str, search: &str, metadata: &str) -> anyhow::Result<Self> {
        Ok(Self {
            gemini: parse_host(gemini)?,
            search: parse_host(search)?,
            metadata: parse_host(metadata)?,
        })
    }
}

fn parse_host(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid upstream host {raw}"))?;
    anyhow::ensure!(!url.cannot_be_a_base(), "upstream host {raw} cannot carry a path");
    Ok(url)
}

/// `base` with `segments` appended as percent-encoded path segments.
fn with_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    credentials: Credentials,
    hosts: UpstreamHosts,
    gemini_model: String,
}

impl Forwarder {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        credentials: Credentials,
        hosts: UpstreamHosts,
        gemini_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            credentials,
            hosts,
            gemini_model: gemini_model.into(),
        }
    }

    /// Forwarder against the public providers with keys from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .context("failed to build upstream HTTP client")?;
        Ok(Self::new(
            client,
            Credentials::from_config(config),
            UpstreamHosts::public()?,
            config.gemini_model.clone(),
        ))
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn key(&self, upstream: Upstream) -> Result<&str, ProxyError> {
        self.credentials
            .get(upstream)
            .ok_or(ProxyError::Misconfigured(upstream))
    }

    /// Forward a generation request body unchanged to the configured model.
    pub async fn generate(&self, body: Bytes) -> Result<Value, ProxyError> {
        let key = self.key(Upstream::Gemini)?;
        let method = format!("{}:generateContent", self.gemini_model);
        let mut url = with_segments(&self.hosts.gemini, &["v1beta", "models", &method]);
        url.query_pairs_mut().append_pair("key", key);

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.forward(Upstream::Gemini, request).await
    }

    /// Run one search. `query` must already be trimmed and non-empty.
    pub async fn search(&self, query: &str, engine: &str) -> Result<Value, ProxyError> {
        let key = self.key(Upstream::Search)?;
        let mut url = with_segments(&self.hosts.search, &["search.json"]);
        {
            let mut params = url.query_pairs_mut();
            params
                .append_pair("api_key", key)
                .append_pair("q", query)
                .append_pair("engine", engine);
            for (name, value) in SEARCH_DEFAULTS {
                params.append_pair(name, value);
            }
            if engine == SearchEngine::GoogleShopping.as_str() {
                params.append_pair("google_domain", "google.com");
            }
        }
        self.forward(Upstream::Search, self.client.get(url)).await
    }

    /// Raw page metadata for `target`, an absolute URL.
    pub async fn metadata(&self, target: &str) -> Result<Value, ProxyError> {
        let key = self.key(Upstream::Metadata)?;
        let mut url = with_segments(&self.hosts.metadata, &["api", "1.1", "site", target]);
        url.query_pairs_mut().append_pair("app_id", key);
        self.forward(Upstream::Metadata, self.client.get(url)).await
    }

    async fn forward(
        &self,
        upstream: Upstream,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, ProxyError> {
        let response = request
            .send()
            .await
            .map_err(|source| ProxyError::Transport { upstream, source })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ProxyError::Transport { upstream, source })?;

        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus {
                upstream,
                status,
                details: body,
            });
        }
        tracing::debug!(%upstream, bytes = body.len(), "upstream ok");
        serde_json::from_str(&body).map_err(|source| ProxyError::InvalidBody { upstream, source })
    }
}
