//! Generative-model client. Requests go to the model proxy, which adds the
//! credential and forwards to the provider unchanged.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::transport::{endpoint_url, Transport};

const MODEL_PATH: &str = "/gemini-proxy";

#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GoogleSearchTool {}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub google_search: GoogleSearchTool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
    pub tools: Vec<Tool>,
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    /// A single user turn with web-search grounding enabled.
    #[must_use]
    pub fn grounded(prompt: String, system: &str, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
            tools: vec![Tool {
                google_search: GoogleSearchTool {},
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

/// A cited web source from search grounding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WebSource {
    pub uri: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroundingChunk {
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GroundingMetadata {
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<ResponseContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

/// Raw provider response, reduced to the two paths callers read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateResponse {
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate.
    #[must_use]
    pub fn candidate_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }

    /// Web citations of the first candidate, empty when ungrounded.
    #[must_use]
    pub fn grounding_chunks(&self) -> &[GroundingChunk] {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| m.grounding_chunks.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ModelClient {
    transport: Transport,
    endpoint: Url,
}

impl ModelClient {
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] if `proxy_base_url` is not a URL.
    pub fn new(transport: Transport, proxy_base_url: &str) -> Result<Self, GatewayError> {
        Ok(Self {
            transport,
            endpoint: endpoint_url(proxy_base_url, MODEL_PATH)?,
        })
    }

    /// Send one generation request.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Upstream`] with status and message on a non-OK reply.
    /// - [`GatewayError::Deserialize`] if the reply is not JSON.
    /// - Transport errors from [`Transport::send`].
    pub async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, GatewayError> {
        let raw = self
            .transport
            .send(|client| client.post(self.endpoint.clone()).json(request))
            .await?;
        if !raw.is_success() {
            return Err(GatewayError::Upstream {
                status: raw.status.as_u16(),
                message: raw.error_message(),
            });
        }
        raw.json("generateContent")
    }
}
