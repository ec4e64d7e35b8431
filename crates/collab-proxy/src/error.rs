use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use collab_core::Upstream;
use collab_gateway::quota;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing or invalid {0} parameter")]
    MissingParam(&'static str),

    #[error("{} not set in environment", .0.credential_var())]
    Misconfigured(Upstream),

    #[error("{upstream} upstream returned {status}")]
    UpstreamStatus {
        upstream: Upstream,
        status: StatusCode,
        details: String,
    },

    #[error("{upstream} request failed: {source}")]
    Transport {
        upstream: Upstream,
        #[source]
        source: reqwest::Error,
    },

    #[error("{upstream} returned a body that is not JSON: {source}")]
    InvalidBody {
        upstream: Upstream,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Body text for a non-OK upstream reply.
fn request_failed(upstream: Upstream) -> &'static str {
    match upstream {
        Upstream::Gemini => "Gemini API request failed",
        Upstream::Search => "SerpAPI request failed",
        Upstream::Metadata => "OpenGraph fetch failed",
    }
}

/// Search errors keep the provider's own `error` text so callers can tell
/// an exhausted quota from other failures.
fn error_text(upstream: Upstream, body: &str) -> String {
    match upstream {
        Upstream::Search => quota::error_message(body),
        Upstream::Gemini | Upstream::Metadata => None,
    }
    .unwrap_or_else(|| request_failed(upstream).to_string())
}

/// Body text when the upstream could not be reached or read.
fn fetch_failed(upstream: Upstream) -> &'static str {
    match upstream {
        Upstream::Gemini => "Failed to process Gemini request",
        Upstream::Search => "Failed to fetch from SerpAPI",
        Upstream::Metadata => "Failed to fetch OpenGraph data",
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ProxyError::MissingParam(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: self.to_string(),
                    details: None,
                },
            ),
            ProxyError::Misconfigured(upstream) => {
                tracing::error!(var = upstream.credential_var(), "upstream credential missing");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Server misconfiguration".to_string(),
                        details: None,
                    },
                )
            }
            ProxyError::UpstreamStatus {
                upstream,
                status,
                details,
            } => {
                tracing::warn!(%upstream, status = status.as_u16(), "upstream returned error status");
                (
                    status,
                    ErrorBody {
                        error: error_text(upstream, &details),
                        details: (upstream == Upstream::Gemini).then_some(details),
                    },
                )
            }
            ProxyError::Transport { upstream, ref source } => {
                tracing::error!(%upstream, error = %source, "upstream request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: fetch_failed(upstream).to_string(),
                        details: None,
                    },
                )
            }
            ProxyError::InvalidBody { upstream, ref source } => {
                tracing::error!(%upstream, error = %source, "upstream body unreadable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: fetch_failed(upstream).to_string(),
                        details: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_param_is_bad_request() {
        let response = ProxyError::MissingParam("q").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_status_is_passed_through() {
        let response = ProxyError::UpstreamStatus {
            upstream: Upstream::Search,
            status: StatusCode::TOO_MANY_REQUESTS,
            details: String::new(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn search_error_text_is_passed_through() {
        let response = ProxyError::UpstreamStatus {
            upstream: Upstream::Search,
            status: StatusCode::TOO_MANY_REQUESTS,
            details: r#"{"error":"Your account has run out of searches."}"#.to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "error": "Your account has run out of searches." })
        );
    }

    #[test]
    fn metadata_error_text_stays_generic() {
        assert_eq!(
            error_text(Upstream::Metadata, r#"{"error":"bad key"}"#),
            "OpenGraph fetch failed"
        );
    }

    #[test]
    fn misconfiguration_names_the_variable() {
        assert_eq!(
            ProxyError::Misconfigured(Upstream::Metadata).to_string(),
            "OPENGRAPH_API_KEY not set in environment"
        );
    }
}
