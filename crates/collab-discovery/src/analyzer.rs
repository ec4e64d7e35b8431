use serde_json::Value;

use collab_core::BrandProfile;
use collab_gateway::{parse_json_response, GatewayError, GenerateRequest, ModelClient, ParseError};

use crate::error::DiscoveryError;
use crate::prompts::{analysis_prompt, ANALYSIS_GENERATION, ANALYSIS_SYSTEM};

/// Produce a structured profile of the brand at `domain` with one grounded
/// model call. Any failure is fatal to the search.
///
/// # Errors
///
/// - [`DiscoveryError::AnalysisFailed`] on a non-OK model response.
/// - [`DiscoveryError::Parse`] if the reply holds no usable profile.
/// - [`DiscoveryError::Gateway`] for transport failures.
pub async fn analyze_brand(model: &ModelClient, domain: &str) -> Result<BrandProfile, DiscoveryError> {
    let request = GenerateRequest::grounded(analysis_prompt(domain), ANALYSIS_SYSTEM, ANALYSIS_GENERATION);
    let response = model.generate(&request).await.map_err(|e| match e {
        GatewayError::Upstream { status, message } => DiscoveryError::AnalysisFailed { status, message },
        other => DiscoveryError::Gateway(other),
    })?;

    let value = parse_json_response(response.candidate_text().unwrap_or_default())?;
    let profile = profile_from_value(value)?;
    tracing::debug!(domain, brand = %profile.name, "brand profile parsed");
    Ok(profile)
}

/// Accept either `{"brandProfile": {...}}` or the bare profile object.
pub(crate) fn profile_from_value(value: Value) -> Result<BrandProfile, ParseError> {
    let inner = match value {
        Value::Object(mut map) if map.get("brandProfile").is_some_and(Value::is_object) => {
            map.remove("brandProfile").unwrap_or_default()
        }
        other => other,
    };
    if !inner.is_object() {
        return Err(ParseError::Malformed("brand profile is not an object".to_string()));
    }
    serde_json::from_value(inner).map_err(|e| ParseError::Malformed(e.to_string()))
}
