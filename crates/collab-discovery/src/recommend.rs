use serde::Deserialize;
use serde_json::Value;

use collab_core::{is_same_brand, normalize_brand_key, BrandCandidate, BrandProfile, FeedbackEntry, ProductCandidate, Rating};
use collab_gateway::{parse_json_response, GatewayError, GenerateRequest, ModelClient, WebSource};

use crate::error::DiscoveryError;
use crate::prompts::{recommendation_prompt, recommendation_system, RECOMMENDATION_GENERATION};

/// How many recent names from each rating feed the digest.
const POSITIVE_FEEDBACK_NAMES: usize = 20;
const NEGATIVE_FEEDBACK_NAMES: usize = 10;

/// Brands, seed products and the web sources the model cited.
#[derive(Debug, Clone, Default)]
pub struct Recommendations {
    pub brands: Vec<BrandCandidate>,
    pub products: Vec<ProductCandidate>,
    pub citations: Vec<WebSource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecommendations {
    brands: Vec<Value>,
    products: Vec<Value>,
}

/// Ask the model for collaborator brands and seed products.
///
/// Products and brands belonging to the source brand are removed from the
/// reply before it is returned.
///
/// # Errors
///
/// - [`DiscoveryError::RecommendationFailed`] on a non-OK model response.
/// - [`DiscoveryError::Parse`] if the reply cannot be recovered as JSON.
/// - [`DiscoveryError::Gateway`] for transport failures.
pub async fn recommend(
    model: &ModelClient,
    profile: &BrandProfile,
    brand_name: &str,
    domain: &str,
    feedback_context: &str,
) -> Result<Recommendations, DiscoveryError> {
    let prompt = recommendation_prompt(profile, brand_name, domain, feedback_context)?;
    let request = GenerateRequest::grounded(
        prompt,
        &recommendation_system(brand_name),
        RECOMMENDATION_GENERATION,
    );
    let response = model.generate(&request).await.map_err(|e| match e {
        GatewayError::Upstream { status, message } => {
            DiscoveryError::RecommendationFailed { status, message }
        }
        other => DiscoveryError::Gateway(other),
    })?;

    let value = parse_json_response(response.candidate_text().unwrap_or_default())?;
    let mut recommendations = recommendations_from_value(value);
    recommendations.citations = response
        .grounding_chunks()
        .iter()
        .filter_map(|chunk| chunk.web.clone())
        .collect();

    let source_key = if brand_name.trim().is_empty() { domain } else { brand_name };
    recommendations
        .brands
        .retain(|b| !is_same_brand(&b.name, source_key));
    recommendations.products = filter_source_brand_products(recommendations.products, source_key);

    tracing::info!(
        brands = recommendations.brands.len(),
        products = recommendations.products.len(),
        citations = recommendations.citations.len(),
        "recommendations parsed"
    );
    Ok(recommendations)
}

/// Entries that fail to deserialize are skipped, not fatal.
fn recommendations_from_value(value: Value) -> Recommendations {
    let raw: RawRecommendations = serde_json::from_value(value).unwrap_or_default();
    let brands = raw
        .brands
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<BrandCandidate>(v) {
            Ok(b) if !b.name.trim().is_empty() => Some(b),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable brand entry");
                None
            }
        })
        .collect();
    let products = raw
        .products
        .into_iter()
        .filter_map(|v| match serde_json::from_value::<ProductCandidate>(v) {
            Ok(p) if !p.product_name.trim().is_empty() => Some(p),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable product entry");
                None
            }
        })
        .collect();
    Recommendations {
        brands,
        products,
        citations: Vec::new(),
    }
}

/// Drop every product whose brand overlaps `source_brand` (equal, or either
/// contains the other after normalization). A product with no usable brand
/// name is dropped too; it cannot be told apart from the source brand.
#[must_use]
pub fn filter_source_brand_products(
    products: Vec<ProductCandidate>,
    source_brand: &str,
) -> Vec<ProductCandidate> {
    products
        .into_iter()
        .filter(|p| {
            let same = normalize_brand_key(&p.brand_name).is_empty()
                || is_same_brand(&p.brand_name, source_brand);
            if same {
                tracing::debug!(product = %p.product_name, brand = %p.brand_name, "removed source brand product");
            }
            !same
        })
        .collect()
}

/// Plain-text digest of past ratings appended to the recommendation prompt.
/// Empty when there is no feedback.
#[must_use]
pub fn build_feedback_context(entries: &[FeedbackEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let names = |rating: Rating, keep: usize| -> Vec<&str> {
        let all: Vec<&str> = entries
            .iter()
            .filter(|e| e.rating == rating)
            .flat_map(|e| e.results.iter().map(|r| r.name.as_str()))
            .collect();
        let skip = all.len().saturating_sub(keep);
        all.into_iter().skip(skip).collect()
    };

    let mut context = String::from("\n\nHISTORICAL FEEDBACK (use to improve relevance):\n");
    if entries.iter().any(|e| e.rating == Rating::Positive) {
        context.push_str(&format!(
            "Users responded positively to brands like: {}\n",
            names(Rating::Positive, POSITIVE_FEEDBACK_NAMES).join(", ")
        ));
    }
    if entries.iter().any(|e| e.rating == Rating::Negative) {
        context.push_str(&format!(
            "Users responded negatively to brands like: {}\n",
            names(Rating::Negative, NEGATIVE_FEEDBACK_NAMES).join(", ")
        ));
    }
    context.push_str("Optimize for brands similar to positive examples.\n");
    context
}

#[cfg(test)]
#[path = "recommend_test.rs"]
mod tests;
