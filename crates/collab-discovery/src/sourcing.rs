//! Products sourced straight from shopping results, one query per brand.

use std::time::Duration;

use collab_core::{extract_domain, normalize_brand_key, BrandCandidate, ProductCandidate, SearchSource};
use collab_gateway::{GatewayError, SearchEngine, SearchGateway, ShoppingResult};

/// Result of a sourcing pass. On quota exhaustion `products` holds what was
/// collected before the failing brand; callers decide whether to keep it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcingOutcome {
    pub products: Vec<ProductCandidate>,
    pub out_of_credits: bool,
}

#[derive(Debug, Clone)]
pub struct ProductSourcer {
    search: SearchGateway,
    max_brands: usize,
    per_brand: usize,
    brand_delay: Duration,
}

impl ProductSourcer {
    #[must_use]
    pub fn new(search: SearchGateway, max_brands: usize, per_brand: usize, brand_delay: Duration) -> Self {
        Self {
            search,
            max_brands,
            per_brand,
            brand_delay,
        }
    }

    /// Query the first `max_brands` brands in order, pausing between them.
    ///
    /// A failed query for one brand is logged and skipped. Quota exhaustion
    /// stops the pass immediately.
    pub async fn source(&self, brands: &[BrandCandidate]) -> SourcingOutcome {
        let targets = &brands[..brands.len().min(self.max_brands)];
        tracing::info!(brands = targets.len(), "sourcing products from recommended brands");

        let mut outcome = SourcingOutcome::default();
        for (i, brand) in targets.iter().enumerate() {
            match self.brand_products(brand).await {
                Ok(mut found) => outcome.products.append(&mut found),
                Err(GatewayError::OutOfCredits) => {
                    tracing::warn!(brand = %brand.name, "search quota exhausted, stopping sourcing");
                    outcome.out_of_credits = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!(brand = %brand.name, error = %e, "product search failed");
                }
            }
            if i + 1 < targets.len() && !self.brand_delay.is_zero() {
                tokio::time::sleep(self.brand_delay).await;
            }
        }

        tracing::info!(
            products = outcome.products.len(),
            out_of_credits = outcome.out_of_credits,
            "sourcing finished"
        );
        outcome
    }

    async fn brand_products(&self, brand: &BrandCandidate) -> Result<Vec<ProductCandidate>, GatewayError> {
        let domain = extract_domain(&brand.url);
        let response = self.search.search(&brand.name, SearchEngine::GoogleShopping).await?;
        let products = filter_brand_products(&response.shopping_results, &brand.name, &domain, self.per_brand);
        tracing::debug!(
            brand = %brand.name,
            raw = response.shopping_results.len(),
            kept = products.len(),
            "filtered shopping results"
        );
        Ok(products)
    }
}

/// Keep shopping results that plausibly belong to `brand_name`, at most `limit`.
///
/// A result qualifies when it has a thumbnail and a product link, and the
/// brand shows up in its title, source or link (by normalized name, by
/// domain, or with every significant brand word present).
#[must_use]
pub fn filter_brand_products(
    results: &[ShoppingResult],
    brand_name: &str,
    brand_domain: &str,
    limit: usize,
) -> Vec<ProductCandidate> {
    results
        .iter()
        .filter(|r| is_brand_match(r, brand_name, brand_domain))
        .filter_map(|r| {
            let url = r.product_url()?;
            let thumbnail = r.thumbnail.as_deref().filter(|t| !t.is_empty())?;
            Some(ProductCandidate {
                product_name: r
                    .title
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "Unknown Product".to_string()),
                brand_name: brand_name.to_string(),
                brand_domain: brand_domain.to_string(),
                url: Some(url.to_string()),
                image_url: Some(thumbnail.to_string()),
                price: r.display_price(),
                source: r.source.clone(),
                verified: true,
                search_source: Some(SearchSource::GoogleShoppingBrand),
                ..ProductCandidate::default()
            })
        })
        .take(limit)
        .collect()
}

fn is_brand_match(result: &ShoppingResult, brand_name: &str, brand_domain: &str) -> bool {
    let title = result.title.as_deref().unwrap_or_default().to_lowercase();
    let source = result.source.as_deref().unwrap_or_default().to_lowercase();
    let link = result.product_url().unwrap_or_default().to_lowercase();

    let brand = normalize_brand_key(brand_name);
    if !brand.is_empty()
        && (title.contains(&brand)
            || normalize_brand_key(&title).contains(&brand)
            || source.contains(&brand)
            || normalize_brand_key(&source).contains(&brand)
            || link.contains(&brand))
    {
        return true;
    }

    let domain: String = brand_domain
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect();
    if !domain.is_empty() && link.contains(&domain) {
        return true;
    }

    let lowered = brand_name.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().filter(|w| w.len() > 2).collect();
    words.len() > 1 && words.iter().all(|w| title.contains(w) || source.contains(w))
}
