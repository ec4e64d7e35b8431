//! Multi-strategy verification of a model-suggested product.
//!
//! Each product is searched four ways, every candidate URL is scored, and the
//! best specific URL that is also live wins. Products with no such URL come
//! back unverified with no link rather than a guessed one.

use std::sync::LazyLock;
use std::time::Duration;

use futures::future::join_all;
use regex::Regex;

use collab_core::{guess_brand_domain, normalize_brand_key, ProductCandidate, SearchSource};
use collab_gateway::{GatewayError, MetadataFetcher, SearchEngine, SearchGateway};

use crate::scoring::{organic_matches, shopping_matches, ScoredMatch};
use crate::specificity::is_specific_product_url;

static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*").expect("valid regex"));

static SIZE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*-\s*\d+\s*(oz|ml|g|lb|pack).*$").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Matches kept per strategy.
const MATCHES_PER_STRATEGY: usize = 3;

/// Candidates checked for liveness per product.
const MAX_LIVENESS_CHECKS: usize = 5;

/// Strip parenthetical asides and trailing size or pack descriptors.
#[must_use]
pub fn clean_product_name(name: &str) -> String {
    let without_asides = PARENTHETICAL.replace_all(name, " ");
    let without_size = SIZE_SUFFIX.replace(&without_asides, "");
    WHITESPACE.replace_all(&without_size, " ").trim().to_string()
}

/// One search to run for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStrategy {
    pub query: String,
    pub engine: SearchEngine,
    pub source: SearchSource,
}

/// The four strategies in priority order: the brand's own site first, then
/// the wider web.
#[must_use]
pub fn search_strategies(clean_name: &str, brand_name: &str, domain: &str) -> [SearchStrategy; 4] {
    [
        SearchStrategy {
            query: format!("\"{clean_name}\" site:{domain}"),
            engine: SearchEngine::Google,
            source: SearchSource::OrganicExactSite,
        },
        SearchStrategy {
            query: format!("site:{domain}/products/ {clean_name}"),
            engine: SearchEngine::Google,
            source: SearchSource::OrganicProductsPath,
        },
        SearchStrategy {
            query: format!("{clean_name} {brand_name}"),
            engine: SearchEngine::GoogleShopping,
            source: SearchSource::Shopping,
        },
        SearchStrategy {
            query: format!("{clean_name} {brand_name} buy"),
            engine: SearchEngine::Google,
            source: SearchSource::OrganicBuyIntent,
        },
    ]
}

#[derive(Debug, Clone)]
struct Candidate {
    found: ScoredMatch,
    source: SearchSource,
    is_brand_site: bool,
}

/// Brand-site candidates first, then by descending score.
fn rank_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.is_brand_site
            .cmp(&a.is_brand_site)
            .then_with(|| b.found.score.cmp(&a.found.score))
    });
}

/// Result of verifying a list of products in batches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationOutcome {
    pub verified: Vec<ProductCandidate>,
    pub unverified: usize,
    pub out_of_credits: bool,
}

#[derive(Debug, Clone)]
pub struct ProductVerifier {
    search: SearchGateway,
    metadata: MetadataFetcher,
    batch_size: usize,
    batch_delay: Duration,
}

impl ProductVerifier {
    #[must_use]
    pub fn new(search: SearchGateway, metadata: MetadataFetcher, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            search,
            metadata,
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    /// Verify one product.
    ///
    /// A failing strategy is skipped; the rest still run so several options
    /// are gathered.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::OutOfCredits`] as soon as any search reports an
    /// exhausted quota. No other error escapes.
    pub async fn verify_product(&self, product: ProductCandidate) -> Result<ProductCandidate, GatewayError> {
        let clean_name = clean_product_name(&product.product_name);
        let domain = if product.brand_domain.trim().is_empty() {
            guess_brand_domain(&product.brand_name)
        } else {
            product.brand_domain.clone()
        };
        let brand_key = normalize_brand_key(&product.brand_name);

        let mut candidates = Vec::new();
        for strategy in search_strategies(&clean_name, &product.brand_name, &domain) {
            let response = match self.search.search(&strategy.query, strategy.engine).await {
                Ok(r) => r,
                Err(GatewayError::OutOfCredits) => return Err(GatewayError::OutOfCredits),
                Err(e) => {
                    tracing::warn!(product = %product.product_name, strategy = %strategy.source, error = %e, "search strategy failed");
                    continue;
                }
            };
            let matches = if strategy.engine == SearchEngine::GoogleShopping {
                shopping_matches(&response.shopping_results, &product.product_name, &product.brand_name, MATCHES_PER_STRATEGY)
            } else {
                organic_matches(&response.organic_results, &product.product_name, &product.brand_name, MATCHES_PER_STRATEGY)
            };
            candidates.extend(matches.into_iter().map(|found| Candidate {
                is_brand_site: found.url.to_lowercase().contains(&brand_key),
                found,
                source: strategy.source,
            }));
        }

        if candidates.is_empty() {
            tracing::debug!(product = %product.product_name, brand = %product.brand_name, "no candidates found");
            return Ok(unverified(product));
        }
        rank_candidates(&mut candidates);

        for candidate in candidates.into_iter().take(MAX_LIVENESS_CHECKS) {
            if !is_specific_product_url(&candidate.found.url, &product.product_name) {
                tracing::debug!(url = %candidate.found.url, "skipping non-specific URL");
                continue;
            }
            if self.metadata.url_exists(&candidate.found.url).await {
                tracing::debug!(product = %product.product_name, url = %candidate.found.url, "product verified");
                let mut verified = product;
                verified.mark_verified(
                    candidate.found.url,
                    candidate.found.image_url,
                    candidate.found.price,
                    candidate.found.source,
                    candidate.source,
                );
                return Ok(verified);
            }
            tracing::debug!(url = %candidate.found.url, "candidate failed liveness check");
        }

        tracing::debug!(product = %product.product_name, "no live product URL found");
        Ok(unverified(product))
    }

    /// Verify `products` in batches; members of a batch run concurrently.
    ///
    /// Quota exhaustion in any member stops the loop. `verified` then holds
    /// the products verified in earlier batches.
    pub async fn verify_products(&self, products: Vec<ProductCandidate>) -> VerificationOutcome {
        let mut outcome = VerificationOutcome::default();
        let total = products.len();
        let mut remaining = products.into_iter().peekable();

        while remaining.peek().is_some() {
            let batch: Vec<ProductCandidate> = remaining.by_ref().take(self.batch_size).collect();
            let results = join_all(batch.into_iter().map(|p| self.verify_product(p))).await;

            let mut exhausted = false;
            for result in results {
                match result {
                    Ok(p) if p.verified && p.url().is_some() => outcome.verified.push(p),
                    Ok(_) => outcome.unverified += 1,
                    Err(_) => exhausted = true,
                }
            }
            if exhausted {
                tracing::warn!("search quota exhausted during verification");
                outcome.out_of_credits = true;
                break;
            }
            if remaining.peek().is_some() && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        tracing::info!(
            total,
            verified = outcome.verified.len(),
            unverified = outcome.unverified,
            out_of_credits = outcome.out_of_credits,
            "verification finished"
        );
        outcome
    }
}

fn unverified(mut product: ProductCandidate) -> ProductCandidate {
    product.url = None;
    product
}
