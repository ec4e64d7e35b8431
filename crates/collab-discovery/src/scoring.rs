//! Ranking of search results against a named product.
//!
//! Scores are additive integers. Results below [`MIN_MATCH_SCORE`] are
//! discarded.

use collab_core::normalize_brand_key;
use collab_gateway::{OrganicResult, ShoppingResult};

use crate::specificity::{is_specific_product_url, significant_words};

pub const MIN_MATCH_SCORE: i32 = 5;

// Shopping results.
pub const SHOPPING_BRAND_IN_TEXT: i32 = 15;
pub const SHOPPING_TITLE_WORD: i32 = 3;
pub const SHOPPING_NAME_PREFIX: i32 = 10;
pub const SHOPPING_BRAND_IN_LINK: i32 = 20;
pub const RETAILER_PENALTY: i32 = 5;
pub const EBAY_PENALTY: i32 = 20;
pub const NON_SPECIFIC_PENALTY: i32 = 25;
pub const NO_LINK_SCORE: i32 = -100;

// Organic results.
pub const ORGANIC_BRAND_MATCH: i32 = 15;
pub const ORGANIC_TITLE_WORD: i32 = 4;
pub const ORGANIC_SNIPPET_WORD: i32 = 2;
pub const NON_SPECIFIC_SCORE: i32 = -100;

/// Characters of the product name compared against shopping titles.
const NAME_PREFIX_CHARS: usize = 20;

/// Large retailers that rank below the brand's own store.
const RETAILERS: &[&str] = &["amazon.com", "walmart.com", "target.com"];

/// A ranked result with the details the verifier keeps.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub url: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub source: Option<String>,
    pub score: i32,
}

fn word_hits(words: &[String], text: &str) -> i32 {
    i32::try_from(words.iter().filter(|w| text.contains(w.as_str())).count()).unwrap_or(i32::MAX)
}

/// Score one shopping result for `product_name` by `brand_name`.
#[must_use]
pub fn score_shopping_result(result: &ShoppingResult, product_name: &str, brand_name: &str) -> i32 {
    let Some(link) = result.product_url() else {
        return NO_LINK_SCORE;
    };
    let title = result.title.as_deref().unwrap_or_default().to_lowercase();
    let source = result.source.as_deref().unwrap_or_default().to_lowercase();
    let link_lower = link.to_lowercase();
    let brand = normalize_brand_key(brand_name);
    let words = significant_words(product_name, 2);

    let mut score = 0;
    if !brand.is_empty() && (title.contains(&brand) || source.contains(&brand)) {
        score += SHOPPING_BRAND_IN_TEXT;
    }
    score += word_hits(&words, &title) * SHOPPING_TITLE_WORD;

    let prefix: String = product_name.to_lowercase().chars().take(NAME_PREFIX_CHARS).collect();
    if !prefix.is_empty() && title.contains(&prefix) {
        score += SHOPPING_NAME_PREFIX;
    }
    if !brand.is_empty() && link_lower.contains(&brand) {
        score += SHOPPING_BRAND_IN_LINK;
    }

    for retailer in RETAILERS {
        if link_lower.contains(retailer) {
            score -= RETAILER_PENALTY;
        }
    }
    if link_lower.contains("ebay.com") {
        score -= EBAY_PENALTY;
    }
    if !is_specific_product_url(link, product_name) {
        score -= NON_SPECIFIC_PENALTY;
    }
    score
}

/// Score one organic result. Non-specific URLs are excluded outright.
#[must_use]
pub fn score_organic_result(result: &OrganicResult, product_name: &str, brand_name: &str) -> i32 {
    let url = result.link.as_deref().unwrap_or_default();
    if !is_specific_product_url(url, product_name) {
        return NON_SPECIFIC_SCORE;
    }
    let title = result.title.as_deref().unwrap_or_default().to_lowercase();
    let snippet = result.snippet.as_deref().unwrap_or_default().to_lowercase();
    let brand = normalize_brand_key(brand_name);
    let words = significant_words(product_name, 2);

    let mut score = 0;
    if !brand.is_empty() && (url.to_lowercase().contains(&brand) || title.contains(&brand)) {
        score += ORGANIC_BRAND_MATCH;
    }
    score += word_hits(&words, &title) * ORGANIC_TITLE_WORD;
    score += word_hits(&words, &snippet) * ORGANIC_SNIPPET_WORD;
    score
}

fn top_matches(mut scored: Vec<ScoredMatch>, limit: usize) -> Vec<ScoredMatch> {
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored
        .into_iter()
        .filter(|m| m.score >= MIN_MATCH_SCORE)
        .take(limit)
        .collect()
}

/// Best `limit` shopping results at or above the minimum score.
#[must_use]
pub fn shopping_matches(
    results: &[ShoppingResult],
    product_name: &str,
    brand_name: &str,
    limit: usize,
) -> Vec<ScoredMatch> {
    let scored = results
        .iter()
        .filter_map(|r| {
            let url = r.product_url()?;
            Some(ScoredMatch {
                url: url.to_string(),
                image_url: r.thumbnail.clone().filter(|t| !t.is_empty()),
                price: r.display_price(),
                source: r.source.clone(),
                score: score_shopping_result(r, product_name, brand_name),
            })
        })
        .collect();
    top_matches(scored, limit)
}

/// Best `limit` organic results at or above the minimum score.
#[must_use]
pub fn organic_matches(
    results: &[OrganicResult],
    product_name: &str,
    brand_name: &str,
    limit: usize,
) -> Vec<ScoredMatch> {
    let scored = results
        .iter()
        .filter_map(|r| {
            let url = r.link.as_deref().filter(|l| !l.is_empty())?;
            Some(ScoredMatch {
                url: url.to_string(),
                image_url: r.thumbnail.clone().filter(|t| !t.is_empty()),
                price: None,
                source: r.source.clone(),
                score: score_organic_result(r, product_name, brand_name),
            })
        })
        .collect();
    top_matches(scored, limit)
}
