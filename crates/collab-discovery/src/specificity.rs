//! Pure classification of product-detail URLs versus listing pages.
//!
//! Three tiers, checked in order: known listing shapes are rejected, known
//! product-detail shapes are accepted, and anything else is accepted only if
//! its final path segment is a slug that echoes the product name.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

/// Paths that are listings, categories or the site root.
static LISTING_PATHS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^/products/?$",
        r"^/shop/?$",
        r"^/collections/?$",
        r"^/collections/[^/]+/?$",
        r"^/store/?$",
        r"^/catalog/?$",
        r"^/all/?$",
        r"^/browse/?$",
        r"^/category/[^/]+/?$",
        r"^/?$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Product-detail shapes across common storefronts and marketplaces.
static PRODUCT_PATHS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)/products/[a-z0-9-]{3,}",
        r"(?i)/product/[a-z0-9-]{3,}",
        r"(?i)/p/[a-z0-9-]{3,}",
        r"(?i)/dp/[a-z0-9]{10}",
        r"(?i)/gp/product/[a-z0-9]{10}",
        r"/ip/[^/]+/\d+",
        r"(?i)/-/a-\d{7,}",
        r"/item/\d{5,}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Query parameters that mark a search or filtered listing.
const LISTING_PARAMS: &[&str] = &["q", "query", "search", "filter", "category", "sort", "page"];

/// Marketplace search-result URL fragments.
const MARKETPLACE_SEARCH: &[&str] = &[
    "amazon.com/s?",
    "amazon.com/s/",
    "target.com/s?",
    "walmart.com/search",
    "google.com/search",
];

const MIN_SLUG_LEN: usize = 6;
const MIN_SLUG_MATCHES: usize = 2;

/// Lowercase ASCII words of `text` longer than `min_len`, punctuation removed.
#[must_use]
pub fn significant_words(text: &str, min_len: usize) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    cleaned
        .split_whitespace()
        .filter(|w| w.len() > min_len)
        .map(str::to_string)
        .collect()
}

/// Whether `url` points at a single product page for `product_name`.
#[must_use]
pub fn is_specific_product_url(url: &str, product_name: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path().to_lowercase();
    let full = url.to_lowercase();

    if LISTING_PATHS.iter().any(|re| re.is_match(&path)) {
        return false;
    }
    if parsed
        .query_pairs()
        .any(|(key, _)| LISTING_PARAMS.contains(&key.as_ref()))
    {
        return false;
    }
    if MARKETPLACE_SEARCH.iter().any(|m| full.contains(m)) {
        return false;
    }

    if PRODUCT_PATHS
        .iter()
        .any(|re| re.is_match(&path) || re.is_match(&full))
    {
        return true;
    }

    slug_matches_name(&path, product_name)
}

fn slug_matches_name(path: &str, product_name: &str) -> bool {
    let last = path.split('/').rfind(|s| !s.is_empty()).unwrap_or_default();
    if last.len() < MIN_SLUG_LEN || !last.contains('-') {
        return false;
    }

    let product_words = significant_words(product_name, 3);
    if product_words.is_empty() {
        return false;
    }
    let slug_words: Vec<&str> = last.split('-').filter(|w| w.len() > 2).collect();
    let matching = product_words
        .iter()
        .filter(|pw| {
            slug_words
                .iter()
                .any(|sw| sw.contains(pw.as_str()) || pw.contains(sw))
        })
        .count();

    matching >= MIN_SLUG_MATCHES || matching * 2 >= product_words.len()
}
