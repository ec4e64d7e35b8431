//! Repairs recommended brand URLs from the model's own search citations.

use reqwest::Url;

use collab_core::BrandCandidate;
use collab_gateway::WebSource;

/// Paths at least this long are treated as deep links, not homepages.
const MAX_HOMEPAGE_PATH_LEN: usize = 10;

/// Give brands without a usable URL the homepage of a matching citation.
///
/// A citation matches when its lowercased title contains the brand name, or
/// the brand name contains the title's first word. Brands that already have
/// a usable URL, or find no match, are returned unchanged.
#[must_use]
pub fn reconcile_brand_urls(brands: Vec<BrandCandidate>, citations: &[WebSource]) -> Vec<BrandCandidate> {
    let by_title = citations_by_title(citations);
    if by_title.is_empty() {
        return brands;
    }

    brands
        .into_iter()
        .map(|mut brand| {
            if brand.has_usable_url() {
                return brand;
            }
            if let Some(uri) = match_citation(&brand.name, &by_title) {
                tracing::debug!(brand = %brand.name, url = %uri, "brand URL taken from citation");
                brand.url = uri.to_string();
            }
            brand
        })
        .collect()
}

/// Title/URI pairs in citation order; a repeated title keeps its first
/// position but takes the later URI.
fn citations_by_title(citations: &[WebSource]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for source in citations {
        let (Some(uri), Some(title)) = (source.uri.as_deref(), source.title.as_deref()) else {
            continue;
        };
        if uri.is_empty() || title.is_empty() || uri.contains("google.com/") {
            continue;
        }
        let title = title.to_lowercase();
        let uri = uri.trim().to_string();
        match out.iter_mut().find(|(t, _)| *t == title) {
            Some(existing) => existing.1 = uri,
            None => out.push((title, uri)),
        }
    }
    out
}

fn match_citation<'a>(brand_name: &str, by_title: &'a [(String, String)]) -> Option<&'a str> {
    let name = brand_name.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }
    by_title
        .iter()
        .filter(|(title, _)| {
            let first_word = title.split(' ').next().unwrap_or_default();
            title.contains(&name) || (!first_word.is_empty() && name.contains(first_word))
        })
        .find(|(_, uri)| is_homepage(uri))
        .map(|(_, uri)| uri.as_str())
}

fn is_homepage(uri: &str) -> bool {
    Url::parse(uri).is_ok_and(|u| u.path() == "/" || u.path().len() < MAX_HOMEPAGE_PATH_LEN)
}
