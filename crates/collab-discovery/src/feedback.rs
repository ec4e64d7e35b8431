use chrono::Utc;

use collab_core::{extract_domain, FeedbackEntry, FeedbackResult, Rating, SearchResult};
use collab_store::Stores;

use crate::error::DiscoveryError;

/// Rate the cached brand results for `input` and append the rating to the
/// feedback log.
///
/// # Errors
///
/// - [`DiscoveryError::NoResults`] if the domain has no cached brand results.
/// - [`DiscoveryError::Store`] if the log cannot be read or written.
pub fn record_feedback(stores: &Stores, input: &str, rating: Rating) -> Result<FeedbackEntry, DiscoveryError> {
    let domain = extract_domain(input);
    let Some(SearchResult::Results { brands, search_id, .. }) = stores.cache.get(&domain)? else {
        return Err(DiscoveryError::NoResults(domain));
    };

    let entry = FeedbackEntry {
        search_id,
        input_url: domain,
        results: brands
            .into_iter()
            .map(|b| FeedbackResult { name: b.name, url: b.url })
            .collect(),
        rating,
        timestamp: Utc::now(),
    };
    let total = stores.feedback.record(entry.clone())?;
    tracing::info!(domain = %entry.input_url, rating = %rating, total, "feedback recorded");
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use collab_core::BrandCandidate;

    use super::*;

    #[test]
    fn feedback_needs_cached_results() {
        let stores = Stores::in_memory();
        let err = record_feedback(&stores, "acme.com", Rating::Positive).unwrap_err();
        assert!(matches!(err, DiscoveryError::NoResults(d) if d == "acme.com"));
    }

    #[test]
    fn feedback_records_brand_names() {
        let stores = Stores::in_memory();
        stores
            .cache
            .put(
                "acme.com",
                &SearchResult::Results {
                    searched_brand: None,
                    brands: vec![BrandCandidate {
                        name: "Fishwife".to_string(),
                        url: "https://eatfishwife.com".to_string(),
                        ..BrandCandidate::default()
                    }],
                    products: vec![],
                    serp_api_out_of_credits: false,
                    search_id: "s9".to_string(),
                },
            )
            .unwrap();

        let entry = record_feedback(&stores, "https://www.acme.com/", Rating::Negative).unwrap();
        assert_eq!(entry.search_id, "s9");
        assert_eq!(entry.results[0].name, "Fishwife");
        let log = stores.feedback.entries().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].rating, Rating::Negative);
    }
}
