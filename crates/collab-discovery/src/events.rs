//! What a running search reports, and how it ends.

use collab_core::{BrandCandidate, ProductCandidate, SearchResult, SearchedBrandCard};

use crate::session::SearchState;

/// Progress messages in the order a search emits them.
pub const MSG_RESEARCHING: &str = "Researching your brand...";
pub const MSG_ANALYZING: &str = "Analyzing products, audience & market position...";
pub const MSG_RECOMMENDING: &str = "Finding complementary brands...";
pub const MSG_SOURCING: &str = "Finding top products from recommended brands...";
pub const MSG_VERIFYING: &str = "Verifying product recommendations...";
pub const MSG_IMAGES: &str = "Fetching product images...";

#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryEvent {
    /// Phase change before brands are ready.
    Progress { state: SearchState, message: String },
    /// Brands are final; products are still being worked on.
    BrandsReady {
        searched_brand: SearchedBrandCard,
        brands: Vec<BrandCandidate>,
    },
    ProductsProgress { message: String },
    /// Terminal: the result that was (or would be) cached.
    Done(SearchResult),
    /// Terminal: the search failed with this message.
    Failed { message: String },
    /// Terminal: the search was cancelled. Nothing is cached.
    Cancelled { brands_shown: bool },
}

/// Completed search payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryReport {
    pub searched_brand: SearchedBrandCard,
    pub brands: Vec<BrandCandidate>,
    pub products: Vec<ProductCandidate>,
    pub out_of_credits: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryOutcome {
    Completed(DiscoveryReport),
    /// No brands and no products, without a quota problem.
    Empty,
    Failed(String),
    Cancelled { brands_shown: bool },
}

impl DiscoveryOutcome {
    /// Cache entry for this outcome. Cancelled searches have none.
    #[must_use]
    pub fn to_search_result(&self, search_id: &str) -> Option<SearchResult> {
        let search_id = search_id.to_string();
        match self {
            Self::Completed(report) => Some(SearchResult::Results {
                searched_brand: Some(report.searched_brand.clone()),
                brands: report.brands.clone(),
                products: report.products.clone(),
                serp_api_out_of_credits: report.out_of_credits,
                search_id,
            }),
            Self::Empty => Some(SearchResult::Empty { search_id }),
            Self::Failed(message) => Some(SearchResult::Error {
                error_message: message.clone(),
                search_id,
            }),
            Self::Cancelled { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_outcome_is_not_cached() {
        let outcome = DiscoveryOutcome::Cancelled { brands_shown: true };
        assert!(outcome.to_search_result("s1").is_none());
    }

    #[test]
    fn failure_keeps_message() {
        let outcome = DiscoveryOutcome::Failed("Brand analysis failed: 500 - boom".to_string());
        assert_eq!(
            outcome.to_search_result("s1"),
            Some(SearchResult::Error {
                error_message: "Brand analysis failed: 500 - boom".to_string(),
                search_id: "s1".to_string(),
            })
        );
    }

    #[test]
    fn completed_carries_quota_flag() {
        let outcome = DiscoveryOutcome::Completed(DiscoveryReport {
            searched_brand: SearchedBrandCard::default(),
            brands: vec![],
            products: vec![],
            out_of_credits: true,
        });
        match outcome.to_search_result("s2") {
            Some(SearchResult::Results {
                serp_api_out_of_credits,
                search_id,
                ..
            }) => {
                assert!(serp_api_out_of_credits);
                assert_eq!(search_id, "s2");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
