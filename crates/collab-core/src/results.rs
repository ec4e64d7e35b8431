use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::brands::{BrandCandidate, SearchedBrandCard};
use crate::products::ProductCandidate;

/// Cached outcome of one search, keyed by normalized domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchResult {
    #[serde(rename_all = "camelCase")]
    Results {
        #[serde(default)]
        searched_brand: Option<SearchedBrandCard>,
        #[serde(default)]
        brands: Vec<BrandCandidate>,
        #[serde(default)]
        products: Vec<ProductCandidate>,
        #[serde(default)]
        serp_api_out_of_credits: bool,
        search_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Empty { search_id: String },
    #[serde(rename_all = "camelCase")]
    Error {
        error_message: String,
        search_id: String,
    },
}

impl SearchResult {
    #[must_use]
    pub fn search_id(&self) -> &str {
        match self {
            SearchResult::Results { search_id, .. }
            | SearchResult::Empty { search_id }
            | SearchResult::Error { search_id, .. } => search_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub domain: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Positive,
    Negative,
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rating::Positive => write!(f, "positive"),
            Rating::Negative => write!(f, "negative"),
        }
    }
}

impl std::str::FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "up" | "+" => Ok(Rating::Positive),
            "negative" | "down" | "-" => Ok(Rating::Negative),
            other => Err(format!("unknown rating '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntry {
    pub search_id: String,
    pub input_url: String,
    pub results: Vec<FeedbackResult>,
    pub rating: Rating,
    pub timestamp: DateTime<Utc>,
}
