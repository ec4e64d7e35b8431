use serde::{Deserialize, Serialize};

use crate::brands::{handle_opt, lenient_string, SocialLinks};

/// Which search strategy produced a product's URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    /// Shopping results scoped to one recommended brand.
    GoogleShoppingBrand,
    OrganicExactSite,
    OrganicProductsPath,
    Shopping,
    OrganicBuyIntent,
}

impl std::fmt::Display for SearchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::GoogleShoppingBrand => "google_shopping_brand",
            Self::OrganicExactSite => "organic_exact_site",
            Self::OrganicProductsPath => "organic_products_path",
            Self::Shopping => "shopping",
            Self::OrganicBuyIntent => "organic_buy_intent",
        };
        write!(f, "{s}")
    }
}

/// A product suggestion, either seeded by the model or sourced from search results.
///
/// `verified` only ever moves from `false` to `true`; see [`ProductCandidate::mark_verified`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductCandidate {
    #[serde(deserialize_with = "lenient_string")]
    pub product_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub brand_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub brand_domain: String,
    #[serde(deserialize_with = "handle_opt")]
    pub url: Option<String>,
    #[serde(deserialize_with = "handle_opt")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "handle_opt")]
    pub price: Option<String>,
    #[serde(deserialize_with = "handle_opt")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social: Option<SocialLinks>,
    #[serde(deserialize_with = "handle_opt", skip_serializing_if = "Option::is_none")]
    pub why_this_product: Option<String>,
    #[serde(deserialize_with = "handle_opt", skip_serializing_if = "Option::is_none")]
    pub suggested_bundle: Option<String>,
    #[serde(deserialize_with = "handle_opt", skip_serializing_if = "Option::is_none")]
    pub estimated_price: Option<String>,
    pub verified: bool,
    pub search_source: Option<SearchSource>,
}

impl ProductCandidate {
    /// Attach a verified URL and the listing details that came with it.
    pub fn mark_verified(
        &mut self,
        url: String,
        image_url: Option<String>,
        price: Option<String>,
        source: Option<String>,
        search_source: SearchSource,
    ) {
        self.url = Some(url);
        if image_url.is_some() {
            self.image_url = image_url;
        }
        if price.is_some() {
            self.price = price;
        }
        if source.is_some() {
            self.source = source;
        }
        self.search_source = Some(search_source);
        self.verified = true;
    }

    /// Product URL unless it is empty.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}
