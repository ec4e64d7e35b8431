use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::ensure_https;

/// Collaboration angle a recommended brand is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollabCategory {
    SameMoment,
    SameAesthetic,
    SameValues,
    GiftPairing,
    LifestyleStack,
    UnexpectedDelight,
}

impl CollabCategory {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "same-moment" => Some(Self::SameMoment),
            "same-aesthetic" => Some(Self::SameAesthetic),
            "same-values" => Some(Self::SameValues),
            "gift-pairing" => Some(Self::GiftPairing),
            "lifestyle-stack" => Some(Self::LifestyleStack),
            "unexpected-delight" => Some(Self::UnexpectedDelight),
            _ => None,
        }
    }
}

impl std::fmt::Display for CollabCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SameMoment => "same-moment",
            Self::SameAesthetic => "same-aesthetic",
            Self::SameValues => "same-values",
            Self::GiftPairing => "gift-pairing",
            Self::LifestyleStack => "lifestyle-stack",
            Self::UnexpectedDelight => "unexpected-delight",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrandStage {
    Emerging,
    Growing,
    Established,
}

impl BrandStage {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emerging" => Some(Self::Emerging),
            "growing" => Some(Self::Growing),
            "established" => Some(Self::Established),
            _ => None,
        }
    }
}

impl std::fmt::Display for BrandStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Emerging => write!(f, "emerging"),
            Self::Growing => write!(f, "growing"),
            Self::Established => write!(f, "established"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceRange {
    #[serde(deserialize_with = "lenient_string")]
    pub tier: String,
    #[serde(deserialize_with = "lenient_string")]
    pub typical_price: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductAnalysis {
    #[serde(deserialize_with = "lenient_string")]
    pub primary_category: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub subcategories: Vec<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub hero_products: Vec<String>,
    pub price_range: PriceRange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandDna {
    #[serde(deserialize_with = "lenient_string")]
    pub aesthetic: String,
    #[serde(deserialize_with = "lenient_string")]
    pub personality: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub core_values: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub origin_story: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetCustomer {
    #[serde(deserialize_with = "lenient_string")]
    pub persona: String,
    #[serde(deserialize_with = "lenient_string")]
    pub lifestyle: String,
    #[serde(deserialize_with = "lenient_vec")]
    pub occasions: Vec<String>,
    #[serde(deserialize_with = "lenient_vec")]
    pub adjacent_interests: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketPosition {
    #[serde(deserialize_with = "lenient_vec")]
    pub competitors: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub differentiator: String,
    /// Free text: the profile scale also allows `iconic`.
    #[serde(deserialize_with = "lenient_string")]
    pub brand_stage: String,
}

/// Structured profile of the searched brand, produced once per search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandProfile {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub tagline: String,
    pub product_analysis: ProductAnalysis,
    #[serde(rename = "brandDNA")]
    pub brand_dna: BrandDna,
    pub target_customer: TargetCustomer,
    pub market_position: MarketPosition,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Social handles or URLs. The model writes the literal `"null"` for
/// unknown handles; those deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    #[serde(
        deserialize_with = "handle_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub tiktok: Option<String>,
    #[serde(
        deserialize_with = "handle_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub instagram: Option<String>,
    #[serde(
        deserialize_with = "handle_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub facebook: Option<String>,
}

impl SocialLinks {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiktok.is_none() && self.instagram.is_none() && self.facebook.is_none()
    }
}

/// A recommended collaborator brand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandCandidate {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(deserialize_with = "lenient_category")]
    pub category: Option<CollabCategory>,
    #[serde(deserialize_with = "lenient_stage")]
    pub brand_stage: Option<BrandStage>,
    #[serde(deserialize_with = "lenient_string")]
    pub reason: String,
    #[serde(deserialize_with = "lenient_string")]
    pub bundle_idea: String,
    pub social: SocialLinks,
}

impl BrandCandidate {
    /// Whether `url` already points at a real homepage rather than nothing,
    /// a bare path, or the search engine itself.
    #[must_use]
    pub fn has_usable_url(&self) -> bool {
        self.url.starts_with("http") && !self.url.contains("google.com")
    }

    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.url = ensure_https(&self.url);
        self
    }
}

/// Display card for the searched brand, shown above the recommendations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchedBrandCard {
    pub name: String,
    pub url: String,
    pub image_url: Option<String>,
    pub description: String,
    #[serde(rename = "brandDNA", skip_serializing_if = "Option::is_none")]
    pub brand_dna: Option<BrandDna>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_customer: Option<TargetCustomer>,
}

impl SearchedBrandCard {
    /// Card built from an analyzed profile, falling back to the searched
    /// domain when the profile has no name or URL.
    #[must_use]
    pub fn from_profile(profile: &BrandProfile, domain: &str) -> Self {
        let fallback = build_fallback_searched_brand(domain);
        let name = if profile.name.trim().is_empty() {
            fallback.name
        } else {
            profile.name.clone()
        };
        let url = if profile.url.trim().is_empty() {
            fallback.url
        } else {
            ensure_https(&profile.url)
        };
        let description = if profile.description.trim().is_empty() {
            fallback.description
        } else {
            profile.description.clone()
        };
        Self {
            name,
            url,
            image_url: profile.image_url.clone().filter(|u| !u.is_empty()),
            description,
            brand_dna: Some(profile.brand_dna.clone()),
            target_customer: Some(profile.target_customer.clone()),
        }
    }
}

/// Minimal card for a domain that has no analyzed profile, e.g. when
/// replaying a cache entry written without one.
#[must_use]
pub fn build_fallback_searched_brand(domain: &str) -> SearchedBrandCard {
    let url = if domain.starts_with("http") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    };
    let bare = domain
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let bare = bare.strip_prefix("www.").unwrap_or(bare);
    let label = bare.split('.').next().unwrap_or_default().replace('-', " ");
    let name = title_case(&label);
    let description = format!(
        "{name} is a brand selling online. Visit their website to explore their product range and categories."
    );
    SearchedBrandCard {
        name,
        url,
        image_url: None,
        description,
        brand_dna: None,
        target_customer: None,
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() || c == '_' {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Strings that may arrive as `null`, numbers, or booleans in model output.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// String lists that may arrive as `null`, a single string, or contain non-strings.
pub(crate) fn lenient_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(serde_json::Value::String(s)) if !s.is_empty() => vec![s],
        _ => Vec::new(),
    })
}

fn lenient_category<'de, D>(deserializer: D) -> Result<Option<CollabCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(|s| CollabCategory::parse(&s))
}

fn lenient_stage<'de, D>(deserializer: D) -> Result<Option<BrandStage>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(|s| BrandStage::parse(&s))
}

pub(crate) fn handle_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = lenient_string(deserializer)?;
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
