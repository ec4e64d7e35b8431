//! Shared data model, domain normalization, and configuration for the
//! brand collaboration finder.

pub mod app_config;
pub mod brands;
pub mod config;
pub mod domain;
pub mod products;
pub mod results;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, OutOfCreditsPolicy, Upstream};
pub use brands::{
    build_fallback_searched_brand, BrandCandidate, BrandDna, BrandProfile, BrandStage,
    CollabCategory, MarketPosition, PriceRange, ProductAnalysis, SearchedBrandCard, SocialLinks,
    TargetCustomer,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use domain::{
    ensure_https, extract_brand_name, extract_domain, guess_brand_domain, is_same_brand,
    is_valid_url, normalize_brand_key, normalize_url,
};
pub use products::{ProductCandidate, SearchSource};
pub use results::{FeedbackEntry, FeedbackResult, HistoryEntry, Rating, SearchResult};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
