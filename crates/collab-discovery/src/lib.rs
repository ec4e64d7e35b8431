//! Collaboration discovery pipeline.
//!
//! Turns a brand URL into a profile of the brand, a list of complementary
//! brands to collaborate with, and purchasable products from those brands.
//! Two grounded model calls produce the profile and the recommendations;
//! the search and metadata proxies supply real product links and images.
//! Searches are cached per domain and can be cancelled at any point.

pub mod analyzer;
pub mod enrichment;
pub mod error;
pub mod events;
pub mod feedback;
pub mod grounding;
pub mod orchestrator;
pub mod prompts;
pub mod recommend;
pub mod scoring;
pub mod search;
pub mod session;
pub mod sourcing;
pub mod specificity;
pub mod verifier;

pub use analyzer::analyze_brand;
pub use error::DiscoveryError;
pub use events::{DiscoveryEvent, DiscoveryOutcome, DiscoveryReport};
pub use feedback::record_feedback;
pub use orchestrator::{Discovery, DiscoverySettings};
pub use recommend::{build_feedback_context, recommend, Recommendations};
pub use search::{perform_search, SearchOptions, SearchRun};
pub use session::{CancelToken, ProductStrategy, SearchSession, SearchState};
pub use specificity::is_specific_product_url;
pub use verifier::{ProductVerifier, VerificationOutcome};
