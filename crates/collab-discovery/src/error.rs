use collab_gateway::{GatewayError, ParseError};
use collab_store::StoreError;
use thiserror::Error;

use crate::session::SearchState;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The brand-analysis call returned a non-OK status.
    #[error("Brand analysis failed: {status} - {message}")]
    AnalysisFailed { status: u16, message: String },

    /// The recommendation call returned a non-OK status.
    #[error("Recommendations failed: {status} - {message}")]
    RecommendationFailed { status: u16, message: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not encode prompt input: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid search state transition {from} -> {to}")]
    InvalidTransition { from: SearchState, to: SearchState },

    #[error("no saved results for {0}")]
    NoResults(String),

    #[error("search cancelled")]
    Cancelled,
}
