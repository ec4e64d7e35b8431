//! Per-search state: identity, the pipeline state machine, and cancellation.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use collab_core::{extract_brand_name, extract_domain};

use crate::error::DiscoveryError;

/// Pipeline phase of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchState {
    Pending,
    Analyzing,
    Recommending,
    BrandsReady,
    SourcingProducts,
    EnrichingImages,
    Done,
    Error,
    Cancelled,
}

impl SearchState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Cancelled)
    }

    /// Whether the pipeline may move from `self` to `next`.
    ///
    /// `Error` and `Cancelled` are reachable from every non-terminal state.
    /// Sourcing may finish directly when the search quota runs out.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(next, Self::Error | Self::Cancelled) {
            return true;
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Analyzing)
                | (Self::Analyzing, Self::Recommending)
                | (Self::Recommending, Self::BrandsReady)
                | (Self::BrandsReady, Self::SourcingProducts)
                | (Self::SourcingProducts, Self::EnrichingImages | Self::Done)
                | (Self::EnrichingImages, Self::Done)
        )
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Recommending => "recommending",
            Self::BrandsReady => "brandsReady",
            Self::SourcingProducts => "sourcingProducts",
            Self::EnrichingImages => "enrichingImages",
            Self::Done => "done",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

struct CancelInner {
    flag: AtomicBool,
    notify: watch::Sender<bool>,
}

/// Cooperative cancellation shared between a search and whoever may stop it.
///
/// Clones observe the same flag.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        let (notify, _) = watch::channel(false);
        Self {
            inner: Arc::new(CancelInner {
                flag: AtomicBool::new(false),
                notify,
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.inner.notify.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Where product results come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductStrategy {
    /// One shopping query per top recommended brand.
    #[default]
    Sourcing,
    /// Verify each model-seeded product with the multi-strategy verifier.
    VerifySeeds,
}

/// One search in flight.
#[derive(Debug)]
pub struct SearchSession {
    id: String,
    domain: String,
    brand_name: String,
    state: SearchState,
    strategy: ProductStrategy,
    brands_shown: bool,
    cancel: CancelToken,
}

impl SearchSession {
    /// Start a session for free-text `input`, normalized to its domain.
    #[must_use]
    pub fn new(input: &str, cancel: CancelToken) -> Self {
        let domain = extract_domain(input);
        let brand_name = extract_brand_name(&domain);
        Self {
            id: Uuid::new_v4().to_string(),
            domain,
            brand_name,
            state: SearchState::Pending,
            strategy: ProductStrategy::default(),
            brands_shown: false,
            cancel,
        }
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: ProductStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[must_use]
    pub fn brand_name(&self) -> &str {
        &self.brand_name
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        self.state
    }

    #[must_use]
    pub fn strategy(&self) -> ProductStrategy {
        self.strategy
    }

    #[must_use]
    pub fn brands_shown(&self) -> bool {
        self.brands_shown
    }

    pub(crate) fn mark_brands_shown(&mut self) {
        self.brands_shown = true;
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail with [`DiscoveryError::Cancelled`] once cancellation was requested.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Cancelled`] if the token has fired.
    pub fn checkpoint(&self) -> Result<(), DiscoveryError> {
        if self.is_cancelled() {
            Err(DiscoveryError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidTransition`] for a move the state
    /// machine does not allow.
    pub fn transition(&mut self, next: SearchState) -> Result<(), DiscoveryError> {
        if !self.state.can_transition_to(next) {
            return Err(DiscoveryError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::info!(search_id = %self.id, from = %self.state, to = %next, "search state");
        self.state = next;
        Ok(())
    }
}
