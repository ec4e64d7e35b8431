//! A full search as the session sees it: cache replay, history, discovery,
//! and the cache write.

use tokio::sync::mpsc;

use collab_core::{build_fallback_searched_brand, extract_domain, is_valid_url, SearchResult};
use collab_store::Stores;

use crate::events::{DiscoveryEvent, DiscoveryOutcome};
use crate::orchestrator::Discovery;
use crate::session::{CancelToken, ProductStrategy, SearchSession};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Ignore any cached result for the domain.
    pub fresh: bool,
    pub strategy: ProductStrategy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchRun {
    /// The input is not a plausible domain; nothing was read, written or fetched.
    Rejected { input: String },
    /// Served from the session cache; no network calls were made.
    Replayed(SearchResult),
    Ran {
        search_id: String,
        outcome: DiscoveryOutcome,
    },
}

/// Search for collaborators of the brand behind `input`.
///
/// Input that is not a plausible domain is rejected before any cache,
/// history or network work. A cached entry for the domain is replayed
/// unless `options.fresh` is set. Otherwise the domain moves to the front of the history, discovery runs,
/// and every non-cancelled outcome is cached. Store failures are logged and
/// never fail the search.
pub async fn perform_search(
    discovery: &Discovery,
    stores: &Stores,
    input: &str,
    options: SearchOptions,
    cancel: CancelToken,
    events: &mpsc::Sender<DiscoveryEvent>,
) -> SearchRun {
    if !is_valid_url(input) {
        tracing::warn!(input, "rejected search input that is not a domain");
        return SearchRun::Rejected {
            input: input.trim().to_string(),
        };
    }
    let domain = extract_domain(input);

    if !options.fresh {
        if let Some(cached) = cached_result(stores, &domain) {
            tracing::info!(domain = %domain, search_id = %cached.search_id(), "replaying cached result");
            if events.send(DiscoveryEvent::Done(cached.clone())).await.is_err() {
                tracing::debug!("event receiver dropped");
            }
            return SearchRun::Replayed(cached);
        }
    }

    if let Err(e) = stores.history.add(&domain) {
        tracing::warn!(domain = %domain, error = %e, "could not update search history");
    }
    let feedback = stores.feedback.entries().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read feedback log");
        Vec::new()
    });

    let mut session = SearchSession::new(&domain, cancel).with_strategy(options.strategy);
    let outcome = discovery.discover(&mut session, &feedback, events).await;

    if let Some(result) = outcome.to_search_result(session.id()) {
        if let Err(e) = stores.cache.put(&domain, &result) {
            tracing::warn!(domain = %domain, error = %e, "could not cache search result");
        }
    }

    SearchRun::Ran {
        search_id: session.id().to_string(),
        outcome,
    }
}

/// Cached entry for `domain`, with a fallback card filled in for results
/// saved without one.
fn cached_result(stores: &Stores, domain: &str) -> Option<SearchResult> {
    let cached = match stores.cache.get(domain) {
        Ok(cached) => cached?,
        Err(e) => {
            tracing::warn!(domain, error = %e, "could not read result cache");
            return None;
        }
    };
    Some(match cached {
        SearchResult::Results {
            searched_brand: None,
            brands,
            products,
            serp_api_out_of_credits,
            search_id,
        } => SearchResult::Results {
            searched_brand: Some(build_fallback_searched_brand(domain)),
            brands,
            products,
            serp_api_out_of_credits,
            search_id,
        },
        other => other,
    })
}
