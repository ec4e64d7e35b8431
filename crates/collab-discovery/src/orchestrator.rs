//! Sequences one search from brand analysis to enriched products.
//!
//! 1. Analyze the searched brand (one grounded model call).
//! 2. Recommend collaborator brands and seed products (second model call).
//! 3. Repair brand URLs from citations and emit `BrandsReady`.
//! 4. Source products (or verify the seeds), honoring the quota policy.
//! 5. Enrich images, dropping imageless products.
//!
//! Model calls race the session's cancel token; every other step checks it
//! at phase boundaries.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use collab_core::{
    AppConfig, BrandCandidate, FeedbackEntry, OutOfCreditsPolicy, ProductCandidate, SearchedBrandCard,
};
use collab_gateway::{GatewayError, Gateways};

use crate::analyzer::analyze_brand;
use crate::enrichment::ImageEnricher;
use crate::error::DiscoveryError;
use crate::events::{
    DiscoveryEvent, DiscoveryOutcome, DiscoveryReport, MSG_ANALYZING, MSG_IMAGES, MSG_RECOMMENDING,
    MSG_RESEARCHING, MSG_SOURCING, MSG_VERIFYING,
};
use crate::grounding::reconcile_brand_urls;
use crate::recommend::{build_feedback_context, recommend};
use crate::session::{CancelToken, ProductStrategy, SearchSession, SearchState};
use crate::sourcing::ProductSourcer;
use crate::verifier::ProductVerifier;

/// Pacing and limits for the product phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub sourcing_max_brands: usize,
    pub sourcing_products_per_brand: usize,
    pub sourcing_brand_delay: Duration,
    pub batch_size: usize,
    pub enrich_batch_delay: Duration,
    pub verify_batch_delay: Duration,
    pub out_of_credits_policy: OutOfCreditsPolicy,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            sourcing_max_brands: 5,
            sourcing_products_per_brand: 4,
            sourcing_brand_delay: Duration::from_millis(100),
            batch_size: 5,
            enrich_batch_delay: Duration::from_millis(100),
            verify_batch_delay: Duration::from_millis(200),
            out_of_credits_policy: OutOfCreditsPolicy::Discard,
        }
    }
}

impl DiscoverySettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            sourcing_max_brands: config.sourcing_max_brands,
            sourcing_products_per_brand: config.sourcing_products_per_brand,
            sourcing_brand_delay: Duration::from_millis(config.sourcing_brand_delay_ms),
            batch_size: config.enrich_batch_size,
            enrich_batch_delay: Duration::from_millis(config.enrich_batch_delay_ms),
            verify_batch_delay: Duration::from_millis(config.verify_batch_delay_ms),
            out_of_credits_policy: config.out_of_credits_policy,
        }
    }
}

/// The discovery pipeline with its service clients.
#[derive(Debug, Clone)]
pub struct Discovery {
    gateways: Gateways,
    sourcer: ProductSourcer,
    verifier: ProductVerifier,
    enricher: ImageEnricher,
    policy: OutOfCreditsPolicy,
}

impl Discovery {
    #[must_use]
    pub fn new(gateways: Gateways, settings: &DiscoverySettings) -> Self {
        let sourcer = ProductSourcer::new(
            gateways.search.clone(),
            settings.sourcing_max_brands,
            settings.sourcing_products_per_brand,
            settings.sourcing_brand_delay,
        );
        let verifier = ProductVerifier::new(
            gateways.search.clone(),
            gateways.metadata.clone(),
            settings.batch_size,
            settings.verify_batch_delay,
        );
        let enricher = ImageEnricher::new(
            gateways.metadata.clone(),
            settings.batch_size,
            settings.enrich_batch_delay,
        );
        Self {
            gateways,
            sourcer,
            verifier,
            enricher,
            policy: settings.out_of_credits_policy,
        }
    }

    /// # Errors
    ///
    /// Returns [`GatewayError`] if the service clients cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        Ok(Self::new(Gateways::from_config(config)?, &DiscoverySettings::from_config(config)))
    }

    #[must_use]
    pub fn verifier(&self) -> &ProductVerifier {
        &self.verifier
    }

    /// Run one search to a terminal outcome, reporting progress on `events`.
    ///
    /// The last event sent is always `Done`, `Failed` or `Cancelled`. Once the
    /// session is cancelled no further progress events are sent.
    pub async fn discover(
        &self,
        session: &mut SearchSession,
        feedback: &[FeedbackEntry],
        events: &mpsc::Sender<DiscoveryEvent>,
    ) -> DiscoveryOutcome {
        let result = self.run(session, feedback, events).await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(_) if session.is_cancelled() => DiscoveryOutcome::Cancelled {
                brands_shown: session.brands_shown(),
            },
            Err(e) => {
                tracing::error!(search_id = %session.id(), error = %e, "discovery failed");
                DiscoveryOutcome::Failed(e.to_string())
            }
        };

        let terminal = match &outcome {
            DiscoveryOutcome::Cancelled { brands_shown } => {
                finish(session, SearchState::Cancelled);
                tracing::info!(search_id = %session.id(), "discovery cancelled");
                Some(DiscoveryEvent::Cancelled {
                    brands_shown: *brands_shown,
                })
            }
            DiscoveryOutcome::Failed(message) => {
                finish(session, SearchState::Error);
                Some(DiscoveryEvent::Failed {
                    message: message.clone(),
                })
            }
            DiscoveryOutcome::Completed(_) | DiscoveryOutcome::Empty => outcome
                .to_search_result(session.id())
                .map(DiscoveryEvent::Done),
        };
        if let Some(event) = terminal {
            send(events, event).await;
        }
        outcome
    }

    async fn run(
        &self,
        session: &mut SearchSession,
        feedback: &[FeedbackEntry],
        events: &mpsc::Sender<DiscoveryEvent>,
    ) -> Result<DiscoveryOutcome, DiscoveryError> {
        let cancel = session.cancel_token().clone();
        let domain = session.domain().to_string();
        let brand_name = session.brand_name().to_string();
        tracing::info!(search_id = %session.id(), domain = %domain, brand = %brand_name, "discovery started");

        session.transition(SearchState::Analyzing)?;
        progress(session, events, MSG_RESEARCHING).await;
        let profile = until_cancelled(&cancel, analyze_brand(&self.gateways.model, &domain)).await?;
        progress(session, events, MSG_ANALYZING).await;
        session.checkpoint()?;

        session.transition(SearchState::Recommending)?;
        progress(session, events, MSG_RECOMMENDING).await;
        let feedback_context = build_feedback_context(feedback);
        let recommendations = until_cancelled(
            &cancel,
            recommend(&self.gateways.model, &profile, &brand_name, &domain, &feedback_context),
        )
        .await?;

        let brands: Vec<BrandCandidate> =
            reconcile_brand_urls(recommendations.brands, &recommendations.citations)
                .into_iter()
                .map(BrandCandidate::with_https)
                .collect();

        let mut searched_brand = SearchedBrandCard::from_profile(&profile, &domain);
        if searched_brand.image_url.is_none() && !searched_brand.url.is_empty() {
            searched_brand.image_url = self.gateways.metadata.fetch_og_image_url(&searched_brand.url).await;
        }
        session.checkpoint()?;

        session.transition(SearchState::BrandsReady)?;
        tracing::info!(search_id = %session.id(), brands = brands.len(), "brands ready");
        send(
            events,
            DiscoveryEvent::BrandsReady {
                searched_brand: searched_brand.clone(),
                brands: brands.clone(),
            },
        )
        .await;
        session.mark_brands_shown();
        session.checkpoint()?;

        session.transition(SearchState::SourcingProducts)?;
        let (mut products, out_of_credits) = match session.strategy() {
            ProductStrategy::Sourcing => {
                products_progress(session, events, MSG_SOURCING).await;
                let sourced = self.sourcer.source(&brands).await;
                (sourced.products, sourced.out_of_credits)
            }
            ProductStrategy::VerifySeeds => {
                products_progress(session, events, MSG_VERIFYING).await;
                let checked = self.verifier.verify_products(recommendations.products).await;
                (checked.verified, checked.out_of_credits)
            }
        };
        if out_of_credits && self.policy == OutOfCreditsPolicy::Discard {
            products.clear();
        }
        session.checkpoint()?;

        if !products.is_empty() {
            session.transition(SearchState::EnrichingImages)?;
            products_progress(session, events, MSG_IMAGES).await;
            products = self.enricher.enrich(products).await;
            attach_brand_socials(&mut products, &brands);
            session.checkpoint()?;
        }

        session.transition(SearchState::Done)?;
        tracing::info!(
            search_id = %session.id(),
            brands = brands.len(),
            products = products.len(),
            out_of_credits,
            "discovery complete"
        );

        if brands.is_empty() && products.is_empty() && !out_of_credits {
            return Ok(DiscoveryOutcome::Empty);
        }
        Ok(DiscoveryOutcome::Completed(DiscoveryReport {
            searched_brand,
            brands,
            products,
            out_of_credits,
        }))
    }
}

/// Race `fut` against cancellation.
async fn until_cancelled<T, F>(cancel: &CancelToken, fut: F) -> Result<T, DiscoveryError>
where
    F: Future<Output = Result<T, DiscoveryError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DiscoveryError::Cancelled),
        result = fut => result,
    }
}

async fn send(events: &mpsc::Sender<DiscoveryEvent>, event: DiscoveryEvent) {
    if events.send(event).await.is_err() {
        tracing::debug!("event receiver dropped");
    }
}

async fn progress(session: &SearchSession, events: &mpsc::Sender<DiscoveryEvent>, message: &str) {
    if session.is_cancelled() {
        return;
    }
    send(
        events,
        DiscoveryEvent::Progress {
            state: session.state(),
            message: message.to_string(),
        },
    )
    .await;
}

async fn products_progress(session: &SearchSession, events: &mpsc::Sender<DiscoveryEvent>, message: &str) {
    if session.is_cancelled() {
        return;
    }
    send(
        events,
        DiscoveryEvent::ProductsProgress {
            message: message.to_string(),
        },
    )
    .await;
}

fn finish(session: &mut SearchSession, state: SearchState) {
    if let Err(e) = session.transition(state) {
        tracing::debug!(error = %e, "terminal transition skipped");
    }
}

/// Give products without social links those of the brand with the same name.
pub(crate) fn attach_brand_socials(products: &mut [ProductCandidate], brands: &[BrandCandidate]) {
    for product in products.iter_mut() {
        if product.social.as_ref().is_some_and(|s| !s.is_empty()) || product.brand_name.is_empty() {
            continue;
        }
        let wanted = product.brand_name.to_lowercase();
        if let Some(brand) = brands
            .iter()
            .find(|b| b.name.to_lowercase() == wanted && !b.social.is_empty())
        {
            product.social = Some(brand.social.clone());
        }
    }
}
