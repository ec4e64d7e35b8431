//! Handlers for `discover`, `feedback` and `verify`.

use anyhow::Context;
use collab_core::{extract_domain, AppConfig, ProductCandidate, Rating};
use collab_discovery::{
    perform_search, record_feedback, CancelToken, Discovery, DiscoveryError, DiscoveryEvent,
    DiscoveryOutcome, ProductStrategy, SearchOptions, SearchRun,
};
use collab_store::Stores;
use tokio::sync::mpsc;

use crate::render::render_event;

const EVENT_BUFFER: usize = 32;

pub(crate) async fn run_discover(
    config: &AppConfig,
    stores: &Stores,
    url: &str,
    fresh: bool,
    verify_seeds: bool,
) -> anyhow::Result<()> {
    let discovery = Discovery::from_config(config).context("failed to build service clients")?;
    let options = SearchOptions {
        fresh,
        strategy: if verify_seeds {
            ProductStrategy::VerifySeeds
        } else {
            ProductStrategy::Sourcing
        },
    };

    let cancel = CancelToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling search");
                cancel.cancel();
            }
        }
    });

    let (tx, mut rx) = mpsc::channel::<DiscoveryEvent>(EVENT_BUFFER);
    let printer = tokio::spawn(async move {
        let mut brands_printed = false;
        while let Some(event) = rx.recv().await {
            if let Some(text) = render_event(&event, &mut brands_printed) {
                println!("{text}");
            }
        }
    });

    let run = perform_search(&discovery, stores, url, options, cancel, &tx).await;
    drop(tx);
    interrupt.abort();
    printer.await.context("event printer panicked")?;

    match run {
        SearchRun::Rejected { input } => {
            anyhow::bail!("'{input}' is not a valid brand URL (e.g. graza.co)")
        }
        SearchRun::Replayed(_) => {
            println!("(cached result, use --fresh to search again)");
            Ok(())
        }
        SearchRun::Ran {
            outcome: DiscoveryOutcome::Failed(message),
            ..
        } => anyhow::bail!(message),
        SearchRun::Ran { .. } => Ok(()),
    }
}

pub(crate) fn run_feedback(stores: &Stores, domain: &str, rating: Rating) -> anyhow::Result<()> {
    let domain = extract_domain(domain);
    let entry = match record_feedback(stores, &domain, rating) {
        Err(DiscoveryError::NoResults(_)) => {
            anyhow::bail!("no saved results for {domain}; run `collab-cli discover {domain}` first")
        }
        other => other.with_context(|| format!("failed to record feedback for {domain}"))?,
    };
    println!(
        "Recorded {} feedback for {} ({} results)",
        entry.rating,
        entry.input_url,
        entry.results.len()
    );
    Ok(())
}

pub(crate) async fn run_verify(
    config: &AppConfig,
    product: &str,
    brand: &str,
    domain: Option<&str>,
) -> anyhow::Result<()> {
    let discovery = Discovery::from_config(config).context("failed to build service clients")?;
    let candidate = ProductCandidate {
        product_name: product.to_string(),
        brand_name: brand.to_string(),
        brand_domain: domain.map(extract_domain).unwrap_or_default(),
        ..ProductCandidate::default()
    };

    let verified = discovery
        .verifier()
        .verify_product(candidate)
        .await
        .context("product verification failed")?;

    match verified.url() {
        Some(url) if verified.verified => {
            println!("{} by {}", verified.product_name, verified.brand_name);
            println!("  {url}");
            if let Some(price) = verified.price.as_deref() {
                println!("  {price}");
            }
            if let Some(image) = verified.image_url.as_deref() {
                println!("  image: {image}");
            }
        }
        _ => println!("No live product page found for {product} by {brand}"),
    }
    Ok(())
}
