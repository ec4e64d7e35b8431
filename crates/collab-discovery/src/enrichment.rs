use std::time::Duration;

use futures::future::join_all;

use collab_core::ProductCandidate;
use collab_gateway::{is_valid_image_url, MetadataFetcher};

/// Backfills product images from page metadata and drops products left without one.
#[derive(Debug, Clone)]
pub struct ImageEnricher {
    metadata: MetadataFetcher,
    batch_size: usize,
    batch_delay: Duration,
}

impl ImageEnricher {
    #[must_use]
    pub fn new(metadata: MetadataFetcher, batch_size: usize, batch_delay: Duration) -> Self {
        Self {
            metadata,
            batch_size: batch_size.max(1),
            batch_delay,
        }
    }

    /// Process `products` in batches; a batch finishes before the next starts.
    /// Order is preserved among the products that keep an image.
    pub async fn enrich(&self, products: Vec<ProductCandidate>) -> Vec<ProductCandidate> {
        let total = products.len();
        let mut enriched = Vec::with_capacity(total);
        let mut remaining = products.into_iter().peekable();

        while remaining.peek().is_some() {
            let batch: Vec<ProductCandidate> = remaining.by_ref().take(self.batch_size).collect();
            enriched.extend(join_all(batch.into_iter().map(|p| self.enrich_one(p))).await);
            if remaining.peek().is_some() && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        let (kept, dropped): (Vec<_>, Vec<_>) = enriched.into_iter().partition(has_valid_image);
        if !dropped.is_empty() {
            tracing::debug!(
                dropped = ?dropped.iter().map(|p| p.product_name.as_str()).collect::<Vec<_>>(),
                "dropped products without images"
            );
        }
        tracing::info!(total, kept = kept.len(), "image enrichment finished");
        kept
    }

    async fn enrich_one(&self, mut product: ProductCandidate) -> ProductCandidate {
        if has_valid_image(&product) {
            return product;
        }
        product.image_url = match product.url() {
            Some(url) => self
                .metadata
                .fetch_og_image_url(url)
                .await
                .filter(|image| is_valid_image_url(image)),
            None => None,
        };
        product
    }
}

fn has_valid_image(product: &ProductCandidate) -> bool {
    product.image_url.as_deref().is_some_and(is_valid_image_url)
}
