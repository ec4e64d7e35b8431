//! Plain-text rendering of discovery events and cached results.

use std::fmt::Write as _;

use collab_core::{BrandCandidate, ProductCandidate, SearchResult, SearchedBrandCard};
use collab_discovery::DiscoveryEvent;

pub(crate) const OUT_OF_CREDITS_NOTICE: &str =
    "Search credits are exhausted; product results are unavailable right now.";

pub(crate) const EMPTY_NOTICE: &str = "No collaboration partners found for this brand.";

/// Text for one event. `brands_printed` tracks whether the brand list is
/// already on screen so `Done` only adds what is new.
pub(crate) fn render_event(event: &DiscoveryEvent, brands_printed: &mut bool) -> Option<String> {
    match event {
        DiscoveryEvent::Progress { message, .. } | DiscoveryEvent::ProductsProgress { message } => {
            Some(format!("... {message}"))
        }
        DiscoveryEvent::BrandsReady {
            searched_brand,
            brands,
        } => {
            *brands_printed = true;
            Some(render_brands(searched_brand, brands))
        }
        DiscoveryEvent::Done(result) => {
            let text = match result {
                SearchResult::Results {
                    products,
                    serp_api_out_of_credits,
                    ..
                } if *brands_printed => render_products(products, *serp_api_out_of_credits),
                other => render_result(other),
            };
            Some(text)
        }
        DiscoveryEvent::Cancelled { brands_shown } => Some(if *brands_shown {
            "Search cancelled; the brands above are kept.".to_string()
        } else {
            "Search cancelled.".to_string()
        }),
        // Reported as the command's error.
        DiscoveryEvent::Failed { .. } => None,
    }
}

pub(crate) fn render_result(result: &SearchResult) -> String {
    match result {
        SearchResult::Results {
            searched_brand,
            brands,
            products,
            serp_api_out_of_credits,
            ..
        } => {
            let mut out = match searched_brand {
                Some(card) => render_brands(card, brands),
                None => render_brand_list(brands),
            };
            out.push('\n');
            out.push_str(&render_products(products, *serp_api_out_of_credits));
            out
        }
        SearchResult::Empty { .. } => EMPTY_NOTICE.to_string(),
        SearchResult::Error { error_message, .. } => format!("Previous search failed: {error_message}"),
    }
}

fn render_brands(card: &SearchedBrandCard, brands: &[BrandCandidate]) -> String {
    let mut out = format!("{} <{}>\n", card.name, card.url);
    if !card.description.is_empty() {
        let _ = writeln!(out, "{}", card.description);
    }
    out.push('\n');
    out.push_str(&render_brand_list(brands));
    out
}

fn render_brand_list(brands: &[BrandCandidate]) -> String {
    let mut out = format!("Recommended collaborators ({}):\n", brands.len());
    for (i, brand) in brands.iter().enumerate() {
        let _ = write!(out, "{:>3}. {}", i + 1, brand.name);
        if let Some(category) = brand.category {
            let _ = write!(out, " [{category}]");
        }
        if !brand.url.is_empty() {
            let _ = write!(out, " <{}>", brand.url);
        }
        out.push('\n');
        if !brand.reason.is_empty() {
            let _ = writeln!(out, "     {}", brand.reason);
        }
        if !brand.bundle_idea.is_empty() {
            let _ = writeln!(out, "     Bundle: {}", brand.bundle_idea);
        }
    }
    out
}

fn render_products(products: &[ProductCandidate], out_of_credits: bool) -> String {
    if out_of_credits && products.is_empty() {
        return OUT_OF_CREDITS_NOTICE.to_string();
    }
    let mut out = format!("Products ({}):\n", products.len());
    for product in products {
        let _ = write!(out, "  - {}", product.product_name);
        if !product.brand_name.is_empty() {
            let _ = write!(out, " by {}", product.brand_name);
        }
        if let Some(price) = product.price.as_deref().or(product.estimated_price.as_deref()) {
            let _ = write!(out, " ({price})");
        }
        if let Some(url) = product.url() {
            let _ = write!(out, "\n    {url}");
        }
        out.push('\n');
    }
    if out_of_credits {
        out.push_str(OUT_OF_CREDITS_NOTICE);
        out.push('\n');
    }
    out
}
