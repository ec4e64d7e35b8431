use chrono::Utc;
use collab_core::{FeedbackResult, Rating};
use serde_json::json;

use super::*;

fn product(name: &str, brand: &str) -> ProductCandidate {
    ProductCandidate {
        product_name: name.to_string(),
        brand_name: brand.to_string(),
        ..ProductCandidate::default()
    }
}

fn feedback(rating: Rating, names: &[&str]) -> FeedbackEntry {
    FeedbackEntry {
        search_id: "s".to_string(),
        input_url: "acme.com".to_string(),
        results: names
            .iter()
            .map(|n| FeedbackResult {
                name: (*n).to_string(),
                url: format!("https://{}.com", n.to_lowercase()),
            })
            .collect(),
        rating,
        timestamp: Utc::now(),
    }
}

#[test]
fn source_brand_products_are_removed() {
    let products = vec![
        product("Trail Jacket", "Patagonia"),
        product("Provisions Salmon", "Patagonia Provisions"),
        product("Hot Sauce", "Fly By Jing"),
    ];
    let kept = filter_source_brand_products(products, "patagonia");
    let names: Vec<_> = kept.iter().map(|p| p.product_name.as_str()).collect();
    assert_eq!(names, vec!["Hot Sauce"]);

    let again = filter_source_brand_products(kept.clone(), "patagonia");
    assert_eq!(again, kept);
}

#[test]
fn products_without_a_brand_name_are_removed() {
    let products = vec![
        product("Mystery Item", ""),
        product("Odd Item", " - "),
        product("Hot Sauce", "Fly By Jing"),
    ];
    let kept = filter_source_brand_products(products, "patagonia");
    let names: Vec<_> = kept.iter().map(|p| p.product_name.as_str()).collect();
    assert_eq!(names, vec!["Hot Sauce"]);
}

#[test]
fn containment_works_in_both_directions() {
    let kept = filter_source_brand_products(vec![product("Tin", "Fishwife")], "eat fishwife");
    assert!(kept.is_empty());
}

#[test]
fn empty_feedback_gives_empty_context() {
    assert_eq!(build_feedback_context(&[]), "");
}

#[test]
fn feedback_context_lists_recent_names() {
    let entries = vec![
        feedback(Rating::Positive, &["Graza", "Fishwife"]),
        feedback(Rating::Negative, &["Generic Co"]),
    ];
    let context = build_feedback_context(&entries);
    assert_eq!(
        context,
        "\n\nHISTORICAL FEEDBACK (use to improve relevance):\n\
         Users responded positively to brands like: Graza, Fishwife\n\
         Users responded negatively to brands like: Generic Co\n\
         Optimize for brands similar to positive examples.\n"
    );
}

#[test]
fn feedback_context_keeps_last_twenty_positive_names() {
    let names: Vec<String> = (0..25).map(|i| format!("Brand{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let context = build_feedback_context(&[feedback(Rating::Positive, &refs)]);
    assert!(!context.contains("Brand4,"));
    assert!(context.contains("like: Brand5, Brand6"));
    assert!(context.contains("Brand24\n"));
    assert!(!context.contains("negatively"));
}

#[test]
fn unreadable_entries_are_skipped() {
    let recommendations = recommendations_from_value(json!({
        "brands": [
            { "name": "Fishwife", "url": "https://eatfishwife.com", "category": "same-moment", "brandStage": "emerging" },
            null,
            { "name": "" }
        ],
        "products": [
            { "productName": "Smoked Salmon", "brandName": "Fishwife" },
            "oops"
        ]
    }));
    assert_eq!(recommendations.brands.len(), 1);
    assert_eq!(recommendations.brands[0].name, "Fishwife");
    assert_eq!(recommendations.products.len(), 1);
}

#[test]
fn missing_sections_yield_empty_lists() {
    let recommendations = recommendations_from_value(json!({ "note": "nothing" }));
    assert!(recommendations.brands.is_empty());
    assert!(recommendations.products.is_empty());
}
