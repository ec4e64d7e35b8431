//! End-to-end discovery runs against wiremock stand-ins for the three proxies.

use std::time::Duration;

use collab_core::{normalize_brand_key, SearchResult};
use collab_discovery::events::{MSG_ANALYZING, MSG_IMAGES, MSG_RECOMMENDING, MSG_RESEARCHING, MSG_SOURCING};
use collab_discovery::{
    perform_search, CancelToken, Discovery, DiscoveryEvent, DiscoveryOutcome, DiscoverySettings,
    ProductStrategy, SearchOptions, SearchRun, SearchSession, SearchState,
};
use collab_gateway::{Gateways, MetadataFetcher, ModelClient, RetryPolicy, SearchGateway, Transport};
use collab_store::Stores;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> Transport {
    Transport::new(
        "collab-test",
        Some(Duration::from_secs(5)),
        RetryPolicy {
            max_retries: 1,
            backoff_base_ms: 0,
        },
    )
    .expect("transport construction should not fail")
}

fn discovery(base: &str) -> Discovery {
    let gateways = Gateways {
        model: ModelClient::new(transport(), base).expect("valid base url"),
        search: SearchGateway::new(transport(), base).expect("valid base url"),
        metadata: MetadataFetcher::new(transport(), base, Duration::from_secs(5))
            .expect("valid base url"),
    };
    let settings = DiscoverySettings {
        sourcing_brand_delay: Duration::ZERO,
        enrich_batch_delay: Duration::ZERO,
        verify_batch_delay: Duration::ZERO,
        ..DiscoverySettings::default()
    };
    Discovery::new(gateways, &settings)
}

fn model_reply(payload: &Value) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": payload.to_string() }] }
        }]
    })
}

async fn mount_analysis(server: &MockServer, name: &str, url: &str) {
    Mock::given(method("POST"))
        .and(path("/gemini-proxy"))
        .and(body_string_contains("brand analyst"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(&json!({
            "brandProfile": {
                "name": name,
                "url": url,
                "description": "A brand people love.",
                "imageUrl": "https://cdn.shopify.com/brand-hero.png"
            }
        }))))
        .mount(server)
        .await;
}

async fn mount_recommendations(server: &MockServer, brands: Value, products: Value) {
    Mock::given(method("POST"))
        .and(path("/gemini-proxy"))
        .and(body_string_contains("collaboration curator"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_reply(&json!({
            "brands": brands,
            "products": products
        }))))
        .mount(server)
        .await;
}

async fn mount_empty_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search-proxy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(server)
        .await;
}

fn two_brands() -> Value {
    json!([
        { "name": "Fishwife", "url": "https://eatfishwife.com", "category": "same-moment" },
        { "name": "Omsom", "url": "omsom.com", "category": "lifestyle-stack" }
    ])
}

async fn drain(mut rx: mpsc::Receiver<DiscoveryEvent>) -> Vec<DiscoveryEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

async fn run(
    discovery: &Discovery,
    input: &str,
    strategy: ProductStrategy,
    cancel: CancelToken,
) -> (DiscoveryOutcome, Vec<DiscoveryEvent>) {
    let (tx, rx) = mpsc::channel(64);
    let mut session = SearchSession::new(input, cancel).with_strategy(strategy);
    let outcome = discovery.discover(&mut session, &[], &tx).await;
    drop(tx);
    (outcome, drain(rx).await)
}

#[tokio::test]
async fn full_run_reports_phases_in_order() {
    let server = MockServer::start().await;
    mount_analysis(&server, "Graza", "https://graza.co").await;
    mount_recommendations(&server, two_brands(), json!([])).await;
    Mock::given(method("GET"))
        .and(path("/search-proxy"))
        .and(query_param("q", "Fishwife"))
        .and(query_param("engine", "google_shopping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "shopping_results": [{
                "title": "Fishwife Smoked Salmon",
                "product_link": "https://eatfishwife.com/products/smoked-salmon",
                "source": "Fishwife",
                "thumbnail": "https://cdn.shopify.com/salmon.jpg",
                "extracted_price": 12.99
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_empty_search(&server).await;
    Mock::given(method("GET"))
        .and(path("/metadata-proxy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let (outcome, events) = run(
        &discovery(&server.uri()),
        "https://www.graza.co/",
        ProductStrategy::Sourcing,
        CancelToken::new(),
    )
    .await;

    let DiscoveryOutcome::Completed(report) = outcome else {
        panic!("expected a completed search, got {outcome:?}");
    };
    assert_eq!(report.searched_brand.name, "Graza");
    assert_eq!(report.brands.len(), 2);
    assert_eq!(report.brands[1].url, "https://omsom.com");
    assert_eq!(report.products.len(), 1);
    assert_eq!(
        report.products[0].url.as_deref(),
        Some("https://eatfishwife.com/products/smoked-salmon")
    );
    assert!(!report.out_of_credits);

    let progress: Vec<(SearchState, &str)> = events
        .iter()
        .filter_map(|e| match e {
            DiscoveryEvent::Progress { state, message } => Some((*state, message.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(
        progress,
        vec![
            (SearchState::Analyzing, MSG_RESEARCHING),
            (SearchState::Analyzing, MSG_ANALYZING),
            (SearchState::Recommending, MSG_RECOMMENDING),
        ]
    );
    let brands_at = events
        .iter()
        .position(|e| matches!(e, DiscoveryEvent::BrandsReady { .. }))
        .expect("brands ready event");
    assert!(matches!(
        &events[brands_at + 1],
        DiscoveryEvent::ProductsProgress { message } if message == MSG_SOURCING
    ));
    assert!(matches!(
        &events[brands_at + 2],
        DiscoveryEvent::ProductsProgress { message } if message == MSG_IMAGES
    ));
    assert!(matches!(events.last(), Some(DiscoveryEvent::Done(SearchResult::Results { .. }))));
}

#[tokio::test]
async fn quota_exhaustion_stops_sourcing_and_discards_products() {
    let server = MockServer::start().await;
    mount_analysis(&server, "Graza", "https://graza.co").await;
    mount_recommendations(&server, two_brands(), json!([])).await;
    Mock::given(method("GET"))
        .and(path("/search-proxy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Your account has run out of searches."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (outcome, events) = run(
        &discovery(&server.uri()),
        "graza.co",
        ProductStrategy::Sourcing,
        CancelToken::new(),
    )
    .await;

    let DiscoveryOutcome::Completed(report) = outcome else {
        panic!("expected a completed search, got {outcome:?}");
    };
    assert!(report.out_of_credits);
    assert!(report.products.is_empty());
    assert_eq!(report.brands.len(), 2);
    match events.last() {
        Some(DiscoveryEvent::Done(SearchResult::Results {
            serp_api_out_of_credits,
            ..
        })) => assert!(*serp_api_out_of_credits),
        other => panic!("unexpected terminal event {other:?}"),
    }
}

#[tokio::test]
async fn products_without_a_usable_image_are_dropped() {
    let server = MockServer::start().await;
    mount_analysis(&server, "Graza", "https://graza.co").await;
    mount_recommendations(&server, two_brands(), json!([])).await;
    Mock::given(method("GET"))
        .and(path("/search-proxy"))
        .and(query_param("q", "Fishwife"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "shopping_results": [
                {
                    "title": "Fishwife Smoked Salmon",
                    "product_link": "https://eatfishwife.com/products/smoked-salmon",
                    "thumbnail": "https://cdn.shopify.com/salmon.jpg"
                },
                {
                    "title": "Fishwife Gift Box",
                    "product_link": "https://eatfishwife.com/products/gift-box",
                    "thumbnail": "https://eatfishwife.com/thumb"
                }
            ]
        })))
        .mount(&server)
        .await;
    mount_empty_search(&server).await;
    Mock::given(method("GET"))
        .and(path("/metadata-proxy"))
        .and(query_param("url", "https://eatfishwife.com/products/smoked-salmon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metadata-proxy"))
        .and(query_param("url", "https://eatfishwife.com/products/gift-box"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "imageUrl": null,
            "faviconUrl": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (outcome, _) = run(
        &discovery(&server.uri()),
        "graza.co",
        ProductStrategy::Sourcing,
        CancelToken::new(),
    )
    .await;

    let DiscoveryOutcome::Completed(report) = outcome else {
        panic!("expected a completed search, got {outcome:?}");
    };
    let names: Vec<&str> = report.products.iter().map(|p| p.product_name.as_str()).collect();
    assert_eq!(names, vec!["Fishwife Smoked Salmon"]);
}

#[tokio::test]
async fn analysis_failure_is_reported_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gemini-proxy"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Gemini API request failed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stores = Stores::in_memory();
    let (tx, rx) = mpsc::channel(64);
    let run = perform_search(
        &discovery(&server.uri()),
        &stores,
        "graza.co",
        SearchOptions::default(),
        CancelToken::new(),
        &tx,
    )
    .await;
    drop(tx);
    let events = drain(rx).await;

    let expected = "Brand analysis failed: 500 - Gemini API request failed";
    match run {
        SearchRun::Ran {
            outcome: DiscoveryOutcome::Failed(message),
            ..
        } => assert_eq!(message, expected),
        other => panic!("unexpected run {other:?}"),
    }
    assert!(matches!(
        events.last(),
        Some(DiscoveryEvent::Failed { message }) if message == expected
    ));
    assert!(matches!(
        stores.cache.get("graza.co").unwrap(),
        Some(SearchResult::Error { error_message, .. }) if error_message == expected
    ));
}

#[tokio::test]
async fn cancelled_search_makes_no_calls_and_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gemini-proxy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let stores = Stores::in_memory();
    let cancel = CancelToken::new();
    cancel.cancel();
    let (tx, rx) = mpsc::channel(64);
    let run = perform_search(
        &discovery(&server.uri()),
        &stores,
        "graza.co",
        SearchOptions::default(),
        cancel,
        &tx,
    )
    .await;
    drop(tx);
    let events = drain(rx).await;

    assert!(matches!(
        run,
        SearchRun::Ran {
            outcome: DiscoveryOutcome::Cancelled { brands_shown: false },
            ..
        }
    ));
    assert_eq!(events, vec![DiscoveryEvent::Cancelled { brands_shown: false }]);
    assert!(stores.cache.get("graza.co").unwrap().is_none());
    assert_eq!(stores.history.list().unwrap()[0].domain, "graza.co");
}

#[tokio::test]
async fn cancelling_after_brands_keeps_them_and_caches_nothing() {
    let server = MockServer::start().await;
    mount_analysis(&server, "Graza", "https://graza.co").await;
    mount_recommendations(&server, two_brands(), json!([])).await;
    Mock::given(method("GET"))
        .and(path("/search-proxy"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let stores = Stores::in_memory();
    let cancel = CancelToken::new();
    let (tx, mut rx) = mpsc::channel(64);
    let listener = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let mut events = Vec::new();
            while let Some(event) = rx.recv().await {
                if matches!(event, DiscoveryEvent::BrandsReady { .. }) {
                    cancel.cancel();
                }
                events.push(event);
            }
            events
        }
    });

    let run = perform_search(
        &discovery(&server.uri()),
        &stores,
        "graza.co",
        SearchOptions::default(),
        cancel,
        &tx,
    )
    .await;
    drop(tx);
    let events = listener.await.expect("event listener");

    assert!(matches!(
        run,
        SearchRun::Ran {
            outcome: DiscoveryOutcome::Cancelled { brands_shown: true },
            ..
        }
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, DiscoveryEvent::BrandsReady { brands, .. } if brands.len() == 2)));
    assert_eq!(
        events.last(),
        Some(&DiscoveryEvent::Cancelled { brands_shown: true })
    );
    assert!(!events.iter().any(|e| matches!(e, DiscoveryEvent::Done(_))));
    assert!(!events.iter().any(
        |e| matches!(e, DiscoveryEvent::ProductsProgress { message } if message == MSG_IMAGES)
    ));
    assert!(stores.cache.get("graza.co").unwrap().is_none());
}

#[tokio::test]
async fn cancelling_during_analysis_returns_without_waiting_for_the_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gemini-proxy"))
        .and(body_string_contains("brand analyst"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/gemini-proxy"))
        .and(body_string_contains("collaboration curator"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancelToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        }
    });

    let (outcome, events) = tokio::time::timeout(
        Duration::from_secs(2),
        run(&discovery(&server.uri()), "graza.co", ProductStrategy::Sourcing, cancel),
    )
    .await
    .expect("cancellation should interrupt the in-flight model call");

    assert_eq!(outcome, DiscoveryOutcome::Cancelled { brands_shown: false });
    assert_eq!(
        events,
        vec![
            DiscoveryEvent::Progress {
                state: SearchState::Analyzing,
                message: MSG_RESEARCHING.to_string(),
            },
            DiscoveryEvent::Cancelled { brands_shown: false },
        ]
    );
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_work() {
    let server = MockServer::start().await;
    let stores = Stores::in_memory();
    let (tx, rx) = mpsc::channel(64);

    let run = perform_search(
        &discovery(&server.uri()),
        &stores,
        "not a domain",
        SearchOptions::default(),
        CancelToken::new(),
        &tx,
    )
    .await;
    drop(tx);
    let events = drain(rx).await;

    assert_eq!(
        run,
        SearchRun::Rejected {
            input: "not a domain".to_string()
        }
    );
    assert!(events.is_empty());
    assert!(stores.history.list().unwrap().is_empty());
    assert!(stores.cache.get("not a domain").unwrap().is_none());
    assert_eq!(server.received_requests().await.map_or(0, |r| r.len()), 0);
}

#[tokio::test]
async fn seeded_products_are_verified_against_live_pages() {
    let server = MockServer::start().await;
    mount_analysis(&server, "Graza", "https://graza.co").await;
    mount_recommendations(
        &server,
        two_brands(),
        json!([{
            "productName": "Smoked Salmon (3 tins)",
            "brandName": "Fishwife",
            "brandDomain": "eatfishwife.com",
            "whyThisProduct": "Pairs with olive oil."
        }]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/search-proxy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [{
                "title": "Fishwife Smoked Salmon",
                "link": "https://eatfishwife.com/products/smoked-salmon",
                "snippet": "Smoked salmon from Fishwife"
            }],
            "shopping_results": [{
                "title": "Fishwife Smoked Salmon",
                "product_link": "https://eatfishwife.com/products/smoked-salmon",
                "source": "Fishwife",
                "thumbnail": "https://cdn.shopify.com/salmon.jpg"
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/metadata-proxy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "imageUrl": "https://cdn.shopify.com/salmon.jpg",
            "faviconUrl": null
        })))
        .mount(&server)
        .await;

    let (outcome, events) = run(
        &discovery(&server.uri()),
        "graza.co",
        ProductStrategy::VerifySeeds,
        CancelToken::new(),
    )
    .await;

    let DiscoveryOutcome::Completed(report) = outcome else {
        panic!("expected a completed search, got {outcome:?}");
    };
    assert_eq!(report.products.len(), 1);
    let product = &report.products[0];
    assert!(product.verified);
    assert_eq!(
        product.url.as_deref(),
        Some("https://eatfishwife.com/products/smoked-salmon")
    );
    assert!(product.search_source.is_some());
    assert!(events.iter().any(|e| matches!(
        e,
        DiscoveryEvent::ProductsProgress { message } if message == collab_discovery::events::MSG_VERIFYING
    )));
}

#[tokio::test]
async fn cached_result_is_replayed_without_network() {
    let server = MockServer::start().await;
    mount_analysis(&server, "Graza", "https://graza.co").await;
    mount_recommendations(&server, two_brands(), json!([])).await;
    mount_empty_search(&server).await;

    let discovery = discovery(&server.uri());
    let stores = Stores::in_memory();

    let (tx, rx) = mpsc::channel(64);
    let first = perform_search(&discovery, &stores, "graza.co", SearchOptions::default(), CancelToken::new(), &tx).await;
    drop(tx);
    drain(rx).await;
    let SearchRun::Ran { search_id, .. } = first else {
        panic!("first search should run");
    };
    let calls_after_first = server.received_requests().await.map_or(0, |r| r.len());

    let (tx, rx) = mpsc::channel(64);
    let second = perform_search(&discovery, &stores, "https://www.graza.co", SearchOptions::default(), CancelToken::new(), &tx).await;
    drop(tx);
    let events = drain(rx).await;

    let SearchRun::Replayed(cached) = second else {
        panic!("second search should replay");
    };
    assert_eq!(cached.search_id(), search_id);
    assert_eq!(events, vec![DiscoveryEvent::Done(cached)]);
    assert_eq!(
        server.received_requests().await.map_or(0, |r| r.len()),
        calls_after_first
    );

    let (tx, rx) = mpsc::channel(64);
    let fresh = SearchOptions {
        fresh: true,
        ..SearchOptions::default()
    };
    let third = perform_search(&discovery, &stores, "graza.co", fresh, CancelToken::new(), &tx).await;
    drop(tx);
    drain(rx).await;
    assert!(matches!(third, SearchRun::Ran { .. }));
}

#[tokio::test]
async fn searched_brand_never_recommends_itself() {
    let server = MockServer::start().await;
    mount_analysis(&server, "Patagonia", "https://patagonia.com").await;
    mount_recommendations(
        &server,
        json!([
            { "name": "Patagonia", "url": "https://patagonia.com" },
            { "name": "Patagonia Provisions", "url": "https://patagoniaprovisions.com" },
            { "name": "Fishwife", "url": "https://eatfishwife.com" }
        ]),
        json!([
            { "productName": "Nano Puff", "brandName": "Patagonia" },
            { "productName": "Smoked Salmon", "brandName": "Fishwife" }
        ]),
    )
    .await;
    mount_empty_search(&server).await;

    let (outcome, _) = run(
        &discovery(&server.uri()),
        "https://www.patagonia.com",
        ProductStrategy::Sourcing,
        CancelToken::new(),
    )
    .await;

    let DiscoveryOutcome::Completed(report) = outcome else {
        panic!("expected a completed search, got {outcome:?}");
    };
    assert!(report
        .brands
        .iter()
        .all(|b| !normalize_brand_key(&b.name).contains("patagonia")));
    assert_eq!(report.brands.len(), 1);
    assert_eq!(report.brands[0].name, "Fishwife");
}
