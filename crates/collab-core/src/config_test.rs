use std::collections::HashMap;
use std::env::VarError;

use super::*;
use crate::Upstream;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "COLLAB_ENV"));
}

#[test]
fn build_app_config_uses_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.proxy_base_url, "http://127.0.0.1:5500");
    assert_eq!(cfg.metadata_timeout_secs, 5);
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert_eq!(cfg.sourcing_max_brands, 5);
    assert_eq!(cfg.sourcing_products_per_brand, 4);
    assert_eq!(cfg.sourcing_brand_delay_ms, 100);
    assert_eq!(cfg.enrich_batch_size, 5);
    assert_eq!(cfg.enrich_batch_delay_ms, 100);
    assert_eq!(cfg.verify_batch_delay_ms, 200);
    assert_eq!(cfg.out_of_credits_policy, OutOfCreditsPolicy::Discard);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:5500");
    assert_eq!(cfg.gemini_model, "gemini-2.0-flash");
    assert!(cfg.gemini_api_key.is_none());
    assert!(cfg.serp_api_key.is_none());
    assert!(cfg.opengraph_api_key.is_none());
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("COLLAB_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COLLAB_BIND_ADDR"),
        "expected InvalidEnvVar(COLLAB_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_invalid_proxy_url() {
    let mut map = HashMap::new();
    map.insert("COLLAB_PROXY_BASE_URL", "not a url");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COLLAB_PROXY_BASE_URL"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_retries() {
    let mut map = HashMap::new();
    map.insert("COLLAB_MAX_RETRIES", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COLLAB_MAX_RETRIES"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_batch_size() {
    let mut map = HashMap::new();
    map.insert("COLLAB_ENRICH_BATCH_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COLLAB_ENRICH_BATCH_SIZE"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_numeric_override() {
    let mut map = HashMap::new();
    map.insert("COLLAB_SOURCING_MAX_BRANDS", "8");
    map.insert("COLLAB_RETRY_BACKOFF_BASE_MS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.sourcing_max_brands, 8);
    assert_eq!(cfg.retry_backoff_base_ms, 0);
}

#[test]
fn build_app_config_numeric_invalid() {
    let mut map = HashMap::new();
    map.insert("COLLAB_METADATA_TIMEOUT_SECS", "five");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COLLAB_METADATA_TIMEOUT_SECS"),
        "got: {result:?}"
    );
}

#[test]
fn build_app_config_keep_partial_policy() {
    let mut map = HashMap::new();
    map.insert("COLLAB_OUT_OF_CREDITS_POLICY", "keep");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.out_of_credits_policy, OutOfCreditsPolicy::KeepPartial);
}

#[test]
fn build_app_config_unknown_policy_fails() {
    let mut map = HashMap::new();
    map.insert("COLLAB_OUT_OF_CREDITS_POLICY", "sometimes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "COLLAB_OUT_OF_CREDITS_POLICY"
    ));
}

#[test]
fn blank_credentials_are_treated_as_absent() {
    let mut map = HashMap::new();
    map.insert("SERP_API_KEY", "   ");
    map.insert("GEMINI_API_KEY", "g-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.serp_api_key.is_none());
    assert_eq!(cfg.upstream_key(Upstream::Gemini).unwrap(), "g-key");
    let err = cfg.upstream_key(Upstream::Search).unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "SERP_API_KEY"));
}

#[test]
fn debug_output_redacts_credentials() {
    let mut map = HashMap::new();
    map.insert("OPENGRAPH_API_KEY", "super-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn proxy_url_joins_without_double_slash() {
    let mut map = HashMap::new();
    map.insert("COLLAB_PROXY_BASE_URL", "http://localhost:8080/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.proxy_url(Upstream::Search),
        "http://localhost:8080/search-proxy"
    );
}
