use crate::app_config::{AppConfig, Environment, OutOfCreditsPolicy};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can pass a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("COLLAB_ENV", "development"))?;
    let log_level = or_default("COLLAB_LOG_LEVEL", "info");

    let proxy_base_url = or_default("COLLAB_PROXY_BASE_URL", "http://127.0.0.1:5500");
    reqwest::Url::parse(&proxy_base_url)
        .map_err(|e| invalid("COLLAB_PROXY_BASE_URL", e.to_string()))?;

    let state_dir = PathBuf::from(or_default("COLLAB_STATE_DIR", "./.collab-state"));
    let user_agent = or_default("COLLAB_USER_AGENT", "collab-finder/0.1 (brand-discovery)");

    let metadata_timeout_secs = parse_u64("COLLAB_METADATA_TIMEOUT_SECS", "5")?;
    let max_retries = parse_u32("COLLAB_MAX_RETRIES", "3")?;
    if max_retries == 0 {
        return Err(invalid(
            "COLLAB_MAX_RETRIES",
            "must allow at least one attempt".to_string(),
        ));
    }
    let retry_backoff_base_ms = parse_u64("COLLAB_RETRY_BACKOFF_BASE_MS", "1000")?;

    let sourcing_max_brands = parse_usize("COLLAB_SOURCING_MAX_BRANDS", "5")?;
    let sourcing_products_per_brand = parse_usize("COLLAB_SOURCING_PRODUCTS_PER_BRAND", "4")?;
    let sourcing_brand_delay_ms = parse_u64("COLLAB_SOURCING_BRAND_DELAY_MS", "100")?;

    let enrich_batch_size = parse_usize("COLLAB_ENRICH_BATCH_SIZE", "5")?;
    if enrich_batch_size == 0 {
        return Err(invalid(
            "COLLAB_ENRICH_BATCH_SIZE",
            "batch size must be positive".to_string(),
        ));
    }
    let enrich_batch_delay_ms = parse_u64("COLLAB_ENRICH_BATCH_DELAY_MS", "100")?;
    let verify_batch_delay_ms = parse_u64("COLLAB_VERIFY_BATCH_DELAY_MS", "200")?;

    let out_of_credits_policy =
        parse_out_of_credits_policy(&or_default("COLLAB_OUT_OF_CREDITS_POLICY", "discard"))?;

    let bind_addr = or_default("COLLAB_BIND_ADDR", "0.0.0.0:5500")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("COLLAB_BIND_ADDR", e.to_string()))?;

    let gemini_model = or_default("COLLAB_GEMINI_MODEL", "gemini-2.0-flash");

    Ok(AppConfig {
        env,
        log_level,
        proxy_base_url,
        state_dir,
        user_agent,
        metadata_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        sourcing_max_brands,
        sourcing_products_per_brand,
        sourcing_brand_delay_ms,
        enrich_batch_size,
        enrich_batch_delay_ms,
        verify_batch_delay_ms,
        out_of_credits_policy,
        bind_addr,
        gemini_model,
        gemini_api_key: optional("GEMINI_API_KEY"),
        serp_api_key: optional("SERP_API_KEY"),
        opengraph_api_key: optional("OPENGRAPH_API_KEY"),
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "COLLAB_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_out_of_credits_policy(s: &str) -> Result<OutOfCreditsPolicy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "discard" => Ok(OutOfCreditsPolicy::Discard),
        "keep" | "keep-partial" | "keep_partial" => Ok(OutOfCreditsPolicy::KeepPartial),
        other => Err(ConfigError::InvalidEnvVar {
            var: "COLLAB_OUT_OF_CREDITS_POLICY".to_string(),
            reason: format!("expected 'discard' or 'keep', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
