//! Single place that decides whether a search response means the provider's
//! quota is spent.

use reqwest::StatusCode;

const QUOTA_MARKER: &str = "run out of searches";

#[must_use]
pub fn is_quota_message(text: &str) -> bool {
    text.to_ascii_lowercase().contains(QUOTA_MARKER)
}

/// A 429 whose body mentions the quota, or any response whose `error`
/// field does.
#[must_use]
pub fn is_out_of_credits(status: StatusCode, body: &str) -> bool {
    if let Some(message) = error_message(body) {
        if is_quota_message(&message) {
            return true;
        }
    }
    status == StatusCode::TOO_MANY_REQUESTS && is_quota_message(body)
}

/// The `error` field of a JSON body, as a string or `{message}` object.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Object(obj) => obj
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
