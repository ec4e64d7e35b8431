//! Reduce a raw page-metadata payload to the `{imageUrl, faviconUrl}` shape
//! the client reads.

use collab_gateway::OpenGraphData;
use serde_json::Value;

/// Image sources, most trusted first.
const IMAGE_SOURCES: [&str; 3] = ["hybridGraph", "openGraph", "htmlInferred"];

/// Favicon sources, most trusted first.
const FAVICON_SOURCES: [&str; 2] = ["hybridGraph", "htmlInferred"];

#[must_use]
pub fn adapt_metadata(data: &Value) -> OpenGraphData {
    let image_url = IMAGE_SOURCES
        .iter()
        .find_map(|section| data.get(section).and_then(|s| s.get("image")).and_then(image_ref))
        .or_else(|| data.get("image").and_then(image_ref));

    let favicon_url = FAVICON_SOURCES.iter().find_map(|section| {
        data.get(section)
            .and_then(|s| s.get("favicon"))
            .and_then(Value::as_str)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
    });

    OpenGraphData {
        image_url,
        favicon_url,
    }
}

/// An image given either as a URL string or as an object with a `url` field.
fn image_ref(value: &Value) -> Option<String> {
    let url = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("url")?.as_str()?,
        _ => return None,
    };
    (!url.is_empty()).then(|| url.to_string())
}
