//! Image URL allow-list and URL helpers for preview images.

/// File extensions and CDN hostname fragments that mark a URL as an image.
const IMAGE_MARKERS: &[&str] = &[
    ".jpg",
    ".jpeg",
    ".png",
    ".webp",
    ".gif",
    ".avif",
    ".svg",
    "cdn.shopify.com",
    "images.squarespace",
    "cloudinary.com",
    "imgix.net",
    "cdn.sanity.io",
    "images.ctfassets.net",
    "gstatic.com/shopping",
    "encrypted-tbn",
    "googleusercontent.com",
    "amazonaws.com",
    "cloudfront.net",
    "akamaized.net",
    "fastly.net",
    "imgix.",
    "scene7.com",
];

/// Favicon size used when a page has no preview image.
pub const FAVICON_SIZE_LARGE: u32 = 256;

/// Whether `url` plausibly points at an image rather than an HTML page.
#[must_use]
pub fn is_valid_image_url(url: &str) -> bool {
    if !url.starts_with("http") {
        return false;
    }
    let lower = url.to_ascii_lowercase();
    IMAGE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Favicon-service URL for `domain` at `size` pixels.
#[must_use]
pub fn favicon_url(domain: &str, size: u32) -> String {
    format!("https://www.google.com/s2/favicons?domain={domain}&sz={size}")
}

/// Resolve a possibly relative image reference against the page it came from.
#[must_use]
pub fn resolve_url(image_url: &str, base_url: &str) -> Option<String> {
    if image_url.is_empty() {
        return None;
    }
    if image_url.starts_with("http") {
        return Some(image_url.to_string());
    }
    if image_url.starts_with("//") {
        return Some(format!("https:{image_url}"));
    }
    let Ok(base) = reqwest::Url::parse(base_url) else {
        return Some(image_url.to_string());
    };
    let origin = base.origin().ascii_serialization();
    if image_url.starts_with('/') {
        Some(format!("{origin}{image_url}"))
    } else {
        Some(format!("{origin}/{image_url}"))
    }
}
