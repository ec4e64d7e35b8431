//! Canonicalization of free-text brand input into bare domains and brand keys.

use std::sync::LazyLock;

use regex::Regex;

static DOMAIN_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]{0,61}[a-zA-Z0-9]?\.[a-zA-Z]{2,}$").expect("valid regex")
});

static SCHEME_WWW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://)?(www\.)?").expect("valid regex"));

static TLD_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(com|co|io|shop|store|net|org|us|uk|ca).*$").expect("valid regex")
});

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("valid regex"));

/// Reduce free-text input to a bare lowercase host.
///
/// Strips any scheme and `www.` prefixes and cuts at the first path, query, or
/// fragment delimiter. Applying it twice yields the same result as once.
#[must_use]
pub fn normalize_url(input: &str) -> String {
    let mut rest = input.trim().to_lowercase();
    loop {
        let before = rest.len();
        rest = rest.trim().to_string();
        for prefix in ["https://", "http://", "www."] {
            if let Some(stripped) = rest.strip_prefix(prefix) {
                rest = stripped.to_string();
            }
        }
        if rest.len() == before {
            break;
        }
    }

    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    rest[..end].trim().to_string()
}

/// Whether the input normalizes to a syntactically plausible domain.
#[must_use]
pub fn is_valid_url(input: &str) -> bool {
    let normalized = normalize_url(input);
    !normalized.is_empty() && DOMAIN_SHAPE.is_match(&normalized)
}

/// Host of `input` without `www.`, parsed as a URL when possible.
///
/// Falls back to [`normalize_url`] when the input cannot be parsed.
#[must_use]
pub fn extract_domain(input: &str) -> String {
    let trimmed = input.trim();
    let candidate = if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    match reqwest::Url::parse(&candidate) {
        Ok(url) => match url.host_str() {
            Some(host) if !host.is_empty() => {
                host.strip_prefix("www.").unwrap_or(host).to_string()
            }
            _ => normalize_url(trimmed),
        },
        Err(_) => normalize_url(trimmed),
    }
}

/// Human-ish brand name derived from a domain, e.g. `acme-goods.com` -> `acme goods`.
#[must_use]
pub fn extract_brand_name(domain: &str) -> String {
    let without_prefix = SCHEME_WWW.replace(domain, "");
    let without_tld = TLD_SUFFIX.replace(&without_prefix, "");
    NON_ALNUM.replace_all(&without_tld, " ").trim().to_string()
}

/// Best-effort `.com` domain for a brand that came without one.
#[must_use]
pub fn guess_brand_domain(brand_name: &str) -> String {
    format!("{}.com", normalize_brand_key(brand_name))
}

/// Prefix `https://` to scheme-less URLs. Empty input stays empty.
#[must_use]
pub fn ensure_https(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() || trimmed.starts_with("http") {
        return trimmed.to_string();
    }
    format!("https://{}", trimmed.trim_start_matches('/'))
}

/// Lowercase ASCII alphanumerics only; the comparison key for brand names.
#[must_use]
pub fn normalize_brand_key(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Whether two brand names overlap: equal, or either contains the other
/// after [`normalize_brand_key`]. Names that normalize to nothing never match.
#[must_use]
pub fn is_same_brand(a: &str, b: &str) -> bool {
    let a = normalize_brand_key(a);
    let b = normalize_brand_key(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_scheme_www_and_path() {
        assert_eq!(normalize_url("https://www.Acme.com/shop?x=1"), "acme.com");
        assert_eq!(normalize_url("  acme.com  "), "acme.com");
        assert_eq!(normalize_url("http://acme.co/"), "acme.co");
        assert_eq!(normalize_url("acme.com?ref=ig"), "acme.com");
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            "https://www.acme.com/shop",
            "https:// www.acme.com",
            "www.www.acme.com",
            "http://https://acme.com",
            "ACME.COM",
            "not a domain",
            "",
            "www./x",
        ];
        for input in inputs {
            let once = normalize_url(input);
            assert_eq!(normalize_url(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn valid_url_examples() {
        assert!(is_valid_url("acme.com"));
        assert!(is_valid_url("a.co"));
        assert!(is_valid_url("https://www.my-brand.shop/products/x"));
        assert!(!is_valid_url("not a domain"));
        assert!(!is_valid_url("a"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("-acme.com"));
    }

    #[test]
    fn extract_domain_strips_www_and_scheme() {
        assert_eq!(extract_domain("https://www.acme.com/shop"), "acme.com");
        assert_eq!(extract_domain("acme.com"), "acme.com");
        assert_eq!(extract_domain("www.Acme.com/about"), "acme.com");
        assert_eq!(extract_domain("shop.acme.com"), "shop.acme.com");
    }

    #[test]
    fn extract_domain_falls_back_when_unparseable() {
        assert_eq!(extract_domain("not a domain"), "not a domain");
    }

    #[test]
    fn brand_name_from_domain() {
        assert_eq!(extract_brand_name("acme-goods.com"), "acme goods");
        assert_eq!(extract_brand_name("https://www.brightland.co"), "brightland");
        assert_eq!(extract_brand_name("fly.by.jing.com"), "fly by jing");
        assert_eq!(extract_brand_name("oatly.co.uk"), "oatly");
    }

    #[test]
    fn guessed_domain_is_compact_lowercase() {
        assert_eq!(guess_brand_domain("Fly By Jing"), "flybyjing.com");
        assert_eq!(guess_brand_domain("Dr. Bronner's"), "drbronners.com");
    }

    #[test]
    fn ensure_https_prefixes_only_when_needed() {
        assert_eq!(ensure_https("acme.com"), "https://acme.com");
        assert_eq!(ensure_https("//acme.com"), "https://acme.com");
        assert_eq!(ensure_https("http://acme.com"), "http://acme.com");
        assert_eq!(ensure_https(""), "");
    }

    #[test]
    fn same_brand_overlap_rules() {
        assert!(is_same_brand("Patagonia", "patagonia"));
        assert!(is_same_brand("Patagonia Provisions", "Patagonia"));
        assert!(is_same_brand("Graza", "GRAZA Olive Oil"));
        assert!(!is_same_brand("Graza", "Fishwife"));
        assert!(!is_same_brand("", "Graza"));
        assert!(!is_same_brand("!!!", "Graza"));
    }
}
