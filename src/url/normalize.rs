use url::Url;

/// Normalizes a possibly-relative URL so equivalent links deduplicate
///
/// # Normalization Steps
///
/// 1. Resolve `href` against `base` (an absolute `href` ignores the base)
/// 2. Remove the fragment (everything after #)
/// 3. Remove trailing slashes
///
/// The query string is preserved as-is and no tracking parameters are
/// stripped. Scheme and host casing follow the WHATWG parser, which lowercases
/// both for http(s); nothing beyond that is folded.
///
/// Never fails: when neither `base` nor `href` parse, the input is returned
/// with its fragment and trailing slashes removed.
///
/// # Examples
///
/// ```
/// use site_digest::url::normalize_url;
///
/// let url = normalize_url("../docs/#intro", "https://example.com/guide/start");
/// assert_eq!(url, "https://example.com/docs");
/// ```
pub fn normalize_url(href: &str, base: &str) -> String {
    let href = href.trim();

    let resolved = match Url::parse(base) {
        Ok(base_url) => base_url.join(href).ok(),
        Err(_) => Url::parse(href).ok(),
    };

    let serialized = match resolved {
        Some(mut url) => {
            url.set_fragment(None);
            String::from(url)
        }
        None => strip_fragment(href).to_string(),
    };

    serialized.trim_end_matches('/').to_string()
}

fn strip_fragment(raw: &str) -> &str {
    match raw.find('#') {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/products/widgets";

    #[test]
    fn test_resolve_root_relative() {
        assert_eq!(
            normalize_url("/about", BASE),
            "https://example.com/about"
        );
    }

    #[test]
    fn test_resolve_path_relative() {
        assert_eq!(
            normalize_url("gadgets", BASE),
            "https://example.com/products/gadgets"
        );
    }

    #[test]
    fn test_absolute_ignores_base() {
        assert_eq!(
            normalize_url("https://other.org/page", BASE),
            "https://other.org/page"
        );
    }

    #[test]
    fn test_remove_fragment() {
        assert_eq!(
            normalize_url("/page#section", BASE),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_remove_trailing_slash() {
        assert_eq!(
            normalize_url("https://example.com/page/", BASE),
            "https://example.com/page"
        );
        assert_eq!(normalize_url("https://example.com/", BASE), "https://example.com");
    }

    #[test]
    fn test_equivalent_urls_collapse() {
        let a = normalize_url("/docs/", BASE);
        let b = normalize_url("https://example.com/docs#top", BASE);
        let c = normalize_url("../docs", BASE);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_query_is_preserved() {
        assert_eq!(
            normalize_url("/search?b=2&a=1&utm_source=x", BASE),
            "https://example.com/search?b=2&a=1&utm_source=x"
        );
    }

    #[test]
    fn test_only_scheme_and_host_are_lowercased() {
        assert_eq!(
            normalize_url("HTTPS://Example.COM/Docs/Intro?Q=A", BASE),
            "https://example.com/Docs/Intro?Q=A"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "/a/b/",
            "https://example.com",
            "https://example.com/x//",
            "?q=1#frag",
            "../up/one/",
            "https://example.com:8443/port/",
        ];

        for input in inputs {
            let once = normalize_url(input, BASE);
            let twice = normalize_url(&once, BASE);
            assert_eq!(once, twice, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_malformed_base_falls_back_to_href() {
        assert_eq!(
            normalize_url("https://example.com/page/", "not a url"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_unparseable_input_returned_best_effort() {
        assert_eq!(normalize_url("just text/#frag", "also not a url"), "just text");
    }
}
