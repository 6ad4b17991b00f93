use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL for the visited set
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or relative
/// 2. Reject any scheme other than `http` and `https`
/// 3. Reject URLs without a host
/// 4. Remove the fragment (everything after `#`)
///
/// Host lowercasing, default-port removal and dot-segment removal are done by
/// the parser itself. Nothing else is rewritten: the warmer must request the
/// exact URLs a visitor would, so the cache sees the same keys.
///
/// # Examples
///
/// ```
/// use cache_warmer::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com:443/a/../page#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    finish(url)
}

/// Resolves a possibly relative reference against `base` and normalizes it
///
/// # Examples
///
/// ```
/// use cache_warmer::url::resolve_url;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/blog/post").unwrap();
/// let url = resolve_url("../about?x=1#team", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about?x=1");
/// ```
pub fn resolve_url(href: &str, base: &Url) -> UrlResult<Url> {
    let url = base
        .join(href.trim())
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    finish(url)
}

fn finish(mut url: Url) -> UrlResult<Url> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/index.html").unwrap()
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_lowercase_host() {
        let result = normalize_url("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_keeps_scheme_www_and_trailing_slash() {
        let result = normalize_url("http://www.example.com/page/").unwrap();
        assert_eq!(result.as_str(), "http://www.example.com/page/");
    }

    #[test]
    fn test_keeps_query() {
        let result = normalize_url("https://example.com/search?q=a&utm_source=x").unwrap();
        assert_eq!(result.as_str(), "https://example.com/search?q=a&utm_source=x");
    }

    #[test]
    fn test_default_port_removed() {
        let result = normalize_url("http://example.com:80/").unwrap();
        assert_eq!(result.as_str(), "http://example.com/");
    }

    #[test]
    fn test_reject_relative() {
        assert!(matches!(normalize_url("/page"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_reject_scheme() {
        assert!(matches!(
            normalize_url("ftp://example.com/file"),
            Err(UrlError::InvalidScheme(_))
        ));
        assert!(matches!(
            normalize_url("mailto:someone@example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_resolve_relative() {
        let result = resolve_url("guide.html", &base()).unwrap();
        assert_eq!(result.as_str(), "https://example.com/docs/guide.html");
    }

    #[test]
    fn test_resolve_root_relative() {
        let result = resolve_url("/about", &base()).unwrap();
        assert_eq!(result.as_str(), "https://example.com/about");
    }

    #[test]
    fn test_resolve_protocol_relative() {
        let result = resolve_url("//cdn.example.com/app.js", &base()).unwrap();
        assert_eq!(result.as_str(), "https://cdn.example.com/app.js");
    }

    #[test]
    fn test_resolve_absolute() {
        let result = resolve_url("http://other.org/x#y", &base()).unwrap();
        assert_eq!(result.as_str(), "http://other.org/x");
    }

    #[test]
    fn test_resolve_fragment_only_is_base() {
        let result = resolve_url("#top", &base()).unwrap();
        assert_eq!(result.as_str(), "https://example.com/docs/index.html");
    }
}
