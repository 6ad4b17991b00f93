use regex::Regex;

/// Regex accept filter applied to every discovered absolute URL
///
/// The pattern is unanchored: it accepts a URL if it matches anywhere in it,
/// so `example\.com` admits `https://www.example.com/page`.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    pattern: Regex,
}

impl UrlFilter {
    /// Compiles a new filter
    ///
    /// # Examples
    ///
    /// ```
    /// use cache_warmer::url::UrlFilter;
    ///
    /// let filter = UrlFilter::new(r"^https://example\.com/").unwrap();
    /// assert!(filter.accepts("https://example.com/page"));
    /// assert!(!filter.accepts("https://other.org/?ref=https://example.com/"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// A filter that accepts every URL
    pub fn accept_all() -> Self {
        Self {
            pattern: Regex::new("").expect("empty pattern always compiles"),
        }
    }

    /// Returns true if the URL may be enqueued
    pub fn accepts(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }

    /// The source pattern
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl std::fmt::Display for UrlFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
