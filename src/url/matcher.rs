/// A configured allowed-host pattern
///
/// Two forms are supported:
/// 1. Exact: `"example.org"` matches only `example.org`
/// 2. Wildcard: `"*.example.org"` matches `example.org` itself and any
///    subdomain such as `blog.example.org` or `api.v2.example.org`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    Exact(String),
    Suffix(String),
}

impl HostPattern {
    /// Parses a pattern; hosts are compared lowercase
    pub fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim().to_lowercase();
        match pattern.strip_prefix("*.") {
            Some(base) => Self::Suffix(base.to_string()),
            None => Self::Exact(pattern),
        }
    }

    /// Checks whether a (lowercase) host satisfies this pattern
    ///
    /// # Examples
    ///
    /// ```
    /// use apex_spider::url::HostPattern;
    ///
    /// let pattern = HostPattern::parse("*.example.org");
    /// assert!(pattern.matches("example.org"));
    /// assert!(pattern.matches("blog.example.org"));
    /// assert!(!pattern.matches("notexample.org"));
    /// ```
    pub fn matches(&self, host: &str) -> bool {
        match self {
            Self::Exact(expected) => host == expected,
            Self::Suffix(base) => {
                host == base
                    || host
                        .strip_suffix(base.as_str())
                        .map_or(false, |prefix| prefix.ends_with('.'))
            }
        }
    }
}
