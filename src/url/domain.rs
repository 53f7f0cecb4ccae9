use url::Url;

/// Returns the pacing key for a URL: scheme, lowercase host and port
///
/// Two URLs share an origin (and therefore a politeness budget) only if all
/// three match. Returns None for URLs without a host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use apex_spider::url::origin_key;
///
/// let url = Url::parse("https://Example.org/wiki/A").unwrap();
/// assert_eq!(origin_key(&url), Some("https://example.org:443".to_string()));
/// ```
pub fn origin_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    let port = url.port_or_known_default()?;
    Some(format!("{}://{}:{}", url.scheme(), host, port))
}
