use url::Url;

/// Extracts the lowercase host from a URL, or None for host-less URLs
///
/// # Examples
///
/// ```
/// use url::Url;
/// use storefront_crawler::url::extract_domain;
///
/// let url = Url::parse("https://SHOP.Example.com/p/1").unwrap();
/// assert_eq!(extract_domain(&url), Some("shop.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
