use url::Url;

/// Removes the query string and fragment from a URL
///
/// Used as the identity of detail pages, where query parameters only select
/// a color or carry tracking data. Applying it twice changes nothing.
///
/// # Examples
///
/// ```
/// use storefront_crawler::url::strip_query;
/// use url::Url;
///
/// let url = Url::parse("https://shop.example.com/p/42?color=red#reviews").unwrap();
/// assert_eq!(strip_query(&url).as_str(), "https://shop.example.com/p/42");
/// ```
pub fn strip_query(url: &Url) -> Url {
    let mut canonical = url.clone();
    canonical.set_query(None);
    canonical.set_fragment(None);
    canonical
}

/// Returns a copy of the URL with one query parameter set, replacing any
/// existing values of that parameter
pub fn set_query_param(url: &Url, name: &str, value: &str) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != name)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut next = url.clone();
    next.set_fragment(None);
    {
        let mut pairs = next.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(name, value);
    }
    next
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
