/// Checks if a domain matches a glob pattern
///
/// Patterns support `*`, which matches any run of characters (including
/// none). A leading `*.` additionally matches the bare domain, so
/// "*.example.com" accepts "example.com" as well as any subdomain.
///
/// Both sides are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use storefront_crawler::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(matches_wildcard("shop.example.*", "shop.example.de"));
/// assert!(!matches_wildcard("*.example.com", "example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        if glob_match(base.as_bytes(), candidate.as_bytes()) {
            return true;
        }
    }
    glob_match(pattern.as_bytes(), candidate.as_bytes())
}

/// Iterative glob match with single-star backtracking
fn glob_match(pattern: &[u8], candidate: &[u8]) -> bool {
    let (mut p, mut c) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while c < candidate.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some(p);
            mark = c;
            p += 1;
        } else if p < pattern.len() && pattern[p] == candidate[c] {
            p += 1;
            c += 1;
        } else if let Some(s) = star {
            p = s + 1;
            mark += 1;
            c = mark;
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&b| b == b'*')
}
