use url::Url;

/// Canonical identity key for a page: origin + path, no query or fragment,
/// trailing slashes removed.
///
/// Unparseable input (and URLs without a host-based origin) falls back to the
/// raw string with trailing slashes trimmed, so one bad link never stops a
/// graph build. Applying it twice gives the same result as applying it once.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) if url.origin().is_tuple() => {
            let key = format!("{}{}", url.origin().ascii_serialization(), url.path());
            key.trim_end_matches('/').to_string()
        }
        _ => raw.trim_end_matches('/').to_string(),
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Host of a URL, or `None` when it has none.
pub fn extract_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}
