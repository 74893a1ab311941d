use reqwest::header::HeaderMap;

/// Look up a response header by name regardless of the casing used by the
/// server or the caller. Non-ASCII values are treated as absent.
pub fn find_header(headers: &HeaderMap, name: &str) -> Option<String> {
    let wanted = name.trim();
    if wanted.is_empty() {
        return None;
    }

    let value = headers.get(wanted.to_ascii_lowercase().as_str()).or_else(|| {
        headers
            .iter()
            .find(|(key, _)| key.as_str().eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value)
    })?;

    value
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn test_lookup_ignores_case() {
        let headers = headers_with("x-job-id", "job-42");
        assert_eq!(find_header(&headers, "X-Job-ID"), Some("job-42".to_string()));
        assert_eq!(find_header(&headers, "x-JOB-id"), Some("job-42".to_string()));
    }

    #[test]
    fn test_missing_or_blank_header() {
        let headers = headers_with("content-type", "application/json");
        assert_eq!(find_header(&headers, "X-Job-ID"), None);

        let headers = headers_with("x-job-id", "   ");
        assert_eq!(find_header(&headers, "X-Job-ID"), None);
        assert_eq!(find_header(&headers, ""), None);
    }
}
