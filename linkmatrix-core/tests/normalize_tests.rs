// Tests for URL normalization

use linkmatrix_core::normalize::{extract_host, extract_url_path, normalize_url};

// ============================================================================
// Canonical Key Tests
// ============================================================================

#[test]
fn test_normalize_strips_trailing_slash() {
    assert_eq!(normalize_url("https://x/b/"), "https://x/b");
    assert_eq!(normalize_url("https://x/b"), "https://x/b");
}

#[test]
fn test_normalize_root() {
    assert_eq!(normalize_url("https://example.com/"), "https://example.com");
    assert_eq!(normalize_url("https://example.com"), "https://example.com");
}

#[test]
fn test_normalize_drops_query_and_fragment() {
    assert_eq!(
        normalize_url("https://example.com/blog/?page=2#comments"),
        "https://example.com/blog"
    );
    assert_eq!(
        normalize_url("https://example.com/a?x=1"),
        normalize_url("https://example.com/a#top")
    );
}

#[test]
fn test_normalize_lowercases_scheme_and_host() {
    assert_eq!(
        normalize_url("HTTPS://Example.COM/About"),
        "https://example.com/About"
    );
}

#[test]
fn test_normalize_drops_default_port() {
    assert_eq!(normalize_url("https://example.com:443/a"), "https://example.com/a");
    assert_eq!(
        normalize_url("http://example.com:8080/a/"),
        "http://example.com:8080/a"
    );
}

#[test]
fn test_normalize_keeps_scheme_distinct() {
    assert_ne!(
        normalize_url("http://example.com/a"),
        normalize_url("https://example.com/a")
    );
}

#[test]
fn test_normalize_malformed_falls_back_to_raw() {
    assert_eq!(normalize_url("not a url/"), "not a url");
    assert_eq!(normalize_url("/relative/path/"), "/relative/path");
    assert_eq!(normalize_url(""), "");
}

#[test]
fn test_normalize_opaque_scheme_falls_back_to_raw() {
    assert_eq!(normalize_url("mailto:team@example.com"), "mailto:team@example.com");
}

#[test]
fn test_normalize_is_idempotent() {
    let inputs = [
        "https://x/a",
        "https://x/a/",
        "https://x/a//",
        "https://x/",
        "HTTPS://X:443/A/?q=1#f",
        "http://example.com//api//test/",
        "http://example.com/api%20test/",
        "http://example.com/api/用户/",
        "http://[::1]/api/",
        "http://user@example.com/api",
        "not a valid url//",
        "mailto:someone@example.com/",
        "",
    ];
    for input in inputs {
        let once = normalize_url(input);
        let twice = normalize_url(&once);
        assert_eq!(once, twice, "not idempotent for {:?}", input);
    }
}

// ============================================================================
// URL Path Extraction Tests
// ============================================================================

#[test]
fn test_extract_url_path_root() {
    assert_eq!(extract_url_path("http://example.com/"), "/");
    assert_eq!(extract_url_path("http://example.com"), "/");
}

#[test]
fn test_extract_url_path_nested() {
    assert_eq!(extract_url_path("http://example.com/api/v1/users"), "/api/v1/users");
}

#[test]
fn test_extract_url_path_with_query_and_fragment() {
    assert_eq!(extract_url_path("http://example.com/api?key=value#top"), "/api");
}

#[test]
fn test_extract_url_path_invalid_url() {
    let url = "not a valid url";
    assert_eq!(extract_url_path(url), url);
}

#[test]
fn test_extract_url_path_ipv6() {
    assert_eq!(extract_url_path("http://[::1]/api"), "/api");
}

#[test]
fn test_extract_host() {
    assert_eq!(
        extract_host("https://blog.example.com/post"),
        Some("blog.example.com".to_string())
    );
    assert_eq!(extract_host("not a url"), None);
}
