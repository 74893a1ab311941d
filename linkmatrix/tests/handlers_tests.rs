use linkmatrix::handlers::*;
use linkmatrix_scanner::{JobOutcome, PageRecord, StreamEndPolicy};
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};
use url::Url;

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("example.com");
    assert_eq!(result, Some("http://example.com".to_string()));
}

#[test]
fn test_parse_url_line_invalid() {
    let result = parse_url_line("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_load_urls_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://example.com")?;
    writeln!(temp_file, "  httpbin.org  ")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "# staging hosts")?;
    writeln!(temp_file, "https://api.example.com")?;

    let path = PathBuf::from(temp_file.path());
    let urls = load_urls_from_file(&path)?;

    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], "https://example.com");
    assert_eq!(urls[1], "http://httpbin.org");
    assert_eq!(urls[2], "https://api.example.com");

    Ok(())
}

#[test]
fn test_load_urls_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let path = PathBuf::from(temp_file.path());
    let result = load_urls_from_file(&path);

    assert!(result.is_err());
    assert!(result.unwrap_err().contains("No valid URLs"));
}

#[test]
fn test_load_urls_from_source_single_url() {
    let url = Url::parse("https://example.com").unwrap();
    let result = load_urls_from_source(Some(&url), None).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0], "https://example.com/");
}

#[test]
fn test_load_urls_from_source_no_input() {
    let result = load_urls_from_source(None, None);
    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .contains("Either --url or --hosts-file must be provided")
    );
}

#[test]
fn test_limit_batch() {
    let urls: Vec<String> = (0..15).map(|i| format!("https://example.com/{}", i)).collect();
    let limited = limit_batch(urls);

    assert_eq!(limited.len(), MAX_BATCH_URLS);
    assert_eq!(limited[0], "https://example.com/0");

    let few = limit_batch(vec!["https://example.com".to_string()]);
    assert_eq!(few.len(), 1);
}

#[test]
fn test_resolve_service_url_precedence() {
    let from_flag = resolve_service_url(
        Some("http://flag:9000"),
        Some("http://env:9000".to_string()),
    )
    .unwrap();
    assert_eq!(from_flag.as_str(), "http://flag:9000/");

    let from_env = resolve_service_url(None, Some("http://env:9000".to_string())).unwrap();
    assert_eq!(from_env.as_str(), "http://env:9000/");

    let fallback = resolve_service_url(None, Some("  ".to_string())).unwrap();
    assert_eq!(fallback.as_str(), "http://localhost:8000/");
}

#[test]
fn test_resolve_service_url_invalid() {
    let result = resolve_service_url(Some("not a url"), None);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Invalid service URL"));
}

#[test]
fn test_build_service_config_end_policy() {
    let url = Url::parse("http://localhost:8000").unwrap();

    let strict = build_service_config(url.clone(), true);
    assert_eq!(strict.end_policy, StreamEndPolicy::Error);

    let lenient = build_service_config(url, false);
    assert_eq!(lenient.end_policy, StreamEndPolicy::Complete);
}

#[test]
fn test_save_and_load_pages() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("pages.json");
    let pages = vec![
        PageRecord::new("https://x/a").with_outbound(&["https://x/b"]),
        PageRecord::new("https://x/b"),
    ];

    save_pages(&pages, &path)?;
    let loaded = load_pages_from_file(&path)?;

    assert_eq!(loaded, pages);
    Ok(())
}

#[test]
fn test_load_pages_wrapped_and_camel_case() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    write!(
        temp_file,
        r#"{{"pages": [{{"url": "https://x/a", "outboundLinks": ["https://x/b/"]}}, {{"url": "https://x/b"}}]}}"#
    )?;

    let pages = load_pages_from_file(temp_file.path())?;
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].outbound_links[0].target_url, "https://x/b/");

    let matrix = build_matrix(&pages, false);
    assert!(matrix.link_exists("https://x/a", "https://x/b"));
    Ok(())
}

#[test]
fn test_load_pages_invalid_json() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{{not json").unwrap();

    let result = load_pages_from_file(temp_file.path());
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Failed to parse pages file"));
}

#[test]
fn test_load_pages_missing_file() {
    let result = load_pages_from_file(std::path::Path::new("/nonexistent/pages.json"));
    assert!(result.is_err());
}

#[test]
fn test_build_matrix_inbound_evidence() {
    let pages = vec![
        PageRecord::new("https://x/a"),
        PageRecord::new("https://x/b").with_inbound(&["https://x/a"]),
    ];

    assert_eq!(build_matrix(&pages, false).link_count(), 0);
    assert!(build_matrix(&pages, true).link_exists("https://x/a", "https://x/b"));
}

#[test]
fn test_exit_code_for_outcomes() {
    let completed = JobOutcome::Completed {
        processed_pages: 3,
        total_time: 1.0,
    };
    let errored = JobOutcome::Errored {
        message: "boom".to_string(),
    };
    let cancelled = JobOutcome::Cancelled {
        user_initiated: true,
    };

    assert_eq!(exit_code(&completed), 0);
    assert_eq!(exit_code(&errored), 1);
    assert_eq!(exit_code(&cancelled), 130);
}
