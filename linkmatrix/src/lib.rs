// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    MAX_BATCH_URLS, SERVICE_URL_ENV, build_matrix, build_service_config, exit_code, limit_batch,
    load_pages_from_file, load_urls_from_file, load_urls_from_source, parse_url_line,
    resolve_service_url, save_pages,
};

// Re-export scrape functionality from linkmatrix-core
pub use linkmatrix_core::crawl::{
    ScrapeOptions, ScrapeProgressCallback, ScrapeRun, execute_scrape, outcome_message,
};
pub use linkmatrix_core::normalize::extract_url_path;
