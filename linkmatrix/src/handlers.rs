use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use linkmatrix_core::crawl::{ScrapeOptions, ScrapeRun, execute_scrape, outcome_message};
use linkmatrix_core::map::LinkGraphBuilder;
use linkmatrix_core::matrix::MatrixEngine;
use linkmatrix_core::report::{ReportFormat, generate_report, save_report};
use linkmatrix_scanner::{
    JobOutcome, PageRecord, ScrapeJobController, ServiceConfig, StreamEndPolicy,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Environment variable consulted when `--service-url` is not given.
pub const SERVICE_URL_ENV: &str = "LINKMATRIX_SERVICE_URL";
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";
/// Start URLs sent in one batch job.
pub const MAX_BATCH_URLS: usize = 10;

// Helper functions for scrape handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    // Try to parse as-is
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("⚠️  Skipping invalid URL '{}'", line);
    None
}

/// Process exit code for a finished scrape. A cancel is not a failure but
/// is reported the way an interrupted shell command is.
pub fn exit_code(outcome: &JobOutcome) -> i32 {
    match outcome {
        JobOutcome::Completed { .. } => 0,
        JobOutcome::Errored { .. } => 1,
        JobOutcome::Cancelled { .. } => 130,
    }
}

/// Keep at most [`MAX_BATCH_URLS`] start URLs.
pub fn limit_batch(mut urls: Vec<String>) -> Vec<String> {
    if urls.len() > MAX_BATCH_URLS {
        warn!(
            given = urls.len(),
            limit = MAX_BATCH_URLS,
            "too many start URLs, keeping the first ones"
        );
        urls.truncate(MAX_BATCH_URLS);
    }
    urls
}

/// Pick the service base URL: the flag, then the environment, then the default.
pub fn resolve_service_url(flag: Option<&str>, env_value: Option<String>) -> Result<Url> {
    let raw = flag
        .map(str::to_string)
        .or_else(|| env_value.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

    Url::parse(raw.trim()).with_context(|| format!("Invalid service URL '{}'", raw))
}

pub fn build_service_config(service_url: Url, strict_end: bool) -> ServiceConfig {
    let policy = if strict_end {
        StreamEndPolicy::Error
    } else {
        StreamEndPolicy::Complete
    };
    ServiceConfig::new(service_url).with_end_policy(policy)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PagesFile {
    List(Vec<PageRecord>),
    Wrapped { pages: Vec<PageRecord> },
}

/// Read pages from a JSON file: either a bare array or `{"pages": [...]}`.
pub fn load_pages_from_file(path: &Path) -> Result<Vec<PageRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pages file {}", path.display()))?;
    let file: PagesFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse pages file {}", path.display()))?;

    Ok(match file {
        PagesFile::List(pages) | PagesFile::Wrapped { pages } => pages,
    })
}

pub fn save_pages(pages: &[PageRecord], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(pages)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn build_matrix(pages: &[PageRecord], inbound_evidence: bool) -> MatrixEngine {
    let graph = LinkGraphBuilder::new()
        .with_inbound_evidence(inbound_evidence)
        .build(pages);
    MatrixEngine::from_graph(&graph)
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

fn report_format(sub_matches: &ArgMatches) -> Result<ReportFormat> {
    let raw = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    match ReportFormat::from_str(raw) {
        Some(format) => Ok(format),
        None => bail!("Unknown report format '{}'", raw),
    }
}

pub async fn handle_scrape(sub_matches: &ArgMatches, quiet: bool) -> Result<JobOutcome> {
    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let target_class = sub_matches.get_one::<String>("target-class").cloned();
    let strict_end = sub_matches.get_flag("strict-end");
    let inbound_evidence = sub_matches.get_flag("inbound-evidence");
    let output = sub_matches
        .get_one::<String>("output")
        .map(|raw| expand_path(raw));
    let format = report_format(sub_matches)?;

    let urls = load_urls_from_source(url, hosts_file).map_err(anyhow::Error::msg)?;
    let urls = limit_batch(urls);

    let service_url = resolve_service_url(
        sub_matches.get_one::<String>("service-url").map(String::as_str),
        std::env::var(SERVICE_URL_ENV).ok(),
    )?;
    let config = build_service_config(service_url, strict_end);

    if !quiet {
        println!("\n🕸️  Scraping {} start URL(s)", urls.len());
        println!("Service: {}", config.base_url);
        if let Some(ref class) = target_class {
            println!("Target class: {}", class);
        }
        println!();
    }

    let controller = Arc::new(ScrapeJobController::new(config)?);

    // Ctrl-C asks the service to stop and keeps what was received
    let interrupt = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, cancelling scrape job");
                controller.cancel(true).await;
            }
        })
    };

    let options = ScrapeOptions {
        urls,
        target_class,
        show_progress_bars: !quiet,
    };
    let run = execute_scrape(&controller, options, None).await;
    match &run {
        // The interrupt task is mid-cancel; let its stop request go out
        Ok(ScrapeRun {
            outcome: JobOutcome::Cancelled {
                user_initiated: true,
            },
            ..
        }) => {
            if let Err(e) = interrupt.await {
                warn!(error = %e, "cancel task failed");
            }
        }
        _ => interrupt.abort(),
    }
    let run = run?;

    let message = outcome_message(&run.outcome);
    match run.outcome {
        JobOutcome::Completed { .. } => println!("\n{} {}", "✓".green().bold(), message),
        JobOutcome::Errored { .. } => eprintln!("\n{} {}", "✗".red().bold(), message),
        JobOutcome::Cancelled { .. } => println!("\n{} {}", "→".yellow().bold(), message),
    }

    let snapshot = run.snapshot;
    if let Some(ref warning) = snapshot.warning {
        eprintln!("{} {}", "⚠".yellow().bold(), warning);
    }
    if snapshot.decode_errors > 0 {
        eprintln!(
            "{} {} malformed record(s) skipped",
            "⚠".yellow().bold(),
            snapshot.decode_errors
        );
    }

    if let Some(ref path) = output {
        save_pages(&snapshot.pages, path)?;
        println!(
            "{} Pages saved: {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
    }

    if snapshot.pages.is_empty() {
        println!("No pages received.");
        return Ok(run.outcome);
    }

    let matrix = build_matrix(&snapshot.pages, inbound_evidence);
    print!("\n{}", generate_report(&matrix, format)?);

    Ok(run.outcome)
}

pub fn handle_matrix(sub_matches: &ArgMatches) -> Result<()> {
    let input = sub_matches
        .get_one::<String>("input")
        .map(|raw| expand_path(raw))
        .context("--input is required")?;
    let output = sub_matches
        .get_one::<String>("output")
        .map(|raw| expand_path(raw));
    let inbound_evidence = sub_matches.get_flag("inbound-evidence");
    let format = report_format(sub_matches)?;

    let pages = load_pages_from_file(&input)?;
    let matrix = build_matrix(&pages, inbound_evidence);
    let report = generate_report(&matrix, format)?;

    match output {
        Some(path) => {
            save_report(&report, &path)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            println!(
                "{} Report saved: {}",
                "✓".green().bold(),
                path.display().to_string().bright_white()
            );
        }
        None => print!("{}", report),
    }

    Ok(())
}
