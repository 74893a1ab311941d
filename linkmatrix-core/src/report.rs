// Report generation for link matrices

use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::matrix::{MatrixEngine, MatrixSummary, PageDegree};
use crate::normalize::{extract_host, extract_url_path};

/// Largest matrix drawn as a grid in text reports.
pub const MAX_GRID_PAGES: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkEntry {
    pub source: String,
    pub target: String,
}

/// Serializable view of a matrix.
#[derive(Debug, Serialize)]
pub struct MatrixReport {
    pub summary: MatrixSummary,
    pub pages: Vec<PageDegree>,
    pub links: Vec<LinkEntry>,
}

impl MatrixReport {
    pub fn from_matrix(matrix: &MatrixEngine) -> Self {
        let pages = matrix.pages();
        let mut links = Vec::new();
        for (target, target_url) in pages.iter().enumerate() {
            for (source, linked) in matrix.row(target).iter().enumerate() {
                if *linked {
                    links.push(LinkEntry {
                        source: pages[source].clone(),
                        target: target_url.clone(),
                    });
                }
            }
        }
        links.sort_by(|a, b| a.source.cmp(&b.source).then_with(|| a.target.cmp(&b.target)));

        Self {
            summary: matrix.summary(),
            pages: matrix.degrees(),
            links,
        }
    }
}

pub fn generate_report(matrix: &MatrixEngine, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(matrix)),
        ReportFormat::Json => generate_json_report(matrix),
    }
}

pub fn generate_text_report(matrix: &MatrixEngine) -> String {
    let summary = matrix.summary();
    let mut report = String::new();

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Pages: {}\n", summary.pages));
    report.push_str(&format!("  Internal links: {}\n", summary.links));
    report.push_str(&format!("  Isolated pages: {}\n", summary.isolated));
    if let Some(ref top) = summary.most_linked {
        report.push_str(&format!(
            "  Most linked: {} ({} incoming)\n",
            top.url, top.incoming
        ));
    }
    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if matrix.is_empty() {
        report.push_str("No pages to report.\n");
        return report;
    }

    // Group by host, stable order
    let mut by_host: BTreeMap<String, Vec<PageDegree>> = BTreeMap::new();
    for degree in matrix.degrees() {
        let host = extract_host(&degree.url).unwrap_or_else(|| "(no host)".to_string());
        by_host.entry(host).or_default().push(degree);
    }

    for (host, degrees) in &by_host {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages\n\n", degrees.len()));
        report.push_str(&format!("  {:>4} {:>4}  path\n", "in", "out"));
        for degree in degrees {
            let mut line = format!(
                "  {:>4} {:>4}  {}",
                degree.incoming,
                degree.outgoing,
                extract_url_path(&degree.url)
            );
            if degree.isolated {
                line.push_str(&format!("  {}", "isolated".yellow()));
            }
            report.push_str(&line);
            report.push('\n');
        }
        report.push('\n');
    }

    if matrix.len() <= MAX_GRID_PAGES {
        report.push_str(&generate_grid(matrix));
    } else {
        report.push_str(&format!(
            "Matrix grid omitted ({} pages, limit {}).\n",
            matrix.len(),
            MAX_GRID_PAGES
        ));
    }

    report
}

/// Adjacency grid: row = target, column = source.
fn generate_grid(matrix: &MatrixEngine) -> String {
    let mut grid = String::new();
    grid.push_str("# Link matrix (row = target, column = source):\n\n");

    grid.push_str("      ");
    for col in 0..matrix.len() {
        grid.push_str(&format!("{:>3}", col));
    }
    grid.push('\n');

    for (row, url) in matrix.pages().iter().enumerate() {
        grid.push_str(&format!("  {:>3} ", row));
        for linked in matrix.row(row) {
            grid.push_str(if *linked { "  #" } else { "  ." });
        }
        grid.push_str(&format!("  {}\n", url));
    }
    grid.push('\n');
    grid
}

pub fn generate_json_report(matrix: &MatrixEngine) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&MatrixReport::from_matrix(matrix))
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
