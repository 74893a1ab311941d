//! Dense page-by-page link matrix with precomputed degrees.
//!
//! Rows are link targets and columns are link sources, so row `r` holds the
//! pages linking *to* page `r`. Every query is O(1) once built.

use linkmatrix_scanner::PageRecord;
use serde::Serialize;
use std::collections::HashMap;

use crate::map::{LinkGraph, build_graph};
use crate::normalize::normalize_url;

/// Degree figures for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageDegree {
    pub url: String,
    pub incoming: usize,
    pub outgoing: usize,
    pub isolated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixSummary {
    pub pages: usize,
    pub links: usize,
    pub isolated: usize,
    pub most_linked: Option<PageDegree>,
}

/// Immutable snapshot of a [`LinkGraph`] as an N x N existence table.
#[derive(Debug, Clone, Default)]
pub struct MatrixEngine {
    pages: Vec<String>,
    index: HashMap<String, usize>,
    cells: Vec<bool>,
    incoming: Vec<usize>,
    outgoing: Vec<usize>,
}

impl MatrixEngine {
    pub fn from_graph(graph: &LinkGraph) -> Self {
        let n = graph.node_count();
        let pages: Vec<String> = graph.nodes().map(str::to_string).collect();
        let index = pages
            .iter()
            .enumerate()
            .map(|(pos, url)| (url.clone(), pos))
            .collect();

        let mut cells = vec![false; n * n];
        for row in 0..n {
            for col in graph.incoming_positions(row) {
                cells[row * n + col] = true;
            }
        }

        let incoming = (0..n)
            .map(|row| cells[row * n..(row + 1) * n].iter().filter(|c| **c).count())
            .collect();
        let outgoing = (0..n)
            .map(|col| (0..n).filter(|row| cells[row * n + col]).count())
            .collect();

        Self {
            pages,
            index,
            cells,
            incoming,
            outgoing,
        }
    }

    /// Build the graph and the matrix in one go.
    pub fn from_pages(pages: &[PageRecord]) -> Self {
        Self::from_graph(&build_graph(pages))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Canonical URLs; index `i` is both row `i` and column `i`.
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn position(&self, url: &str) -> Option<usize> {
        self.index.get(&normalize_url(url)).copied()
    }

    /// Whether the page in column `source` links to the page in row `target`.
    /// Out-of-range positions read as `false`.
    pub fn cell(&self, target: usize, source: usize) -> bool {
        let n = self.len();
        target < n && source < n && self.cells[target * n + source]
    }

    /// One row of the table: which pages link to `target`.
    pub fn row(&self, target: usize) -> &[bool] {
        let n = self.len();
        if target >= n {
            return &[];
        }
        &self.cells[target * n..(target + 1) * n]
    }

    /// Pages linking to this one. Unknown pages have no links.
    pub fn incoming_count(&self, url: &str) -> usize {
        self.position(url).map_or(0, |pos| self.incoming[pos])
    }

    /// Pages this one links to. Unknown pages have no links.
    pub fn outgoing_count(&self, url: &str) -> usize {
        self.position(url).map_or(0, |pos| self.outgoing[pos])
    }

    /// A page in the matrix with no links in either direction. Pages not in
    /// the matrix are not isolated, they are absent.
    pub fn is_isolated(&self, url: &str) -> bool {
        self.position(url)
            .is_some_and(|pos| self.incoming[pos] == 0 && self.outgoing[pos] == 0)
    }

    pub fn link_exists(&self, source: &str, target: &str) -> bool {
        match (self.position(source), self.position(target)) {
            (Some(s), Some(t)) => self.cell(t, s),
            _ => false,
        }
    }

    pub fn link_count(&self) -> usize {
        self.incoming.iter().sum()
    }

    pub fn degree(&self, position: usize) -> Option<PageDegree> {
        let url = self.pages.get(position)?;
        let incoming = self.incoming[position];
        let outgoing = self.outgoing[position];
        Some(PageDegree {
            url: url.clone(),
            incoming,
            outgoing,
            isolated: incoming == 0 && outgoing == 0,
        })
    }

    /// Degrees in matrix order.
    pub fn degrees(&self) -> Vec<PageDegree> {
        (0..self.len()).filter_map(|pos| self.degree(pos)).collect()
    }

    pub fn isolated_pages(&self) -> Vec<&str> {
        (0..self.len())
            .filter(|&pos| self.incoming[pos] == 0 && self.outgoing[pos] == 0)
            .map(|pos| self.pages[pos].as_str())
            .collect()
    }

    /// Most linked-to pages first; ties by outgoing count, then URL.
    pub fn ranked_by_incoming(&self) -> Vec<PageDegree> {
        let mut ranked = self.degrees();
        ranked.sort_by(|a, b| {
            b.incoming
                .cmp(&a.incoming)
                .then(b.outgoing.cmp(&a.outgoing))
                .then_with(|| a.url.cmp(&b.url))
        });
        ranked
    }

    pub fn summary(&self) -> MatrixSummary {
        MatrixSummary {
            pages: self.len(),
            links: self.link_count(),
            isolated: self.isolated_pages().len(),
            most_linked: self
                .ranked_by_incoming()
                .into_iter()
                .next()
                .filter(|d| d.incoming > 0),
        }
    }
}
