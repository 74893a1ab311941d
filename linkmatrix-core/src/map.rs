//! Directed link graph between crawled pages.
//!
//! Pages are identified by their canonical URL key (see
//! [`normalize_url`](crate::normalize::normalize_url)). An edge `A -> B`
//! means page A links to page B. Links to pages outside the crawled set and
//! links from a page to itself are not represented.

use linkmatrix_scanner::PageRecord;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::debug;

use crate::normalize::normalize_url;

/// Read-only link graph. Build a new one whenever the page set changes.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl LinkGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Canonical URLs in first-seen page order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_indices().map(|idx| self.graph[idx].as_str())
    }

    /// `(source, target)` pairs of canonical URLs.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.graph.edge_indices().filter_map(|edge| {
            let (source, target) = self.graph.edge_endpoints(edge)?;
            Some((self.graph[source].as_str(), self.graph[target].as_str()))
        })
    }

    /// Whether the page with this URL (normalized first) is a node.
    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(&normalize_url(url))
    }

    /// Position of a page in [`nodes`](Self::nodes) order.
    pub fn position(&self, url: &str) -> Option<usize> {
        self.index.get(&normalize_url(url)).map(|idx| idx.index())
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        match (
            self.index.get(&normalize_url(source)),
            self.index.get(&normalize_url(target)),
        ) {
            (Some(&s), Some(&t)) => self.graph.contains_edge(s, t),
            _ => false,
        }
    }

    pub(crate) fn incoming_positions(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors_directed(NodeIndex::new(position), Direction::Incoming)
            .map(|idx| idx.index())
    }
}

/// Builds a [`LinkGraph`] from page records.
#[derive(Debug, Clone, Default)]
pub struct LinkGraphBuilder {
    inbound_evidence: bool,
}

impl LinkGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accept a page's `inbound_links` as evidence: an inbound entry
    /// naming page S on page T adds the edge `S -> T`.
    pub fn with_inbound_evidence(mut self, enabled: bool) -> Self {
        self.inbound_evidence = enabled;
        self
    }

    pub fn build(&self, pages: &[PageRecord]) -> LinkGraph {
        let mut graph = DiGraph::with_capacity(pages.len(), 0);
        let mut index: HashMap<String, NodeIndex> = HashMap::with_capacity(pages.len());

        // One node per canonical URL; duplicates share the first page's node
        let mut page_nodes = Vec::with_capacity(pages.len());
        for page in pages {
            let key = normalize_url(&page.url);
            let node = *index
                .entry(key)
                .or_insert_with_key(|key| graph.add_node(key.clone()));
            page_nodes.push(node);
        }

        for (page, &node) in pages.iter().zip(&page_nodes) {
            for link in &page.outbound_links {
                if let Some(&target) = index.get(&normalize_url(&link.target_url))
                    && target != node
                {
                    graph.update_edge(node, target, ());
                }
            }

            if self.inbound_evidence {
                for link in &page.inbound_links {
                    if let Some(&source) = index.get(&normalize_url(&link.target_url))
                        && source != node
                    {
                        graph.update_edge(source, node, ());
                    }
                }
            }
        }

        debug!(
            pages = pages.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built link graph"
        );

        LinkGraph { graph, index }
    }
}

/// Build a link graph from outbound links only.
pub fn build_graph(pages: &[PageRecord]) -> LinkGraph {
    LinkGraphBuilder::new().build(pages)
}
