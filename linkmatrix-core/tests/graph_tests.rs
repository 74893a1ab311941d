// Tests for link graph construction and the degree matrix

use linkmatrix_core::map::{LinkGraphBuilder, build_graph};
use linkmatrix_core::matrix::MatrixEngine;
use linkmatrix_scanner::{LinkRef, PageRecord};

fn site() -> Vec<PageRecord> {
    vec![
        PageRecord::new("https://x/").with_outbound(&["https://x/a", "https://x/b/", "https://ext.com/"]),
        PageRecord::new("https://x/a").with_outbound(&["https://x/b?ref=a", "https://x/"]),
        PageRecord::new("https://x/b").with_outbound(&["https://x/b/", "https://x/#top"]),
        PageRecord::new("https://x/orphan"),
    ]
}

// ============================================================================
// Graph Construction Tests
// ============================================================================

#[test]
fn test_trailing_slash_link_resolves() {
    let pages = vec![
        PageRecord::new("https://x/a").with_outbound(&["https://x/b/"]),
        PageRecord::new("https://x/b"),
    ];
    let matrix = MatrixEngine::from_pages(&pages);

    assert!(matrix.link_exists("https://x/a", "https://x/b"));
    assert!(!matrix.link_exists("https://x/b", "https://x/a"));
    assert_eq!(matrix.incoming_count("https://x/b"), 1);
    assert_eq!(matrix.outgoing_count("https://x/a"), 1);
    assert!(!matrix.is_isolated("https://x/a"));
    assert!(!matrix.is_isolated("https://x/b"));
}

#[test]
fn test_self_links_are_excluded() {
    let pages = vec![
        PageRecord::new("https://x/a").with_outbound(&["https://x/a", "https://x/a/", "https://x/a?x=1"]),
    ];
    let graph = build_graph(&pages);
    assert_eq!(graph.edge_count(), 0);

    let matrix = MatrixEngine::from_graph(&graph);
    assert!(!matrix.link_exists("https://x/a", "https://x/a"));
    assert!(matrix.is_isolated("https://x/a"));
}

#[test]
fn test_external_links_are_not_nodes() {
    let graph = build_graph(&site());
    assert_eq!(graph.node_count(), 4);
    assert!(!graph.contains("https://ext.com/"));
}

#[test]
fn test_nodes_keep_page_order() {
    let graph = build_graph(&site());
    let nodes: Vec<&str> = graph.nodes().collect();
    assert_eq!(nodes, vec!["https://x", "https://x/a", "https://x/b", "https://x/orphan"]);
    assert_eq!(graph.position("https://x/b/"), Some(2));
}

#[test]
fn test_duplicate_pages_collapse() {
    let pages = vec![
        PageRecord::new("https://x/a").with_outbound(&["https://x/b"]),
        PageRecord::new("https://x/a/").with_outbound(&["https://x/c"]),
        PageRecord::new("https://x/b"),
        PageRecord::new("https://x/c"),
    ];
    let graph = build_graph(&pages);
    assert_eq!(graph.node_count(), 3);
    assert!(graph.has_edge("https://x/a", "https://x/b"));
    assert!(graph.has_edge("https://x/a", "https://x/c"));
}

#[test]
fn test_repeated_links_make_one_edge() {
    let pages = vec![
        PageRecord::new("https://x/a").with_outbound(&["https://x/b", "https://x/b/", "https://x/b#x"]),
        PageRecord::new("https://x/b"),
    ];
    let graph = build_graph(&pages);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_inbound_evidence_is_opt_in() {
    let pages = vec![
        PageRecord::new("https://x/a"),
        PageRecord::new("https://x/b").with_inbound(&["https://x/a"]),
    ];

    let outbound_only = build_graph(&pages);
    assert_eq!(outbound_only.edge_count(), 0);

    let with_inbound = LinkGraphBuilder::new()
        .with_inbound_evidence(true)
        .build(&pages);
    assert!(with_inbound.has_edge("https://x/a", "https://x/b"));
    assert!(!with_inbound.has_edge("https://x/b", "https://x/a"));
}

#[test]
fn test_malformed_urls_do_not_abort_build() {
    let pages = vec![
        PageRecord::new("not a url").with_outbound(&["also bad/", "https://x/a"]),
        PageRecord::new("also bad"),
        PageRecord::new("https://x/a"),
    ];
    let matrix = MatrixEngine::from_pages(&pages);
    assert_eq!(matrix.len(), 3);
    assert!(matrix.link_exists("not a url", "also bad"));
    assert!(matrix.link_exists("not a url", "https://x/a"));
}

#[test]
fn test_nofollow_links_still_count() {
    let mut link = LinkRef::new("https://x/b");
    link.is_follow = false;
    let mut page = PageRecord::new("https://x/a");
    page.outbound_links.push(link);

    let matrix = MatrixEngine::from_pages(&[page, PageRecord::new("https://x/b")]);
    assert!(matrix.link_exists("https://x/a", "https://x/b"));
}

// ============================================================================
// Matrix Query Tests
// ============================================================================

#[test]
fn test_degree_consistency() {
    let matrix = MatrixEngine::from_pages(&site());
    let pages = matrix.pages().to_vec();

    for p in &pages {
        let incoming = pages.iter().filter(|q| matrix.link_exists(q, p)).count();
        let outgoing = pages.iter().filter(|q| matrix.link_exists(p, q)).count();
        assert_eq!(matrix.incoming_count(p), incoming, "incoming for {}", p);
        assert_eq!(matrix.outgoing_count(p), outgoing, "outgoing for {}", p);
        assert_eq!(
            matrix.is_isolated(p),
            incoming == 0 && outgoing == 0,
            "isolated for {}",
            p
        );
    }
}

#[test]
fn test_site_degrees() {
    let matrix = MatrixEngine::from_pages(&site());

    assert_eq!(matrix.outgoing_count("https://x/"), 2);
    assert_eq!(matrix.incoming_count("https://x/"), 2);
    assert_eq!(matrix.incoming_count("https://x/b"), 2);
    assert_eq!(matrix.outgoing_count("https://x/b"), 1);
    assert_eq!(matrix.link_count(), 5);
    assert_eq!(matrix.isolated_pages(), vec!["https://x/orphan"]);
}

#[test]
fn test_cells_follow_row_target_column_source() {
    let matrix = MatrixEngine::from_pages(&site());
    let a = matrix.position("https://x/a").unwrap();
    let b = matrix.position("https://x/b").unwrap();

    assert!(matrix.cell(b, a));
    assert!(!matrix.cell(a, b));
    assert!(!matrix.cell(99, 0));
    assert!(matrix.row(99).is_empty());
    for i in 0..matrix.len() {
        assert!(!matrix.cell(i, i));
    }
}

#[test]
fn test_unknown_pages() {
    let matrix = MatrixEngine::from_pages(&site());
    assert_eq!(matrix.incoming_count("https://nowhere/"), 0);
    assert_eq!(matrix.outgoing_count("https://nowhere/"), 0);
    assert!(!matrix.is_isolated("https://nowhere/"));
    assert!(!matrix.link_exists("https://nowhere/", "https://x/a"));
}

#[test]
fn test_ranking_and_summary() {
    let matrix = MatrixEngine::from_pages(&site());
    let ranked = matrix.ranked_by_incoming();

    assert_eq!(ranked.len(), 4);
    assert_eq!(ranked[0].url, "https://x");
    assert_eq!(ranked[1].url, "https://x/b");
    assert_eq!(ranked.last().unwrap().url, "https://x/orphan");

    let summary = matrix.summary();
    assert_eq!(summary.pages, 4);
    assert_eq!(summary.links, 5);
    assert_eq!(summary.isolated, 1);
    assert_eq!(summary.most_linked.unwrap().url, "https://x");
}

#[test]
fn test_empty_matrix() {
    let matrix = MatrixEngine::from_pages(&[]);
    assert!(matrix.is_empty());
    assert_eq!(matrix.link_count(), 0);
    assert!(matrix.summary().most_linked.is_none());
}
