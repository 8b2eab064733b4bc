use anyhow::Result;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, VecDeque};
use std::io::Write;

use super::ResultWriter;
use crate::crawler::{CrawlResult, Page, PageId};

/// Writes the pages reachable from the root as a Graphviz digraph named
/// after the root host
#[derive(Debug, Default, Clone, Copy)]
pub struct DotWriter;

/// Graph of the pages reachable from the root. Repeated links between two
/// pages collapse into one edge weighted by the number of links.
pub fn site_graph(result: &CrawlResult) -> DiGraph<&Page, usize> {
    let mut graph = DiGraph::new();
    let mut nodes: HashMap<PageId, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::new();

    let root = result.root();
    nodes.insert(root.id(), graph.add_node(root));
    queue.push_back(root);

    while let Some(page) = queue.pop_front() {
        let from = nodes[&page.id()];

        let mut edges: Vec<(PageId, usize)> = Vec::new();
        for linked in result.links(page) {
            match edges.iter_mut().find(|(id, _)| *id == linked.id()) {
                Some((_, weight)) => *weight += 1,
                None => edges.push((linked.id(), 1)),
            }
            if !nodes.contains_key(&linked.id()) {
                nodes.insert(linked.id(), graph.add_node(linked));
                queue.push_back(linked);
            }
        }

        for (to, weight) in edges {
            graph.add_edge(from, nodes[&to], weight);
        }
    }
    graph
}

/// Escapes characters that are special inside a record label
fn escape_record(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escapes a quoted graph id
fn escape_id(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `{url|asset\l...}`, one left-justified line per asset
fn node_label(page: &Page) -> String {
    let assets: String = page
        .assets()
        .iter()
        .map(|asset| format!("{}\\l", escape_record(asset.as_str())))
        .collect();
    format!("{{{}|{}}}", escape_record(page.url().as_str()), assets)
}

impl ResultWriter for DotWriter {
    fn ext(&self) -> &'static str {
        "dot"
    }

    fn write(&self, out: &mut dyn Write, result: &CrawlResult) -> Result<()> {
        let graph = site_graph(result);

        let dot = Dot::with_attr_getters(
            &graph,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &|_, edge| match *edge.weight() {
                1 => String::new(),
                weight => format!("label = \"{}\"", weight),
            },
            &|_, (_, page)| format!("shape = record, label = \"{}\"", node_label(page)),
        );
        let host = result.root().url().host_str().unwrap_or_default();
        let rendered = dot.to_string();
        let body = rendered.strip_prefix("digraph ").unwrap_or(&rendered);
        write!(out, "digraph \"{}\" {}", escape_id(host), body)?;
        out.flush()?;
        Ok(())
    }
}
