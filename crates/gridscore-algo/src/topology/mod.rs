//! Graph algorithms over the energized AC network.
//!
//! The per-interval network is an undirected multigraph: every bus is a
//! vertex, every energized AC line and transformer an edge. Parallel branches
//! are kept as separate edges, which matters for bridge detection: two
//! parallel branches protect each other, so neither is a bridge.
//!
//! - [`connected_components`] labels islands (BFS, ordered by smallest bus)
//! - [`component_count`] counts them with petgraph's union-find
//! - [`bridges`] finds the edges whose loss would split an island (Tarjan low-link)

pub mod connectivity;

pub use connectivity::{
    evaluate_connectivity, BaseConnectivityInfo, ContingencyConnectivityInfo, ConnectivityReport,
};

use petgraph::algo::connected_components as petgraph_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::VecDeque;

/// Build the multigraph; edge weights are positions in `edges`.
fn build_graph(num_vertices: usize, edges: &[(usize, usize)]) -> UnGraph<(), usize> {
    let mut graph = UnGraph::with_capacity(num_vertices, edges.len());
    for _ in 0..num_vertices {
        graph.add_node(());
    }
    for (pos, &(a, b)) in edges.iter().enumerate() {
        graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), pos);
    }
    graph
}

/// Number of connected components, isolated vertices included.
pub fn component_count(num_vertices: usize, edges: &[(usize, usize)]) -> usize {
    petgraph_components(&build_graph(num_vertices, edges))
}

/// Connected components as sorted vertex lists, ordered by their smallest vertex.
pub fn connected_components(num_vertices: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
    let graph = build_graph(num_vertices, edges);
    let mut visited = vec![false; num_vertices];
    let mut components = Vec::new();
    for start in graph.node_indices() {
        if visited[start.index()] {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        visited[start.index()] = true;
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            members.push(node.index());
            for neighbor in graph.neighbors(node) {
                if !visited[neighbor.index()] {
                    visited[neighbor.index()] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }
    components
}

/// Positions (into `edges`) of every bridge, ascending.
///
/// Iterative DFS so that long radial feeders do not exhaust the call stack.
/// The tree edge back to the parent is skipped by edge identity, not by
/// endpoint, so a parallel edge counts as a back edge. Self-loops are ignored.
pub fn bridges(num_vertices: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    const UNSEEN: usize = usize::MAX;

    let graph = build_graph(num_vertices, edges);
    let incident = |v: NodeIndex| -> Vec<(usize, usize)> {
        graph
            .edges(v)
            .map(|e| {
                let other = if e.source() == v { e.target() } else { e.source() };
                (other.index(), *e.weight())
            })
            .collect()
    };

    let mut disc = vec![UNSEEN; num_vertices];
    let mut low = vec![0usize; num_vertices];
    let mut timer = 0usize;
    let mut found = Vec::new();

    for root in graph.node_indices() {
        if disc[root.index()] != UNSEEN {
            continue;
        }
        disc[root.index()] = timer;
        low[root.index()] = timer;
        timer += 1;

        // (vertex, edge used to reach it, incident edges, cursor)
        let mut stack: Vec<(usize, Option<usize>, Vec<(usize, usize)>, usize)> =
            vec![(root.index(), None, incident(root), 0)];

        while let Some(frame) = stack.last_mut() {
            let v = frame.0;
            let via = frame.1;
            if frame.3 < frame.2.len() {
                let (w, edge) = frame.2[frame.3];
                frame.3 += 1;
                if Some(edge) == via || w == v {
                    continue;
                }
                if disc[w] == UNSEEN {
                    disc[w] = timer;
                    low[w] = timer;
                    timer += 1;
                    stack.push((w, Some(edge), incident(NodeIndex::new(w)), 0));
                } else {
                    low[v] = low[v].min(disc[w]);
                }
            } else {
                stack.pop();
                if let (Some(parent), Some(edge)) = (stack.last(), via) {
                    let u = parent.0;
                    low[u] = low[u].min(low[v]);
                    if low[v] > disc[u] {
                        found.push(edge);
                    }
                }
            }
        }
    }
    found.sort_unstable();
    found
}
