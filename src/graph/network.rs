//! Network analysis. Splits a tree into connected components and tags each
//! one as main program, subprogram body or invalid.
//!
//! Components are formed by links and additionally by identifier
//! references: a group output belongs to the network of the group input it
//! references even when no link connects them.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::{EdgeRef, IntoEdgeReferences, NodeIndexable};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::types::*;

/// Result of one network analysis pass over a tree.
#[derive(Debug, Clone, Default)]
pub struct NetworkIndex {
    by_node: HashMap<NodeIndex, Network>,
    members: Vec<(Network, Vec<NodeId>)>,
}

impl NetworkIndex {
    pub(crate) fn build(graph: &StableDiGraph<NodeData, LinkData>) -> Self {
        let mut components = UnionFind::<usize>::new(graph.node_bound());

        for edge in graph.edge_references() {
            components.union(edge.source().index(), edge.target().index());
        }

        let inputs: HashMap<Uuid, NodeIndex> = graph
            .node_indices()
            .filter_map(|idx| match graph[idx].kind {
                NodeKind::GroupInput { .. } => Some((graph[idx].identifier, idx)),
                _ => None,
            })
            .collect();

        for idx in graph.node_indices() {
            if let NodeKind::GroupOutput {
                group_input: Some(id),
            } = graph[idx].kind
            {
                if let Some(&input_idx) = inputs.get(&id) {
                    components.union(idx.index(), input_idx.index());
                }
            }
        }

        // Ordered by the lowest member index so network ids are stable.
        let mut grouped: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
        let mut root_to_first: HashMap<usize, usize> = HashMap::new();
        for idx in graph.node_indices() {
            let root = components.find(idx.index());
            let first = *root_to_first.entry(root).or_insert(idx.index());
            grouped.entry(first).or_default().push(idx);
        }

        let mut index = NetworkIndex::default();
        for (position, nodes) in grouped.into_values().enumerate() {
            let network = Network {
                id: NetworkId(position),
                kind: classify(graph, &nodes),
            };
            for &idx in &nodes {
                index.by_node.insert(idx, network);
            }
            index
                .members
                .push((network, nodes.into_iter().map(NodeId).collect()));
        }
        index
    }

    pub fn network_of(&self, node: NodeId) -> Option<Network> {
        self.by_node.get(&node.0).copied()
    }

    /// All networks with their member nodes.
    pub fn networks(&self) -> &[(Network, Vec<NodeId>)] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

fn classify(graph: &StableDiGraph<NodeData, LinkData>, nodes: &[NodeIndex]) -> NetworkKind {
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut calls = Vec::new();

    for &idx in nodes {
        let node = &graph[idx];
        match &node.kind {
            NodeKind::GroupInput { .. } => inputs.push(node.identifier),
            NodeKind::GroupOutput { group_input } => outputs.push(*group_input),
            NodeKind::GroupCall { subprogram } => calls.push(*subprogram),
            NodeKind::Function { .. } | NodeKind::Frame => {}
        }
    }

    if inputs.len() > 1 || outputs.len() > 1 {
        return NetworkKind::Invalid;
    }

    let owner = inputs.first().copied();
    if let Some(reference) = outputs.first() {
        if reference.is_none() || *reference != owner {
            return NetworkKind::Invalid;
        }
    }

    match owner {
        Some(id) if calls.contains(&Some(id)) => NetworkKind::Invalid,
        Some(id) => NetworkKind::Subnetwork(id),
        None => NetworkKind::Main,
    }
}
