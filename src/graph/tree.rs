//! The node tree, the in-memory graph model.
//!
//! Uses a petgraph `StableDiGraph` so node and link handles survive
//! removals. Every edge is one link; the socket positions on both ends are
//! stored in the edge weight.

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

use super::model::GraphModel;
use super::network::NetworkIndex;
use super::subprogram::SubprogramRegistry;
use super::types::*;
use crate::error::{GroupError, Result};

/// A node tree holding nodes, links and the derived network/subprogram caches.
pub struct NodeTree {
    /// The directed graph; edges point from the output side to the input side.
    graph: StableDiGraph<NodeData, LinkData>,
    /// Index: unique node name -> node index.
    name_index: HashMap<String, NodeIndex>,
    /// Index: persistent identifier -> node index.
    identifier_index: HashMap<Uuid, NodeIndex>,
    /// Networks, computed on first use after a structural change.
    networks: OnceCell<NetworkIndex>,
    subprograms: SubprogramRegistry,
    next_serial: u64,
}

impl NodeTree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            name_index: HashMap::new(),
            identifier_index: HashMap::new(),
            networks: OnceCell::new(),
            subprograms: SubprogramRegistry::default(),
            next_serial: 0,
        }
    }

    pub(crate) fn inner_graph(&self) -> &StableDiGraph<NodeData, LinkData> {
        &self.graph
    }

    // ─── Lookup ─────────────────────────────────────────────────

    /// Find a node by its unique name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.name_index.get(name).copied().map(NodeId)
    }

    /// Resolve a list of names, failing on the first unknown one.
    pub fn resolve_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<NodeId>> {
        names
            .iter()
            .map(|name| {
                self.find(name.as_ref())
                    .ok_or_else(|| GroupError::UnknownNode(name.as_ref().to_string()))
            })
            .collect()
    }

    pub fn find_by_identifier(&self, identifier: &Uuid) -> Option<NodeId> {
        self.identifier_index.get(identifier).copied().map(NodeId)
    }

    /// All nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().map(NodeId)
    }

    /// All links in creation order.
    pub fn links(&self) -> Vec<Link> {
        let mut links: Vec<(u64, Link)> = self
            .graph
            .edge_references()
            .map(|e| (e.weight().serial, self.link_from_edge(e)))
            .collect();
        links.sort_by_key(|(serial, _)| *serial);
        links.into_iter().map(|(_, link)| link).collect()
    }

    pub fn set_position(&mut self, id: NodeId, position: Position) -> Result<()> {
        self.weight_mut(id)?.position = position;
        Ok(())
    }

    pub fn set_label(&mut self, id: NodeId, label: Option<String>) -> Result<()> {
        self.weight_mut(id)?.label = label;
        Ok(())
    }

    pub fn set_selected(&mut self, id: NodeId, select: bool) -> Result<()> {
        self.weight_mut(id)?.select = select;
        Ok(())
    }

    /// Networks of the tree with their member nodes.
    pub fn networks(&self) -> &[(Network, Vec<NodeId>)] {
        self.network_index().networks()
    }

    pub fn network_index(&self) -> &NetworkIndex {
        self.networks
            .get_or_init(|| NetworkIndex::build(&self.graph))
    }

    /// Cached subprogram registry; see [`GraphModel::refresh_subprograms`].
    pub fn subprograms(&self) -> &SubprogramRegistry {
        &self.subprograms
    }

    // ─── Stats ──────────────────────────────────────────────────

    pub fn stats(&self) -> TreeStats {
        TreeStats {
            node_count: self.graph.node_count(),
            link_count: self.graph.edge_count(),
            network_count: self.network_index().len(),
            subprogram_count: self.subprograms.len(),
            selected_count: self.graph.node_weights().filter(|n| n.select).count(),
        }
    }

    // ─── Internal Helpers ───────────────────────────────────────

    /// Node data for fields that no index or cache depends on.
    fn weight_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.graph
            .node_weight_mut(id.0)
            .ok_or(GroupError::NodeNotFound(id))
    }

    fn socket_exists(&self, socket: SocketRef) -> Result<&Socket> {
        self.graph
            .node_weight(socket.node.0)
            .ok_or(GroupError::NodeNotFound(socket.node))?
            .socket(socket.direction, socket.index)
            .ok_or(GroupError::SocketNotFound(socket))
    }

    fn link_from_edge(
        &self,
        edge: petgraph::stable_graph::EdgeReference<'_, LinkData>,
    ) -> Link {
        Link {
            id: LinkId(edge.id()),
            from: SocketRef::output(NodeId(edge.source()), edge.weight().from_socket),
            to: SocketRef::input(NodeId(edge.target()), edge.weight().to_socket),
        }
    }

    /// Derive a free node name, Blender style ("Math", "Math.001", ...).
    fn free_name(&self, base: &str) -> String {
        if !self.name_index.contains_key(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{}.{:03}", base, n))
            .find(|candidate| !self.name_index.contains_key(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    /// Insert fully formed node data. Used by persistence.
    pub(crate) fn insert_node_data(&mut self, data: NodeData) -> Result<NodeId> {
        if self.name_index.contains_key(&data.name) {
            return Err(GroupError::DuplicateName(data.name));
        }
        if self.identifier_index.contains_key(&data.identifier) {
            return Err(GroupError::DuplicateIdentifier(data.identifier));
        }
        // Frames are skipped by extraction, so they must not carry links.
        if !data.kind.is_data_flow() && !(data.inputs.is_empty() && data.outputs.is_empty()) {
            return Err(GroupError::MalformedNode {
                name: data.name,
                reason: format!("{} nodes have no sockets", data.kind),
            });
        }
        let name = data.name.clone();
        let identifier = data.identifier;
        let idx = self.graph.add_node(data);
        self.name_index.insert(name, idx);
        self.identifier_index.insert(identifier, idx);
        self.networks = OnceCell::new();
        Ok(NodeId(idx))
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphModel for NodeTree {
    fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.graph
            .node_weight(id.0)
            .ok_or(GroupError::NodeNotFound(id))
    }

    fn origin(&self, input: SocketRef) -> Result<Option<Link>> {
        if input.direction != SocketDirection::Input {
            return Err(GroupError::SocketNotFound(input));
        }
        self.socket_exists(input)?;
        Ok(self
            .graph
            .edges_directed(input.node.0, Direction::Incoming)
            .find(|e| e.weight().to_socket == input.index)
            .map(|e| self.link_from_edge(e)))
    }

    fn targets(&self, output: SocketRef) -> Result<Vec<Link>> {
        if output.direction != SocketDirection::Output {
            return Err(GroupError::SocketNotFound(output));
        }
        self.socket_exists(output)?;
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(output.node.0, Direction::Outgoing)
            .filter(|e| e.weight().from_socket == output.index)
            .collect();
        edges.sort_by_key(|e| e.weight().serial);
        Ok(edges.into_iter().map(|e| self.link_from_edge(e)).collect())
    }

    fn network(&self, id: NodeId) -> Result<Network> {
        self.network_index()
            .network_of(id)
            .ok_or(GroupError::NodeNotFound(id))
    }

    fn add_node(&mut self, node: NewNode) -> Result<NodeId> {
        let base = node
            .name
            .clone()
            .unwrap_or_else(|| node.kind.to_string());
        let data = NodeData {
            identifier: Uuid::new_v4(),
            name: self.free_name(&base),
            label: node.label,
            kind: node.kind,
            inputs: node.inputs,
            outputs: node.outputs,
            restrictions: node.restrictions,
            position: node.position,
            select: false,
            highlight: false,
        };
        debug!(name = %data.name, kind = %data.kind, "adding node");
        self.insert_node_data(data)
    }

    fn add_parameter(
        &mut self,
        node: NodeId,
        direction: SocketDirection,
        data_type: DataType,
        name: &str,
    ) -> Result<SocketRef> {
        let data = self
            .graph
            .node_weight_mut(node.0)
            .ok_or(GroupError::NodeNotFound(node))?;
        if !data.kind.accepts_parameters() {
            return Err(GroupError::NotAnInterface(node));
        }
        let extra_side = data.kind.extra_side();
        if extra_side.is_some_and(|side| side != direction) {
            return Err(GroupError::NotAnInterface(node));
        }

        let sockets = data.sockets_mut(direction);
        // The extra socket is never linked, so shifting it is safe.
        let index = sockets
            .iter()
            .position(|socket| socket.is_extra)
            .unwrap_or(sockets.len());
        sockets.insert(index, Socket::new(name, data_type));
        Ok(SocketRef {
            node,
            direction,
            index,
        })
    }

    fn link(&mut self, from: SocketRef, to: SocketRef) -> Result<LinkId> {
        let invalid = |reason: &str| GroupError::InvalidLink {
            from,
            to,
            reason: reason.to_string(),
        };
        if from.direction != SocketDirection::Output || to.direction != SocketDirection::Input {
            return Err(invalid("links go from an output to an input"));
        }
        if from.node == to.node {
            return Err(invalid("a node cannot be linked to itself"));
        }
        if self.socket_exists(from)?.is_extra || self.socket_exists(to)?.is_extra {
            return Err(invalid("extra sockets cannot be linked"));
        }

        if let Some(existing) = self.origin(to)? {
            debug!(link = %existing.id, "replacing origin of {}", to);
            self.graph.remove_edge(existing.id.0);
        }

        let serial = self.next_serial;
        self.next_serial += 1;
        let edge = self.graph.add_edge(
            from.node.0,
            to.node.0,
            LinkData {
                from_socket: from.index,
                to_socket: to.index,
                serial,
            },
        );
        self.networks = OnceCell::new();
        Ok(LinkId(edge))
    }

    fn unlink(&mut self, link: LinkId) -> Result<Link> {
        let (source, target) = self
            .graph
            .edge_endpoints(link.0)
            .ok_or(GroupError::LinkNotFound(link))?;
        let data = self
            .graph
            .remove_edge(link.0)
            .ok_or(GroupError::LinkNotFound(link))?;
        self.networks = OnceCell::new();
        Ok(Link {
            id: link,
            from: SocketRef::output(NodeId(source), data.from_socket),
            to: SocketRef::input(NodeId(target), data.to_socket),
        })
    }

    fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let data = self
            .graph
            .remove_node(id.0)
            .ok_or(GroupError::NodeNotFound(id))?;
        debug!(name = %data.name, "removing node");
        self.name_index.remove(&data.name);
        self.identifier_index.remove(&data.identifier);
        self.networks = OnceCell::new();
        Ok(())
    }

    fn selected_nodes(&self) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].select)
            .map(NodeId)
            .collect()
    }

    fn select_only(&mut self, nodes: &[NodeId]) {
        let chosen: HashSet<NodeIndex> = nodes.iter().map(|n| n.0).collect();
        for idx in self.graph.node_indices().collect::<Vec<_>>() {
            self.graph[idx].select = chosen.contains(&idx);
        }
    }

    fn highlight(&mut self, nodes: &[NodeId]) {
        for node in nodes {
            if let Some(data) = self.graph.node_weight_mut(node.0) {
                data.highlight = true;
            }
        }
    }

    fn refresh_subprograms(&mut self) {
        self.subprograms = SubprogramRegistry::rebuild(&self.graph);
        debug!(count = self.subprograms.len(), "subprogram registry refreshed");
    }

    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn link_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Statistics about a tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeStats {
    pub node_count: usize,
    pub link_count: usize,
    pub network_count: usize,
    pub subprogram_count: usize,
    pub selected_count: usize,
}
